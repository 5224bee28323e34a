//! Two-step login: password, then a mailed one-time passcode.
//!
//! ```text
//! login(email, password)
//!   ├─ unknown email ─────────────────────────▶ InvalidCredentials
//!   ├─ locked (after lazy expiry check) ──────▶ denied
//!   ├─ wrong password ─▶ record failure ──────▶ InvalidCredentials
//!   └─ ok ─▶ reset failures ─▶ issue OTP ─────▶ PendingLogin
//!
//! verify_login_otp(account_id, code)
//!   ├─ locked ────────────────────────────────▶ denied
//!   ├─ wrong / expired / missing code ────────▶ InvalidOtp
//!   └─ ok ─▶ code consumed ───────────────────▶ Account
//! ```
//!
//! "Denied" is `InvalidCredentials` unless `disclose_lockout` is set, in which
//! case it is `AccountLocked` with the seconds left on the lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    account::{Account, AccountId},
    clock::Clock,
    config::SecurityConfig,
    crypto::verify_password,
    error::AuthError,
    lockout::LockoutCheck,
    repositories::AccountRepository,
    services::{LockoutService, OtpService},
    validation::{normalize_email, validate_otp_candidate},
};

/// A login that passed the password step and is waiting for its passcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    pub account_id: AccountId,
    pub otp_expires_at: DateTime<Utc>,
}

pub struct LoginService<R: AccountRepository> {
    repository: Arc<R>,
    lockout: Arc<LockoutService<R>>,
    otp: Arc<OtpService<R>>,
    clock: Arc<dyn Clock>,
    disclose_lockout: bool,
}

impl<R: AccountRepository> LoginService<R> {
    pub fn new(
        repository: Arc<R>,
        lockout: Arc<LockoutService<R>>,
        otp: Arc<OtpService<R>>,
        clock: Arc<dyn Clock>,
        config: &SecurityConfig,
    ) -> Self {
        Self {
            repository,
            lockout,
            otp,
            clock,
            disclose_lockout: config.disclose_lockout,
        }
    }

    /// Check the password and, if it matches, mail a one-time passcode.
    pub async fn login(&self, email: &str, password: &str) -> Result<PendingLogin, Error> {
        let mut account = self
            .repository
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(Error::Auth(AuthError::InvalidCredentials))?;

        let check = self.lockout.check_account(&mut account).await?;
        if check.is_locked() {
            tracing::info!(account_id = %account.id, "Login refused: account locked");
            return Err(self.denied(check));
        }

        if !verify_password(password, &account.credential_hash) {
            let attempt = self.lockout.record_failure(&mut account).await?;
            tracing::info!(
                account_id = %account.id,
                failed_attempts = attempt.failed_attempts,
                "Login failed: wrong password"
            );
            return Err(Error::Auth(AuthError::InvalidCredentials));
        }

        self.lockout.reset_account(&mut account).await?;
        let otp_expires_at = self.otp.issue_for(&mut account).await?;

        Ok(PendingLogin {
            account_id: account.id,
            otp_expires_at,
        })
    }

    /// Complete a login with the mailed passcode.
    pub async fn verify_login_otp(&self, id: &AccountId, candidate: &str) -> Result<Account, Error> {
        validate_otp_candidate(candidate)?;

        let mut account = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(Error::Auth(AuthError::InvalidOtp))?;

        let check = self.lockout.check_account(&mut account).await?;
        if check.is_locked() {
            tracing::info!(account_id = %account.id, "Passcode refused: account locked");
            return Err(self.denied(check));
        }

        if !self.otp.verify_for(&mut account, candidate).await? {
            return Err(Error::Auth(AuthError::InvalidOtp));
        }

        tracing::info!(account_id = %account.id, "Login completed");
        Ok(account)
    }

    fn denied(&self, check: LockoutCheck) -> Error {
        if !self.disclose_lockout {
            return Error::Auth(AuthError::InvalidCredentials);
        }

        let retry_after_seconds = match check {
            LockoutCheck::Locked {
                locked_until: Some(until),
            } => Some((until - self.clock.now()).num_seconds().max(0)),
            _ => None,
        };
        Error::Auth(AuthError::AccountLocked {
            retry_after_seconds,
        })
    }
}
