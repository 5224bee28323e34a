//! One-time passcode service.
//!
//! Issues a passcode, saves it on the account and mails it to the holder.
//! Verification consumes a matching code. Neither a failed verification nor
//! an invalid candidate counts towards the login lockout.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    Error,
    account::{Account, AccountId},
    clock::Clock,
    config::SecurityConfig,
    crypto::generate_otp,
    error::AuthError,
    notifier::{Notifier, Recipient},
    otp,
    repositories::AccountRepository,
    validation::validate_otp_candidate,
};

pub struct OtpService<R: AccountRepository> {
    repository: Arc<R>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    length: usize,
    expiry_minutes: u64,
}

impl<R: AccountRepository> OtpService<R> {
    pub fn new(
        repository: Arc<R>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: &SecurityConfig,
    ) -> Self {
        Self {
            repository,
            notifier,
            clock,
            ttl: config.otp_ttl,
            length: config.otp_length,
            expiry_minutes: config.otp_expiry_minutes(),
        }
    }

    /// Generate a fresh passcode for the account, replacing any pending one.
    /// Returns when it expires.
    pub async fn issue(&self, id: &AccountId) -> Result<DateTime<Utc>, Error> {
        let mut account = self.load(id).await?;
        self.issue_for(&mut account).await
    }

    /// Issue a caller-supplied passcode instead of a generated one.
    pub async fn issue_code(&self, id: &AccountId, code: &str) -> Result<DateTime<Utc>, Error> {
        validate_otp_candidate(code)?;
        let mut account = self.load(id).await?;
        self.store_and_send(&mut account, code.to_string()).await
    }

    /// Check a candidate against the pending passcode, consuming it on a match.
    ///
    /// A malformed candidate is rejected with a validation error before the
    /// account is read.
    pub async fn verify(&self, id: &AccountId, candidate: &str) -> Result<bool, Error> {
        validate_otp_candidate(candidate)?;
        let mut account = self.load(id).await?;
        self.verify_for(&mut account, candidate).await
    }

    pub(crate) async fn issue_for(&self, account: &mut Account) -> Result<DateTime<Utc>, Error> {
        let code = generate_otp(self.length);
        self.store_and_send(account, code).await
    }

    pub(crate) async fn verify_for(&self, account: &mut Account, candidate: &str) -> Result<bool, Error> {
        let now = self.clock.now();
        if !otp::verify(account, candidate, now) {
            tracing::debug!(account_id = %account.id, "One-time passcode rejected");
            return Ok(false);
        }

        account.updated_at = now;
        self.repository.save(account).await?;
        tracing::info!(account_id = %account.id, "One-time passcode verified");
        Ok(true)
    }

    async fn store_and_send(&self, account: &mut Account, code: String) -> Result<DateTime<Utc>, Error> {
        let now = self.clock.now();
        let expires_at = otp::issue(account, code.as_str(), now, self.ttl);
        account.updated_at = now;
        self.repository.save(account).await?;

        tracing::debug!(
            account_id = %account.id,
            expires_at = %expires_at,
            "Issued one-time passcode"
        );

        let recipient = Recipient::from(&*account);
        if let Err(e) = self
            .notifier
            .send_otp(&recipient, &code, self.expiry_minutes)
            .await
        {
            tracing::warn!(
                account_id = %account.id,
                error = %e,
                "Failed to send one-time passcode"
            );
        }

        Ok(expires_at)
    }

    async fn load(&self, id: &AccountId) -> Result<Account, Error> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(Error::Auth(AuthError::AccountNotFound))
    }
}
