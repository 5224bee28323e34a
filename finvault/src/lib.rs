//! Account security for a banking backend.
//!
//! finvault guards account logins with two mechanisms:
//!
//! - **Lockout**: repeated failed logins lock the account. The lock lifts on
//!   its own once the lockout duration has passed since the last failure, or
//!   by administrative unlock. The holder is emailed when it happens.
//! - **One-time passcodes**: a correct password does not finish the login.
//!   A short numeric code is mailed to the holder and must be presented
//!   before it expires. Each code works once.
//!
//! # Example
//!
//! ```rust,no_run
//! use finvault::{FinvaultBuilder, RegisterAccount};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let finvault = FinvaultBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     finvault
//!         .register(RegisterAccount::new("ada@example.com", "correct horse battery"))
//!         .await?;
//!
//!     let pending = finvault.login("ada@example.com", "correct horse battery").await?;
//!     // The passcode is mailed to the holder; collect it from them.
//!     let account = finvault.verify_login_otp(&pending.account_id, "482913").await?;
//!     println!("Welcome back, {account}");
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use chrono::{DateTime, Utc};

pub mod builder;

pub use builder::{FinvaultBuilder, FinvaultBuilderError};

pub use finvault_core::{
    Account, AccountId, AccountRepository, AccountService, AccountStatus, Clock, CredentialHash,
    FailedAttempt, InMemoryAccountRepository, LockoutService, LockoutStatus, LoginService,
    ManualClock, Notifier, OtpService, PendingLogin, PendingOtp, Recipient, RegisterAccount, Role,
    SecurityConfig, SystemClock, TracingNotifier,
    error::{AuthError, NotificationError, StorageError, ValidationError},
};

#[cfg(feature = "mailer")]
pub use finvault_core::MailerNotifier;
#[cfg(feature = "mailer")]
pub use finvault_mailer::MailerConfig;

#[cfg(feature = "sqlite")]
pub mod sqlite {
    pub use finvault_storage_sqlite::{SqliteAccountRepository, SqlitePool, SqliteStorage};
}

#[cfg(feature = "sqlite")]
pub use finvault_storage_sqlite::SqliteStorage;

#[derive(Debug, thiserror::Error)]
pub enum FinvaultError {
    #[error(transparent)]
    Core(#[from] finvault_core::Error),

    #[error(transparent)]
    Builder(#[from] FinvaultBuilderError),
}

impl FinvaultError {
    /// The request was refused for a credential or lockout reason.
    pub fn is_denial(&self) -> bool {
        matches!(self, FinvaultError::Core(e) if e.is_denial())
    }

    pub fn as_auth_error(&self) -> Option<&AuthError> {
        match self {
            FinvaultError::Core(finvault_core::Error::Auth(e)) => Some(e),
            _ => None,
        }
    }
}

/// The main entry point: the account security services over one repository.
pub struct Finvault<R: AccountRepository> {
    repository: Arc<R>,
    config: SecurityConfig,
    accounts: Arc<AccountService<R>>,
    lockout: Arc<LockoutService<R>>,
    otp: Arc<OtpService<R>>,
    login: Arc<LoginService<R>>,
}

impl<R: AccountRepository> Finvault<R> {
    /// Create an instance with the default [`SecurityConfig`], notifications
    /// written to the log and the system clock.
    pub fn new(repository: Arc<R>) -> Self {
        Self::from_parts(
            repository,
            SecurityConfig::default(),
            Arc::new(TracingNotifier),
            Arc::new(SystemClock),
        )
    }

    pub(crate) fn from_parts(
        repository: Arc<R>,
        config: SecurityConfig,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let accounts = Arc::new(AccountService::new(
            repository.clone(),
            clock.clone(),
            config.bank_name.clone(),
        ));
        let lockout = Arc::new(LockoutService::new(
            repository.clone(),
            notifier.clone(),
            clock.clone(),
            &config,
        ));
        let otp = Arc::new(OtpService::new(
            repository.clone(),
            notifier,
            clock.clone(),
            &config,
        ));
        let login = Arc::new(LoginService::new(
            repository.clone(),
            lockout.clone(),
            otp.clone(),
            clock,
            &config,
        ));

        Self {
            repository,
            config,
            accounts,
            lockout,
            otp,
            login,
        }
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    // Accounts

    pub async fn register(&self, request: RegisterAccount) -> Result<Account, FinvaultError> {
        Ok(self.accounts.register(request).await?)
    }

    pub async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, FinvaultError> {
        Ok(self.accounts.get_account(id).await?)
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, FinvaultError> {
        Ok(self.accounts.get_account_by_email(email).await?)
    }

    pub async fn delete_account(&self, id: &AccountId) -> Result<(), FinvaultError> {
        Ok(self.accounts.delete_account(id).await?)
    }

    // Login

    /// First login step. On success a passcode has been issued and mailed.
    pub async fn login(&self, email: &str, password: &str) -> Result<PendingLogin, FinvaultError> {
        Ok(self.login.login(email, password).await?)
    }

    /// Second login step.
    pub async fn verify_login_otp(
        &self,
        id: &AccountId,
        candidate: &str,
    ) -> Result<Account, FinvaultError> {
        Ok(self.login.verify_login_otp(id, candidate).await?)
    }

    // One-time passcodes

    pub async fn issue_otp(&self, id: &AccountId) -> Result<DateTime<Utc>, FinvaultError> {
        Ok(self.otp.issue(id).await?)
    }

    pub async fn verify_otp(&self, id: &AccountId, candidate: &str) -> Result<bool, FinvaultError> {
        Ok(self.otp.verify(id, candidate).await?)
    }

    // Lockout

    pub async fn is_locked_out(&self, id: &AccountId) -> Result<bool, FinvaultError> {
        Ok(self.lockout.is_locked_out(id).await?)
    }

    pub async fn lockout_status(&self, id: &AccountId) -> Result<LockoutStatus, FinvaultError> {
        Ok(self.lockout.lockout_status(id).await?)
    }

    pub async fn record_failed_attempt(&self, id: &AccountId) -> Result<FailedAttempt, FinvaultError> {
        Ok(self.lockout.record_failed_attempt(id).await?)
    }

    pub async fn reset_on_success(&self, id: &AccountId) -> Result<(), FinvaultError> {
        Ok(self.lockout.reset_on_success(id).await?)
    }

    /// Administrative unlock. Returns whether the account was locked.
    pub async fn unlock_account(&self, id: &AccountId) -> Result<bool, FinvaultError> {
        Ok(self.lockout.unlock_account(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_facade() {
        let finvault = Finvault::new(Arc::new(InMemoryAccountRepository::new()));
        let account = finvault
            .register(RegisterAccount::new("ada@example.com", "securepassword123"))
            .await
            .unwrap();

        assert!(finvault.login("ada@example.com", "securepassword123").await.is_ok());
        assert!(finvault.get_account(&account.id).await.unwrap().unwrap().has_pending_otp());

        let err = finvault.login("ada@example.com", "wrong password").await.unwrap_err();
        assert!(err.is_denial());
        assert!(matches!(err.as_auth_error(), Some(AuthError::InvalidCredentials)));
    }
}
