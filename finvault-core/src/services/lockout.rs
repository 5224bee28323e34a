//! Login lockout service.
//!
//! Wraps [`LockoutPolicy`] with persistence and notification: each call loads
//! the account, applies the transition in memory, saves it, and only then
//! notifies the holder. A failed notification is logged and ignored.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = LockoutService::new(repository, notifier, clock, &SecurityConfig::default());
//!
//! if service.is_locked_out(&account_id).await? {
//!     // deny the login
//! }
//!
//! let attempt = service.record_failed_attempt(&account_id).await?;
//! ```

use std::sync::Arc;

use crate::{
    Error,
    account::{Account, AccountId},
    clock::Clock,
    config::SecurityConfig,
    error::AuthError,
    lockout::{self, FailedAttempt, LockoutCheck, LockoutPolicy, LockoutStatus},
    notifier::{Notifier, Recipient},
    repositories::AccountRepository,
};

pub struct LockoutService<R: AccountRepository> {
    repository: Arc<R>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: LockoutPolicy,
    lockout_minutes: u64,
}

impl<R: AccountRepository> LockoutService<R> {
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
            policy: LockoutPolicy::from(config),
            lockout_minutes: config.lockout_minutes(),
        }
    }

    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    /// Whether the account is locked right now. Lifts and saves an expired lock.
    pub async fn is_locked_out(&self, id: &AccountId) -> Result<bool, Error> {
        let mut account = self.load(id).await?;
        Ok(self.check_account(&mut account).await?.is_locked())
    }

    /// The current lockout state, including when it lifts.
    pub async fn lockout_status(&self, id: &AccountId) -> Result<LockoutStatus, Error> {
        let mut account = self.load(id).await?;
        let (check, status) = self.policy.status(&mut account, self.clock.now());
        if check.requires_save() {
            self.persist_expiry(&mut account).await?;
        }
        Ok(status)
    }

    /// Count a failed login, locking the account at the threshold.
    pub async fn record_failed_attempt(&self, id: &AccountId) -> Result<FailedAttempt, Error> {
        let mut account = self.load(id).await?;
        self.record_failure(&mut account).await
    }

    /// Clear failures after a successful password check.
    pub async fn reset_on_success(&self, id: &AccountId) -> Result<(), Error> {
        let mut account = self.load(id).await?;
        self.reset_account(&mut account).await
    }

    /// Administrative unlock. Returns `true` if the account was locked.
    pub async fn unlock_account(&self, id: &AccountId) -> Result<bool, Error> {
        let mut account = self.load(id).await?;
        if !lockout::unlock(&mut account) {
            return Ok(false);
        }

        self.save(&mut account).await?;
        tracing::info!(account_id = %account.id, "Account unlocked manually");
        Ok(true)
    }

    pub(crate) async fn check_account(&self, account: &mut Account) -> Result<LockoutCheck, Error> {
        let check = self.policy.check(account, self.clock.now());
        if check.requires_save() {
            self.persist_expiry(account).await?;
        }
        Ok(check)
    }

    pub(crate) async fn record_failure(&self, account: &mut Account) -> Result<FailedAttempt, Error> {
        let attempt = self.policy.record_failed_attempt(account, self.clock.now());
        self.save(account).await?;

        tracing::debug!(
            account_id = %account.id,
            failed_attempts = attempt.failed_attempts,
            "Recorded failed login attempt"
        );

        if attempt.locked {
            if attempt.newly_locked {
                tracing::info!(
                    account_id = %account.id,
                    failed_attempts = attempt.failed_attempts,
                    "Account locked after repeated failed logins"
                );
            }

            let recipient = Recipient::from(&*account);
            if let Err(e) = self
                .notifier
                .send_locked(&recipient, self.lockout_minutes)
                .await
            {
                tracing::warn!(
                    account_id = %account.id,
                    error = %e,
                    "Failed to send account locked notification"
                );
            }
        }

        Ok(attempt)
    }

    pub(crate) async fn reset_account(&self, account: &mut Account) -> Result<(), Error> {
        lockout::reset_on_success(account);
        self.save(account).await
    }

    async fn persist_expiry(&self, account: &mut Account) -> Result<(), Error> {
        self.save(account).await?;
        tracing::info!(account_id = %account.id, "Lockout expired; account unlocked");
        Ok(())
    }

    async fn save(&self, account: &mut Account) -> Result<(), Error> {
        account.updated_at = self.clock.now();
        self.repository.save(account).await
    }

    async fn load(&self, id: &AccountId) -> Result<Account, Error> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(Error::Auth(AuthError::AccountNotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        account::AccountStatus,
        clock::ManualClock,
        repositories::InMemoryAccountRepository,
        test_support::{RecordingNotifier, seed_account, t},
    };
    use chrono::Duration;

    struct Fixture {
        repo: Arc<InMemoryAccountRepository>,
        notifier: Arc<RecordingNotifier>,
        clock: Arc<ManualClock>,
        service: LockoutService<InMemoryAccountRepository>,
        id: AccountId,
    }

    async fn fixture(notifier: RecordingNotifier) -> Fixture {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let notifier = Arc::new(notifier);
        let clock = Arc::new(ManualClock::new(t(0)));
        let config = SecurityConfig {
            max_failed_attempts: 3,
            lockout_duration: Duration::seconds(60),
            ..SecurityConfig::default()
        };
        let service = LockoutService::new(repo.clone(), notifier.clone(), clock.clone(), &config);
        let id = seed_account(&*repo, "customer@example.com").await;

        Fixture {
            repo,
            notifier,
            clock,
            service,
            id,
        }
    }

    async fn stored(f: &Fixture) -> Account {
        f.repo.find_by_id(&f.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_lockout_scenario() {
        let f = fixture(RecordingNotifier::new()).await;

        for second in 0..3 {
            f.clock.set(t(second));
            f.service.record_failed_attempt(&f.id).await.unwrap();
        }
        assert_eq!(stored(&f).await.status, AccountStatus::Locked);
        assert_eq!(f.notifier.locked_count(), 1);

        f.clock.set(t(30));
        assert!(f.service.is_locked_out(&f.id).await.unwrap());

        f.clock.set(t(65));
        assert!(!f.service.is_locked_out(&f.id).await.unwrap());
        let account = stored(&f).await;
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.failed_attempt_count, 0);
        assert!(account.last_failed_attempt_at.is_none());

        let attempt = f.service.record_failed_attempt(&f.id).await.unwrap();
        assert_eq!(attempt.failed_attempts, 1);
        assert!(!attempt.locked);
    }

    #[tokio::test]
    async fn test_one_below_threshold_stays_active() {
        let f = fixture(RecordingNotifier::new()).await;

        for _ in 0..2 {
            f.service.record_failed_attempt(&f.id).await.unwrap();
        }
        assert_eq!(stored(&f).await.status, AccountStatus::Active);
        assert!(!f.service.is_locked_out(&f.id).await.unwrap());
        assert_eq!(f.notifier.locked_count(), 0);
    }

    #[tokio::test]
    async fn test_failures_while_locked_notify_again() {
        let f = fixture(RecordingNotifier::new()).await;

        for _ in 0..4 {
            f.service.record_failed_attempt(&f.id).await.unwrap();
        }
        assert_eq!(stored(&f).await.failed_attempt_count, 4);
        assert_eq!(f.notifier.locked_count(), 2);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_undo_lock() {
        let f = fixture(RecordingNotifier::failing()).await;

        for _ in 0..3 {
            f.service.record_failed_attempt(&f.id).await.unwrap();
        }
        assert_eq!(stored(&f).await.status, AccountStatus::Locked);
        assert!(f.service.is_locked_out(&f.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_lockout_status_reports_retry_after() {
        let f = fixture(RecordingNotifier::new()).await;
        for _ in 0..3 {
            f.service.record_failed_attempt(&f.id).await.unwrap();
        }

        f.clock.set(t(20));
        let status = f.service.lockout_status(&f.id).await.unwrap();
        assert!(status.is_locked);
        assert_eq!(status.locked_until, Some(t(60)));
        assert_eq!(status.retry_after_seconds(t(20)), Some(40));

        f.clock.set(t(61));
        let status = f.service.lockout_status(&f.id).await.unwrap();
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 0);
        assert_eq!(stored(&f).await.status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn test_reset_on_success() {
        let f = fixture(RecordingNotifier::new()).await;
        for _ in 0..3 {
            f.service.record_failed_attempt(&f.id).await.unwrap();
        }

        f.service.reset_on_success(&f.id).await.unwrap();
        let account = stored(&f).await;
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.failed_attempt_count, 0);
        assert!(account.last_failed_attempt_at.is_none());
    }

    #[tokio::test]
    async fn test_unlock_account_returns_was_locked() {
        let f = fixture(RecordingNotifier::new()).await;
        for _ in 0..3 {
            f.service.record_failed_attempt(&f.id).await.unwrap();
        }

        assert!(f.service.unlock_account(&f.id).await.unwrap());
        assert!(!f.service.is_locked_out(&f.id).await.unwrap());
        assert!(!f.service.unlock_account(&f.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_inconsistent_record_stays_locked() {
        let f = fixture(RecordingNotifier::new()).await;
        let mut account = stored(&f).await;
        account.status = AccountStatus::Locked;
        account.failed_attempt_count = 3;
        f.repo.save(&account).await.unwrap();

        f.clock.set(t(86_400));
        assert!(f.service.is_locked_out(&f.id).await.unwrap());
        assert_eq!(stored(&f).await.status, AccountStatus::Locked);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let f = fixture(RecordingNotifier::new()).await;
        let err = f
            .service
            .record_failed_attempt(&AccountId::new("acc_missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::AccountNotFound)));
    }
}
