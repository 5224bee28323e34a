//! Failed-login lockout state machine
//!
//! ```text
//!            failure count reaches max_failed_attempts
//!   Active ───────────────────────────────────────────▶ Locked
//!     ▲                                                   │
//!     └───────────────────────────────────────────────────┘
//!       lockout_duration elapsed since last failure (checked lazily),
//!       manual unlock, or a successful login
//! ```
//!
//! Expiry is evaluated when the account is next checked, not by a timer, so
//! a stored `Locked` status may outlive its lock until [`LockoutPolicy::check`]
//! runs and clears it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    account::{Account, AccountStatus},
    config::SecurityConfig,
};

/// Threshold and duration for a lockout decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failed_attempts: u32,
    pub lockout_duration: Duration,
}

impl From<&SecurityConfig> for LockoutPolicy {
    fn from(config: &SecurityConfig) -> Self {
        Self {
            max_failed_attempts: config.max_failed_attempts,
            lockout_duration: config.lockout_duration,
        }
    }
}

/// Result of recording one failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedAttempt {
    pub failed_attempts: u32,
    /// The count is at or past the threshold; the account is locked.
    pub locked: bool,
    /// This attempt is the one that moved the account from active to locked.
    pub newly_locked: bool,
}

/// Outcome of a lockout check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutCheck {
    /// Not locked.
    Active,
    /// Was locked, the lock has run out and the account has just been reset.
    Expired,
    /// Locked. `locked_until` is `None` only for an inconsistent record
    /// without a failure timestamp, which stays locked until unlocked by hand.
    Locked { locked_until: Option<DateTime<Utc>> },
}

impl LockoutCheck {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockoutCheck::Locked { .. })
    }

    /// The check changed the account and it needs to be saved.
    pub fn requires_save(&self) -> bool {
        matches!(self, LockoutCheck::Expired)
    }
}

/// A point-in-time view of an account's lockout, suitable for an API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutStatus {
    pub failed_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    /// Seconds until the lock lifts, or `None` when unlocked or of unknown length.
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        if !self.is_locked {
            return None;
        }
        self.locked_until
            .map(|until| (until - now).num_seconds().max(0))
    }
}

impl LockoutPolicy {
    pub fn new(max_failed_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            max_failed_attempts,
            lockout_duration,
        }
    }

    /// Count a failed login and lock the account once the threshold is reached.
    ///
    /// Runs the threshold check on every call, so failures recorded against an
    /// already locked account keep counting and keep reporting `locked`.
    pub fn record_failed_attempt(&self, account: &mut Account, now: DateTime<Utc>) -> FailedAttempt {
        let was_locked = account.is_locked();

        account.failed_attempt_count = account.failed_attempt_count.saturating_add(1);
        account.last_failed_attempt_at = Some(now);

        let locked = account.failed_attempt_count >= self.max_failed_attempts;
        if locked {
            account.status = AccountStatus::Locked;
        }

        FailedAttempt {
            failed_attempts: account.failed_attempt_count,
            locked,
            newly_locked: locked && !was_locked,
        }
    }

    /// Decide whether the account is locked right now, lifting an expired lock.
    ///
    /// A lock expires once strictly more than `lockout_duration` has passed
    /// since the last failure.
    pub fn check(&self, account: &mut Account, now: DateTime<Utc>) -> LockoutCheck {
        if !account.is_locked() {
            return LockoutCheck::Active;
        }

        match account.last_failed_attempt_at {
            Some(last) if now - last > self.lockout_duration => {
                clear(account);
                LockoutCheck::Expired
            }
            Some(last) => LockoutCheck::Locked {
                locked_until: Some(
                    last.checked_add_signed(self.lockout_duration)
                        .unwrap_or(DateTime::<Utc>::MAX_UTC),
                ),
            },
            None => {
                tracing::warn!(
                    account_id = %account.id,
                    failed_attempts = account.failed_attempt_count,
                    "Account is locked without a failed attempt timestamp; keeping it locked"
                );
                LockoutCheck::Locked { locked_until: None }
            }
        }
    }

    pub fn is_locked_out(&self, account: &mut Account, now: DateTime<Utc>) -> bool {
        self.check(account, now).is_locked()
    }

    /// Like [`check`](Self::check) but reported as a [`LockoutStatus`].
    pub fn status(&self, account: &mut Account, now: DateTime<Utc>) -> (LockoutCheck, LockoutStatus) {
        let check = self.check(account, now);
        let locked_until = match check {
            LockoutCheck::Locked { locked_until } => locked_until,
            _ => None,
        };

        let status = LockoutStatus {
            failed_attempts: account.failed_attempt_count,
            is_locked: check.is_locked(),
            locked_until,
        };
        (check, status)
    }
}

/// Reset after a successful primary credential check.
pub fn reset_on_success(account: &mut Account) {
    clear(account);
}

/// Administrative unlock. Returns whether the account was locked; an active
/// account is left untouched.
pub fn unlock(account: &mut Account) -> bool {
    if !account.is_locked() {
        return false;
    }
    clear(account);
    true
}

fn clear(account: &mut Account) {
    account.status = AccountStatus::Active;
    account.failed_attempt_count = 0;
    account.last_failed_attempt_at = None;
}
