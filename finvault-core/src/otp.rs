//! One-time passcode state transitions
//!
//! An account holds at most one pending passcode. Issuing replaces whatever
//! was there; a successful verification consumes it. Failed verifications
//! leave it in place so the holder can retry until it expires, and they are
//! not counted towards the login lockout.
//!
//! These functions only mutate the [`Account`] in memory. Persisting the
//! result and notifying the holder is the job of
//! [`OtpService`](crate::services::OtpService).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{account::Account, crypto::constant_time_eq};

/// The outstanding passcode for an account. Code and expiry always travel together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingOtp {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl std::fmt::Debug for PendingOtp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingOtp")
            .field("code", &"******")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Store `code` on the account, valid until `now + ttl` (saturating at the
/// latest representable time). Returns the expiry.
pub fn issue(
    account: &mut Account,
    code: impl Into<String>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> DateTime<Utc> {
    let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
    account.otp = Some(PendingOtp {
        code: code.into(),
        expires_at,
    });
    expires_at
}

/// Consume the pending passcode if `candidate` matches and it has not expired.
///
/// Returns `false` without touching the account for a wrong, expired or
/// missing code; the three cases are deliberately indistinguishable.
pub fn verify(account: &mut Account, candidate: &str, now: DateTime<Utc>) -> bool {
    let matches = account
        .otp
        .as_ref()
        .is_some_and(|otp| constant_time_eq(candidate, &otp.code) && !otp.is_expired(now));

    if matches {
        account.otp = None;
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::CredentialHash;

    fn t(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn account() -> Account {
        Account::new(
            "customer@example.com".to_string(),
            "BOF-ABCDEF123456".to_string(),
            CredentialHash::new("hash"),
            t(0),
        )
    }

    #[test]
    fn test_issue_sets_code_and_expiry() {
        let mut account = account();
        let expires_at = issue(&mut account, "482913", t(0), Duration::seconds(60));

        assert_eq!(expires_at, t(60));
        let otp = account.otp.as_ref().unwrap();
        assert_eq!(otp.code, "482913");
        assert_eq!(otp.expires_at, t(60));
    }

    #[test]
    fn test_issue_with_huge_ttl_saturates() {
        let mut account = account();
        let expires_at = issue(&mut account, "482913", t(0), Duration::MAX);

        assert_eq!(expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(verify(&mut account, "482913", t(1)));
    }

    #[test]
    fn test_latest_issue_wins() {
        let mut account = account();
        issue(&mut account, "111111", t(0), Duration::seconds(60));
        issue(&mut account, "222222", t(10), Duration::seconds(60));

        assert!(!verify(&mut account, "111111", t(20)));
        assert!(verify(&mut account, "222222", t(20)));
    }

    #[test]
    fn test_verify_is_single_use() {
        let mut account = account();
        issue(&mut account, "482913", t(0), Duration::seconds(60));

        assert!(verify(&mut account, "482913", t(30)));
        assert!(account.otp.is_none());
        assert!(!verify(&mut account, "482913", t(31)));
    }

    #[test]
    fn test_verify_valid_strictly_before_expiry() {
        let mut account = account();
        issue(&mut account, "482913", t(0), Duration::seconds(60));

        assert!(!verify(&mut account, "482913", t(60)));
        assert!(!verify(&mut account, "482913", t(61)));

        let mut account = self::account();
        issue(&mut account, "482913", t(0), Duration::seconds(60));
        assert!(verify(&mut account, "482913", t(59)));
    }

    #[test]
    fn test_failed_verify_leaves_code_in_place() {
        let mut account = account();
        issue(&mut account, "482913", t(0), Duration::seconds(60));

        assert!(!verify(&mut account, "000000", t(5)));
        assert!(!verify(&mut account, "48291", t(6)));
        assert!(account.otp.is_some());
        assert!(verify(&mut account, "482913", t(7)));
    }

    #[test]
    fn test_expired_code_is_kept_until_replaced() {
        let mut account = account();
        issue(&mut account, "482913", t(0), Duration::seconds(60));

        assert!(!verify(&mut account, "482913", t(120)));
        assert!(account.otp.is_some());
    }

    #[test]
    fn test_verify_without_pending_code() {
        let mut account = account();
        assert!(!verify(&mut account, "482913", t(0)));
        assert!(!verify(&mut account, "", t(0)));
    }

    #[test]
    fn test_debug_hides_code() {
        let mut account = account();
        issue(&mut account, "482913", t(0), Duration::seconds(60));
        assert!(!format!("{account:?}").contains("482913"));
    }
}
