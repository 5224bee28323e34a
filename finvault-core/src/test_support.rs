//! Shared fixtures for the service tests.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    account::{Account, AccountId, CredentialHash},
    error::NotificationError,
    notifier::{Notifier, Recipient},
    repositories::AccountRepository,
};

pub(crate) fn t(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
}

pub(crate) async fn seed_account<R: AccountRepository>(repo: &R, email: &str) -> AccountId {
    let account = Account::new(
        email.to_string(),
        format!("BOF-{:0>12}", repo_suffix(email)),
        CredentialHash::new("hash"),
        t(0),
    );
    repo.create(&account).await.unwrap().id
}

fn repo_suffix(email: &str) -> String {
    email
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(12)
        .collect::<String>()
        .to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    Otp { email: String, code: String, expiry_minutes: u64 },
    Locked { email: String, lockout_minutes: u64 },
}

/// Records every notification; optionally fails each delivery after recording it.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn last_code(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|sent| match sent {
            Sent::Otp { code, .. } => Some(code),
            Sent::Locked { .. } => None,
        })
    }

    pub(crate) fn locked_count(&self) -> usize {
        self.sent()
            .iter()
            .filter(|sent| matches!(sent, Sent::Locked { .. }))
            .count()
    }

    fn outcome(&self) -> Result<(), NotificationError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(NotificationError::Delivery("smtp unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_otp(
        &self,
        recipient: &Recipient,
        code: &str,
        expiry_minutes: u64,
    ) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(Sent::Otp {
            email: recipient.email.clone(),
            code: code.to_string(),
            expiry_minutes,
        });
        self.outcome()
    }

    async fn send_locked(
        &self,
        recipient: &Recipient,
        lockout_minutes: u64,
    ) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(Sent::Locked {
            email: recipient.email.clone(),
            lockout_minutes,
        });
        self.outcome()
    }
}
