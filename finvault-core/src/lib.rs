//! Account security core for finvault
//!
//! Holds the [`Account`] entity and the two security mechanisms that guard
//! it: one-time passcodes mailed as a second login factor, and a lockout that
//! trips after repeated failed logins and lifts itself once its duration has
//! passed.
//!
//! The state transitions in [`otp`] and [`lockout`] are plain functions on
//! `&mut Account`. The [`services`] wrap them with an [`AccountRepository`],
//! a [`Notifier`] and a [`Clock`], all passed in explicitly together with a
//! [`SecurityConfig`].
//!
//! Storage backends live in their own crates and implement
//! [`AccountRepository`]; [`InMemoryAccountRepository`] is provided for tests.
pub mod account;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod id;
pub mod lockout;
pub mod notifier;
pub mod otp;
pub mod repositories;
pub mod services;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use account::{Account, AccountId, AccountStatus, CredentialHash, Role};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SecurityConfig;
pub use error::Error;
pub use lockout::{FailedAttempt, LockoutCheck, LockoutPolicy, LockoutStatus};
pub use notifier::{Notifier, Recipient, TracingNotifier};
pub use otp::PendingOtp;
pub use repositories::{AccountRepository, InMemoryAccountRepository};
pub use services::{
    AccountService, LockoutService, LoginService, OtpService, PendingLogin, RegisterAccount,
};

#[cfg(feature = "mailer")]
pub use notifier::MailerNotifier;
