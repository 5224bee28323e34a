//! Service layer
//!
//! Each service loads an account, applies one of the pure transitions from
//! [`crate::otp`] or [`crate::lockout`], saves the result and then notifies
//! the holder. Notification failures are logged and never undo a saved change.

pub mod account;
pub mod lockout;
pub mod login;
pub mod otp;

pub use account::{AccountService, RegisterAccount};
pub use lockout::LockoutService;
pub use login::{LoginService, PendingLogin};
pub use otp::OtpService;
