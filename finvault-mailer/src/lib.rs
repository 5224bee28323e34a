//! Email delivery for finvault.
//!
//! Builds the two security notifications the account core sends (one-time
//! passcode and account-locked) from askama templates and hands them to a
//! [`Mailer`] transport. SMTP is used in production; the file transport
//! writes `.eml` files and is the default for local development.
pub mod config;
pub mod email;
pub mod email_types;
pub mod error;
pub mod mailer;
pub mod templates;
pub mod transports;

pub use config::MailerConfig;
pub use email::{Email, EmailKind};
pub use email_types::{AccountLockedEmail, OtpEmail};
pub use error::MailerError;
pub use mailer::Mailer;
pub use templates::{AskamaTemplateEngine, TemplateContext, TemplateEngine};
pub use transports::{FileTransport, SmtpTransport};

pub mod prelude {
    pub use crate::{
        AccountLockedEmail, AskamaTemplateEngine, Email, EmailKind, FileTransport, Mailer,
        MailerConfig, MailerError, OtpEmail, SmtpTransport, TemplateContext, TemplateEngine,
    };
}
