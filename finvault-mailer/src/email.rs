//! A rendered security notice, ready for a transport.

use std::fmt;

use lettre::Message;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use serde::{Deserialize, Serialize};

use crate::MailerError;

/// Which notice an [`Email`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    Otp,
    AccountLocked,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::Otp => "otp",
            EmailKind::AccountLocked => "account_locked",
        }
    }
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notice for one account holder, in both HTML and plain text.
///
/// Bodies may contain a live passcode, so `Debug` leaves them out.
#[derive(Clone, Serialize, Deserialize)]
pub struct Email {
    pub kind: EmailKind,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl Email {
    /// Addresses are checked here so a bad `from` or `to` fails at render
    /// time, not inside a transport.
    pub fn new(
        kind: EmailKind,
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
        text_body: impl Into<String>,
    ) -> Result<Self, MailerError> {
        let email = Self {
            kind,
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            html_body: html_body.into(),
            text_body: text_body.into(),
        };

        email.from.parse::<Mailbox>()?;
        email.to.parse::<Mailbox>()?;
        if email.subject.trim().is_empty() {
            return Err(MailerError::Builder("Subject is required".to_string()));
        }
        if email.html_body.trim().is_empty() || email.text_body.trim().is_empty() {
            return Err(MailerError::Builder(format!(
                "Rendered {kind} email has an empty body"
            )));
        }

        Ok(email)
    }

    /// A multipart/alternative message: plain text first, HTML preferred.
    pub(crate) fn into_message(self) -> Result<Message, MailerError> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(self.to.parse()?)
            .subject(self.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(self.text_body))
                    .singlepart(SinglePart::html(self.html_body)),
            )?;

        Ok(message)
    }
}

impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Email")
            .field("kind", &self.kind)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn otp_email() -> Result<Email, MailerError> {
        Email::new(
            EmailKind::Otp,
            "Bank of Finance <security@bank.example>",
            "customer@example.com",
            "Your Login OTP Code",
            "<p>Your code is 482913</p>",
            "Your code is 482913",
        )
    }

    #[test]
    fn test_new_email() {
        let email = otp_email().unwrap();
        assert_eq!(email.kind, EmailKind::Otp);
        assert_eq!(email.to, "customer@example.com");
        assert_eq!(email.subject, "Your Login OTP Code");
    }

    #[test]
    fn test_rejects_bad_address() {
        let result = Email::new(
            EmailKind::AccountLocked,
            "security@bank.example",
            "not-an-address",
            "Your Account Has Been Locked",
            "<p>locked</p>",
            "locked",
        );
        assert!(matches!(result, Err(MailerError::Address(_))));
    }

    #[test]
    fn test_rejects_empty_body() {
        let result = Email::new(
            EmailKind::Otp,
            "security@bank.example",
            "customer@example.com",
            "Your Login OTP Code",
            "<p>482913</p>",
            "  ",
        );
        assert!(matches!(result, Err(MailerError::Builder(_))));
    }

    #[test]
    fn test_debug_hides_passcode() {
        let debug = format!("{:?}", otp_email().unwrap());
        assert!(!debug.contains("482913"));
        assert!(debug.contains("customer@example.com"));
    }

    #[test]
    fn test_into_message_is_multipart() {
        let message = otp_email().unwrap().into_message().unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("To: customer@example.com"));
    }
}
