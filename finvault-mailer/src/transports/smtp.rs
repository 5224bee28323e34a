use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::{
    Email, Mailer, MailerError,
    config::{SmtpSettings, SmtpTls},
};

/// Delivers notices through an SMTP relay over a pooled connection.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    relay: String,
}

impl SmtpTransport {
    pub fn from_settings(settings: &SmtpSettings) -> Result<Self, MailerError> {
        let builder = match settings.tls {
            // Local relays such as mailpit
            SmtpTls::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            }
            SmtpTls::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            }
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?,
        };
        let mut builder = builder.port(settings.port());

        match (&settings.username, &settings.password) {
            (Some(username), Some(password)) => {
                builder =
                    builder.credentials(Credentials::new(username.clone(), password.clone()));
            }
            (None, None) => {}
            _ => {
                return Err(MailerError::Config(
                    "SMTP username and password must be set together".to_string(),
                ));
            }
        }

        Ok(Self {
            transport: builder.build(),
            relay: format!("{}:{}", settings.host, settings.port()),
        })
    }

    pub fn relay(&self) -> &str {
        &self.relay
    }
}

#[async_trait]
impl Mailer for SmtpTransport {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        let kind = email.kind;
        let response = self.transport.send(email.into_message()?).await?;

        tracing::debug!(
            kind = %kind,
            relay = %self.relay,
            code = %response.code(),
            "Relay accepted security email"
        );
        Ok(())
    }
}
