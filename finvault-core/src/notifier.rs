//! Security notifications sent to the account holder
//!
//! Delivery is best-effort: the services call a [`Notifier`] only after the
//! state change has been saved, and a failed delivery is logged, not returned.

use async_trait::async_trait;

use crate::{
    account::{Account, AccountId},
    error::NotificationError,
};

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub account_id: AccountId,
    pub email: String,
    pub name: Option<String>,
}

impl From<&Account> for Recipient {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id.clone(),
            email: account.email.clone(),
            name: account.full_name(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Deliver a freshly issued one-time passcode.
    async fn send_otp(
        &self,
        recipient: &Recipient,
        code: &str,
        expiry_minutes: u64,
    ) -> Result<(), NotificationError>;

    /// Tell the holder their account has been locked.
    async fn send_locked(
        &self,
        recipient: &Recipient,
        lockout_minutes: u64,
    ) -> Result<(), NotificationError>;
}

/// Logs notifications instead of delivering them. The passcode itself is
/// never logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send_otp(
        &self,
        recipient: &Recipient,
        _code: &str,
        expiry_minutes: u64,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            account_id = %recipient.account_id,
            expiry_minutes,
            "One-time passcode issued (no mail transport configured)"
        );
        Ok(())
    }

    async fn send_locked(
        &self,
        recipient: &Recipient,
        lockout_minutes: u64,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            account_id = %recipient.account_id,
            lockout_minutes,
            "Account locked (no mail transport configured)"
        );
        Ok(())
    }
}

#[cfg(feature = "mailer")]
pub use self::mailer_impl::*;

#[cfg(feature = "mailer")]
mod mailer_impl {
    use super::*;
    use finvault_mailer::prelude::*;

    /// Delivers notifications as email through a `finvault-mailer` transport.
    pub struct MailerNotifier {
        transport: Box<dyn Mailer>,
        engine: AskamaTemplateEngine,
        config: MailerConfig,
    }

    impl MailerNotifier {
        pub fn new(config: MailerConfig) -> Result<Self, NotificationError> {
            let transport = config
                .build_transport()
                .map_err(|e| NotificationError::Delivery(e.to_string()))?;
            Ok(Self::with_transport(transport, config))
        }

        pub fn with_transport(transport: Box<dyn Mailer>, config: MailerConfig) -> Self {
            Self {
                transport,
                engine: AskamaTemplateEngine::new(),
                config,
            }
        }

        pub fn from_env() -> Result<Self, NotificationError> {
            let config =
                MailerConfig::from_env().map_err(|e| NotificationError::Delivery(e.to_string()))?;
            Self::new(config)
        }

        fn create_context(&self, recipient: &Recipient) -> TemplateContext {
            TemplateContext {
                app_name: self.config.app_name.clone(),
                app_url: self.config.app_url.clone(),
                user_name: recipient.name.clone(),
                user_email: Some(recipient.email.clone()),
            }
        }

        async fn deliver(&self, email: Email) -> Result<(), NotificationError> {
            self.transport
                .send_email(email)
                .await
                .map_err(|e| NotificationError::Delivery(e.to_string()))
        }
    }

    #[async_trait]
    impl Notifier for MailerNotifier {
        async fn send_otp(
            &self,
            recipient: &Recipient,
            code: &str,
            expiry_minutes: u64,
        ) -> Result<(), NotificationError> {
            let email = OtpEmail::build(
                &self.engine,
                &self.config.get_from_address(),
                &recipient.email,
                code,
                expiry_minutes,
                self.create_context(recipient),
            )
            .await
            .map_err(|e| NotificationError::Rendering(e.to_string()))?;

            self.deliver(email).await?;
            tracing::info!(account_id = %recipient.account_id, "OTP email sent");
            Ok(())
        }

        async fn send_locked(
            &self,
            recipient: &Recipient,
            lockout_minutes: u64,
        ) -> Result<(), NotificationError> {
            let email = AccountLockedEmail::build(
                &self.engine,
                &self.config.get_from_address(),
                &recipient.email,
                lockout_minutes,
                self.create_context(recipient),
            )
            .await
            .map_err(|e| NotificationError::Rendering(e.to_string()))?;

            self.deliver(email).await?;
            tracing::info!(account_id = %recipient.account_id, "Account locked email sent");
            Ok(())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::CredentialHash;
    use chrono::Utc;

    #[test]
    fn test_recipient_from_account() {
        let mut account = Account::new(
            "customer@example.com".to_string(),
            "BOF-ABCDEF123456".to_string(),
            CredentialHash::new("hash"),
            Utc::now(),
        );
        account.first_name = Some("Ada".to_string());

        let recipient = Recipient::from(&account);
        assert_eq!(recipient.account_id, account.id);
        assert_eq!(recipient.email, "customer@example.com");
        assert_eq!(recipient.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_tracing_notifier_never_fails() {
        let recipient = Recipient {
            account_id: AccountId::new("acc_test"),
            email: "customer@example.com".to_string(),
            name: None,
        };
        assert!(TracingNotifier.send_otp(&recipient, "482913", 1).await.is_ok());
        assert!(TracingNotifier.send_locked(&recipient, 1).await.is_ok());
    }
}
