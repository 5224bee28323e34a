use crate::{
    Email, EmailKind, MailerError,
    templates::{TemplateContext, TemplateData, TemplateEngine},
};

pub struct OtpEmail;

impl OtpEmail {
    pub async fn build<T: TemplateEngine>(
        engine: &T,
        from: &str,
        to: &str,
        otp: &str,
        expiry_minutes: u64,
        context: TemplateContext,
    ) -> Result<Email, MailerError> {
        let template_data = TemplateData::new()
            .insert("context", &context)?
            .insert("otp", otp)?
            .insert("expiry_minutes", expiry_minutes)?;

        let html_body = engine.render_html("otp", template_data.clone()).await?;
        let text_body = engine.render_text("otp", template_data).await?;

        Email::new(
            EmailKind::Otp,
            from,
            to,
            format!("Your {} Login OTP Code", context.app_name),
            html_body,
            text_body,
        )
    }
}

pub struct AccountLockedEmail;

impl AccountLockedEmail {
    pub async fn build<T: TemplateEngine>(
        engine: &T,
        from: &str,
        to: &str,
        lockout_minutes: u64,
        context: TemplateContext,
    ) -> Result<Email, MailerError> {
        let template_data = TemplateData::new()
            .insert("context", &context)?
            .insert("lockout_minutes", lockout_minutes)?;

        let html_body = engine
            .render_html("account_locked", template_data.clone())
            .await?;
        let text_body = engine.render_text("account_locked", template_data).await?;

        Email::new(
            EmailKind::AccountLocked,
            from,
            to,
            format!("Your {} Account Has Been Locked", context.app_name),
            html_body,
            text_body,
        )
    }
}
