use crate::{MailerError, templates::TemplateData};
use askama::Template;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateContext {
    pub app_name: String,
    pub app_url: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self {
            app_name: "Finance Backend".to_string(),
            app_url: "http://127.0.0.1:8000".to_string(),
            user_email: None,
            user_name: None,
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Your Login OTP Code - {{ app_name }}</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 20px; background-color: #f4f4f4; }
        .container { max-width: 600px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; }
        .code { font-size: 32px; letter-spacing: 8px; font-family: monospace; text-align: center; padding: 16px; background: #f8f9fa; border-radius: 4px; }
        .footer { margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; font-size: 12px; color: #666; }
    </style>
</head>
<body>
    <div class="container">
        <h1>{{ app_name }}</h1>

        <p>{% if let Some(name) = user_name %}Hello {{ name }},{% else %}Hello,{% endif %}</p>

        <p>Use the following one-time code to finish signing in:</p>

        <div class="code">{{ otp }}</div>

        <p>This code expires in {{ expiry_minutes }} minute(s) and can only be used once.</p>

        <p>If you did not try to sign in, change your password and contact support.</p>

        <div class="footer">
            <p>This email was sent by {{ app_name }}.</p>
        </div>
    </div>
</body>
</html>
"#,
    ext = "html"
)]
pub struct OtpTemplate {
    pub app_name: String,
    pub user_name: Option<String>,
    pub otp: String,
    pub expiry_minutes: u64,
}

impl OtpTemplate {
    pub fn from_data(data: TemplateData) -> Result<Self, MailerError> {
        let context = data.context();

        Ok(Self {
            app_name: context.app_name,
            user_name: context.user_name,
            otp: data.require_str("otp")?,
            expiry_minutes: data.require_u64("expiry_minutes")?,
        })
    }
}

#[derive(Template)]
#[template(
    source = r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Your Account Has Been Locked - {{ app_name }}</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 20px; background-color: #f4f4f4; }
        .container { max-width: 600px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; }
        .warning { background: #fff3cd; border: 1px solid #ffeeba; padding: 12px; border-radius: 4px; }
        .footer { margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; font-size: 12px; color: #666; }
    </style>
</head>
<body>
    <div class="container">
        <h1>{{ app_name }}</h1>

        <p>{% if let Some(name) = user_name %}Hello {{ name }},{% else %}Hello,{% endif %}</p>

        <div class="warning">
            <p>Your account has been locked after too many failed login attempts.</p>
        </div>

        <p>You can try again in {{ lockout_minutes }} minute(s). The lock is lifted automatically.</p>

        <p>If these attempts were not made by you, contact support immediately.</p>

        <div class="footer">
            <p>This email was sent by {{ app_name }}.</p>
        </div>
    </div>
</body>
</html>
"#,
    ext = "html"
)]
pub struct AccountLockedTemplate {
    pub app_name: String,
    pub user_name: Option<String>,
    pub lockout_minutes: u64,
}

impl AccountLockedTemplate {
    pub fn from_data(data: TemplateData) -> Result<Self, MailerError> {
        let context = data.context();

        Ok(Self {
            app_name: context.app_name,
            user_name: context.user_name,
            lockout_minutes: data.require_u64("lockout_minutes")?,
        })
    }
}
