use crate::{MailerError, templates::TemplateData};
use askama::Template;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex pattern"));

static BLANK_LINES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("Invalid blank line regex pattern"));

static STYLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(style|title)[^>]*>.*?</(style|title)>").expect("Invalid style regex pattern")
});

#[async_trait]
pub trait TemplateEngine: Send + Sync {
    async fn render_html(
        &self,
        template_name: &str,
        data: TemplateData,
    ) -> Result<String, MailerError>;

    async fn render_text(
        &self,
        template_name: &str,
        data: TemplateData,
    ) -> Result<String, MailerError>;
}

/// Renders the compiled-in security templates.
#[derive(Debug, Clone, Default)]
pub struct AskamaTemplateEngine;

impl AskamaTemplateEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TemplateEngine for AskamaTemplateEngine {
    async fn render_html(
        &self,
        template_name: &str,
        data: TemplateData,
    ) -> Result<String, MailerError> {
        match template_name {
            "otp" => Ok(crate::templates::OtpTemplate::from_data(data)?.render()?),
            "account_locked" => {
                Ok(crate::templates::AccountLockedTemplate::from_data(data)?.render()?)
            }
            other => Err(MailerError::UnknownTemplate(other.to_string())),
        }
    }

    /// Plain text fallback for clients without HTML support, derived by
    /// stripping the rendered HTML.
    async fn render_text(
        &self,
        template_name: &str,
        data: TemplateData,
    ) -> Result<String, MailerError> {
        let html = self.render_html(template_name, data).await?;
        Ok(strip_tags(&html))
    }
}

fn strip_tags(html: &str) -> String {
    let text = STYLE_REGEX.replace_all(html, "");
    let text = text
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("</p>", "\n\n")
        .replace("</div>", "\n")
        .replace("</h1>", "\n\n");

    let text = TAG_REGEX.replace_all(&text, "");
    let text = BLANK_LINES_REGEX.replace_all(&text, "\n\n");

    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
