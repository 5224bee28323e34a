use crate::{FileTransport, Mailer, MailerError, SmtpTransport};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub transport: TransportConfig,
    pub from_address: String,
    pub from_name: Option<String>,
    pub app_name: String,
    pub app_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    Smtp(SmtpSettings),
    File { output_dir: PathBuf },
}

/// SMTP relay settings. The password never appears in `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: SmtpTls,
}

impl SmtpSettings {
    /// The configured port, or the usual one for the TLS mode.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(match self.tls {
            SmtpTls::None => 1025,
            SmtpTls::StartTls => 587,
            SmtpTls::Tls => 465,
        })
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "******"))
            .field("tls", &self.tls)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SmtpTls {
    None,
    #[default]
    StartTls,
    Tls,
}

impl std::str::FromStr for SmtpTls {
    type Err = MailerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "false" | "0" | "no" => Ok(SmtpTls::None),
            "starttls" => Ok(SmtpTls::StartTls),
            "tls" | "true" | "1" | "yes" => Ok(SmtpTls::Tls),
            other => Err(MailerError::Config(format!("Unknown TLS mode: {other}"))),
        }
    }
}

impl MailerConfig {
    /// Read the mailer configuration from `MAILER_*` environment variables.
    ///
    /// SMTP is selected when `MAILER_SMTP_HOST` is set; otherwise emails are
    /// written to `MAILER_FILE_OUTPUT_DIR` (default `./emails`).
    pub fn from_env() -> Result<Self, MailerError> {
        let transport = if let Ok(host) = std::env::var("MAILER_SMTP_HOST") {
            let port = match std::env::var("MAILER_SMTP_PORT") {
                Ok(p) => Some(
                    p.parse()
                        .map_err(|_| MailerError::Config(format!("Invalid SMTP port: {p}")))?,
                ),
                Err(_) => None,
            };
            let tls = match std::env::var("MAILER_SMTP_TLS") {
                Ok(t) => t.parse()?,
                Err(_) => SmtpTls::default(),
            };

            TransportConfig::Smtp(SmtpSettings {
                host,
                port,
                username: std::env::var("MAILER_SMTP_USERNAME").ok(),
                password: std::env::var("MAILER_SMTP_PASSWORD").ok(),
                tls,
            })
        } else {
            TransportConfig::File {
                output_dir: std::env::var("MAILER_FILE_OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./emails")),
            }
        };

        let defaults = Self::default();
        Ok(Self {
            transport,
            from_address: std::env::var("MAILER_FROM_ADDRESS").unwrap_or(defaults.from_address),
            from_name: std::env::var("MAILER_FROM_NAME").ok(),
            app_name: std::env::var("MAILER_APP_NAME").unwrap_or(defaults.app_name),
            app_url: std::env::var("MAILER_APP_URL").unwrap_or(defaults.app_url),
        })
    }

    pub fn build_transport(&self) -> Result<Box<dyn Mailer>, MailerError> {
        match &self.transport {
            TransportConfig::Smtp(settings) => {
                Ok(Box::new(SmtpTransport::from_settings(settings)?))
            }
            TransportConfig::File { output_dir } => Ok(Box::new(FileTransport::new(output_dir)?)),
        }
    }

    pub fn get_from_address(&self) -> String {
        match &self.from_name {
            Some(name) => format!("{} <{}>", name, self.from_address),
            None => self.from_address.clone(),
        }
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::File {
                output_dir: PathBuf::from("./emails"),
            },
            from_address: "webmaster@localhost".to_string(),
            from_name: None,
            app_name: "Finance Backend".to_string(),
            app_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MailerConfig::default();
        assert_eq!(config.from_address, "webmaster@localhost");
        assert_eq!(config.app_name, "Finance Backend");

        match config.transport {
            TransportConfig::File { output_dir } => {
                assert_eq!(output_dir, PathBuf::from("./emails"));
            }
            _ => panic!("Expected file transport"),
        }
    }

    #[test]
    fn test_get_from_address() {
        let mut config = MailerConfig::default();
        assert_eq!(config.get_from_address(), "webmaster@localhost");

        config.from_name = Some("Bank of Finance".to_string());
        assert_eq!(
            config.get_from_address(),
            "Bank of Finance <webmaster@localhost>"
        );
    }

    #[test]
    fn test_tls_type_parsing() {
        assert_eq!("StartTLS".parse::<SmtpTls>().unwrap(), SmtpTls::StartTls);
        assert_eq!("false".parse::<SmtpTls>().unwrap(), SmtpTls::None);
        assert_eq!("true".parse::<SmtpTls>().unwrap(), SmtpTls::Tls);
        assert!("sometimes".parse::<SmtpTls>().is_err());
    }

    #[test]
    fn test_transport_config_serde() {
        let json = r#"{"type":"smtp","host":"localhost","tls":"none"}"#;
        let transport: TransportConfig = serde_json::from_str(json).unwrap();
        match transport {
            TransportConfig::Smtp(settings) => {
                assert_eq!(settings.host, "localhost");
                assert_eq!(settings.tls, SmtpTls::None);
                assert_eq!(settings.port(), 1025);
                assert!(settings.username.is_none());
            }
            _ => panic!("Expected smtp transport"),
        }
    }

    #[test]
    fn test_smtp_debug_redacts_password() {
        let settings = SmtpSettings {
            host: "smtp.bank.example".to_string(),
            port: None,
            username: Some("mailer".to_string()),
            password: Some("hunter2".to_string()),
            tls: SmtpTls::default(),
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("mailer"));
    }

    #[test]
    fn test_build_file_transport() {
        let dir = tempfile::tempdir().unwrap();
        let config = MailerConfig {
            transport: TransportConfig::File {
                output_dir: dir.path().to_path_buf(),
            },
            ..MailerConfig::default()
        };
        assert!(config.build_transport().is_ok());
    }
}
