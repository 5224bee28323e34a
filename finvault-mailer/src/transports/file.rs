use crate::{Email, Mailer, MailerError};
use async_trait::async_trait;
use lettre::Transport;
use lettre::transport::file::FileTransport as LettreFileTransport;
use std::path::{Path, PathBuf};

/// Writes each message as an `.eml` file into a directory.
#[derive(Debug, Clone)]
pub struct FileTransport {
    transport: LettreFileTransport,
    output_dir: PathBuf,
}

impl FileTransport {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self, MailerError> {
        let output_dir = output_dir.as_ref().to_path_buf();

        if !output_dir.exists() {
            std::fs::create_dir_all(&output_dir)?;
        }

        let transport = LettreFileTransport::new(&output_dir);

        Ok(Self {
            transport,
            output_dir,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl Mailer for FileTransport {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        let kind = email.kind;
        let message = email.into_message()?;

        // lettre's FileTransport is sync
        let transport = self.transport.clone();
        let id = tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| MailerError::Builder(format!("Failed to send email: {e}")))??;

        tracing::debug!(
            kind = %kind,
            message_id = %id,
            dir = %self.output_dir.display(),
            "Wrote security email to file"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EmailKind;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_transport_writes_eml() {
        let temp_dir = tempdir().unwrap();
        let transport = FileTransport::new(temp_dir.path()).unwrap();

        let email = Email::new(
            EmailKind::Otp,
            "security@bank.example",
            "customer@example.com",
            "Your Login OTP Code",
            "<p>482913</p>",
            "482913",
        )
        .unwrap();

        transport.send_email(email).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].path().extension().is_some_and(|e| e == "eml"));
    }

    #[test]
    fn test_creates_missing_directory() {
        let temp_dir = tempdir().unwrap();
        let nested = temp_dir.path().join("outbox").join("security");

        let transport = FileTransport::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(transport.output_dir(), nested.as_path());
    }
}
