//! Mail-transport facade
//!
//! [`PickupDirTransport`] hands messages to an MTA by dropping RFC 5322
//! `.eml` files into its pickup directory.

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;

use crate::utils::MailError;

/// An outgoing plain-text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

fn validate_address(address: &str) -> Result<(), MailError> {
    let valid = match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !address.chars().any(|c| c.is_whitespace() || c.is_control())
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(MailError::Address(address.to_string()))
    }
}

impl MailMessage {
    /// Reject malformed addresses and header injection attempts
    pub fn validate(&self) -> Result<(), MailError> {
        validate_address(&self.from)?;
        if self.to.is_empty() {
            return Err(MailError::Address("no recipients".to_string()));
        }
        for recipient in &self.to {
            validate_address(recipient)?;
        }
        if self.subject.contains(['\r', '\n']) {
            return Err(MailError::Transport(
                "subject must be a single line".to_string(),
            ));
        }
        Ok(())
    }

    /// RFC 5322 text of the message with CRLF line endings
    pub fn to_rfc5322(&self, message_id: &str) -> String {
        let mut text = String::new();
        text.push_str(&format!("From: {}\r\n", self.from));
        text.push_str(&format!("To: {}\r\n", self.to.join(", ")));
        text.push_str(&format!("Subject: {}\r\n", self.subject));
        text.push_str(&format!("Date: {}\r\n", Utc::now().to_rfc2822()));
        text.push_str(&format!("Message-ID: <{}@probewatch>\r\n", message_id));
        text.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
        for line in self.body.lines() {
            text.push_str(line);
            text.push_str("\r\n");
        }
        text
    }
}

/// Delivers messages; returns a transport-specific message id
#[async_trait]
pub trait MailTransport: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, message: &MailMessage) -> Result<String, MailError>;
}

/// Writes each message as `<id>.eml` into an MTA pickup directory
#[derive(Debug, Clone)]
pub struct PickupDirTransport {
    dir: PathBuf,
    name: String,
}

impl PickupDirTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = format!("pickup:{}", dir.display());
        Self { dir, name }
    }
}

#[async_trait]
impl MailTransport for PickupDirTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: &MailMessage) -> Result<String, MailError> {
        message.validate()?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let id = format!(
            "{}-{:08x}",
            Utc::now().format("%Y%m%d%H%M%S%3f"),
            rand::random::<u32>()
        );
        let tmp = self.dir.join(format!("{}.tmp", id));
        let target = self.dir.join(format!("{}.eml", id));

        // Write under a temporary name so the MTA never picks up half a file
        tokio::fs::write(&tmp, message.to_rfc5322(&id)).await?;
        tokio::fs::rename(&tmp, &target).await?;
        tracing::debug!(id = %id, path = %target.display(), "message queued");
        Ok(id)
    }
}
