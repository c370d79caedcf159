//! Mail probe: hands a test message to the mail facade
//!
//! Keys (under `<id>.`):
//! - `from` (required)
//! - `to` (required, comma-separated)
//! - `subject` (default "probewatch delivery check")
//! - `body`

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Settings;
use crate::core::{BaseProbe, Probe, RunContext};
use crate::facade::{MailMessage, MailTransport};
use crate::utils::{ConfigError, ProbeError};

const DEFAULT_SUBJECT: &str = "probewatch delivery check";

pub struct MailProbe {
    base: BaseProbe,
    transport: Arc<dyn MailTransport>,
    message: Option<MailMessage>,
}

impl MailProbe {
    pub fn new(id: &str, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            base: BaseProbe::new(id),
            transport,
            message: None,
        }
    }
}

#[async_trait]
impl Probe for MailProbe {
    fn base(&self) -> &BaseProbe {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseProbe {
        &mut self.base
    }

    fn configure(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        self.base.configure(settings)?;
        let scoped = self.base.scoped(settings);

        let from = scoped.require("from")?.to_string();
        let to = scoped.get_list("to");
        if to.is_empty() {
            return Err(ConfigError::Missing(scoped.key("to")));
        }
        let subject = scoped.get("subject").unwrap_or(DEFAULT_SUBJECT).to_string();
        let body = scoped.get("body").map(str::to_string).unwrap_or_else(|| {
            format!("Sent by probe '{}' to verify mail delivery.", self.base.id())
        });

        self.message = Some(MailMessage {
            from,
            to,
            subject,
            body,
        });
        Ok(())
    }

    async fn execute(&mut self, ctx: &RunContext) -> Result<(), ProbeError> {
        let Some(template) = self.message.as_ref() else {
            return Err(ProbeError::Check("probe was not configured".to_string()));
        };
        let mut message = template.clone();
        message
            .body
            .push_str(&format!("\n\nHost: {}\n", ctx.local_hostname()));

        self.base.detail(format!(
            "Sending '{}' to {} via {}",
            message.subject,
            message.to.join(", "),
            self.transport.name()
        ));

        match self.transport.send(&message).await {
            Ok(id) => {
                self.base.info(format!(
                    "Message {} accepted by {} for {} recipient(s)",
                    id,
                    self.transport.name(),
                    message.to.len()
                ));
                Ok(())
            }
            Err(err) => {
                self.base.error_with_cause(
                    format!("Delivery via {} failed", self.transport.name()),
                    &err,
                );
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::mock::MockMailTransport;
    use crate::models::Severity;

    fn settings() -> Settings {
        Settings::from_pairs([
            ("mail.from", "probewatch@example.com"),
            ("mail.to", "ops@example.com, dba@example.com"),
        ])
    }

    #[test]
    fn test_recipients_are_required() {
        let mut probe = MailProbe::new("mail", Arc::new(MockMailTransport::new()));
        let settings = Settings::from_pairs([("mail.from", "probewatch@example.com")]);
        assert!(matches!(
            probe.configure(&settings),
            Err(ConfigError::Missing(key)) if key == "mail.to"
        ));
    }

    #[tokio::test]
    async fn test_message_handed_to_transport() {
        let transport = Arc::new(MockMailTransport::new());
        let mut probe = MailProbe::new("mail", transport.clone());
        probe.configure(&settings()).unwrap();
        let ctx = RunContext::new(Default::default(), "probe-host");

        probe.execute(&ctx).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["ops@example.com", "dba@example.com"]);
        assert_eq!(sent[0].subject, DEFAULT_SUBJECT);
        assert!(sent[0].body.ends_with("Host: probe-host\n"));
        assert_eq!(
            probe.result().entries()[0].value().to_text(),
            "Message mock-1 accepted by mock-mail for 2 recipient(s)"
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_error_entry() {
        let transport = Arc::new(MockMailTransport::failing("relay refused"));
        let mut probe = MailProbe::new("mail", transport);
        probe.configure(&settings()).unwrap();

        let err = probe.execute(&RunContext::default()).await.unwrap_err();

        assert!(matches!(err, ProbeError::Mail(_)));
        assert_eq!(probe.result().count(Severity::Error), 1);
    }

    #[tokio::test]
    async fn test_invalid_address_fails_in_transport() {
        let transport = Arc::new(MockMailTransport::new());
        let mut probe = MailProbe::new("mail", transport.clone());
        let settings = Settings::from_pairs([("mail.from", "nobody"), ("mail.to", "ops@example.com")]);
        probe.configure(&settings).unwrap();

        assert!(probe.execute(&RunContext::default()).await.is_err());
        assert!(transport.sent().is_empty());
    }
}
