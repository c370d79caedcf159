//! Error types for probewatch
//!
//! All error types use thiserror for clean error handling.
//! SECURITY: Error messages MUST NOT contain passwords or other configured secrets.

use std::time::Duration;

use crate::core::orchestrator::Report;

/// Errors raised while reading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration key: {0}")]
    Missing(String),

    #[error("Invalid value for '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for probe execution
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Check failed: {0}")]
    Check(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the query-execution facade
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Execution failed: {0}")]
    Execution(String),
}

/// Errors from the mail-transport facade
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors that end an orchestration run (or prevent one from starting)
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    #[error("Unknown probe type '{0}'")]
    UnknownProbe(String),

    #[error("Unknown renderer '{0}'")]
    UnknownRenderer(String),

    #[error("Unknown failure policy '{0}'")]
    UnknownPolicy(String),

    #[error("Failed to instantiate {component} '{id}': {reason}")]
    Instantiate {
        component: &'static str,
        id: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Raised by a terminal failure policy; the orchestrator turns it into
    /// [`OrchestrationError::Aborted`] with the partial report attached
    #[error("Failure of probe '{probe}' escalated")]
    Escalated { probe: String },

    #[error("Run aborted after failure of probe '{probe}'")]
    Aborted { probe: String, report: Box<Report> },
}

impl OrchestrationError {
    /// Partial report carried by a mid-run abort, if any
    pub fn partial_report(&self) -> Option<&Report> {
        match self {
            OrchestrationError::Aborted { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Errors while producing renderer output
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message_names_key() {
        let err = ConfigError::invalid("tcp.port", "not a number");
        assert_eq!(err.to_string(), "Invalid value for 'tcp.port': not a number");
    }

    #[test]
    fn test_probe_error_wraps_facade_errors() {
        let err: ProbeError = QueryError::Execution("no such table: t".to_string()).into();
        assert!(matches!(err, ProbeError::Query(_)));
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn test_only_abort_carries_report() {
        let err = OrchestrationError::UnknownRenderer("pdf".to_string());
        assert!(err.partial_report().is_none());
    }
}
