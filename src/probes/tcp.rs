//! Connectivity probe: can we open a TCP connection?
//!
//! Keys (under `<id>.`):
//! - `host` (required), `port` (required)
//! - `connect_timeout_ms` (default 1200): per attempt
//! - `retries` (default 2): extra attempts for transient failures

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::Settings;
use crate::constants::{TCP_PROBE_RETRIES, TCP_PROBE_TIMEOUT_MS};
use crate::core::{BaseProbe, Probe, RunContext};
use crate::utils::{is_transient_error, retry_with_backoff, ConfigError, ProbeError, RetryConfig};

pub struct TcpProbe {
    base: BaseProbe,
    target: String,
    connect_timeout: Duration,
    retry: RetryConfig,
}

impl TcpProbe {
    pub fn new(id: &str) -> Self {
        Self {
            base: BaseProbe::new(id),
            target: String::new(),
            connect_timeout: Duration::from_millis(TCP_PROBE_TIMEOUT_MS),
            retry: RetryConfig::with_retries(TCP_PROBE_RETRIES),
        }
    }

    /// Shortens the backoff between attempts
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

async fn connect_once(target: &str, limit: Duration) -> Result<(), String> {
    match timeout(limit, TcpStream::connect(target)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("connection timed out after {} ms", limit.as_millis())),
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn base(&self) -> &BaseProbe {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseProbe {
        &mut self.base
    }

    fn configure(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        self.base.configure(settings)?;
        let scoped = self.base.scoped(settings);

        let host = scoped.require("host")?.trim().to_string();
        let raw_port = scoped.require("port")?;
        let port = raw_port
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|&port| port != 0)
            .ok_or_else(|| {
                ConfigError::invalid(scoped.key("port"), format!("'{}' is not a TCP port", raw_port))
            })?;
        let connect_timeout = scoped
            .get_u64("connect_timeout_ms")?
            .unwrap_or(TCP_PROBE_TIMEOUT_MS);
        let retries = scoped
            .get_u64("retries")?
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX));

        self.target = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, port)
        } else {
            format!("{}:{}", host, port)
        };
        self.connect_timeout = Duration::from_millis(connect_timeout);
        if let Some(retries) = retries {
            self.retry.max_retries = retries;
        }
        Ok(())
    }

    async fn execute(&mut self, _ctx: &RunContext) -> Result<(), ProbeError> {
        let target = self.target.clone();
        let limit = self.connect_timeout;
        self.base.detail(format!(
            "Connecting to {} (timeout {} ms, up to {} retries)",
            target,
            limit.as_millis(),
            self.retry.max_retries
        ));

        let started = Instant::now();
        let outcome = retry_with_backoff(
            self.retry.clone(),
            || connect_once(&target, limit),
            |err: &String| is_transient_error(err),
        )
        .await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(()) => {
                tracing::debug!(probe = %self.base.id(), %target, "tcp connect ok");
                self.base
                    .info(format!("Connected to {} in {} ms", target, elapsed.as_millis()));
                Ok(())
            }
            Err(reason) => {
                tracing::warn!(probe = %self.base.id(), %target, error = %reason, "tcp connect failed");
                self.base
                    .error(format!("Could not connect to {}: {}", target, reason));
                Err(ProbeError::Connect(format!("{}: {}", target, reason)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use tokio::net::TcpListener;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 1,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_open_port_passes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port().to_string();
        let settings = Settings::from_pairs([("tcp#local.host", "127.0.0.1"), ("tcp#local.port", port.as_str())]);
        let mut probe = TcpProbe::new("tcp#local");
        probe.configure(&settings).unwrap();

        probe.execute(&RunContext::default()).await.unwrap();

        assert_eq!(probe.result().count(Severity::Info), 1);
        assert!(!probe.result().has_error_entry());
    }

    #[tokio::test]
    async fn test_closed_port_fails_with_error_entry() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port().to_string()
        };
        let settings = Settings::from_pairs([("tcp.host", "127.0.0.1"), ("tcp.port", port.as_str())]);
        let mut probe = TcpProbe::new("tcp").with_retry(fast_retry());
        probe.configure(&settings).unwrap();

        let err = probe.execute(&RunContext::default()).await.unwrap_err();

        assert!(matches!(err, ProbeError::Connect(_)));
        assert!(probe.result().has_error_entry());
    }

    #[test]
    fn test_retries_default_and_override() {
        let mut settings = Settings::from_pairs([("tcp.host", "db"), ("tcp.port", "5432")]);
        let mut probe = TcpProbe::new("tcp");
        probe.configure(&settings).unwrap();
        assert_eq!(probe.retry, RetryConfig::with_retries(TCP_PROBE_RETRIES));
        assert_eq!(probe.target, "db:5432");

        settings.set("tcp.retries", "0");
        probe.configure(&settings).unwrap();
        assert_eq!(probe.retry.max_retries, 0);
    }

    #[test]
    fn test_bad_port_is_rejected() {
        for port in ["0", "70000", "http"] {
            let settings = Settings::from_pairs([("tcp.host", "db"), ("tcp.port", port)]);
            let err = TcpProbe::new("tcp").configure(&settings).unwrap_err();
            assert!(err.to_string().contains("tcp.port"), "{}", err);
        }
    }

    #[test]
    fn test_missing_host_is_rejected() {
        let settings = Settings::from_pairs([("tcp.port", "5432")]);
        let err = TcpProbe::new("tcp").configure(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ref key) if key == "tcp.host"));
    }
}
