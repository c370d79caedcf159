//! Retry logic with exponential backoff for transient failures
//!
//! Connectivity probes use this to ride out a refused or reset connection
//! before declaring a dependency down.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial attempt)
    pub max_retries: u32,
    /// Initial delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Default backoff with a caller-chosen retry count
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

/// Retry an async operation with exponential backoff
///
/// `is_retryable` decides whether a given error is worth another attempt;
/// the first non-retryable error is returned immediately.
///
/// # Example
///
/// ```ignore
/// let stream = retry_with_backoff(
///     RetryConfig::with_retries(3),
///     || TcpStream::connect(addr),
///     |err| is_transient_error(&err.to_string()),
/// ).await?;
/// ```
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    config: RetryConfig,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                attempt += 1;

                if attempt > config.max_retries || !is_retryable(&err) {
                    return Err(err);
                }

                tracing::debug!(
                    attempt,
                    max_attempts = config.max_retries + 1,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "attempt failed, retrying"
                );

                sleep(delay).await;

                // Next delay: exponential growth capped at max_delay, then ±20% jitter
                let next_delay_ms = (delay.as_millis() as f64 * config.backoff_multiplier) as u64;
                let base_delay = Duration::from_millis(next_delay_ms).min(config.max_delay);
                let jitter_factor = rand::thread_rng().gen_range(0.8..=1.2);
                delay = Duration::from_millis((base_delay.as_millis() as f64 * jitter_factor) as u64);
            }
        }
    }
}

/// Determines if a connection error is worth retrying
///
/// Refused/reset connections, timeouts and name resolution hiccups are
/// transient. Access and permission failures are not, and neither is
/// anything unrecognised.
pub fn is_transient_error(error_msg: &str) -> bool {
    let lowercase = error_msg.to_lowercase();

    let retryable_patterns = [
        "timeout",
        "timed out",
        "connection refused",
        "connection reset",
        "connection aborted",
        "network unreachable",
        "no route to host",
        "temporarily unavailable",
        "temporary failure",
        "broken pipe",
        "host is down",
        "name resolution",
        "could not resolve",
    ];

    let non_retryable_patterns = [
        "access denied",
        "permission denied",
        "unauthorized",
        "invalid port",
        "invalid address",
    ];

    if non_retryable_patterns.iter().any(|p| lowercase.contains(p)) {
        return false;
    }

    retryable_patterns.iter().any(|p| lowercase.contains(p))
}
