//! # Utilities Module
//!
//! Cross-cutting concerns and shared functionality used throughout the crate.
//!
//! ## Modules
//!
//! - [`errors`]: Typed error hierarchy using `thiserror`
//! - [`retry`]: Exponential backoff retry logic for transient network failures
//!
//! ## Design Notes
//!
//! Probe-level errors ([`ProbeError`], [`ConfigError`]) are always recovered at
//! the orchestrator boundary and handed to the active failure policy.
//! [`OrchestrationError`] is the only type that ends a run early.
//!
//! Retry logic uses tokio's async timer. Transient errors (timeouts, refused
//! connections) are retried with exponential backoff, while permanent errors
//! (access denied, bad configuration) fail immediately.

pub mod errors;
pub mod retry;

pub use errors::{
    ConfigError, MailError, OrchestrationError, ProbeError, QueryError, RenderError,
};
pub use retry::{is_transient_error, retry_with_backoff, RetryConfig};
