//! probewatch - diagnostic probe orchestration and reporting
//!
//! Runs a configured sequence of probes through a fixed lifecycle, applies
//! a failure policy to probe errors and renders the combined report.

// Public modules
pub mod config;
pub mod constants;
pub mod core;
pub mod facade;
pub mod format;
pub mod logger;
pub mod models;
pub mod probes;
pub mod render;
pub mod resources;
pub mod server;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use crate::config::{ServerConfig, Settings};
pub use crate::core::{
    BaseProbe, Collaborators, FailurePolicy, Orchestrator, Probe, Registry, Report, RunContext,
};
pub use crate::models::{Entry, ProbeResult, Severity};
pub use crate::render::Renderer;
pub use crate::service::{DiagnosticService, Request, Response};
pub use crate::utils::{ConfigError, OrchestrationError, ProbeError, RenderError};
