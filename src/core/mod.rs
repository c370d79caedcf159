//! Orchestration core
//!
//! Probe lifecycle, run context, failure policies, the registry and the
//! orchestrator itself. Nothing in here talks to the network, a database or
//! HTTP directly.

pub mod context;
pub mod orchestrator;
pub mod policy;
pub mod probe;
pub mod registry;

// Scripted probes for orchestration tests (tests only)
#[cfg(test)]
pub mod mock_probe;

pub use context::{local_hostname, RequestInfo, ResponseStatus, RunContext};
pub use orchestrator::{Orchestrator, Report, Summary};
pub use policy::{FailurePolicy, FailureStage, LogAndAbort, LogAndContinue, ProbeFailure};
pub use probe::{BaseProbe, Probe};
pub use registry::{probe_type, Collaborators, Registry};
