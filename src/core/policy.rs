//! Failure policies: what happens when a probe fails
//!
//! Both built-in policies log the failure, record it in the run context and
//! mark the response as a server error. [`LogAndAbort`] additionally
//! escalates, which ends the run.

use serde::Serialize;
use std::fmt;

use super::context::{ResponseStatus, RunContext};
use crate::models::{Entry, ErrorTrace, ProbeResult};
use crate::utils::OrchestrationError;

/// Lifecycle step in which a probe failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Configure,
    Execute,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureStage::Configure => "configure",
            FailureStage::Execute => "execute",
        })
    }
}

/// A probe failure together with everything the probe logged before it
#[derive(Debug, Clone)]
pub struct ProbeFailure {
    pub probe: String,
    pub stage: FailureStage,
    pub error: ErrorTrace,
    pub result: ProbeResult,
}

/// Decides how a probe failure is surfaced
pub trait FailurePolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok` lets the run continue; `Err` ends it
    fn handle(&self, failure: &ProbeFailure, ctx: &mut RunContext)
        -> Result<(), OrchestrationError>;
}

fn record_failure(failure: &ProbeFailure, ctx: &mut RunContext) {
    tracing::error!(
        probe = %failure.probe,
        stage = %failure.stage,
        error = %failure.error,
        "probe failed"
    );
    ctx.record(
        Entry::error(format!(
            "Probe '{}' failed during {}",
            failure.probe, failure.stage
        ))
        .with_cause(failure.error.clone()),
    );
    ctx.set_status(ResponseStatus::ServerError);
}

/// Record the failure and keep going
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAndContinue;

impl FailurePolicy for LogAndContinue {
    fn name(&self) -> &'static str {
        "continue"
    }

    fn handle(
        &self,
        failure: &ProbeFailure,
        ctx: &mut RunContext,
    ) -> Result<(), OrchestrationError> {
        record_failure(failure, ctx);
        Ok(())
    }
}

/// Record the failure, then stop the run
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAndAbort;

impl FailurePolicy for LogAndAbort {
    fn name(&self) -> &'static str {
        "abort"
    }

    fn handle(
        &self,
        failure: &ProbeFailure,
        ctx: &mut RunContext,
    ) -> Result<(), OrchestrationError> {
        record_failure(failure, ctx);
        Err(OrchestrationError::Escalated {
            probe: failure.probe.clone(),
        })
    }
}
