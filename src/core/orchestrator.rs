//! The orchestration driver
//!
//! [`Orchestrator`] is built once from configuration (all identifiers are
//! resolved up front) and then shared by every run. A run walks the
//! configured probes strictly in order, one at a time:
//!
//! instantiate → configure → activity check → execute → cleanup → finish
//!
//! Probe failures are contained here and passed to the failure policy.
//! Only a failed instantiation or a policy escalation ends a run early.

use chrono::{DateTime, Duration, Utc};
use std::io::Write;

use super::context::RunContext;
use super::policy::{FailurePolicy, FailureStage, ProbeFailure};
use super::probe::Probe;
use super::registry::{Collaborators, Registry};
use crate::config::Settings;
use crate::constants::*;
use crate::models::{Entry, ErrorTrace, ProbeResult, Severity};
use crate::render::Renderer;
use crate::utils::{OrchestrationError, ProbeError, RenderError};

/// Aggregate outcome of one run
#[derive(Debug, Clone)]
pub struct Report {
    pub results: Vec<ProbeResult>,
    pub failures: Vec<ProbeFailure>,
    pub generated_at: DateTime<Utc>,
}

/// Totals shown in a report's summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub probe_count: usize,
    pub elapsed: Duration,
    pub infos: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl Report {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            failures: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// A report succeeds iff no failure was raised
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether the failure's partial result also sits in `results`
    ///
    /// It does not after an abort or a rejected configuration; renderers
    /// show those entries with the failure instead.
    pub fn lists_result(&self, failure: &ProbeFailure) -> bool {
        self.results.iter().any(|result| {
            result.probe() == failure.result.probe()
                && result.started_at() == failure.result.started_at()
        })
    }

    pub fn summary(&self) -> Summary {
        let count = |severity: Severity| -> usize {
            self.results.iter().map(|r| r.count(severity)).sum()
        };
        Summary {
            probe_count: self.results.len(),
            elapsed: self
                .results
                .iter()
                .fold(Duration::zero(), |acc, r| acc + r.elapsed()),
            infos: count(Severity::Info),
            warnings: count(Severity::Warn),
            errors: count(Severity::Error),
        }
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

enum Outcome {
    Passed(ProbeResult),
    Skipped,
    Failed(ProbeFailure),
}

/// Runs the configured probes and hands the result to the renderer
pub struct Orchestrator {
    probe_ids: Vec<String>,
    settings: Settings,
    registry: Registry,
    collaborators: Collaborators,
    policy: Box<dyn FailurePolicy>,
    renderer: Box<dyn Renderer>,
    virtual_host: bool,
}

impl Orchestrator {
    /// Resolve and validate everything the configuration names
    pub fn new(
        settings: Settings,
        registry: Registry,
        collaborators: Collaborators,
    ) -> Result<Self, OrchestrationError> {
        let probe_ids = settings.get_list(KEY_PROBES);
        if probe_ids.is_empty() {
            return Err(OrchestrationError::MissingKey(KEY_PROBES.to_string()));
        }
        if let Some(unknown) = probe_ids.iter().find(|id| !registry.has_probe(id)) {
            return Err(OrchestrationError::UnknownProbe(unknown.clone()));
        }

        let renderer_name = settings
            .get(KEY_RENDERER)
            .ok_or_else(|| OrchestrationError::MissingKey(KEY_RENDERER.to_string()))?;
        let policy_name = settings
            .get(KEY_FAILURE_POLICY)
            .ok_or_else(|| OrchestrationError::MissingKey(KEY_FAILURE_POLICY.to_string()))?;
        let renderer = registry.create_renderer(renderer_name, &settings)?;
        let policy = registry.create_policy(policy_name)?;
        let virtual_host = settings.get_bool(KEY_VIRTUAL_HOST)?.unwrap_or(false);

        tracing::info!(
            probes = %probe_ids.join(","),
            renderer = renderer.name(),
            policy = policy.name(),
            virtual_host,
            "orchestrator ready"
        );

        Ok(Self {
            probe_ids,
            settings,
            registry,
            collaborators,
            policy,
            renderer,
            virtual_host,
        })
    }

    pub fn probe_ids(&self) -> &[String] {
        &self.probe_ids
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn policy(&self) -> &dyn FailurePolicy {
        self.policy.as_ref()
    }

    /// Whether requests must target the local host name
    pub fn virtual_host_only(&self) -> bool {
        self.virtual_host
    }

    /// Run every configured probe, in order
    pub async fn run(&self, ctx: &mut RunContext) -> Result<Report, OrchestrationError> {
        let mut report = Report::new();

        for id in &self.probe_ids {
            let mut probe = self.registry.create_probe(id, &self.collaborators)?;

            match self.run_probe(id, probe.as_mut(), ctx).await {
                Outcome::Passed(result) => report.results.push(result),
                Outcome::Skipped => {}
                Outcome::Failed(failure) => {
                    let handled = self.policy.handle(&failure, ctx);
                    if let Err(err) = handled {
                        report.failures.push(failure);
                        return Err(match err {
                            OrchestrationError::Escalated { probe } => {
                                tracing::warn!(probe = %probe, "run aborted by failure policy");
                                OrchestrationError::Aborted {
                                    probe,
                                    report: Box::new(report),
                                }
                            }
                            other => other,
                        });
                    }
                    if failure.stage == FailureStage::Execute {
                        report.results.push(failure.result.clone());
                    }
                    report.failures.push(failure);
                }
            }
        }

        tracing::info!(
            results = report.results.len(),
            failures = report.failures.len(),
            "run complete"
        );
        Ok(report)
    }

    async fn run_probe(&self, id: &str, probe: &mut dyn Probe, ctx: &mut RunContext) -> Outcome {
        if let Err(err) = probe.configure(&self.settings) {
            tracing::warn!(probe = %id, error = %err, "configuration rejected");
            probe
                .base_mut()
                .error_with_cause("Configuration rejected", &err);
            let result = Self::finish(probe).await;
            return Outcome::Failed(ProbeFailure {
                probe: id.to_string(),
                stage: FailureStage::Configure,
                error: ErrorTrace::capture(&err),
                result,
            });
        }

        if !probe.is_active(Utc::now()) {
            let (from, until) = probe.base().active_window();
            tracing::debug!(
                probe = %id,
                active_from = %from,
                active_until = %until,
                "outside activity window, skipped"
            );
            return Outcome::Skipped;
        }

        tracing::debug!(probe = %id, "executing");
        let executed = match probe.base().timeout() {
            Some(limit) => match tokio::time::timeout(limit, probe.execute(&*ctx)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    probe.base_mut().log(Entry::error(format!(
                        "Execution exceeded deadline of {} ms",
                        limit.as_millis()
                    )));
                    Err(ProbeError::Timeout(limit))
                }
            },
            None => probe.execute(&*ctx).await,
        };

        let result = Self::finish(probe).await;
        match executed {
            Ok(()) => {
                tracing::debug!(probe = %id, entries = result.len(), "passed");
                Outcome::Passed(result)
            }
            Err(err) => Outcome::Failed(ProbeFailure {
                probe: id.to_string(),
                stage: FailureStage::Execute,
                error: ErrorTrace::capture(&err),
                result,
            }),
        }
    }

    /// Cleanup, stamp the end time and copy the finished result out; the
    /// probe keeps its own
    async fn finish(probe: &mut dyn Probe) -> ProbeResult {
        probe.cleanup().await;
        probe.base_mut().finish();
        probe.result().clone()
    }

    /// Render a report with the configured renderer
    pub fn render(
        &self,
        report: &Report,
        ctx: &RunContext,
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        self.renderer.render(report, ctx, out)
    }
}
