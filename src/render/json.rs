//! Machine-readable report for monitoring tools
//!
//! Same data as the HTML renderers: success flag, summary, per-probe
//! entries in timestamp order, failures with their cause chain. Entry
//! values are emitted raw; the `formatter` field names the display
//! strategy the probe chose.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use super::{HostInfo, RenderOptions, Renderer};
use crate::core::{FailureStage, Report, RunContext};
use crate::models::{EntryValue, ErrorTrace, ProbeResult, Severity};
use crate::utils::RenderError;

#[derive(Serialize)]
struct JsonReport<'a> {
    success: bool,
    generated_at: DateTime<Utc>,
    summary: JsonSummary,
    results: Vec<JsonResult<'a>>,
    failures: Vec<JsonFailure<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<JsonHost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a [(String, String)]>,
}

#[derive(Serialize)]
struct JsonSummary {
    probe_count: usize,
    elapsed_ms: i64,
    infos: usize,
    warnings: usize,
    errors: usize,
}

#[derive(Serialize)]
struct JsonResult<'a> {
    probe: &'a str,
    description: &'a str,
    point_of_contact: &'a str,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    elapsed_ms: i64,
    entries: Vec<JsonEntry<'a>>,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    severity: Severity,
    timestamp: DateTime<Utc>,
    formatter: &'static str,
    value: &'a EntryValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<&'a ErrorTrace>,
}

#[derive(Serialize)]
struct JsonFailure<'a> {
    probe: &'a str,
    stage: FailureStage,
    error: &'a ErrorTrace,
    /// Partial entries, when the result isn't among `results`
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<Vec<JsonEntry<'a>>>,
}

#[derive(Serialize)]
struct JsonHost {
    local_host: String,
    request_host: String,
    client_addr: String,
    user_agent: String,
}

impl From<HostInfo> for JsonHost {
    fn from(info: HostInfo) -> Self {
        Self {
            local_host: info.local_host,
            request_host: info.request_host,
            client_addr: info.client_addr,
            user_agent: info.user_agent,
        }
    }
}

fn json_result(result: &ProbeResult) -> JsonResult<'_> {
    JsonResult {
        probe: result.probe(),
        description: result.description(),
        point_of_contact: result.point_of_contact(),
        started_at: result.started_at(),
        ended_at: result.ended_at(),
        elapsed_ms: result.elapsed().num_milliseconds(),
        entries: json_entries(result),
    }
}

fn json_entries(result: &ProbeResult) -> Vec<JsonEntry<'_>> {
    result
        .sorted_entries()
        .into_iter()
        .map(|entry| JsonEntry {
            severity: entry.severity(),
            timestamp: entry.timestamp(),
            formatter: entry.formatter().name(),
            value: entry.value(),
            cause: entry.cause(),
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct JsonRenderer {
    options: RenderOptions,
}

impl JsonRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }
}

impl Renderer for JsonRenderer {
    fn name(&self) -> &'static str {
        "json"
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn render(
        &self,
        report: &Report,
        ctx: &RunContext,
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let summary = report.summary();
        let view = JsonReport {
            success: report.is_success(),
            generated_at: report.generated_at,
            summary: JsonSummary {
                probe_count: summary.probe_count,
                elapsed_ms: summary.elapsed.num_milliseconds(),
                infos: summary.infos,
                warnings: summary.warnings,
                errors: summary.errors,
            },
            results: report.results.iter().map(json_result).collect(),
            failures: report
                .failures
                .iter()
                .map(|failure| JsonFailure {
                    probe: &failure.probe,
                    stage: failure.stage,
                    error: &failure.error,
                    entries: (!report.lists_result(failure))
                        .then(|| json_entries(&failure.result)),
                })
                .collect(),
            host: self
                .options
                .show_host_info
                .then(|| HostInfo::of(ctx).into()),
            config: self.options.config.as_deref(),
        };

        serde_json::to_writer_pretty(&mut *out, &view)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures::{self, render_to_string};
    use serde_json::Value;

    fn render(renderer: &JsonRenderer, report: &Report) -> Value {
        serde_json::from_str(&render_to_string(renderer, report)).unwrap()
    }

    #[test]
    fn test_summary_and_success_flag() {
        let json = render(&JsonRenderer::default(), &fixtures::report());
        assert_eq!(json["success"], false);
        assert_eq!(json["summary"]["probe_count"], 2);
        assert_eq!(json["summary"]["infos"], 2);
        assert_eq!(json["summary"]["warnings"], 1);
        assert_eq!(json["summary"]["errors"], 1);
        assert_eq!(json["failures"][0]["stage"], "execute");
        assert_eq!(json["failures"][0]["error"]["causes"][0], "no such table: orders");
        assert!(json.get("host").is_none());
    }

    #[test]
    fn test_entries_sorted_by_timestamp() {
        let json = render(&JsonRenderer::default(), &fixtures::report());
        let entries = json["results"][0]["entries"].as_array().unwrap();
        let texts: Vec<&str> = entries
            .iter()
            .map(|e| e["value"]["data"].as_str().unwrap())
            .collect();
        assert_eq!(texts, vec!["first", "second <b>", "third"]);
        assert_eq!(entries[2]["severity"], "WARN");
        assert_eq!(entries[0]["formatter"], "link");
    }

    #[test]
    fn test_failure_entries_only_when_result_is_missing() {
        let json = render(&JsonRenderer::default(), &fixtures::report());
        assert!(json["failures"][0].get("entries").is_none());

        let json = render(&JsonRenderer::default(), &fixtures::aborted_report());
        let entries = json["failures"][0]["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["severity"], "ERROR");
        assert_eq!(entries[0]["value"]["data"], "query failed");
    }

    #[test]
    fn test_host_and_config_when_enabled() {
        let renderer = JsonRenderer::new(RenderOptions {
            show_host_info: true,
            config: Some(vec![("renderer".to_string(), "json".to_string())]),
        });
        let json = render(&renderer, &fixtures::passing_report());
        assert_eq!(json["success"], true);
        assert_eq!(json["host"]["local_host"], "probe-host");
        assert_eq!(json["config"][0][1], "json");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let renderer = JsonRenderer::default();
        let report = fixtures::report();
        assert_eq!(
            render_to_string(&renderer, &report),
            render_to_string(&renderer, &report)
        );
    }
}
