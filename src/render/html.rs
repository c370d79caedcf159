//! HTML building blocks shared by the flat and tabbed renderers
//!
//! Everything appends to a `String` page buffer; the renderer writes the
//! finished page out in one go. All report text passes through
//! [`escape_html`] or the entry's own formatter.

use std::fmt::Write as _;

use super::{format_elapsed, format_timestamp, HostInfo, RenderOptions};
use crate::core::{Report, RunContext, Summary};
use crate::format::escape_html;
use crate::models::{ProbeResult, Severity};

pub const CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const STYLESHEET_HREF: &str = "?resource=probewatch.css";
pub const TABS_SCRIPT_SRC: &str = "?resource=tabs.js";

pub fn page_start(page: &mut String, report: &Report, scripts: &[&str]) {
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(
        page,
        "<title>probewatch report {}</title>",
        format_timestamp(report.generated_at)
    );
    let _ = writeln!(page, "<link rel=\"stylesheet\" href=\"{}\">", STYLESHEET_HREF);
    for src in scripts {
        let _ = writeln!(page, "<script src=\"{}\" defer></script>", src);
    }
    page.push_str("</head>\n<body>\n");
    let _ = writeln!(
        page,
        "<header><h1>probewatch</h1><p class=\"generated\">Generated {}</p></header>",
        format_timestamp(report.generated_at)
    );
}

pub fn page_end(page: &mut String) {
    page.push_str("</body>\n</html>\n");
}

/// Overall state: failure iff any failure was recorded
pub fn banner(page: &mut String, report: &Report) {
    if report.is_success() {
        page.push_str("<div class=\"banner success\">SUCCESS: all probes passed</div>\n");
    } else {
        let _ = writeln!(
            page,
            "<div class=\"banner failure\">FAILURE: {} probe failure(s)</div>",
            report.failures.len()
        );
    }
}

pub fn summary(page: &mut String, summary: &Summary) {
    page.push_str("<table class=\"summary\"><tbody>\n");
    let rows = [
        ("Test Count", summary.probe_count.to_string()),
        ("Elapsed", format_elapsed(summary.elapsed)),
        ("Infos", summary.infos.to_string()),
        ("Warnings", summary.warnings.to_string()),
        ("Errors", summary.errors.to_string()),
    ];
    for (label, value) in rows {
        let _ = writeln!(page, "<tr><th>{}</th><td>{}</td></tr>", label, value);
    }
    page.push_str("</tbody></table>\n");
}

fn key_value_table(page: &mut String, class: &str, rows: &[(&str, &str)]) {
    let _ = writeln!(page, "<table class=\"{}\"><tbody>", class);
    for (key, value) in rows {
        let _ = writeln!(
            page,
            "<tr><th>{}</th><td>{}</td></tr>",
            escape_html(key),
            escape_html(value)
        );
    }
    page.push_str("</tbody></table>\n");
}

/// Host and configuration blocks, as the options ask for
pub fn decorations(page: &mut String, options: &RenderOptions, ctx: &RunContext) {
    if options.show_host_info {
        let info = HostInfo::of(ctx);
        page.push_str("<h2>Host</h2>\n");
        key_value_table(page, "host-info", &info.rows());
    }
    if let Some(config) = &options.config {
        let rows: Vec<(&str, &str)> = config
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        page.push_str("<h2>Configuration</h2>\n");
        key_value_table(page, "config", &rows);
    }
}

/// Failures with their cause chain
///
/// A failure whose partial result is missing from the report's results
/// (abort, rejected configuration) carries its entries along here.
pub fn failures(page: &mut String, report: &Report) {
    if report.failures.is_empty() {
        return;
    }
    page.push_str("<div class=\"failures\">\n<h2>Failures</h2>\n<ul>\n");
    for failure in &report.failures {
        let _ = write!(
            page,
            "<li><strong>{}</strong> failed during {}: {}",
            escape_html(&failure.probe),
            failure.stage,
            escape_html(&failure.error.message)
        );
        for cause in &failure.error.causes {
            let _ = write!(
                page,
                "<div class=\"cause\">caused by: {}</div>",
                escape_html(cause)
            );
        }
        if !report.lists_result(failure) && !failure.result.is_empty() {
            page.push('\n');
            entries_table(page, &failure.result);
        }
        page.push_str("</li>\n");
    }
    page.push_str("</ul>\n</div>\n");
}

fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "severity-info",
        Severity::Warn => "severity-warn",
        Severity::Error => "severity-error",
    }
}

/// One probe's metadata and its entries in timestamp order
pub fn probe_result(page: &mut String, result: &ProbeResult) {
    let state = if result.has_error_entry() { "failed" } else { "ok" };
    let _ = writeln!(
        page,
        "<div class=\"probe\">\n<h2 class=\"{}\">{}</h2>",
        state,
        escape_html(result.probe())
    );
    let _ = writeln!(
        page,
        "<p class=\"meta\">Description: {} | Contact: {} | Elapsed: {}</p>",
        escape_html(result.description()),
        escape_html(result.point_of_contact()),
        format_elapsed(result.elapsed())
    );
    entries_table(page, result);
    page.push_str("</div>\n");
}

fn entries_table(page: &mut String, result: &ProbeResult) {
    page.push_str(
        "<table class=\"entries\"><thead><tr><th>Severity</th><th>Message</th><th>Time</th></tr></thead><tbody>\n",
    );
    for entry in result.sorted_entries() {
        let _ = writeln!(
            page,
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td></tr>",
            severity_class(entry.severity()),
            entry.severity(),
            entry.formatted(),
            format_timestamp(entry.timestamp())
        );
    }
    page.push_str("</tbody></table>\n");
}
