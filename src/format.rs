//! Entry formatting strategies
//!
//! Each [`Entry`] carries the formatter chosen by the probe that created it;
//! renderers call [`Entry::formatted`] and never pick a formatter themselves.
//! Every formatter returns an HTML fragment with all payload text escaped.

use regex::Regex;
use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};

use crate::models::{Entry, EntryValue, ErrorTrace, Table};

static URL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"']+"#).ok());

/// Strategy that turns an entry's value and cause into display markup
pub trait EntryFormatter: Send + Sync {
    /// Short identifier, used in debug output and the JSON report
    fn name(&self) -> &'static str;

    fn format(&self, entry: &Entry) -> String;
}

/// Formatter assigned to entries that don't specify one
pub fn default_formatter() -> Arc<dyn EntryFormatter> {
    Arc::new(LinkFormatter)
}

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape text and turn http(s) URLs into anchors
pub fn linkify(raw: &str) -> String {
    let Some(pattern) = URL_PATTERN.as_ref() else {
        return escape_html(raw);
    };

    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for found in pattern.find_iter(raw) {
        out.push_str(&escape_html(&raw[last..found.start()]));
        let url = escape_html(found.as_str());
        let _ = write!(out, "<a href=\"{url}\">{url}</a>");
        last = found.end();
    }
    out.push_str(&escape_html(&raw[last..]));
    out
}

fn format_cause(cause: Option<&ErrorTrace>) -> String {
    let Some(cause) = cause else {
        return String::new();
    };
    let mut out = format!(
        "<div class=\"cause\">{}</div>",
        escape_html(&cause.message)
    );
    for inner in &cause.causes {
        let _ = write!(
            out,
            "<div class=\"cause\">caused by: {}</div>",
            escape_html(inner)
        );
    }
    out
}

fn format_table(table: &Table) -> String {
    let mut out = String::from("<table class=\"data\"><thead><tr>");
    for column in &table.columns {
        let _ = write!(out, "<th>{}</th>", escape_html(column));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", linkify(cell));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}

/// Pass-through text with hyperlink detection
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkFormatter;

impl EntryFormatter for LinkFormatter {
    fn name(&self) -> &'static str {
        "link"
    }

    fn format(&self, entry: &Entry) -> String {
        let body = match entry.value() {
            EntryValue::Text(text) => linkify(text),
            EntryValue::Table(table) => format_table(table),
        };
        body + &format_cause(entry.cause())
    }
}

/// Row/column rendering for tabular values
#[derive(Debug, Clone, Copy, Default)]
pub struct TableFormatter;

impl EntryFormatter for TableFormatter {
    fn name(&self) -> &'static str {
        "table"
    }

    fn format(&self, entry: &Entry) -> String {
        match entry.value() {
            EntryValue::Table(table) => format_table(table) + &format_cause(entry.cause()),
            EntryValue::Text(_) => LinkFormatter.format(entry),
        }
    }
}

/// Verbatim block, whitespace preserved
#[derive(Debug, Clone, Copy, Default)]
pub struct PreformattedFormatter;

impl EntryFormatter for PreformattedFormatter {
    fn name(&self) -> &'static str {
        "pre"
    }

    fn format(&self, entry: &Entry) -> String {
        format!(
            "<pre>{}</pre>{}",
            escape_html(&entry.value().to_text()),
            format_cause(entry.cause())
        )
    }
}

/// Two-column table parsed from newline-delimited `key=value` text
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueFormatter;

impl KeyValueFormatter {
    /// Split `key=value` lines; blank lines are dropped, lines without `=`
    /// become a key with an empty value
    pub fn parse(text: &str) -> Table {
        let mut table = Table::new(["Key", "Value"]);
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match line.split_once('=') {
                Some((key, value)) => table.push_row([key.trim(), value.trim()]),
                None => table.push_row([line, ""]),
            }
        }
        table
    }
}

impl EntryFormatter for KeyValueFormatter {
    fn name(&self) -> &'static str {
        "key_value"
    }

    fn format(&self, entry: &Entry) -> String {
        let table = match entry.value() {
            EntryValue::Text(text) => Self::parse(text),
            EntryValue::Table(table) => table.clone(),
        };
        format_table(&table) + &format_cause(entry.cause())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_link_formatter_detects_urls() {
        let entry = Entry::info("see https://status.example.com/db?x=1&y=2 for details");
        let html = LinkFormatter.format(&entry);
        assert_eq!(
            html,
            "see <a href=\"https://status.example.com/db?x=1&amp;y=2\">\
             https://status.example.com/db?x=1&amp;y=2</a> for details"
        );
    }

    #[test]
    fn test_link_formatter_escapes_plain_text_and_appends_cause() {
        let entry = Entry::error("<script>")
            .with_cause(ErrorTrace {
                message: "outer".to_string(),
                causes: vec!["inner".to_string()],
            });
        let html = LinkFormatter.format(&entry);
        assert!(html.starts_with("&lt;script&gt;"));
        assert!(html.contains("<div class=\"cause\">outer</div>"));
        assert!(html.contains("caused by: inner"));
    }

    #[test]
    fn test_table_formatter_renders_rows() {
        let mut table = Table::new(["id", "state"]);
        table.push_row(["1", "up"]);
        table.push_row(["2", "down"]);
        let html = TableFormatter.format(&Entry::info(table));
        assert!(html.starts_with("<table class=\"data\"><thead><tr><th>id</th><th>state</th>"));
        assert_eq!(html.matches("<tr>").count(), 3);
        assert!(html.contains("<td>down</td>"));
    }

    #[test]
    fn test_table_formatter_falls_back_for_text() {
        let entry = Entry::info("plain");
        assert_eq!(TableFormatter.format(&entry), "plain");
    }

    #[test]
    fn test_preformatted_keeps_whitespace() {
        let entry = Entry::info("line 1\n  line <2>");
        assert_eq!(
            PreformattedFormatter.format(&entry),
            "<pre>line 1\n  line &lt;2&gt;</pre>"
        );
    }

    #[test]
    fn test_key_value_parse() {
        let table = KeyValueFormatter::parse("host = db01\nport=5432\n\nflag\nurl=a=b");
        assert_eq!(table.columns, vec!["Key", "Value"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["host", "db01"],
                vec!["port", "5432"],
                vec!["flag", ""],
                vec!["url", "a=b"],
            ]
        );
    }

    #[test]
    fn test_key_value_formatter_outputs_table() {
        let html = KeyValueFormatter.format(&Entry::info("a=1\nb=2"));
        assert!(html.contains("<th>Key</th><th>Value</th>"));
        assert!(html.contains("<td>a</td><td>1</td>"));
    }
}
