//! A single timestamped observation recorded by a probe

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::format::{default_formatter, EntryFormatter};

/// Severity of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tabular payload: column names plus rows of cell text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Payload carried by an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum EntryValue {
    Text(String),
    Table(Table),
}

impl EntryValue {
    /// Plain-text view of the payload (tables become tab-separated lines)
    pub fn to_text(&self) -> String {
        match self {
            EntryValue::Text(text) => text.clone(),
            EntryValue::Table(table) => {
                let mut lines = vec![table.columns.join("\t")];
                lines.extend(table.rows.iter().map(|row| row.join("\t")));
                lines.join("\n")
            }
        }
    }
}

impl From<&str> for EntryValue {
    fn from(value: &str) -> Self {
        EntryValue::Text(value.to_string())
    }
}

impl From<String> for EntryValue {
    fn from(value: String) -> Self {
        EntryValue::Text(value)
    }
}

impl From<Table> for EntryValue {
    fn from(value: Table) -> Self {
        EntryValue::Table(value)
    }
}

/// Captured error: top-level message plus the `source()` chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTrace {
    pub message: String,
    pub causes: Vec<String>,
}

impl ErrorTrace {
    pub fn capture(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(inner) = source {
            causes.push(inner.to_string());
            source = inner.source();
        }
        Self {
            message: err.to_string(),
            causes,
        }
    }

    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
        }
    }
}

impl fmt::Display for ErrorTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {}", cause)?;
        }
        Ok(())
    }
}

/// One observation in a probe's log
///
/// Built with the `with_*` methods before it is handed to a
/// [`ProbeResult`](super::ProbeResult); after that only shared references
/// are ever given out.
#[derive(Clone)]
pub struct Entry {
    value: EntryValue,
    timestamp: DateTime<Utc>,
    severity: Severity,
    cause: Option<ErrorTrace>,
    formatter: Arc<dyn EntryFormatter>,
}

impl Entry {
    pub fn new(severity: Severity, value: impl Into<EntryValue>) -> Self {
        Self {
            value: value.into(),
            timestamp: Utc::now(),
            severity,
            cause: None,
            formatter: default_formatter(),
        }
    }

    pub fn info(value: impl Into<EntryValue>) -> Self {
        Self::new(Severity::Info, value)
    }

    pub fn warn(value: impl Into<EntryValue>) -> Self {
        Self::new(Severity::Warn, value)
    }

    pub fn error(value: impl Into<EntryValue>) -> Self {
        Self::new(Severity::Error, value)
    }

    pub fn with_cause(mut self, cause: ErrorTrace) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn EntryFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn value(&self) -> &EntryValue {
        &self.value
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn cause(&self) -> Option<&ErrorTrace> {
        self.cause.as_ref()
    }

    pub fn formatter(&self) -> &dyn EntryFormatter {
        self.formatter.as_ref()
    }

    /// Display markup for this entry, produced by its own formatter
    pub fn formatted(&self) -> String {
        self.formatter.format(self)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("severity", &self.severity)
            .field("timestamp", &self.timestamp)
            .field("value", &self.value)
            .field("cause", &self.cause)
            .field("formatter", &self.formatter.name())
            .finish()
    }
}
