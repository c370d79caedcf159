//! The log of one probe run

use chrono::{DateTime, Duration, Utc};

use super::entry::{Entry, Severity};
use crate::constants::NOT_AVAILABLE;

/// Ordered entries for a single probe run, bounded by start/end instants
///
/// Entries can only be appended and read; `ended_at` is stamped once by
/// [`ProbeResult::finish`].
#[derive(Debug, Clone)]
pub struct ProbeResult {
    probe: String,
    description: String,
    point_of_contact: String,
    entries: Vec<Entry>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl ProbeResult {
    pub fn new(probe: impl Into<String>) -> Self {
        Self {
            probe: probe.into(),
            description: NOT_AVAILABLE.to_string(),
            point_of_contact: NOT_AVAILABLE.to_string(),
            entries: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Identifier of the probe that produced this result
    pub fn probe(&self) -> &str {
        &self.probe
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn point_of_contact(&self) -> &str {
        &self.point_of_contact
    }

    pub(crate) fn set_metadata(&mut self, description: &str, point_of_contact: &str) {
        self.description = description.to_string();
        self.point_of_contact = point_of_contact.to_string();
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entries ordered by timestamp; ties keep insertion order
    pub fn sorted_entries(&self) -> Vec<&Entry> {
        let mut sorted: Vec<&Entry> = self.entries.iter().collect();
        sorted.sort_by_key(|entry| entry.timestamp());
        sorted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.severity() == severity)
            .count()
    }

    pub fn has_error_entry(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.severity() == Severity::Error)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Stamp `ended_at`. Returns false (and changes nothing) if already stamped.
    pub fn finish(&mut self) -> bool {
        if self.ended_at.is_some() {
            return false;
        }
        self.ended_at = Some(Utc::now().max(self.started_at));
        true
    }

    /// Run time, zero while the run is still open
    pub fn elapsed(&self) -> Duration {
        self.ended_at
            .map(|end| end - self.started_at)
            .unwrap_or_else(Duration::zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_result_has_sentinel_metadata() {
        let result = ProbeResult::new("tcp#db");
        assert_eq!(result.probe(), "tcp#db");
        assert_eq!(result.description(), NOT_AVAILABLE);
        assert_eq!(result.point_of_contact(), NOT_AVAILABLE);
        assert!(result.ended_at().is_none());
        assert_eq!(result.elapsed(), Duration::zero());
    }

    #[test]
    fn test_finish_is_stamped_once() {
        let mut result = ProbeResult::new("system");
        assert!(result.finish());
        let first = result.ended_at();
        assert!(!result.finish());
        assert_eq!(result.ended_at(), first);
        assert!(result.ended_at().unwrap() >= result.started_at());
    }

    #[test]
    fn test_error_detection_and_counts() {
        let mut result = ProbeResult::new("query");
        result.push(Entry::info("a"));
        result.push(Entry::warn("b"));
        assert!(!result.has_error_entry());
        result.push(Entry::error("c"));
        assert!(result.has_error_entry());
        assert_eq!(result.count(Severity::Info), 1);
        assert_eq!(result.count(Severity::Warn), 1);
        assert_eq!(result.count(Severity::Error), 1);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_sorted_entries_orders_by_timestamp_stably() {
        let base = Utc::now();
        let mut result = ProbeResult::new("mail");
        result.push(Entry::info("late").with_timestamp(base + Duration::seconds(5)));
        result.push(Entry::info("early").with_timestamp(base));
        result.push(Entry::info("tie").with_timestamp(base));

        let texts: Vec<String> = result
            .sorted_entries()
            .iter()
            .map(|e| e.value().to_text())
            .collect();
        assert_eq!(texts, vec!["early", "tie", "late"]);
        // Insertion order is untouched
        assert_eq!(result.entries()[0].value().to_text(), "late");
    }
}
