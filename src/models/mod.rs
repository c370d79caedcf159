//! # Domain Models
//!
//! The result/log data model shared by probes, failure policies and renderers.
//!
//! - [`Entry`]: one timestamped, severity-tagged observation, carrying its own
//!   display formatter
//! - [`ProbeResult`]: the ordered log of entries for one probe run
//!
//! Entries are appended in whatever order a probe produces them; renderers
//! sort by timestamp at display time via [`ProbeResult::sorted_entries`].

pub mod entry;
pub mod result;

pub use entry::{Entry, EntryValue, ErrorTrace, Severity, Table};
pub use result::ProbeResult;
