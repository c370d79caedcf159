//! Probe lifecycle contract and the shared base implementation
//!
//! # Lifecycle
//!
//! The orchestrator drives every probe through the same steps:
//!
//! 1. `configure` - read `<id>.*` keys from the shared [`Settings`]
//! 2. `is_active` - skip the probe when "now" is outside its window
//! 3. `execute` - do the check, appending entries to the result
//! 4. `cleanup` - always, whatever `execute` returned
//!
//! A leaf probe embeds a [`BaseProbe`], exposes it through `base`/`base_mut`
//! and implements `execute`. `Err` from `execute` is the only failure
//! signal; entries logged before the error stay in the result and travel
//! with the failure.
//!
//! # Example
//!
//! ```ignore
//! struct PingProbe { base: BaseProbe }
//!
//! #[async_trait]
//! impl Probe for PingProbe {
//!     fn base(&self) -> &BaseProbe { &self.base }
//!     fn base_mut(&mut self) -> &mut BaseProbe { &mut self.base }
//!
//!     async fn execute(&mut self, _ctx: &RunContext) -> Result<(), ProbeError> {
//!         self.base.info("pong");
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::context::RunContext;
use crate::config::{ScopedSettings, Settings};
use crate::constants::*;
use crate::format::{EntryFormatter, KeyValueFormatter};
use crate::models::{Entry, EntryValue, ErrorTrace, ProbeResult};
use crate::utils::{ConfigError, ProbeError};

/// Configuration parsing, activity window and logging shared by all probes
#[derive(Debug)]
pub struct BaseProbe {
    id: String,
    verbose: bool,
    active_from: DateTime<Utc>,
    active_until: DateTime<Utc>,
    point_of_contact: Option<String>,
    description: Option<String>,
    timeout: Option<Duration>,
    result: ProbeResult,
}

impl BaseProbe {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let (active_from, active_until) = default_window(Utc::now());
        Self {
            result: ProbeResult::new(id.clone()),
            id,
            verbose: false,
            active_from,
            active_until,
            point_of_contact: None,
            description: None,
            timeout: None,
        }
    }

    /// Identifier as listed in the `probes` key; also the config prefix
    pub fn id(&self) -> &str {
        &self.id
    }

    /// This probe's slice of the shared settings
    pub fn scoped<'a>(&'a self, settings: &'a Settings) -> ScopedSettings<'a> {
        settings.scoped(&self.id)
    }

    /// Parse the shared lifecycle keys
    ///
    /// Unset window bounds default to yesterday/tomorrow relative to now. In
    /// verbose mode the effective configuration (secrets masked) is logged.
    pub fn configure(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        let scoped = settings.scoped(&self.id);
        let (default_from, default_until) = default_window(Utc::now());

        let verbose = scoped.get_bool(KEY_VERBOSE)?.unwrap_or(false);
        let active_from = scoped.get_instant(KEY_ACTIVE_FROM)?.unwrap_or(default_from);
        let active_until = scoped
            .get_instant(KEY_ACTIVE_UNTIL)?
            .unwrap_or(default_until);
        if active_from >= active_until {
            return Err(ConfigError::invalid(
                scoped.key(KEY_ACTIVE_UNTIL),
                format!(
                    "window end {} is not after its start {}",
                    active_until.to_rfc3339(),
                    active_from.to_rfc3339()
                ),
            ));
        }
        let timeout = scoped.get_u64(KEY_TIMEOUT_MS)?.map(Duration::from_millis);
        let point_of_contact = scoped.get(KEY_CONTACT).map(str::to_string);
        let description = scoped.get(KEY_DESCRIPTION).map(str::to_string);
        let dump = scoped
            .masked()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("\n");

        self.verbose = verbose;
        self.active_from = active_from;
        self.active_until = active_until;
        self.timeout = timeout;
        self.point_of_contact = point_of_contact;
        self.description = description;
        let (description, contact) = (
            self.description().to_string(),
            self.point_of_contact().to_string(),
        );
        self.result.set_metadata(&description, &contact);

        if self.verbose {
            self.log_with(
                Entry::info(format!(
                    "active_from={}\nactive_until={}\n{}",
                    self.active_from.to_rfc3339(),
                    self.active_until.to_rfc3339(),
                    dump
                )),
                Arc::new(KeyValueFormatter),
            );
        }
        Ok(())
    }

    /// True iff `now` lies in `[active_from, active_until)`
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now >= self.active_from && now < self.active_until
    }

    pub fn active_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.active_from, self.active_until)
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Optional execution deadline from `<id>.timeout_ms`
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn point_of_contact(&self) -> &str {
        self.point_of_contact.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn result(&self) -> &ProbeResult {
        &self.result
    }

    /// Stamp the end of the run; only the first call has an effect
    pub fn finish(&mut self) -> bool {
        self.result.finish()
    }

    pub fn log(&mut self, entry: Entry) {
        self.result.push(entry);
    }

    pub fn log_with(&mut self, entry: Entry, formatter: Arc<dyn EntryFormatter>) {
        self.result.push(entry.with_formatter(formatter));
    }

    pub fn info(&mut self, value: impl Into<EntryValue>) {
        self.log(Entry::info(value));
    }

    pub fn warn(&mut self, value: impl Into<EntryValue>) {
        self.log(Entry::warn(value));
    }

    pub fn error(&mut self, value: impl Into<EntryValue>) {
        self.log(Entry::error(value));
    }

    pub fn error_with_cause(
        &mut self,
        value: impl Into<EntryValue>,
        cause: &(dyn std::error::Error + 'static),
    ) {
        self.log(Entry::error(value).with_cause(ErrorTrace::capture(cause)));
    }

    /// INFO entry that only appears when the probe is verbose
    pub fn detail(&mut self, value: impl Into<EntryValue>) {
        if self.verbose {
            self.info(value);
        }
    }
}

fn default_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        now.checked_sub_days(Days::new(1)).unwrap_or(now),
        now.checked_add_days(Days::new(1)).unwrap_or(now),
    )
}

/// A unit of diagnostic work
#[async_trait]
pub trait Probe: Send {
    fn base(&self) -> &BaseProbe;

    fn base_mut(&mut self) -> &mut BaseProbe;

    fn id(&self) -> &str {
        self.base().id()
    }

    /// Parse and validate configuration. Overrides must call the base first.
    fn configure(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        self.base_mut().configure(settings)
    }

    fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.base().is_active(now)
    }

    async fn execute(&mut self, ctx: &RunContext) -> Result<(), ProbeError>;

    /// Release resources. Runs after every `execute`, successful or not.
    async fn cleanup(&mut self) {}

    fn result(&self) -> &ProbeResult {
        self.base().result()
    }

    fn description(&self) -> &str {
        self.base().description()
    }

    fn point_of_contact(&self) -> &str {
        self.base().point_of_contact()
    }
}
