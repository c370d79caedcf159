//! # Report rendering
//!
//! A [`Renderer`] turns a finished [`Report`] into the response body. All
//! renderers consume the same data and differ only in layout:
//!
//! - [`FlatRenderer`] (`flat`): one HTML listing
//! - [`TabbedRenderer`] (`tabbed`): HTML with a summary tab and one tab per probe
//! - [`JsonRenderer`] (`json`): machine readable, for monitoring tools
//!
//! Entries are sorted by timestamp here, at render time. The header
//! timestamp is the report's `generated_at`, so rendering the same report
//! twice yields the same bytes.

pub mod flat;
pub mod html;
pub mod json;
pub mod tabbed;

use chrono::{DateTime, Duration, Utc};
use std::io::Write;

use crate::config::Settings;
use crate::constants::*;
use crate::core::{Registry, Report, RunContext};
use crate::utils::{ConfigError, RenderError};

pub use flat::FlatRenderer;
pub use json::JsonRenderer;
pub use tabbed::TabbedRenderer;

/// Presentation strategy for a report
pub trait Renderer: Send + Sync {
    fn name(&self) -> &'static str;

    /// MIME type of the produced output
    fn content_type(&self) -> &'static str;

    fn render(
        &self,
        report: &Report,
        ctx: &RunContext,
        out: &mut dyn Write,
    ) -> Result<(), RenderError>;
}

/// Decoration flags shared by all renderers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Show host name, client address and user agent
    pub show_host_info: bool,
    /// Settings snapshot (secrets masked), present iff `render.show_config`
    pub config: Option<Vec<(String, String)>>,
}

impl RenderOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let show_host_info = settings.get_bool(KEY_SHOW_HOST_INFO)?.unwrap_or(false);
        let show_config = settings.get_bool(KEY_SHOW_CONFIG)?.unwrap_or(false);
        Ok(Self {
            show_host_info,
            config: show_config.then(|| settings.masked()),
        })
    }
}

/// Request and host facts shown when `render.show_host_info` is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub local_host: String,
    pub request_host: String,
    pub client_addr: String,
    pub user_agent: String,
}

impl HostInfo {
    pub fn of(ctx: &RunContext) -> Self {
        let or_na = |value: &Option<String>| {
            value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        let request = ctx.request();
        Self {
            local_host: ctx.local_hostname().to_string(),
            request_host: or_na(&request.host),
            client_addr: or_na(&request.client_addr),
            user_agent: or_na(&request.user_agent),
        }
    }

    pub fn rows(&self) -> [(&'static str, &str); 4] {
        [
            ("Host", self.local_host.as_str()),
            ("Requested host", self.request_host.as_str()),
            ("Client", self.client_addr.as_str()),
            ("User agent", self.user_agent.as_str()),
        ]
    }
}

/// `1.234 s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.num_milliseconds().max(0);
    format!("{}.{:03} s", millis / 1000, millis % 1000)
}

/// `2026-01-02 03:04:05.678 UTC`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string()
}

/// Register the bundled renderers under their names
pub fn register_builtins(registry: &mut Registry) {
    registry.register_renderer("flat", |settings| {
        let options = RenderOptions::from_settings(settings)?;
        Ok(Box::new(FlatRenderer::new(options)) as Box<dyn Renderer>)
    });
    registry.register_renderer("tabbed", |settings| {
        let options = RenderOptions::from_settings(settings)?;
        Ok(Box::new(TabbedRenderer::new(options)) as Box<dyn Renderer>)
    });
    registry.register_renderer("json", |settings| {
        let options = RenderOptions::from_settings(settings)?;
        Ok(Box::new(JsonRenderer::new(options)) as Box<dyn Renderer>)
    });
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_settings() {
        let settings = Settings::from_pairs([
            (KEY_SHOW_HOST_INFO, "true"),
            (KEY_SHOW_CONFIG, "yes"),
            ("tcp.password", "hunter2"),
        ]);
        let options = RenderOptions::from_settings(&settings).unwrap();
        assert!(options.show_host_info);
        let config = options.config.unwrap();
        assert!(config.contains(&("tcp.password".to_string(), MASKED_VALUE.to_string())));

        let defaults = RenderOptions::from_settings(&Settings::new()).unwrap();
        assert_eq!(defaults, RenderOptions::default());
    }

    #[test]
    fn test_invalid_flag_is_config_error() {
        let settings = Settings::from_pairs([(KEY_SHOW_HOST_INFO, "loud")]);
        assert!(RenderOptions::from_settings(&settings).is_err());
    }

    #[test]
    fn test_host_info_defaults_missing_request_fields() {
        let ctx = RunContext::new(Default::default(), "probe-host");
        let info = HostInfo::of(&ctx);
        assert_eq!(info.local_host, "probe-host");
        assert_eq!(info.client_addr, NOT_AVAILABLE);
        assert_eq!(info.rows()[3], ("User agent", NOT_AVAILABLE));
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_elapsed(Duration::milliseconds(1234)), "1.234 s");
        assert_eq!(format_elapsed(Duration::milliseconds(7)), "0.007 s");
        assert_eq!(
            format_timestamp(fixtures::at(0)),
            "2026-05-28 20:26:40.000 UTC"
        );
    }
}
