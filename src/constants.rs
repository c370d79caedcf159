//! # Application-Wide Constants
//!
//! Configuration keys, defaults and limits used throughout probewatch.
//!
//! ## Key layout
//!
//! Orchestrator keys are top-level (`probes`, `renderer`, ...). Per-probe keys
//! are prefixed with the probe identifier as listed in `probes`, e.g.
//! `tcp#db.port`. Renderer flags use the `render.` prefix; `renderer` itself
//! holds the renderer name, so a TOML `render.show_config = true` stays legal.

// ============================================================================
// Orchestrator configuration keys
// ============================================================================

/// Comma-separated, ordered list of probe identifiers (`type` or `type#label`)
pub const KEY_PROBES: &str = "probes";

/// Renderer identifier
pub const KEY_RENDERER: &str = "renderer";

/// Failure policy identifier
pub const KEY_FAILURE_POLICY: &str = "failure_policy";

/// Reject requests whose Host header doesn't match the local hostname
pub const KEY_VIRTUAL_HOST: &str = "virtual_host";

/// Separator between a probe type and its instance label
pub const PROBE_LABEL_SEPARATOR: char = '#';

// ============================================================================
// Per-probe keys (suffixes after `<probe id>.`)
// ============================================================================

pub const KEY_VERBOSE: &str = "verbose";
pub const KEY_ACTIVE_FROM: &str = "active_from";
pub const KEY_ACTIVE_UNTIL: &str = "active_until";
pub const KEY_CONTACT: &str = "contact";
pub const KEY_DESCRIPTION: &str = "description";

/// Optional per-probe deadline in milliseconds
pub const KEY_TIMEOUT_MS: &str = "timeout_ms";

// ============================================================================
// Renderer flags
// ============================================================================

pub const KEY_SHOW_HOST_INFO: &str = "render.show_host_info";
pub const KEY_SHOW_CONFIG: &str = "render.show_config";

// ============================================================================
// Defaults
// ============================================================================

/// Placeholder for unset description / point of contact
pub const NOT_AVAILABLE: &str = "not available";

/// Default renderer when none is configured in the server config file
pub const DEFAULT_RENDERER: &str = "tabbed";

/// Default failure policy when none is configured in the server config file
pub const DEFAULT_FAILURE_POLICY: &str = "continue";

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Config file consulted when `PROBEWATCH_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "probewatch.toml";

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "PROBEWATCH_CONFIG";

/// TCP connection timeout for connectivity probes (milliseconds)
///
/// Long enough for WAN latency, short enough that an unreachable host doesn't
/// stall the whole sequential run.
pub const TCP_PROBE_TIMEOUT_MS: u64 = 1200;

/// Extra connection attempts after a transient TCP failure
pub const TCP_PROBE_RETRIES: u32 = 2;

/// Query duration above which the query probe logs a warning (milliseconds)
pub const QUERY_WARN_MS: u64 = 1000;

/// Rows read from a query result before the rest is dropped
pub const QUERY_ROW_LIMIT: usize = 500;

/// SQLite busy timeout for the query facade (milliseconds)
pub const SQLITE_BUSY_TIMEOUT_MS: u64 = 2000;

// ============================================================================
// Security
// ============================================================================

/// Substrings marking a configuration key as secret; values are masked in
/// verbose dumps and the renderer's configuration view
pub const SECRET_KEY_MARKERS: &[&str] = &["password", "secret", "token", "credential"];

/// Replacement shown for secret values
pub const MASKED_VALUE: &str = "********";

// ============================================================================
// Invocation
// ============================================================================

/// Query parameter requesting a bundled static resource
pub const PARAM_RESOURCE: &str = "resource";

/// Query parameter requesting a bundled build resource
pub const PARAM_BUILD: &str = "build";
