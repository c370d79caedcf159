//! Configuration: the flat settings map and the server config file
//!
//! Probes, renderers and failure policies all read from one [`Settings`]
//! map. Probes see it through [`ScopedSettings`], which prefixes every key
//! with the probe identifier so several probe types can share the map.
//!
//! The server binary loads a TOML file (`PROBEWATCH_CONFIG`, then
//! `./probewatch.toml`, then built-in defaults). Its `[settings]` table is
//! flattened into the string map: nested tables join with `.`, arrays with `,`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::utils::ConfigError;

/// True if the key names a secret (password, token, ...)
pub fn is_secret_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SECRET_KEY_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::invalid(key, format!("'{}' is not a boolean", raw))),
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>()
        .map_err(|_| ConfigError::invalid(key, format!("'{}' is not a non-negative integer", raw)))
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` date meaning midnight UTC
fn parse_instant(key: &str, raw: &str) -> Result<DateTime<Utc>, ConfigError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            ConfigError::invalid(
                key,
                format!("'{}' is neither RFC 3339 nor YYYY-MM-DD", raw),
            )
        })
}

/// Flat string-keyed configuration map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Flatten a TOML table into string settings
    pub fn from_toml(table: &toml::Table) -> Self {
        let mut settings = Self::new();
        settings.flatten_toml("", table);
        settings
    }

    fn flatten_toml(&mut self, prefix: &str, table: &toml::Table) {
        for (key, value) in table {
            let full_key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            match value {
                toml::Value::Table(inner) => self.flatten_toml(&full_key, inner),
                other => {
                    self.values.insert(full_key, toml_scalar(other));
                }
            }
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Trimmed value; blank values count as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        self.get(key).map(|raw| parse_bool(key, raw)).transpose()
    }

    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        self.get(key).map(|raw| parse_u64(key, raw)).transpose()
    }

    pub fn get_instant(&self, key: &str) -> Result<Option<DateTime<Utc>>, ConfigError> {
        self.get(key).map(|raw| parse_instant(key, raw)).transpose()
    }

    /// Comma-separated list, entries trimmed, empties dropped
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// View of the keys under `<prefix>.`
    pub fn scoped<'a>(&'a self, prefix: &'a str) -> ScopedSettings<'a> {
        ScopedSettings {
            settings: self,
            prefix,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All pairs with secret values replaced by a mask
    pub fn masked(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(k, v)| {
                let shown = if is_secret_key(k) { MASKED_VALUE } else { v };
                (k.to_string(), shown.to_string())
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn toml_scalar(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => items
            .iter()
            .map(toml_scalar)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Settings seen through a probe's key prefix
#[derive(Debug, Clone, Copy)]
pub struct ScopedSettings<'a> {
    settings: &'a Settings,
    prefix: &'a str,
}

impl<'a> ScopedSettings<'a> {
    pub fn prefix(&self) -> &str {
        self.prefix
    }

    /// Fully-qualified key for `name`
    pub fn key(&self, name: &str) -> String {
        format!("{}.{}", self.prefix, name)
    }

    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.settings.get(&self.key(name))
    }

    pub fn require(&self, name: &str) -> Result<&'a str, ConfigError> {
        self.settings.require(&self.key(name))
    }

    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        self.settings.get_bool(&self.key(name))
    }

    pub fn get_u64(&self, name: &str) -> Result<Option<u64>, ConfigError> {
        self.settings.get_u64(&self.key(name))
    }

    pub fn get_instant(&self, name: &str) -> Result<Option<DateTime<Utc>>, ConfigError> {
        self.settings.get_instant(&self.key(name))
    }

    pub fn get_list(&self, name: &str) -> Vec<String> {
        self.settings.get_list(&self.key(name))
    }

    /// Pairs under this prefix (prefix stripped), secrets masked
    pub fn masked(&self) -> Vec<(String, String)> {
        let lead = format!("{}.", self.prefix);
        self.settings
            .masked()
            .into_iter()
            .filter_map(|(k, v)| k.strip_prefix(&lead).map(|rest| (rest.to_string(), v)))
            .collect()
    }
}

// ============================================================================
// Server configuration
// ============================================================================

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// SQLite database backing the query facade (query probes need it)
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,

    /// Pickup directory backing the mail facade (mail probes need it)
    #[serde(default)]
    pub mail_pickup_dir: Option<PathBuf>,

    /// Orchestrator and probe settings, flattened into [`Settings`]
    #[serde(default = "default_settings_table")]
    pub settings: toml::Table,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_settings_table() -> toml::Table {
    let mut table = toml::Table::new();
    table.insert(KEY_PROBES.to_string(), toml::Value::String("system".to_string()));
    table.insert(
        KEY_RENDERER.to_string(),
        toml::Value::String(DEFAULT_RENDERER.to_string()),
    );
    table.insert(
        KEY_FAILURE_POLICY.to_string(),
        toml::Value::String(DEFAULT_FAILURE_POLICY.to_string()),
    );
    table
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            sqlite_path: None,
            mail_pickup_dir: None,
            settings: default_settings_table(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::invalid("config file", e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::invalid(path.display().to_string(), format!("unreadable: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn settings(&self) -> Settings {
        Settings::from_toml(&self.settings)
    }
}

/// Load the server configuration
///
/// An explicitly named file (`PROBEWATCH_CONFIG`) must exist and parse.
/// The default file is optional; without it the built-in defaults apply.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let config = ServerConfig::from_file(Path::new(&path))?;
        tracing::info!(path = %path, "loaded configuration from file");
        return Ok(config);
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        let config = ServerConfig::from_file(default_path)?;
        tracing::info!(path = DEFAULT_CONFIG_FILE, "loaded configuration from file");
        return Ok(config);
    }

    tracing::info!("using default configuration");
    Ok(ServerConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_get_treats_blank_as_unset() {
        let settings = Settings::from_pairs([("a", "  x "), ("b", "   ")]);
        assert_eq!(settings.get("a"), Some("x"));
        assert_eq!(settings.get("b"), None);
        assert!(matches!(settings.require("b"), Err(ConfigError::Missing(k)) if k == "b"));
    }

    #[test]
    fn test_typed_accessors() {
        let settings = Settings::from_pairs([
            ("flag", "Yes"),
            ("off", "0"),
            ("bad", "maybe"),
            ("n", "1500"),
            ("neg", "-1"),
        ]);
        assert_eq!(settings.get_bool("flag").unwrap(), Some(true));
        assert_eq!(settings.get_bool("off").unwrap(), Some(false));
        assert_eq!(settings.get_bool("missing").unwrap(), None);
        assert!(settings.get_bool("bad").is_err());
        assert_eq!(settings.get_u64("n").unwrap(), Some(1500));
        assert!(settings.get_u64("neg").is_err());
    }

    #[test]
    fn test_instant_formats() {
        let settings = Settings::from_pairs([
            ("date", "2026-03-01"),
            ("rfc", "2026-03-01T12:30:00+02:00"),
            ("junk", "next tuesday"),
        ]);
        let date = settings.get_instant("date").unwrap().unwrap();
        assert_eq!((date.year(), date.month(), date.day(), date.hour()), (2026, 3, 1, 0));
        let rfc = settings.get_instant("rfc").unwrap().unwrap();
        assert_eq!(rfc.hour(), 10);
        assert!(settings.get_instant("junk").is_err());
    }

    #[test]
    fn test_list_parsing() {
        let settings = Settings::from_pairs([("probes", " tcp#db, ,query ,system")]);
        assert_eq!(settings.get_list("probes"), vec!["tcp#db", "query", "system"]);
        assert!(settings.get_list("absent").is_empty());
    }

    #[test]
    fn test_scoped_settings_prefix_and_masking() {
        let settings = Settings::from_pairs([
            ("mail.to", "ops@example.com"),
            ("mail.smtp_password", "hunter2"),
            ("mailer.to", "other"),
        ]);
        let scoped = settings.scoped("mail");
        assert_eq!(scoped.key("to"), "mail.to");
        assert_eq!(scoped.get("to"), Some("ops@example.com"));
        let masked = scoped.masked();
        assert_eq!(
            masked,
            vec![
                ("smtp_password".to_string(), MASKED_VALUE.to_string()),
                ("to".to_string(), "ops@example.com".to_string()),
            ]
        );
    }

    #[test]
    fn test_server_config_flattens_settings() {
        let config = ServerConfig::from_toml_str(
            r#"
listen_addr = "127.0.0.1:9000"

[settings]
probes = ["tcp#db", "system"]
renderer = "flat"
failure_policy = "abort"

[settings."tcp#db"]
host = "db.internal"
port = 5432
verbose = true
"#,
        )
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        let settings = config.settings();
        assert_eq!(settings.get_list(KEY_PROBES), vec!["tcp#db", "system"]);
        assert_eq!(settings.get("tcp#db.port"), Some("5432"));
        assert_eq!(settings.get_bool("tcp#db.verbose").unwrap(), Some(true));
    }

    #[test]
    fn test_renderer_flags_sit_beside_renderer_name() {
        let config = ServerConfig::from_toml_str(
            r#"
[settings]
probes = "system"
renderer = "tabbed"
render.show_host_info = true
render.show_config = true
"#,
        )
        .unwrap();

        let settings = config.settings();
        assert_eq!(settings.get(KEY_RENDERER), Some("tabbed"));
        let options = crate::render::RenderOptions::from_settings(&settings).unwrap();
        assert!(options.show_host_info);
        assert!(options.config.is_some());
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        let settings = config.settings();
        assert_eq!(settings.get(KEY_RENDERER), Some(DEFAULT_RENDERER));
        assert_eq!(settings.get(KEY_FAILURE_POLICY), Some(DEFAULT_FAILURE_POLICY));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(ServerConfig::from_toml_str("listen_addr = ").is_err());
    }
}
