//! Host facts about the machine running the service
//!
//! Logs host and request details as a key/value table. With
//! `<id>.paths` (comma-separated) it also checks that each path exists.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::constants::NOT_AVAILABLE;
use crate::core::{BaseProbe, Probe, RunContext};
use crate::format::KeyValueFormatter;
use crate::models::Entry;
use crate::utils::{ConfigError, ProbeError};

pub struct SystemInfoProbe {
    base: BaseProbe,
    paths: Vec<PathBuf>,
}

impl SystemInfoProbe {
    pub fn new(id: &str) -> Self {
        Self {
            base: BaseProbe::new(id),
            paths: Vec::new(),
        }
    }
}

fn host_facts(ctx: &RunContext) -> String {
    let request = ctx.request();
    let or_na = |value: &Option<String>| value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| NOT_AVAILABLE.to_string());
    let cpus = std::thread::available_parallelism()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| NOT_AVAILABLE.to_string());

    [
        ("hostname", ctx.local_hostname().to_string()),
        ("os", std::env::consts::OS.to_string()),
        ("arch", std::env::consts::ARCH.to_string()),
        ("cpus", cpus),
        ("pid", std::process::id().to_string()),
        ("working_dir", cwd),
        ("version", env!("CARGO_PKG_VERSION").to_string()),
        ("request_host", or_na(&request.host)),
        ("client_addr", or_na(&request.client_addr)),
        ("user_agent", or_na(&request.user_agent)),
    ]
    .iter()
    .map(|(key, value)| format!("{}={}", key, value))
    .collect::<Vec<_>>()
    .join("\n")
}

#[async_trait]
impl Probe for SystemInfoProbe {
    fn base(&self) -> &BaseProbe {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseProbe {
        &mut self.base
    }

    fn configure(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        self.base.configure(settings)?;
        self.paths = self
            .base
            .scoped(settings)
            .get_list("paths")
            .into_iter()
            .map(PathBuf::from)
            .collect();
        Ok(())
    }

    async fn execute(&mut self, ctx: &RunContext) -> Result<(), ProbeError> {
        self.base
            .log_with(Entry::info(host_facts(ctx)), Arc::new(KeyValueFormatter));

        let mut missing = Vec::new();
        for path in &self.paths {
            match tokio::fs::metadata(path).await {
                Ok(meta) => {
                    let kind = if meta.is_dir() { "directory" } else { "file" };
                    self.base
                        .info(format!("{} present ({})", path.display(), kind));
                }
                Err(err) => {
                    self.base
                        .error_with_cause(format!("{} is not accessible", path.display()), &err);
                    missing.push(path.display().to_string());
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProbeError::Check(format!("missing: {}", missing.join(", "))))
        }
    }
}
