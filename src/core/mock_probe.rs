//! Scripted probe for orchestration tests
//!
//! Registered under the `scripted` type. The label of the identifier
//! (`scripted#<label>`) selects the behavior set with [`Tracker::script`];
//! an identifier without a script fails to instantiate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::context::RunContext;
use super::probe::{BaseProbe, Probe};
use super::registry::Registry;
use crate::constants::PROBE_LABEL_SEPARATOR;
use crate::utils::ProbeError;

#[derive(Debug, Clone, Copy)]
pub enum Script {
    Pass,
    FailAfterError,
    Sleep(Duration),
}

/// Shared counters plus the label → script table
#[derive(Debug, Clone, Default)]
pub struct Tracker {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    pub instantiated: Arc<AtomicUsize>,
    pub executed: Arc<AtomicUsize>,
    pub cleaned: Arc<AtomicUsize>,
}

impl Tracker {
    pub fn script(&self, label: &str, script: Script) {
        self.scripts.lock().unwrap().insert(label.to_string(), script);
    }

    fn lookup(&self, label: &str) -> Option<Script> {
        self.scripts.lock().unwrap().get(label).copied()
    }
}

pub struct ScriptedProbe {
    base: BaseProbe,
    script: Script,
    tracker: Tracker,
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn base(&self) -> &BaseProbe {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseProbe {
        &mut self.base
    }

    async fn execute(&mut self, _ctx: &RunContext) -> Result<(), ProbeError> {
        self.tracker.executed.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Pass => {
                self.base.info("scripted pass");
                Ok(())
            }
            Script::FailAfterError => {
                self.base.error("scripted failure");
                Err(ProbeError::Check("scripted".to_string()))
            }
            Script::Sleep(duration) => {
                tokio::time::sleep(duration).await;
                self.base.info("woke up");
                Ok(())
            }
        }
    }

    async fn cleanup(&mut self) {
        self.tracker.cleaned.fetch_add(1, Ordering::SeqCst);
    }
}

/// Built-in registry plus the `scripted` probe type
pub fn scripted_registry(tracker: &Tracker) -> Registry {
    let mut registry = Registry::with_builtins();
    let tracker = tracker.clone();
    registry.register_probe("scripted", move |id, _| {
        let label = id
            .split_once(PROBE_LABEL_SEPARATOR)
            .map(|(_, label)| label)
            .unwrap_or("");
        let script = tracker
            .lookup(label)
            .ok_or_else(|| format!("no script for '{}'", label))?;
        tracker.instantiated.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedProbe {
            base: BaseProbe::new(id),
            script,
            tracker: tracker.clone(),
        }) as Box<dyn Probe>)
    });
    registry
}
