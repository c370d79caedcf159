//! Name → constructor maps for probes, renderers and failure policies
//!
//! Identifiers in the configuration are resolved here. The orchestrator
//! checks every identifier against the registry when it is built, so an
//! unknown name is a start-up error rather than a mid-run surprise.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::policy::{FailurePolicy, LogAndAbort, LogAndContinue};
use super::probe::Probe;
use crate::config::Settings;
use crate::constants::PROBE_LABEL_SEPARATOR;
use crate::facade::{MailTransport, QueryExecutor};
use crate::probes;
use crate::render::{self, Renderer};
use crate::utils::{ConfigError, OrchestrationError};

/// External collaborators handed to probe constructors
#[derive(Clone, Default)]
pub struct Collaborators {
    pub query: Option<Arc<dyn QueryExecutor>>,
    pub mail: Option<Arc<dyn MailTransport>>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("query", &self.query.as_ref().map(|q| q.source_name().to_string()))
            .field("mail", &self.mail.as_ref().map(|m| m.name().to_string()))
            .finish()
    }
}

/// Builds a probe for the given identifier
pub type ProbeFactory =
    Arc<dyn Fn(&str, &Collaborators) -> Result<Box<dyn Probe>, String> + Send + Sync>;

/// Builds a renderer from the shared settings
pub type RendererFactory =
    Arc<dyn Fn(&Settings) -> Result<Box<dyn Renderer>, ConfigError> + Send + Sync>;

pub type PolicyFactory = Arc<dyn Fn() -> Box<dyn FailurePolicy> + Send + Sync>;

/// Probe type part of an identifier (`tcp#db` → `tcp`)
pub fn probe_type(id: &str) -> &str {
    id.split(PROBE_LABEL_SEPARATOR).next().unwrap_or(id)
}

#[derive(Clone, Default)]
pub struct Registry {
    probes: BTreeMap<String, ProbeFactory>,
    renderers: BTreeMap<String, RendererFactory>,
    policies: BTreeMap<String, PolicyFactory>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every bundled probe, renderer and policy
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        probes::register_builtins(&mut registry);
        render::register_builtins(&mut registry);
        registry.register_policy("continue", || Box::new(LogAndContinue));
        registry.register_policy("abort", || Box::new(LogAndAbort));
        registry
    }

    pub fn register_probe<F>(&mut self, type_name: &str, factory: F)
    where
        F: Fn(&str, &Collaborators) -> Result<Box<dyn Probe>, String> + Send + Sync + 'static,
    {
        self.probes.insert(type_name.to_string(), Arc::new(factory));
    }

    pub fn register_renderer<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Settings) -> Result<Box<dyn Renderer>, ConfigError> + Send + Sync + 'static,
    {
        self.renderers.insert(name.to_string(), Arc::new(factory));
    }

    pub fn register_policy<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn FailurePolicy> + Send + Sync + 'static,
    {
        self.policies.insert(name.to_string(), Arc::new(factory));
    }

    pub fn has_probe(&self, id: &str) -> bool {
        self.probes.contains_key(probe_type(id))
    }

    pub fn probe_types(&self) -> impl Iterator<Item = &str> {
        self.probes.keys().map(String::as_str)
    }

    pub fn create_probe(
        &self,
        id: &str,
        collaborators: &Collaborators,
    ) -> Result<Box<dyn Probe>, OrchestrationError> {
        let factory = self
            .probes
            .get(probe_type(id))
            .ok_or_else(|| OrchestrationError::UnknownProbe(id.to_string()))?;
        factory(id, collaborators).map_err(|reason| OrchestrationError::Instantiate {
            component: "probe",
            id: id.to_string(),
            reason,
        })
    }

    pub fn create_renderer(
        &self,
        name: &str,
        settings: &Settings,
    ) -> Result<Box<dyn Renderer>, OrchestrationError> {
        let factory = self
            .renderers
            .get(name)
            .ok_or_else(|| OrchestrationError::UnknownRenderer(name.to_string()))?;
        factory(settings).map_err(|e| OrchestrationError::Instantiate {
            component: "renderer",
            id: name.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn create_policy(&self, name: &str) -> Result<Box<dyn FailurePolicy>, OrchestrationError> {
        self.policies
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| OrchestrationError::UnknownPolicy(name.to_string()))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("probes", &self.probes.keys().collect::<Vec<_>>())
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .field("policies", &self.policies.keys().collect::<Vec<_>>())
            .finish()
    }
}
