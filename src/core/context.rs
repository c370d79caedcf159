//! Per-run request/response context
//!
//! One [`RunContext`] is built for every orchestration run. Probes read the
//! request side through it; failure policies write the response status and
//! the orchestrator-level log.

use crate::models::Entry;

/// Resolve the local host name, falling back to `localhost`
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// What the caller told us about the incoming request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// `Host` header as sent (may include a port)
    pub host: Option<String>,
    pub client_addr: Option<String>,
    pub user_agent: Option<String>,
}

/// HTTP-like status indicator for the eventual response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    Forbidden,
    NotFound,
    ServerError,
}

impl ResponseStatus {
    pub fn code(&self) -> u16 {
        match self {
            ResponseStatus::Ok => 200,
            ResponseStatus::Forbidden => 403,
            ResponseStatus::NotFound => 404,
            ResponseStatus::ServerError => 500,
        }
    }
}

/// State owned by a single orchestration run
#[derive(Debug)]
pub struct RunContext {
    request: RequestInfo,
    local_hostname: String,
    status: ResponseStatus,
    log: Vec<Entry>,
}

impl RunContext {
    pub fn new(request: RequestInfo, local_hostname: impl Into<String>) -> Self {
        Self {
            request,
            local_hostname: local_hostname.into(),
            status: ResponseStatus::Ok,
            log: Vec::new(),
        }
    }

    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    pub fn local_hostname(&self) -> &str {
        &self.local_hostname
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ResponseStatus) {
        self.status = status;
    }

    /// Append to the orchestrator-level log
    pub fn record(&mut self, entry: Entry) {
        self.log.push(entry);
    }

    pub fn log(&self) -> &[Entry] {
        &self.log
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(RequestInfo::default(), local_hostname())
    }
}
