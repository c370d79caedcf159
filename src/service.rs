//! Request handling independent of the HTTP framework
//!
//! [`DiagnosticService::handle`] decides, in this order:
//!
//! 1. virtual-host mismatch → 403, no probe work
//! 2. `resource=` / `build=` → the bundled file or 404, no probe work
//! 3. orchestrator failed to start → 500 with the start-up error as text
//! 4. otherwise run the probes and render: 200 when everything passed, 500
//!    with the report when a failure was recorded (or the run was aborted)

use std::collections::HashMap;

use crate::constants::{PARAM_BUILD, PARAM_RESOURCE};
use crate::core::{local_hostname, Orchestrator, Report, RequestInfo, ResponseStatus, RunContext};
use crate::resources::{build_resource, static_resource, Resource};
use crate::utils::OrchestrationError;

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// An incoming diagnostic request
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// `Host` header as sent
    pub host: Option<String>,
    pub query: HashMap<String, String>,
    pub client_addr: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    fn text(status: ResponseStatus, message: impl Into<String>) -> Self {
        Self {
            status: status.code(),
            content_type: PLAIN_TEXT,
            body: message.into().into_bytes(),
        }
    }

    fn resource(resource: Resource) -> Self {
        Self {
            status: ResponseStatus::Ok.code(),
            content_type: resource.content_type,
            body: resource.bytes.into_owned(),
        }
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Strip an optional port from a `Host` header value
fn host_without_port(host: &str) -> &str {
    let host = host.trim();
    if let Some(rest) = host.strip_prefix('[') {
        // [v6]:port
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}

/// Case-insensitive host comparison, ignoring any port
pub fn host_matches(requested: Option<&str>, local: &str) -> bool {
    requested
        .map(host_without_port)
        .is_some_and(|name| name.eq_ignore_ascii_case(local))
}

/// Runs the orchestrator once per request
pub struct DiagnosticService {
    orchestrator: Result<Orchestrator, OrchestrationError>,
    local_hostname: String,
}

impl DiagnosticService {
    /// A failed orchestrator is kept so every request can report why
    pub fn new(orchestrator: Result<Orchestrator, OrchestrationError>) -> Self {
        Self {
            orchestrator,
            local_hostname: local_hostname(),
        }
    }

    pub fn with_local_hostname(mut self, name: impl Into<String>) -> Self {
        self.local_hostname = name.into();
        self
    }

    pub fn local_hostname(&self) -> &str {
        &self.local_hostname
    }

    pub fn is_ready(&self) -> bool {
        self.orchestrator.is_ok()
    }

    pub async fn handle(&self, request: Request) -> Response {
        if let Ok(orchestrator) = &self.orchestrator {
            if orchestrator.virtual_host_only()
                && !host_matches(request.host.as_deref(), &self.local_hostname)
            {
                tracing::warn!(
                    host = request.host.as_deref().unwrap_or("-"),
                    local = %self.local_hostname,
                    "rejected request for foreign host"
                );
                return Response::text(ResponseStatus::Forbidden, "403 Forbidden\n");
            }
        }

        if let Some(name) = request.query.get(PARAM_RESOURCE) {
            return Self::download(name, static_resource(name));
        }
        if let Some(name) = request.query.get(PARAM_BUILD) {
            return Self::download(name, build_resource(name));
        }

        let orchestrator = match &self.orchestrator {
            Ok(orchestrator) => orchestrator,
            Err(err) => {
                tracing::error!(error = %err, "request refused, orchestrator unavailable");
                return Response::text(
                    ResponseStatus::ServerError,
                    format!("probewatch is not configured correctly: {}\n", err),
                );
            }
        };

        let mut ctx = RunContext::new(
            RequestInfo {
                host: request.host,
                client_addr: request.client_addr,
                user_agent: request.user_agent,
            },
            self.local_hostname.clone(),
        );

        let report = match orchestrator.run(&mut ctx).await {
            Ok(report) => report,
            Err(OrchestrationError::Aborted { report, .. }) => {
                ctx.set_status(ResponseStatus::ServerError);
                *report
            }
            Err(err) => {
                tracing::error!(error = %err, "run failed before a report was produced");
                return Response::text(
                    ResponseStatus::ServerError,
                    format!("probe run failed: {}\n", err),
                );
            }
        };

        self.render(orchestrator, &report, &ctx)
    }

    fn download(name: &str, resource: Option<Resource>) -> Response {
        match resource {
            Some(resource) => {
                tracing::debug!(name, "serving bundled resource");
                Response::resource(resource)
            }
            None => {
                tracing::debug!(name, "unknown resource requested");
                Response::text(ResponseStatus::NotFound, "404 Not Found\n")
            }
        }
    }

    fn render(&self, orchestrator: &Orchestrator, report: &Report, ctx: &RunContext) -> Response {
        let mut body = Vec::new();
        match orchestrator.render(report, ctx, &mut body) {
            Ok(()) => Response {
                status: ctx.status().code(),
                content_type: orchestrator.renderer().content_type(),
                body,
            },
            Err(err) => {
                tracing::error!(error = %err, "rendering failed");
                Response::text(
                    ResponseStatus::ServerError,
                    format!("report rendering failed: {}\n", err),
                )
            }
        }
    }
}
