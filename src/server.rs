//! HTTP front end for [`DiagnosticService`]
//!
//! - `GET /` runs the probes (or serves `?resource=` / `?build=` files)
//! - `GET /health` reports liveness without running anything

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::service::{DiagnosticService, Request};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    configured: bool,
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn report(
    State(service): State<Arc<DiagnosticService>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> impl IntoResponse {
    let request = Request {
        host: header_text(&headers, header::HOST),
        query,
        client_addr: connect_info.map(|ConnectInfo(addr)| addr.to_string()),
        user_agent: header_text(&headers, header::USER_AGENT),
    };
    tracing::info!(
        host = request.host.as_deref().unwrap_or("-"),
        client = request.client_addr.as_deref().unwrap_or("-"),
        "diagnostic request"
    );

    let response = service.handle(request).await;
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
}

async fn health(State(service): State<Arc<DiagnosticService>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        configured: service.is_ready(),
    })
}

/// Build the router with all endpoints
pub fn router(service: Arc<DiagnosticService>) -> Router {
    Router::new()
        .route("/", get(report))
        .route("/health", get(health))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::core::{Collaborators, Orchestrator, Registry};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    async fn spawn(service: DiagnosticService) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::new(service));
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });
        addr
    }

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: probe-host\r\nUser-Agent: test\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    fn system_service() -> DiagnosticService {
        let settings = Settings::from_pairs([
            ("probes", "system"),
            ("renderer", "json"),
            ("failure_policy", "continue"),
        ]);
        let orchestrator =
            Orchestrator::new(settings, Registry::with_builtins(), Collaborators::default());
        DiagnosticService::new(orchestrator).with_local_hostname("probe-host")
    }

    #[tokio::test]
    async fn test_report_endpoint() {
        let addr = spawn(system_service()).await;

        let response = get(addr, "/").await;

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("content-type: application/json"));
        assert!(response.contains("\"success\": true"));
        assert!(response.contains("client_addr=127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_resource_and_health_endpoints() {
        let addr = spawn(system_service()).await;

        let css = get(addr, "/?resource=probewatch.css").await;
        assert!(css.starts_with("HTTP/1.1 200"));
        assert!(css.contains("content-type: text/css"));

        let missing = get(addr, "/?build=secrets.txt").await;
        assert!(missing.starts_with("HTTP/1.1 404"));

        let health = get(addr, "/health").await;
        assert!(health.contains("\"status\":\"healthy\""));
        assert!(health.contains("\"configured\":true"));
    }
}
