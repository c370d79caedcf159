use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use probewatch::config::{load_config, ServerConfig};
use probewatch::facade::{PickupDirTransport, SqliteExecutor};
use probewatch::logger::init_logging;
use probewatch::server::router;
use probewatch::{Collaborators, DiagnosticService, Orchestrator, Registry};

fn collaborators(config: &ServerConfig) -> Collaborators {
    let mut collaborators = Collaborators::default();
    if let Some(path) = &config.sqlite_path {
        tracing::info!(path = %path.display(), "query facade backed by SQLite");
        collaborators.query = Some(Arc::new(SqliteExecutor::new(path)));
    }
    if let Some(dir) = &config.mail_pickup_dir {
        tracing::info!(dir = %dir.display(), "mail facade backed by pickup directory");
        collaborators.mail = Some(Arc::new(PickupDirTransport::new(dir)));
    }
    collaborators
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "probewatch starting");

    let config = load_config()?;

    // A broken probe configuration still starts the server; every report
    // request then answers 500 with the reason.
    let orchestrator = Orchestrator::new(
        config.settings(),
        Registry::with_builtins(),
        collaborators(&config),
    );
    if let Err(e) = &orchestrator {
        tracing::error!(error = %e, "orchestrator failed to start");
    }
    let service = Arc::new(DiagnosticService::new(orchestrator));

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, host = service.local_hostname(), "listening");

    axum::serve(
        listener,
        router(service).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}
