//! Server startup and graceful shutdown

use anyhow::{Context, Result};
use axum::Router;
use reelgrab_core::Config;
use tokio::task::JoinHandle;

/// Start the server with graceful shutdown
///
/// The retention sweep, when running, is aborted once the server has drained.
pub async fn start_server(config: &Config, app: Router, sweep: Option<JoinHandle<()>>) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        storage_dir = %config.storage_dir().display(),
        retention_ttl_secs = config.retention_ttl().as_secs(),
        attempt_timeout_ms = config.attempt_timeout().as_millis() as u64,
        transfer_timeout_ms = config.transfer_timeout().as_millis() as u64,
        max_media_mb = config.max_media_bytes() / 1024 / 1024,
        resolution_mode = %config.resolution_mode(),
        "Server ready and accepting connections"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(sweep) = sweep {
        sweep.abort();
        tracing::debug!("Retention sweep stopped");
    }

    served?;
    tracing::info!("Server stopped");
    Ok(())
}

/// Signal handler for graceful shutdown
///
/// Listens for Ctrl+C (SIGINT) and SIGTERM signals to initiate graceful shutdown.
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
