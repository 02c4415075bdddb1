//! HamClock Update Web
//!
//! Small dashboard for the scheduled HamClock update job: timer status,
//! update log, installed version, checkout state, and a button that runs the
//! update script with live output.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod logging;
pub mod services;
pub mod state;

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use config::DashboardConfig;
use state::AppState;

/// Serve the dashboard until Ctrl-C / SIGTERM
pub async fn run(config: DashboardConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    let state = Arc::new(AppState::new(config));
    let shutdown = state.shutdown.clone();
    let app = api::router(state.clone());

    info!(addr = %addr, "Serving at port {}", state.config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("server error")?;

    info!("Server stopped by user");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM and cancel running update streams
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => {},
    }

    info!("Shutdown signal received");
    token.cancel();
}
