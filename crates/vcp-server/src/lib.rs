//! HTTP and WebSocket front end for the VCP hub

pub mod app;
pub mod args;
pub mod auth;
pub mod error;
pub mod logging;
pub mod routes;
pub mod ws;

pub use app::{AppState, build_router};
pub use args::{Cli, Commands, ConfigAction};
pub use error::ApiError;

use anyhow::Context;
use std::future::Future;
use tokio::net::TcpListener;

/// Bind the configured address and serve until SIGINT or SIGTERM
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let address = state.config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    serve_with_shutdown(listener, state, shutdown_signal()).await
}

/// Serve on an already-bound listener until `signal` resolves
pub async fn serve_with_shutdown<S>(
    listener: TcpListener,
    state: AppState,
    signal: S,
) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;
    let background = state.start_background();
    let router = build_router(state.clone());

    tracing::info!(%address, hub_path = %state.config.hub.path, "vcp server listening");

    let shutdown_state = state.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal.await;
            tracing::info!("shutting down");
            shutdown_state.shutdown().await;
        })
        .await
        .context("server error")?;

    for handle in background {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "background task ended abnormally");
        }
    }
    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to register SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
