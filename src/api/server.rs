use super::handlers;
use crate::core::{RateReader, RefreshJob};
use anyhow::{Context, Result};
use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Handler dependencies, built once by the entry point.
#[derive(Clone)]
pub struct AppState {
    pub reader: RateReader,
    pub refresher: Arc<RefreshJob>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/rates", get(handlers::get_rates))
        .route("/api/update-rates", get(handlers::update_rates))
        .with_state(state)
}

/// Serves on an already bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Serving rates on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Unable to serve requests")
}

pub async fn run(address: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Unable to bind {address}"))?;
    serve(listener, state).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down web server..."),
        // Without a signal handler, run until the process is killed.
        Err(_) => std::future::pending::<()>().await,
    }
}
