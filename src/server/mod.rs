//! JSON API over the retrieval and extraction core.
//!
//! Endpoints:
//! - `POST /api/fetch-videos` fetch a page and list its video references
//! - `GET /api/video-metadata` probe a single video URL
//! - `GET /api/health` liveness and feature flags

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{Config, ConfigHandle};
use crate::error::ConfigError;
use crate::retrieval::RetrievalOrchestrator;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigHandle,
}

impl AppState {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }

    /// Orchestrator for one request. Calls in flight keep the snapshot they
    /// started with.
    pub fn orchestrator(config: &Config) -> Result<RetrievalOrchestrator, ConfigError> {
        RetrievalOrchestrator::new(Arc::new(config.retrieval()))
    }
}

/// Start the web server.
pub async fn serve(config: ConfigHandle, addr: SocketAddr) -> anyhow::Result<()> {
    config.watch().await;

    let app = create_router(AppState::new(config));

    tracing::info!("Starting server at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
