//! Web server and API endpoints for the Home Zenith dashboard backend.
//!
//! This module provides the HTTP surface: the metrics query API, a health
//! endpoint, and WebSocket streaming for live metric updates.

pub mod config;
pub mod handlers;
pub mod router;
pub mod websocket;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;
pub use websocket::ClientRegistry;

use crate::error::{Result, ZenithError};
use crate::metrics::data::MetricEvent;
use crate::store::MetricsStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Shared application state, created once at startup and injected into every
/// handler by reference.
#[derive(Clone)]
pub struct AppState {
    /// The metrics store backing the query API
    pub store: Arc<MetricsStore>,
    /// Broadcast channel carrying newly stored samples
    pub events: broadcast::Sender<MetricEvent>,
    /// Connected WebSocket sessions
    pub clients: ClientRegistry,
    /// Maximum number of concurrent WebSocket sessions
    pub max_connections: usize,
}

impl AppState {
    /// Create the shared state for a server instance.
    pub fn new(
        store: Arc<MetricsStore>,
        events: broadcast::Sender<MetricEvent>,
        max_connections: usize,
    ) -> Self {
        Self {
            store,
            events,
            clients: ClientRegistry::new(),
            max_connections,
        }
    }
}

/// Start the web server with the provided configuration and shared state.
pub async fn start_web_server(config: WebConfig, state: AppState) -> Result<()> {
    let app = router::create_app(config.clone(), state).await?;

    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| ZenithError::config_error(format!("invalid bind address: {e}")))?;

    info!("Starting Home Zenith backend on http://{addr}");
    info!("Latest metrics: http://{addr}/api/metrics/system");
    info!("WebSocket endpoint: ws://{addr}/ws");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ZenithError::web_server_error(format!("failed to bind to address: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ZenithError::web_server_error(format!("server error: {e}")))?;

    Ok(())
}
