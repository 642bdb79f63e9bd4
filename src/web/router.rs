//! Web application router and middleware setup.

use crate::error::Result;
use crate::web::config::WebConfig;
use crate::web::handlers;
use crate::web::websocket;
use crate::web::AppState;
use axum::{routing::get, Router};
use std::path::PathBuf;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Create the main axum application with all routes and middleware.
pub async fn create_app(config: WebConfig, state: AppState) -> Result<Router> {
    let mut app = Router::new()
        .route("/", get(handlers::root))
        // Metrics query API
        .route("/api/metrics/system", get(handlers::latest_system))
        .route("/api/metrics/system/history", get(handlers::system_history))
        .route("/api/metrics/network", get(handlers::latest_network))
        .route(
            "/api/metrics/network/history",
            get(handlers::network_history),
        )
        .route("/api/health", get(handlers::health_check))
        // WebSocket route
        .route("/ws", get(websocket::websocket_handler));

    // Serve the dashboard's built assets if a path is configured
    if let Some(static_path) = &config.static_path {
        let static_path = PathBuf::from(static_path);

        if static_path.exists() {
            info!("Serving static files from: {:?}", static_path);
            app = app.nest_service("/static", ServeDir::new(&static_path));
        } else {
            warn!(
                "Static path {:?} does not exist, skipping static file serving",
                static_path
            );
        }
    }

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let app = app
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state);

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::collector::EVENT_CHANNEL_CAPACITY;
    use crate::store::MetricsStore;
    use std::sync::Arc;
    use tokio::sync::broadcast;

    #[tokio::test]
    async fn test_create_app() {
        let store = Arc::new(MetricsStore::open_in_memory(0).unwrap());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = AppState::new(store, events, 100);

        let app = create_app(WebConfig::default(), state).await;
        assert!(app.is_ok());
    }
}
