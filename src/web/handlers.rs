//! HTTP handlers for the metrics query API.

use crate::error::ZenithError;
use crate::web::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

/// Default history window in hours when the query does not specify one.
const DEFAULT_HISTORY_HOURS: i64 = 24;

/// Query parameters for the history endpoints.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub hours: Option<i64>,
}

impl HistoryQuery {
    /// The inclusive lower bound of the requested window, in epoch seconds.
    fn since(&self) -> i64 {
        let hours = self.hours.unwrap_or(DEFAULT_HISTORY_HOURS);
        Utc::now().timestamp().saturating_sub(hours.saturating_mul(3_600))
    }
}

/// Root banner, kept for dashboard connectivity checks.
pub async fn root() -> &'static str {
    "Home Zenith Dashboard Backend API"
}

/// Latest system sample, or an empty object when none exist yet.
pub async fn latest_system(State(state): State<AppState>) -> Response {
    match state.store.latest_system() {
        Ok(Some(sample)) => Json(sample).into_response(),
        Ok(None) => Json(json!({})).into_response(),
        Err(err) => store_error("latest system metrics", &err),
    }
}

/// System samples from the requested window, ascending by timestamp.
pub async fn system_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    match state.store.system_history_since(query.since()) {
        Ok(samples) => Json(samples).into_response(),
        Err(err) => store_error("system metrics history", &err),
    }
}

/// Latest network sample, or an empty object when none exist yet.
pub async fn latest_network(State(state): State<AppState>) -> Response {
    match state.store.latest_network() {
        Ok(Some(sample)) => Json(sample).into_response(),
        Ok(None) => Json(json!({})).into_response(),
        Err(err) => store_error("latest network metrics", &err),
    }
}

/// Network samples from the requested window, ascending by timestamp.
pub async fn network_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    match state.store.network_history_since(query.since()) {
        Ok(samples) => Json(samples).into_response(),
        Err(err) => store_error("network metrics history", &err),
    }
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "home-zenith",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "connected_clients": state.clients.count().await,
    }))
}

fn store_error(what: &str, err: &ZenithError) -> Response {
    error!("failed to read {what}: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::collector::EVENT_CHANNEL_CAPACITY;
    use crate::metrics::data::{NetworkSampleDraft, SystemSampleDraft};
    use crate::store::MetricsStore;
    use crate::web::{create_app, WebConfig};
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let store = Arc::new(MetricsStore::open_in_memory(0).unwrap());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        AppState::new(store, events, 100)
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let app = create_app(WebConfig::default(), state).await.unwrap();
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap();
        (status, value)
    }

    fn system_draft() -> SystemSampleDraft {
        SystemSampleDraft {
            cpu_usage: 33.3,
            memory_used: 3.7,
            memory_total: 8.0,
            disk_used: 20.1,
            disk_total: 100.0,
            temperature: Some(51.0),
            uptime: 3_600,
        }
    }

    #[tokio::test]
    async fn test_latest_system_empty_store_returns_empty_object() {
        let (status, body) = get_json(test_state(), "/api/metrics/system").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_latest_network_empty_store_returns_empty_object() {
        let (status, body) = get_json(test_state(), "/api/metrics/network").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_latest_system_returns_stored_row() {
        let state = test_state();
        state.store.insert_system(&system_draft()).unwrap();

        let (status, body) = get_json(state, "/api/metrics/system").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cpu_usage"], 33.3);
        assert_eq!(body["memory_used"], 3.7);
        assert_eq!(body["temperature"], 51.0);
    }

    #[tokio::test]
    async fn test_history_filters_to_requested_window() {
        let state = test_state();
        let now = Utc::now().timestamp();

        // One row well outside a 24h window, one inside.
        state
            .store
            .insert_system_at(&system_draft(), now - 48 * 3_600)
            .unwrap();
        state
            .store
            .insert_system_at(&system_draft(), now - 3_600)
            .unwrap();

        let (status, body) = get_json(state, "/api/metrics/system/history").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["timestamp"], now - 3_600);
    }

    #[tokio::test]
    async fn test_history_honors_hours_parameter() {
        let state = test_state();
        let now = Utc::now().timestamp();
        state
            .store
            .insert_system_at(&system_draft(), now - 48 * 3_600)
            .unwrap();
        state
            .store
            .insert_system_at(&system_draft(), now - 3_600)
            .unwrap();

        let (status, body) = get_json(state, "/api/metrics/system/history?hours=72").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_history_empty_store_returns_empty_array() {
        let (status, body) = get_json(test_state(), "/api/metrics/network/history").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_network_latest_returns_stored_row() {
        let state = test_state();
        state
            .store
            .insert_network(&NetworkSampleDraft {
                interface_name: "eth0".to_string(),
                download_speed: 5.4,
                upload_speed: 0.3,
                connected_devices: None,
            })
            .unwrap();

        let (status, body) = get_json(state, "/api/metrics/network").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["interface_name"], "eth0");
        // absent probe result is omitted, not null
        assert!(body.get("connected_devices").is_none());
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_500_with_message() {
        let state = test_state();
        state.store.execute_batch("DROP TABLE system_metrics").unwrap();

        let (status, body) = get_json(state, "/api/metrics/system").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("system_metrics"));
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = get_json(test_state(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "home-zenith");
        assert_eq!(body["connected_clients"], 0);
    }
}
