//! WebSocket handler for real-time metric streaming.

use crate::web::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A connected dashboard session.
#[derive(Debug, Clone)]
pub struct ClientSession {
    /// When the session connected
    pub connected_at: SystemTime,
}

/// Registry of connected WebSocket sessions.
///
/// Presence only: sessions carry no per-client state beyond their connect
/// time. Created once at startup as part of [`AppState`].
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    inner: Arc<RwLock<HashMap<String, ClientSession>>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly connected session.
    pub async fn register(&self, session_id: String) {
        self.inner.write().await.insert(
            session_id,
            ClientSession {
                connected_at: SystemTime::now(),
            },
        );
    }

    /// Remove a disconnected session.
    pub async fn remove(&self, session_id: &str) {
        self.inner.write().await.remove(session_id);
    }

    /// Number of currently connected sessions.
    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// WebSocket upgrade handler.
pub async fn websocket_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    if state.clients.count().await >= state.max_connections {
        warn!("rejecting WebSocket connection: session limit reached");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle one WebSocket session: forward every broadcast metric event until
/// the client disconnects.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4().to_string();
    state.clients.register(session_id.clone()).await;
    info!("WebSocket client connected: {session_id}");

    let (mut sender, mut receiver) = socket.split();
    let mut events = state.events.subscribe();

    let send_id = session_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Best-effort delivery: a slow client just misses ticks.
                    warn!("client {send_id} lagged, skipped {skipped} events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(err) => error!("failed to serialize metric event: {err}"),
            }
        }
    });

    let recv_id = session_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(text)) => {
                    debug!("ignoring message from {recv_id}: {text}");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("WebSocket error for client {recv_id}: {err}");
                    break;
                }
            }
        }
    });

    // Whichever side finishes first tears the session down.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.clients.remove(&session_id).await;
    info!("WebSocket client disconnected: {session_id}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_tracks_presence() {
        let registry = ClientRegistry::new();
        assert_eq!(registry.count().await, 0);

        registry.register("a".to_string()).await;
        registry.register("b".to_string()).await;
        assert_eq!(registry.count().await, 2);

        registry.remove("a").await;
        assert_eq!(registry.count().await, 1);

        // Removing an unknown session is a no-op.
        registry.remove("missing").await;
        assert_eq!(registry.count().await, 1);
    }
}
