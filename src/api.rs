//! Debug/telemetry API
//!
//! Read-only snapshot of the live pointer list and interaction mode over
//! HTTP and WebSocket, plus the entry points for the external mode triggers
//! (secondary trigger enters Edit, cancel returns to View).
//! Default port: 8126

use crate::dispatch::DispatchEvent;
use crate::effects::EffectFrame;
use crate::mode::ModeController;
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tower_http::cors::CorsLayer;

/// Default API port
pub const DEFAULT_API_PORT: u16 = 8126;

/// One pointer as exposed to the debug consumer.
#[derive(Debug, Clone, Serialize)]
pub struct PointerInfo {
    pub x: f32,
    pub y: f32,
    pub gesture: String,
    pub handedness: String,
    /// Overlay styling hint (open vs closed).
    pub color: String,
    pub fresh: bool,
}

/// Snapshot published to the debug consumer after every tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StateSnapshot {
    /// Wall-clock time of the snapshot (ms since epoch).
    pub timestamp_ms: i64,
    pub mode: String,
    pub pointers: Vec<PointerInfo>,
    pub effects: Vec<EffectFrame>,
    pub recent_dispatches: Vec<DispatchEvent>,
    pub dropped_frames: u64,
}

impl StateSnapshot {
    pub fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Shared state for API handlers
pub struct ApiState {
    /// Latest published snapshot
    pub snapshot: Arc<parking_lot::RwLock<StateSnapshot>>,
    /// Mode controller driven by the external triggers
    pub mode: Arc<ModeController>,
    /// Broadcast channel for snapshot pushes
    pub update_tx: broadcast::Sender<StateSnapshot>,
}

impl ApiState {
    pub fn new(mode: Arc<ModeController>) -> Arc<Self> {
        let (update_tx, _) = broadcast::channel(16);
        Arc::new(Self {
            snapshot: Arc::new(parking_lot::RwLock::new(StateSnapshot::default())),
            mode,
            update_tx,
        })
    }

    /// Publish a new snapshot and push it to WebSocket subscribers.
    pub fn publish(&self, snapshot: StateSnapshot) {
        *self.snapshot.write() = snapshot.clone();
        // No subscribers is fine.
        let _ = self.update_tx.send(snapshot);
    }
}

/// Build the API router
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/ws", get(ws_handler))
        .route("/mode/edit", post(mode_edit))
        .route("/mode/cancel", post(mode_cancel))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the API server until the process exits.
pub async fn run_server(state: Arc<ApiState>, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind API server on {}", addr))?;
    info!("Debug API listening on http://{}", addr);
    axum::serve(listener, app)
        .await
        .context("API server failed")?;
    Ok(())
}

async fn get_state(State(state): State<Arc<ApiState>>) -> Json<StateSnapshot> {
    Json(state.snapshot.read().clone())
}

/// External secondary trigger: enter Edit mode.
async fn mode_edit(State(state): State<Arc<ApiState>>) -> StatusCode {
    state.mode.enter_edit();
    StatusCode::NO_CONTENT
}

/// External cancel trigger: back to View mode.
async fn mode_cancel(State(state): State<Arc<ApiState>>) -> StatusCode {
    state.mode.cancel();
    StatusCode::NO_CONTENT
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<ApiState>) {
    debug!("Debug consumer connected via WebSocket");
    let mut rx = state.update_tx.subscribe();

    loop {
        match rx.recv().await {
            Ok(snapshot) => {
                let payload = match serde_json::to_string(&snapshot) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Failed to serialize snapshot: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    debug!("Debug consumer disconnected");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!("Debug consumer lagged, skipped {} snapshot(s)", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_updates_snapshot() {
        let state = ApiState::new(Arc::new(ModeController::new()));
        state.publish(StateSnapshot {
            timestamp_ms: 42,
            mode: "view".to_string(),
            dropped_frames: 3,
            ..Default::default()
        });
        let snapshot = state.snapshot.read();
        assert_eq!(snapshot.timestamp_ms, 42);
        assert_eq!(snapshot.dropped_frames, 3);
    }

    #[tokio::test]
    async fn test_mode_endpoints_drive_controller() {
        let mode = Arc::new(ModeController::new());
        let state = ApiState::new(mode.clone());

        assert_eq!(mode_edit(State(state.clone())).await, StatusCode::NO_CONTENT);
        assert_eq!(mode.current(), crate::mode::InteractionMode::Edit);

        assert_eq!(mode_cancel(State(state)).await, StatusCode::NO_CONTENT);
        assert_eq!(mode.current(), crate::mode::InteractionMode::View);
    }
}
