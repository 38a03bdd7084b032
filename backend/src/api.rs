//! HTTP and WebSocket surface
//!
//! - `GET /ws` - real-time channel, one JSON message per text frame
//! - `GET /health` - liveness
//! - `GET /stats` - live session, queue and connection counts
//! - `GET /scores/{name}` - recorded tally for a display name

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::game::{GameServerHandle, ServerStats};
use crate::scores::ScoreStore;
use shared::{ClientMessage, ErrorReason, Score, ServerMessage};

#[derive(Clone)]
pub struct AppState {
    pub server: GameServerHandle,
    pub scores: Arc<dyn ScoreStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/scores/{name}", get(score_of))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn stats(State(state): State<AppState>) -> Result<Json<ServerStats>, StatusCode> {
    state
        .server
        .stats()
        .await
        .map(Json)
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

async fn score_of(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Score>, StatusCode> {
    match state.scores.score(&name).await {
        Ok(Some(score)) => Ok(Json(score)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(err) => {
            error!("[BACKEND] Score lookup for {} failed: {}", name, err);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.server))
}

async fn handle_socket(socket: WebSocket, server: GameServerHandle) {
    let (outbound, mut notifications) = mpsc::unbounded_channel::<ServerMessage>();
    let connection = server.connect(outbound.clone());
    let (mut sender, mut receiver) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(message) = notifications.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(err) => {
                    error!("[BACKEND] Failed to encode {:?}: {}", message, err);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = receiver.next().await {
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(message) => server.send(connection, message),
            Err(err) => {
                warn!("[BACKEND] Unreadable frame from {}: {}", connection, err);
                let _ = outbound.send(ServerMessage::Error {
                    reason: ErrorReason::InvalidMessage,
                    message: format!("Invalid message: {}", err),
                });
            }
        }
    }

    debug!("[BACKEND] Socket for {} closed", connection);
    server.disconnect(connection);
    writer.abort();
}
