use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::state::AppState;
use crate::session::{ClientMessage, SessionCoordinator, SessionEvent};

/// GET /sessions/:session_id/ws
/// Attach an observer: inbound control/audio messages, outbound events.
pub async fn session_ws(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    let coordinator = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    match coordinator {
        Some(coordinator) => ws.on_upgrade(move |socket| handle_socket(socket, coordinator)),
        None => (StatusCode::NOT_FOUND, "session not found").into_response(),
    }
}

async fn handle_socket(socket: WebSocket, coordinator: Arc<SessionCoordinator>) {
    info!("Observer attached to {}", coordinator.id());
    coordinator.observer_attached().await;

    let mut events = coordinator.subscribe();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let frame = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("Failed to serialize event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                // Best-effort delivery: a slow observer just misses events.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "Observer on {} lagged, {} events dropped",
                        coordinator.id(),
                        skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => coordinator.handle_message(message).await,
                        Err(e) => {
                            let error = SessionEvent::Error {
                                message: format!("unrecognized message: {e}"),
                            };
                            if let Ok(frame) = serde_json::to_string(&error) {
                                let _ = sender.send(Message::Text(frame)).await;
                            }
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // binary/ping/pong: nothing to do
                Some(Err(e)) => {
                    warn!("Socket error on {}: {}", coordinator.id(), e);
                    break;
                }
            },
        }
    }

    coordinator.observer_detached().await;
    info!("Observer detached from {}", coordinator.id());
}
