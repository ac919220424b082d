//! WebSocket stream of published envelopes.
//!
//! Each client receives every [`Envelope`](crate::publish::Envelope)
//! published after it connects, as one JSON text frame. A client that
//! falls behind skips to the newest envelope.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::AppState;

/// `GET /ws` → WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_envelopes(socket, state))
}

async fn stream_envelopes(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.publisher.subscribe();
    debug!(clients = state.publisher.subscriber_count(), "websocket client connected");

    loop {
        tokio::select! {
            result = rx.recv() => match result {
                Ok(envelope) => {
                    let json = match serde_json::to_string(&envelope) {
                        Ok(j) => j,
                        Err(e) => {
                            warn!("failed to serialize envelope: {e}");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        debug!("websocket client disconnected (send failed)");
                        return;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "websocket client lagged");
                }
                Err(RecvError::Closed) => return,
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | None => {
                    debug!("websocket client disconnected");
                    return;
                }
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        return;
                    }
                }
                Some(Err(e)) => {
                    debug!("websocket error: {e}");
                    return;
                }
                // Clients only listen.
                Some(Ok(_)) => {}
            },
        }
    }
}
