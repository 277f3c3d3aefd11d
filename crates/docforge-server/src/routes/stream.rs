//! `WS /ws/{client_id}` (§6.1, §4.8): forwards Stream Hub events for one
//! subscriber over a WebSocket connection. Best-effort per §4.8 — a lag
//! or a closed socket just ends the forwarding loop, it never panics
//! the server.

use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::debug;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| forward_events(socket, state, client_id))
}

async fn forward_events(mut socket: WebSocket, state: AppState, client_id: String) {
    let mut events = state.hub.attach(&client_id);
    debug!(client_id, "stream client connected");

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let Ok(payload) = serde_json::to_string(&event) else { continue };
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            message = socket.recv() => {
                if message.is_none() {
                    break;
                }
            }
        }
    }

    state.hub.detach(&client_id);
    debug!(client_id, "stream client disconnected");
}
