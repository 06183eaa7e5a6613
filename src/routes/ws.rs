//! WebSocket handler — one game connection.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection ID, registers with the session and
//! enters a `select!` loop:
//! - Incoming client text → `Session::on_message`
//! - Snapshots queued by the session → forward to client
//!
//! The session never touches the socket. It only pushes into this
//! connection's channel, so a slow or dead socket can stall nobody else.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → `on_connect` assigns a role and queues the first snapshot
//! 2. Client sends actions → session mutates and broadcasts
//! 3. Close or send failure → `on_disconnect` (a player forfeits)

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::ServerMessage;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    upgrade(ws, state)
}

pub fn upgrade(ws: WebSocketUpgrade, state: AppState) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();

    // Per-connection channel for snapshots queued by the session.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(state.client_channel_capacity);

    let role = state.session.lock().await.on_connect(conn_id, client_tx);
    info!(%conn_id, %role, "ws: connection established");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        state.session.lock().await.on_message(conn_id, text.as_str());
                    }
                    Message::Binary(bytes) => {
                        let text = String::from_utf8_lossy(&bytes);
                        state.session.lock().await.on_message(conn_id, &text);
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(out) = client_rx.recv() => {
                if send_message(&mut socket, &out).await.is_err() {
                    break;
                }
            }
        }
    }

    let remaining = {
        let mut session = state.session.lock().await;
        session.on_disconnect(conn_id);
        session.client_count()
    };
    info!(%conn_id, %role, remaining, "ws: connection closed");
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), ()> {
    let json = match msg.encode() {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize message");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
