//! Session — the single game plus every connection watching it.
//!
//! DESIGN
//! ======
//! `Session` owns the canonical `Game` and one outbound channel per live
//! connection. The websocket layer calls `on_connect`, `on_message` and
//! `on_disconnect` as plain methods while holding the session lock, so
//! exactly one event is processed at a time. Every state change ends with
//! a broadcast of a full snapshot, tagged per recipient with its role.
//!
//! ERROR HANDLING
//! ==============
//! Delivery is best-effort: `try_send` into a closed or full channel is
//! skipped without affecting the other recipients. Malformed payloads are
//! answered privately; refused moves are broadcast so every client
//! refreshes its turn display.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::game::{ConnectionId, Game, GameStatus, MoveOutcome, Role};
use crate::protocol::{self, ClientAction, ErrorCode, ServerMessage};

const CONTINUE_MESSAGE: &str = "continue with the game";

/// One live connection: the role it was given and where its frames go.
struct Client {
    role: Role,
    tx: mpsc::Sender<ServerMessage>,
}

#[derive(Default)]
pub struct Session {
    game: Game,
    clients: HashMap<ConnectionId, Client>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered connections.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Register a connection, give it a role, and send it the current state.
    /// If its arrival starts the game, everyone hears about it.
    pub fn on_connect(&mut self, conn_id: ConnectionId, tx: mpsc::Sender<ServerMessage>) -> Role {
        let was_waiting = self.game.status == GameStatus::Waiting;
        let role = self.game.assign_role(conn_id);
        self.clients.insert(conn_id, Client { role, tx });
        info!(%conn_id, %role, clients = self.clients.len(), "session: connection registered");

        if was_waiting && self.game.status == GameStatus::Playing {
            info!("session: both players present, game started");
            self.broadcast("Both players connected. Player X's turn", None);
        } else {
            let message = self.game.describe();
            self.send_to(conn_id, |game, role| ServerMessage::snapshot(game, role, message));
        }
        role
    }

    /// Decode and apply one inbound payload.
    pub fn on_message(&mut self, conn_id: ConnectionId, text: &str) {
        match protocol::decode_action(text) {
            Ok(action) => self.apply(conn_id, action),
            Err(e) => {
                warn!(%conn_id, error = %e, "session: malformed payload");
                self.send_to(conn_id, |game, role| ServerMessage::snapshot(game, role, e.to_string()).with_error(&e));
            }
        }
    }

    /// Drop a connection. A departing player forfeits the game.
    pub fn on_disconnect(&mut self, conn_id: ConnectionId) {
        if self.clients.remove(&conn_id).is_none() {
            return;
        }

        let Some(gone) = self.game.release_role(conn_id) else {
            info!(%conn_id, clients = self.clients.len(), "session: spectator left");
            return;
        };

        let remaining = gone.other();
        let message = if self.game.roster.holder(remaining).is_some() {
            format!("Player {gone} disconnected. {remaining} wins by forfeit.")
        } else {
            format!("Player {gone} disconnected.")
        };
        info!(%conn_id, seat = %gone, clients = self.clients.len(), "session: player left, game forfeited");
        self.broadcast(&message, None);
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    fn apply(&mut self, conn_id: ConnectionId, action: ClientAction) {
        match action {
            ClientAction::Move { player, position } => match self.game.apply_move(player, position, conn_id) {
                Ok(outcome) => {
                    info!(%conn_id, %player, position, ?outcome, "session: move accepted");
                    let message = match outcome {
                        MoveOutcome::Continue { next } => {
                            debug!(%next, "session: turn passed");
                            CONTINUE_MESSAGE.to_owned()
                        }
                        MoveOutcome::Won(_) | MoveOutcome::Draw => self.game.describe(),
                    };
                    self.broadcast(&message, None);
                }
                Err(e) => {
                    warn!(%conn_id, %player, position, code = e.error_code(), "session: move rejected");
                    self.broadcast(&e.to_string(), Some(&e));
                }
            },
            ClientAction::Reset => {
                self.game.reset();
                info!(%conn_id, status = ?self.game.status, "session: game reset");
                let message = match self.game.status {
                    GameStatus::Playing => "Game reset. Player X's turn".to_owned(),
                    _ => format!("Game reset. {}", self.game.describe()),
                };
                self.broadcast(&message, None);
            }
        }
    }

    // =========================================================================
    // DELIVERY
    // =========================================================================

    /// Send the current snapshot to every connection, each tagged with its role.
    fn broadcast(&self, message: &str, err: Option<&dyn ErrorCode>) {
        for (conn_id, client) in &self.clients {
            let mut frame = ServerMessage::snapshot(&self.game, client.role, message);
            if let Some(err) = err {
                frame = frame.with_error(err);
            }
            deliver(*conn_id, client, frame);
        }
    }

    fn send_to(&self, conn_id: ConnectionId, build: impl FnOnce(&Game, Role) -> ServerMessage) {
        let Some(client) = self.clients.get(&conn_id) else {
            return;
        };
        deliver(conn_id, client, build(&self.game, client.role));
    }
}

fn deliver(conn_id: ConnectionId, client: &Client, frame: ServerMessage) {
    // Best-effort: a closed or backed-up connection just misses this one.
    if let Err(e) = client.tx.try_send(frame) {
        debug!(%conn_id, error = %e, "session: delivery skipped");
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
