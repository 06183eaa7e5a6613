//! Wire protocol — JSON messages exchanged over the websocket.
//!
//! ARCHITECTURE
//! ============
//! Clients send a `ClientAction` tagged by `action`. The server answers
//! with a full `ServerMessage` snapshot every time: the board, whose turn
//! it is, the winner, a status line, and the recipient's own role. There
//! are no deltas, so any single message is enough to redraw a client.
//!
//! DESIGN
//! ======
//! - `positionToMark` accepts any whole JSON number so that negative or
//!   too-large indices are rule violations, not decode failures. Values
//!   beyond `i64` saturate; a fractional value is malformed.
//! - `error` carries a grepable code and is omitted when nothing failed.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::game::{Game, GameStatus, Role, Symbol};

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code attached to refused requests.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid json: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ErrorCode for ProtocolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "E_MALFORMED",
        }
    }
}

// =============================================================================
// CLIENT → SERVER
// =============================================================================

/// Inbound request from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientAction {
    Move {
        player: Symbol,
        #[serde(rename = "positionToMark", deserialize_with = "whole_number")]
        position: i64,
    },
    Reset,
}

#[allow(clippy::cast_possible_truncation)]
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    if number.as_u64().is_some() {
        return Ok(i64::MAX);
    }
    match number.as_f64() {
        // `as` saturates at the i64 bounds.
        Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        _ => Err(D::Error::custom(format!("positionToMark must be a whole number, got {number}"))),
    }
}

/// Decode one inbound text payload.
///
/// # Errors
///
/// Returns `ProtocolError::Malformed` if the payload is not a recognised
/// action.
pub fn decode_action(text: &str) -> Result<ClientAction, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

// =============================================================================
// SERVER → CLIENT
// =============================================================================

/// Full state snapshot, tagged with the recipient's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub board: Vec<String>,
    pub next_turn: Option<Symbol>,
    pub winner: Option<Symbol>,
    pub message: String,
    pub game_status: GameStatus,
    pub your_symbol: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerMessage {
    /// Snapshot `game` for a recipient holding `role`.
    pub fn snapshot(game: &Game, role: Role, message: impl Into<String>) -> Self {
        Self {
            board: game.board.to_wire(),
            next_turn: game.turn,
            winner: game.winner,
            message: message.into(),
            game_status: game.status,
            your_symbol: role,
            error: None,
        }
    }

    #[must_use]
    pub fn with_error(mut self, err: &(impl ErrorCode + ?Sized)) -> Self {
        self.error = Some(err.error_code().to_owned());
        self
    }

    /// Encode for the wire.
    ///
    /// # Errors
    ///
    /// Returns a serialization error; not expected for well-formed values.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
