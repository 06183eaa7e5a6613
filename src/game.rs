//! Game state machine — board, turn order, roster, win/draw detection.
//!
//! DESIGN
//! ======
//! `Game` is a plain value with no transport concerns. The session owns
//! exactly one and calls its operations by `&mut` reference while holding
//! the session lock, so every transition runs to completion before the
//! next inbound message is looked at.
//!
//! LIFECYCLE
//! =========
//! `waiting` (fewer than two players) → `playing` (both seats filled)
//! → `finished` (win, draw, or a player left) → `reset` → `waiting` or
//! `playing` depending on who is still seated.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::ErrorCode;

/// Identity of one live socket connection.
pub type ConnectionId = Uuid;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// Every line that wins: 3 rows, 3 columns, 2 diagonals.
pub const WIN_PATTERNS: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

// =============================================================================
// SYMBOLS AND ROLES
// =============================================================================

/// A player mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// The opponent's mark.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::X => "X",
            Symbol::O => "O",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a connection is allowed to do for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    X,
    O,
    #[serde(rename = "spectator")]
    Spectator,
}

impl From<Symbol> for Role {
    fn from(symbol: Symbol) -> Self {
        match symbol {
            Symbol::X => Role::X,
            Symbol::O => Role::O,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::X => f.write_str("X"),
            Role::O => f.write_str("O"),
            Role::Spectator => f.write_str("spectator"),
        }
    }
}

/// Lifecycle position of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

// =============================================================================
// BOARD
// =============================================================================

/// Nine cells, row-major. A filled cell only empties again on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [Option<Symbol>; BOARD_CELLS],
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Wire rendering: `""`, `"X"` or `"O"` per cell.
    #[must_use]
    pub fn to_wire(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|cell| cell.map_or_else(String::new, |s| s.as_str().to_owned()))
            .collect()
    }

    /// Scan all eight lines for three equal marks.
    #[must_use]
    pub fn line_owner(&self) -> Option<Symbol> {
        WIN_PATTERNS.iter().find_map(|&[a, b, c]| {
            let mark = self.cells[a]?;
            (self.cells[b] == Some(mark) && self.cells[c] == Some(mark)).then_some(mark)
        })
    }
}

// =============================================================================
// ROSTER
// =============================================================================

/// Which connection holds each seat. Everyone else is a spectator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    x: Option<ConnectionId>,
    o: Option<ConnectionId>,
}

impl Roster {
    #[must_use]
    pub fn holder(&self, symbol: Symbol) -> Option<ConnectionId> {
        match symbol {
            Symbol::X => self.x,
            Symbol::O => self.o,
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.x.is_some() && self.o.is_some()
    }

    /// Seat held by `conn_id`, if any.
    #[must_use]
    pub fn seat_of(&self, conn_id: ConnectionId) -> Option<Symbol> {
        if self.x == Some(conn_id) {
            Some(Symbol::X)
        } else if self.o == Some(conn_id) {
            Some(Symbol::O)
        } else {
            None
        }
    }

    fn slot_mut(&mut self, symbol: Symbol) -> &mut Option<ConnectionId> {
        match symbol {
            Symbol::X => &mut self.x,
            Symbol::O => &mut self.o,
        }
    }
}

// =============================================================================
// ERRORS AND OUTCOMES
// =============================================================================

/// Why a move was refused. The board is untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("Game is not in progress")]
    NotInProgress,
    #[error("It is not {0}'s turn")]
    NotYourTurn(Symbol),
    #[error("You are not playing {0}")]
    NotYourSymbol(Symbol),
    #[error("Invalid move. Try again! Position {0} is off the board")]
    OutOfRange(i64),
    #[error("Invalid move. Try again! Position {0} is already taken")]
    CellOccupied(usize),
}

impl ErrorCode for MoveError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotInProgress => "E_NOT_IN_PROGRESS",
            Self::NotYourTurn(_) => "E_NOT_YOUR_TURN",
            Self::NotYourSymbol(_) => "E_NOT_YOUR_SYMBOL",
            Self::OutOfRange(_) => "E_OUT_OF_RANGE",
            Self::CellOccupied(_) => "E_CELL_OCCUPIED",
        }
    }
}

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Play continues; `next` moves now.
    Continue { next: Symbol },
    Won(Symbol),
    Draw,
}

// =============================================================================
// GAME
// =============================================================================

/// Canonical game state plus the seat roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub board: Board,
    pub turn: Option<Symbol>,
    pub winner: Option<Symbol>,
    pub status: GameStatus,
    pub move_count: u8,
    pub roster: Roster,
    /// Set when a player leaves; no seat is handed out again until reset.
    pub seats_locked: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    #[must_use]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Some(Symbol::X),
            winner: None,
            status: GameStatus::Waiting,
            move_count: 0,
            roster: Roster::default(),
            seats_locked: false,
        }
    }

    /// Seat a new connection: X first, then O, then spectators.
    /// Filling the second seat while waiting starts the game. After a
    /// player has left, newcomers only spectate until the next reset.
    pub fn assign_role(&mut self, conn_id: ConnectionId) -> Role {
        if self.seats_locked {
            return Role::Spectator;
        }
        let role = [Symbol::X, Symbol::O]
            .into_iter()
            .find(|&symbol| self.roster.holder(symbol).is_none())
            .map_or(Role::Spectator, |symbol| {
                *self.roster.slot_mut(symbol) = Some(conn_id);
                Role::from(symbol)
            });

        if self.status == GameStatus::Waiting && self.roster.is_full() {
            self.status = GameStatus::Playing;
        }
        role
    }

    /// Vacate the seat held by `conn_id`. Losing a player ends the game
    /// immediately; `winner` stays unset so a forfeit is never mistaken
    /// for a completed line. Returns the seat that was vacated.
    pub fn release_role(&mut self, conn_id: ConnectionId) -> Option<Symbol> {
        let symbol = self.roster.seat_of(conn_id)?;
        *self.roster.slot_mut(symbol) = None;
        self.seats_locked = true;
        self.status = GameStatus::Finished;
        self.turn = None;
        Some(symbol)
    }

    /// Validate and apply one move.
    ///
    /// # Errors
    ///
    /// Returns a `MoveError` when the game is not running, it is not
    /// `symbol`'s turn, `requester` does not hold `symbol`, `position` is
    /// off the board, or the cell is taken. State is unchanged on error.
    pub fn apply_move(
        &mut self,
        symbol: Symbol,
        position: i64,
        requester: ConnectionId,
    ) -> Result<MoveOutcome, MoveError> {
        if self.status != GameStatus::Playing {
            return Err(MoveError::NotInProgress);
        }
        if self.turn != Some(symbol) {
            return Err(MoveError::NotYourTurn(symbol));
        }
        if self.roster.holder(symbol) != Some(requester) {
            return Err(MoveError::NotYourSymbol(symbol));
        }
        let index = usize::try_from(position)
            .ok()
            .filter(|&i| i < BOARD_CELLS)
            .ok_or(MoveError::OutOfRange(position))?;
        if self.board.cells[index].is_some() {
            return Err(MoveError::CellOccupied(index));
        }

        self.board.cells[index] = Some(symbol);
        self.move_count += 1;
        self.turn = Some(symbol.other());

        if let Some(owner) = self.board.line_owner() {
            self.winner = Some(owner);
            self.status = GameStatus::Finished;
            self.turn = None;
            return Ok(MoveOutcome::Won(owner));
        }
        if usize::from(self.move_count) == BOARD_CELLS {
            self.status = GameStatus::Finished;
            self.turn = None;
            return Ok(MoveOutcome::Draw);
        }
        Ok(MoveOutcome::Continue { next: symbol.other() })
    }

    /// Clear the board and start over with X. Seats are kept; an empty
    /// seat opens again for the next new connection.
    pub fn reset(&mut self) {
        self.seats_locked = false;
        self.board = Board::new();
        self.move_count = 0;
        self.winner = None;
        self.turn = Some(Symbol::X);
        self.status = if self.roster.is_full() { GameStatus::Playing } else { GameStatus::Waiting };
    }

    /// Human-readable summary of the current state.
    #[must_use]
    pub fn describe(&self) -> String {
        match (self.status, self.winner, self.turn) {
            (GameStatus::Waiting, _, _) => "Waiting for an opponent...".to_owned(),
            (GameStatus::Playing, _, Some(turn)) => format!("Player {turn}'s turn"),
            (GameStatus::Playing, _, None) => "continue with the game".to_owned(),
            (GameStatus::Finished, Some(winner), _) => format!("Player {winner} won The game"),
            (GameStatus::Finished, None, _) if usize::from(self.move_count) == BOARD_CELLS => {
                "Game Is Draw".to_owned()
            }
            (GameStatus::Finished, None, _) => "Game over. Press reset to play again".to_owned(),
        }
    }
}

#[cfg(test)]
#[path = "game_test.rs"]
mod tests;
