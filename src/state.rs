//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the one game session behind a mutex; handlers lock it for the
//! duration of a single event and never across an await on the socket.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::session::Session;

/// Shared application state. Clone is required by Axum; inner fields are
/// Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub client_channel_capacity: usize,
}

impl AppState {
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new())),
            client_channel_capacity: config.client_channel_capacity,
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// `AppState` with default configuration and a fresh session.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(&ServerConfig::default())
    }
}
