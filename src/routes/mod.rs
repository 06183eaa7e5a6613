//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One endpoint serves both the websocket and a plaintext liveness body:
//! an upgrade request on `/` (or `/ws`) joins the game, any other request
//! of any method gets `Server running`. `/healthz` answers with a bare 200.

pub mod ws;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Body returned to plain HTTP requests.
pub const LIVENESS_BODY: &str = "Server running";

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", any(root))
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .fallback(liveness)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Upgrade when asked to, otherwise report liveness.
async fn root(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match upgrade {
        Ok(ws) => ws::upgrade(ws, state),
        Err(_) => LIVENESS_BODY.into_response(),
    }
}

async fn liveness() -> &'static str {
    LIVENESS_BODY
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
