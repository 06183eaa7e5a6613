mod config;
mod game;
mod protocol;
mod routes;
mod session;
mod state;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match config::ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    let state = state::AppState::new(&config);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(config.socket_addr())
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, "tictactoe server listening");
    axum::serve(listener, app).await.expect("server failed");
}
