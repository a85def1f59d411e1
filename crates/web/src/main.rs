use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use chess_master_core::{GameSession, GameSettings, SessionHandle};

mod routes;

const CONFIG_ENV: &str = "CHESS_MASTER_CONFIG";
const BIND_ADDR: &str = "127.0.0.1:3000";

pub struct AppState {
    pub session: SessionHandle,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/state", get(routes::state))
        .route("/select", post(routes::select))
        .route("/move", post(routes::make_move))
        .route("/new", post(routes::new_game))
        .route("/settings", post(routes::update_settings))
        .route("/mode", post(routes::set_mode))
        .route("/difficulty", post(routes::set_difficulty))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn load_settings() -> chess_master_core::Result<GameSettings> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            tracing::info!(%path, "loading settings");
            GameSettings::load(path)
        }
        Err(_) => Ok(GameSettings::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings()?;
    let state = Arc::new(AppState {
        session: SessionHandle::new(GameSession::new(settings)),
    });

    let listener = tokio::net::TcpListener::bind(BIND_ADDR).await?;
    tracing::info!("Server running at http://{}", BIND_ADDR);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
