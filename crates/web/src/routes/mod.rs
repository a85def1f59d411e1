use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use chess_master_core::{
    clock::format_seconds, rules, Difficulty, Error, GameMode, GameSettings, GameStatus, MovePair,
    SessionEvent, SessionSnapshot,
};

use crate::AppState;

// ============================================================================
// VIEWS
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub fen: String,
    pub turn: &'static str,
    pub status: StatusView,
    pub moves: Vec<String>,
    pub move_pairs: Vec<MovePair>,
    pub clock: ClockView,
    pub selected: Option<String>,
    pub destinations: Vec<String>,
    pub settings: GameSettings,
    pub active_difficulty: Difficulty,
    pub generation: u64,
    pub events: Vec<EventView>,
}

#[derive(Serialize)]
pub struct StatusView {
    pub kind: &'static str,
    pub reason: String,
    pub terminal: bool,
    pub winner: Option<&'static str>,
    pub check: Option<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockView {
    pub white: u32,
    pub black: u32,
    pub white_display: String,
    pub black_display: String,
    pub running: bool,
}

#[derive(Serialize)]
pub struct EventView {
    pub kind: &'static str,
    pub message: String,
}

impl From<GameStatus> for StatusView {
    fn from(status: GameStatus) -> Self {
        let check = match status {
            GameStatus::Check(side) => Some(rules::color_name(side)),
            _ => None,
        };
        StatusView {
            kind: status.as_str(),
            reason: status.reason(),
            terminal: status.is_terminal(),
            winner: status.winner().map(rules::color_name),
            check,
        }
    }
}

impl From<SessionEvent> for EventView {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::NewGame { .. } => EventView {
                kind: "new_game",
                message: "New game started!".to_string(),
            },
            SessionEvent::MoveApplied { san, mover } => EventView {
                kind: "move",
                message: format!("{} played {}", rules::color_name(mover), san),
            },
            SessionEvent::Check(_) => EventView {
                kind: "check",
                message: "Check!".to_string(),
            },
            SessionEvent::GameOver(status) => {
                let message = match status.winner() {
                    Some(winner) => format!("{} wins! {}", rules::color_name(winner), status.reason()),
                    None => status.reason(),
                };
                EventView { kind: "game_over", message }
            }
            SessionEvent::InvalidMove(_) => EventView {
                kind: "invalid_move",
                message: "Invalid move!".to_string(),
            },
        }
    }
}

fn view(snapshot: SessionSnapshot, events: Vec<SessionEvent>) -> StateView {
    StateView {
        fen: snapshot.fen,
        turn: rules::color_name(snapshot.turn),
        status: snapshot.status.into(),
        moves: snapshot.moves,
        move_pairs: snapshot.move_pairs,
        clock: ClockView {
            white: snapshot.clock.white,
            black: snapshot.clock.black,
            white_display: format_seconds(snapshot.clock.white),
            black_display: format_seconds(snapshot.clock.black),
            running: snapshot.clock.running,
        },
        selected: snapshot.selected.map(|sq| sq.to_string()),
        destinations: snapshot.destinations.iter().map(|sq| sq.to_string()).collect(),
        settings: snapshot.settings,
        active_difficulty: snapshot.active_difficulty,
        generation: snapshot.generation,
        events: events.into_iter().map(EventView::from).collect(),
    }
}

fn current(state: &AppState) -> Json<StateView> {
    let events = state.session.drain_events();
    Json(view(state.session.snapshot(), events))
}

// ============================================================================
// ERRORS
// ============================================================================

pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidMove(_) | Error::PreconditionViolation(_) | Error::Config(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::StaleResponse { .. } => StatusCode::CONFLICT,
            Error::Json(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Deserialize)]
pub struct SelectRequest {
    pub square: String,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
}

#[derive(Deserialize)]
pub struct ModeRequest {
    pub mode: GameMode,
}

#[derive(Deserialize)]
pub struct DifficultyRequest {
    pub difficulty: Difficulty,
}

// ============================================================================
// HANDLERS
// ============================================================================

pub async fn health() -> &'static str {
    "OK"
}

pub async fn state(State(state): State<Arc<AppState>>) -> Json<StateView> {
    current(&state)
}

pub async fn select(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<StateView>, ApiError> {
    let square = rules::parse_square(&request.square)?;
    // A rejected move is already reported through the event list.
    if let Err(e) = state.session.select(square) {
        if !e.is_recoverable() {
            return Err(e.into());
        }
    }
    Ok(current(&state))
}

pub async fn make_move(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<StateView>, ApiError> {
    let from = rules::parse_square(&request.from)?;
    let to = rules::parse_square(&request.to)?;
    if let Err(e) = state.session.attempt_move(from, to) {
        // The error body reports the rejection; its queued event is spent.
        state.session.drain_events();
        return Err(e.into());
    }
    Ok(current(&state))
}

pub async fn new_game(State(state): State<Arc<AppState>>) -> Json<StateView> {
    state.session.new_game();
    current(&state)
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<GameSettings>,
) -> Result<Json<StateView>, ApiError> {
    state.session.apply_settings(settings)?;
    Ok(current(&state))
}

pub async fn set_mode(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ModeRequest>,
) -> Json<StateView> {
    state.session.set_game_mode(request.mode);
    current(&state)
}

pub async fn set_difficulty(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DifficultyRequest>,
) -> Json<StateView> {
    state.session.set_difficulty(request.difficulty);
    current(&state)
}
