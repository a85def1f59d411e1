//! Game settings
//!
//! Settings are read once when a session starts (or when a new game begins)
//! and passed down explicitly; nothing in the crate reads them from global
//! state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ai::Difficulty;
use crate::error::{Error, Result};

pub const DEFAULT_INITIAL_SECONDS: u32 = 600;
pub const DEFAULT_AI_REPLY_DELAY_MS: u64 = 500;

/// Who sits on the other side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Ai,
    Human,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiColor {
    White,
    #[default]
    Black,
}

impl From<AiColor> for shakmaty::Color {
    fn from(color: AiColor) -> Self {
        match color {
            AiColor::White => shakmaty::Color::White,
            AiColor::Black => shakmaty::Color::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardTheme {
    #[default]
    Classic,
    Modern,
    Wooden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceStyle {
    #[default]
    Classic,
    Modern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    pub ai_difficulty: Difficulty,
    pub game_mode: GameMode,
    pub ai_color: AiColor,
    /// Starting time for each side, in seconds.
    pub initial_seconds: u32,
    /// Pause before the computer answers a move.
    pub ai_reply_delay_ms: u64,
    // Presentation only; carried through untouched.
    pub sound_enabled: bool,
    pub board_theme: BoardTheme,
    pub piece_style: PieceStyle,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            ai_difficulty: Difficulty::Medium,
            game_mode: GameMode::Ai,
            ai_color: AiColor::Black,
            initial_seconds: DEFAULT_INITIAL_SECONDS,
            ai_reply_delay_ms: DEFAULT_AI_REPLY_DELAY_MS,
            sound_enabled: true,
            board_theme: BoardTheme::Classic,
            piece_style: PieceStyle::Classic,
        }
    }
}

impl GameSettings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: GameSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_seconds == 0 {
            return Err(Error::Config("initialSeconds must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn ai_side(&self) -> Option<shakmaty::Color> {
        match self.game_mode {
            GameMode::Ai => Some(self.ai_color.into()),
            GameMode::Human => None,
        }
    }
}
