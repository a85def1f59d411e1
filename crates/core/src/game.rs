//! Turn and game state machine
//!
//! Owns the current position, the move record and the game status for one
//! game. Every successful move replaces the position wholesale and then
//! re-evaluates the status.

use std::collections::HashMap;

use shakmaty::{Chess, Color, Move, Square};
use tracing::{debug, info};

use crate::error::{MoveRejection, Result};
use crate::history::MoveRecord;
use crate::rules::{self, DrawRule};

/// Occurrences of one position that end the game as a draw.
const REPETITION_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    /// The given side is in check. Lasts until the next move.
    Check(Color),
    Checkmate { winner: Color },
    Stalemate,
    DrawByRepetition,
    DrawByMaterial,
    DrawByFiftyMoves,
    TimeForfeit { winner: Color },
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::InProgress | GameStatus::Check(_))
    }

    /// Winning side, or `None` for draws and unfinished games.
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameStatus::Checkmate { winner } | GameStatus::TimeForfeit { winner } => Some(*winner),
            _ => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            GameStatus::Stalemate
                | GameStatus::DrawByRepetition
                | GameStatus::DrawByMaterial
                | GameStatus::DrawByFiftyMoves
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::InProgress => "in_progress",
            GameStatus::Check(_) => "check",
            GameStatus::Checkmate { .. } => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::DrawByRepetition => "draw_by_repetition",
            GameStatus::DrawByMaterial => "draw_by_material",
            GameStatus::DrawByFiftyMoves => "draw_by_fifty_moves",
            GameStatus::TimeForfeit { .. } => "time_forfeit",
        }
    }

    /// Text for the game-over banner.
    pub fn reason(&self) -> String {
        match self {
            GameStatus::InProgress => "Game in progress".to_string(),
            GameStatus::Check(side) => format!("{} is in check", rules::color_name(*side)),
            GameStatus::Checkmate { .. } => "Checkmate!".to_string(),
            GameStatus::Stalemate => "Stalemate!".to_string(),
            GameStatus::DrawByRepetition => "Draw by threefold repetition".to_string(),
            GameStatus::DrawByMaterial => "Draw by insufficient material".to_string(),
            GameStatus::DrawByFiftyMoves => "Draw by the fifty-move rule".to_string(),
            GameStatus::TimeForfeit { winner } => {
                format!("{} ran out of time", rules::color_name(!*winner))
            }
        }
    }
}

/// Result of a move the state machine accepted.
#[derive(Debug, Clone)]
pub struct AppliedMove {
    pub mv: Move,
    pub san: String,
    pub mover: Color,
    pub status: GameStatus,
}

pub struct Game {
    position: Chess,
    history: MoveRecord,
    status: GameStatus,
    repetitions: HashMap<String, u32>,
}

impl Game {
    pub fn new() -> Self {
        Self::from_position(rules::starting_position())
    }

    /// Starts a game from an arbitrary position with an empty record.
    pub fn from_position(position: Chess) -> Self {
        let mut game = Self {
            position,
            history: MoveRecord::new(),
            status: GameStatus::InProgress,
            repetitions: HashMap::new(),
        };
        game.repetitions.insert(rules::repetition_key(&game.position), 1);
        game.status = game.evaluate(0);
        game
    }

    /// Discards the current game and returns to the initial arrangement.
    pub fn new_game(&mut self) {
        *self = Self::new();
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn turn(&self) -> Color {
        rules::side_to_move(&self.position)
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn history(&self) -> &MoveRecord {
        &self.history
    }

    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_over() {
            return Vec::new();
        }
        rules::legal_moves(&self.position)
    }

    pub fn fen(&self) -> String {
        rules::fen(&self.position)
    }

    /// Plays the move from `origin` to `destination`, promoting to a queen
    /// when a pawn reaches the last rank.
    pub fn attempt_move(&mut self, origin: Square, destination: Square) -> Result<AppliedMove> {
        if self.is_over() {
            return Err(MoveRejection::GameOver.into());
        }
        let mv = rules::find_move(&self.position, origin, destination)?;
        self.apply(&mv)
    }

    /// Plays a fully specified move.
    pub fn apply(&mut self, mv: &Move) -> Result<AppliedMove> {
        if self.is_over() {
            return Err(MoveRejection::GameOver.into());
        }

        let mover = self.turn();
        let (next, san) = rules::apply_move(&self.position, mv)?;

        self.position = next;
        self.history.push(san.clone());
        let seen = {
            let count = self
                .repetitions
                .entry(rules::repetition_key(&self.position))
                .or_insert(0);
            *count += 1;
            *count
        };

        let previous = self.status;
        self.status = self.evaluate(seen);

        debug!(san = %san, mover = rules::color_name(mover), ply = self.history.len(), "move applied");
        if self.status != previous && self.status.is_terminal() {
            info!(status = self.status.as_str(), reason = %self.status.reason(), "game over");
        }

        Ok(AppliedMove {
            mv: mv.clone(),
            san,
            mover,
            status: self.status,
        })
    }

    /// Ends the game on time. Has no effect once the game is already over.
    pub fn forfeit_on_time(&mut self, winner: Color) -> bool {
        if self.is_over() {
            return false;
        }
        self.status = GameStatus::TimeForfeit { winner };
        info!(winner = rules::color_name(winner), "time forfeit");
        true
    }

    /// Status of the current position: checkmate, oracle draws, stalemate,
    /// repetition, then check.
    fn evaluate(&self, occurrences: u32) -> GameStatus {
        let pos = &self.position;
        let turn = rules::side_to_move(pos);

        if rules::is_checkmate(pos) {
            return GameStatus::Checkmate { winner: !turn };
        }
        match rules::draw_rule(pos) {
            Some(DrawRule::InsufficientMaterial) => return GameStatus::DrawByMaterial,
            Some(DrawRule::FiftyMoves) => return GameStatus::DrawByFiftyMoves,
            None => {}
        }
        if rules::is_stalemate(pos) {
            return GameStatus::Stalemate;
        }
        if occurrences >= REPETITION_LIMIT {
            return GameStatus::DrawByRepetition;
        }
        if rules::is_check(pos) {
            return GameStatus::Check(turn);
        }
        GameStatus::InProgress
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
