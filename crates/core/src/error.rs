//! Error types for chess-master-core

use thiserror::Error;

/// Why a move attempt was turned down.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("the game is already over")]
    GameOver,

    #[error("there is no piece on the origin square")]
    NoPieceOnSquare,

    #[error("that piece belongs to the side not to move")]
    NotYourPiece,

    #[error("the move is not legal in this position")]
    Illegal,

    #[error("it is the computer's turn")]
    NotYourTurn,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid move: {0}")]
    InvalidMove(MoveRejection),

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Stale response for generation {found} (current is {expected})")]
    StaleResponse { expected: u64, found: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Recoverable conditions a player can routinely trigger.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::InvalidMove(_) | Error::StaleResponse { .. })
    }
}

impl From<MoveRejection> for Error {
    fn from(rejection: MoveRejection) -> Self {
        Error::InvalidMove(rejection)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
