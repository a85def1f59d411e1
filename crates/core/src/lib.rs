//! Chess Master Core Library
//!
//! Runs a two-player chess session: turn order, move validation through the
//! rules oracle, terminal detection, a per-side clock and a computer
//! opponent with three difficulty tiers.

pub mod ai;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod game;
pub mod history;
pub mod rules;
pub mod selection;
pub mod session;

pub use ai::{select_move, Difficulty};
pub use clock::{Clock, ClockState};
pub use config::{GameMode, GameSettings};
pub use driver::SessionHandle;
pub use error::{Error, MoveRejection, Result};
pub use game::{AppliedMove, Game, GameStatus};
pub use history::{MovePair, MoveRecord};
pub use selection::{SelectOutcome, Selection};
pub use session::{AiTicket, GameSession, MoveOutcome, SessionEvent, SessionSnapshot};

pub use shakmaty::{Color, Square};
