//! One game session
//!
//! Ties the state machine, the clock, the selection and the computer
//! opponent together. All mutation goes through `&mut self`; the async
//! driver serializes access with a lock.

use rand::rngs::StdRng;
use rand::SeedableRng;
use shakmaty::{Color, Square};
use tracing::{debug, info};

use crate::ai::{self, Difficulty};
use crate::clock::{Clock, ClockState};
use crate::config::{GameMode, GameSettings};
use crate::error::{Error, MoveRejection, Result};
use crate::game::{AppliedMove, Game, GameStatus};
use crate::history::MovePair;
use crate::selection::{SelectOutcome, Selection};

const MAX_PENDING_EVENTS: usize = 64;

/// Permission to play one computer move in the generation it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiTicket {
    generation: u64,
}

impl AiTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    NewGame { generation: u64 },
    MoveApplied { san: String, mover: Color },
    Check(Color),
    GameOver(GameStatus),
    InvalidMove(MoveRejection),
}

#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub applied: AppliedMove,
    /// Set when the computer should answer this move.
    pub ai_reply: Option<AiTicket>,
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub fen: String,
    pub turn: Color,
    pub status: GameStatus,
    pub moves: Vec<String>,
    pub move_pairs: Vec<MovePair>,
    pub clock: ClockState,
    pub selected: Option<Square>,
    pub destinations: Vec<Square>,
    pub settings: GameSettings,
    /// Tier the computer plays with in the current game. `settings`
    /// holds the tier requested for the next one.
    pub active_difficulty: Difficulty,
    pub generation: u64,
}

pub struct GameSession {
    settings: GameSettings,
    difficulty: Difficulty,
    game: Game,
    clock: Clock,
    selection: Selection,
    generation: u64,
    rng: StdRng,
    events: Vec<SessionEvent>,
}

impl GameSession {
    pub fn new(settings: GameSettings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    /// Session whose computer moves are reproducible.
    pub fn with_seed(settings: GameSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: GameSettings, rng: StdRng) -> Self {
        let clock = Clock::new(settings.initial_seconds);
        Self {
            difficulty: settings.ai_difficulty,
            settings,
            game: Game::new(),
            clock,
            selection: Selection::Idle,
            generation: 0,
            rng,
            events: Vec::new(),
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn turn(&self) -> Color {
        self.game.turn()
    }

    pub fn status(&self) -> GameStatus {
        self.game.status()
    }

    /// Whether the computer is the side to move in a live game.
    pub fn is_ai_turn(&self) -> bool {
        !self.game.is_over() && self.settings.ai_side() == Some(self.game.turn())
    }

    /// Throws away the current game and starts over with the current
    /// settings. Any computer reply still pending for the old game becomes
    /// stale.
    pub fn new_game(&mut self) -> Option<AiTicket> {
        self.generation += 1;
        self.difficulty = self.settings.ai_difficulty;
        self.game.new_game();
        self.clock.reset(self.settings.initial_seconds);
        self.selection.clear();
        self.events.clear();
        self.push_event(SessionEvent::NewGame { generation: self.generation });
        info!(
            generation = self.generation,
            difficulty = self.difficulty.as_str(),
            "new game started"
        );
        self.ai_ticket()
    }

    /// Replaces the settings. Clock length and difficulty apply from the
    /// next game.
    pub fn apply_settings(&mut self, settings: GameSettings) -> Result<Option<AiTicket>> {
        settings.validate()?;
        self.settings = settings;
        Ok(self.on_turn_change())
    }

    /// Requests a tier for the next game. The game in progress keeps the
    /// tier it started with.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.settings.ai_difficulty = difficulty;
    }

    pub fn set_game_mode(&mut self, mode: GameMode) -> Option<AiTicket> {
        self.settings.game_mode = mode;
        self.on_turn_change()
    }

    /// Handles a click on `square`.
    ///
    /// Returns the move when the click completed one.
    pub fn select(&mut self, square: Square) -> Result<Option<MoveOutcome>> {
        if self.game.is_over() || self.is_ai_turn() {
            self.selection.clear();
            return Ok(None);
        }

        match self.selection.select(square, self.game.position()) {
            SelectOutcome::Attempt { origin, destination } => {
                self.attempt_move(origin, destination).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Plays a move for the human side to move.
    pub fn attempt_move(&mut self, origin: Square, destination: Square) -> Result<MoveOutcome> {
        self.selection.clear();

        let result = if self.is_ai_turn() {
            Err(MoveRejection::NotYourTurn.into())
        } else {
            self.game.attempt_move(origin, destination)
        };

        match result {
            Ok(applied) => {
                self.record(&applied);
                Ok(MoveOutcome {
                    applied,
                    ai_reply: self.ai_ticket(),
                })
            }
            Err(Error::InvalidMove(rejection)) => {
                debug!(from = %origin, to = %destination, reason = %rejection, "move rejected");
                self.push_event(SessionEvent::InvalidMove(rejection));
                Err(Error::InvalidMove(rejection))
            }
            Err(e) => Err(e),
        }
    }

    /// Plays the computer's answer if the ticket is still current.
    ///
    /// A ticket from an earlier game is a `StaleResponse`. A current ticket
    /// that finds the game over or the human to move yields `Ok(None)`.
    pub fn play_ai_reply(&mut self, ticket: AiTicket) -> Result<Option<AppliedMove>> {
        if ticket.generation != self.generation {
            return Err(Error::StaleResponse {
                expected: self.generation,
                found: ticket.generation,
            });
        }
        if !self.is_ai_turn() {
            return Ok(None);
        }

        let legal = self.game.legal_moves();
        let Some(mv) = ai::select_move(
            self.game.position(),
            &legal,
            self.difficulty,
            &mut self.rng,
        ) else {
            return Ok(None);
        };

        let applied = self.game.apply(&mv)?;
        self.record(&applied);
        Ok(Some(applied))
    }

    /// Advances the clock by one second for the side to move.
    ///
    /// Returns the winner if this tick ended the game on time.
    pub fn tick(&mut self) -> Option<Color> {
        if self.game.is_over() {
            self.clock.stop();
            return None;
        }

        let winner = self.clock.tick(self.game.turn())?;
        if self.game.forfeit_on_time(winner) {
            self.selection.clear();
            self.push_event(SessionEvent::GameOver(self.game.status()));
            return Some(winner);
        }
        None
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            fen: self.game.fen(),
            turn: self.game.turn(),
            status: self.game.status(),
            moves: self.game.history().moves().to_vec(),
            move_pairs: self.game.history().pairs(),
            clock: self.clock.state(),
            selected: self.selection.origin(),
            destinations: self.selection.destinations().to_vec(),
            settings: self.settings.clone(),
            active_difficulty: self.difficulty,
            generation: self.generation,
        }
    }

    /// Queues an event, dropping the oldest once the queue is full so an
    /// idle consumer cannot make it grow without bound.
    fn push_event(&mut self, event: SessionEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            self.events.remove(0);
        }
        self.events.push(event);
    }

    fn record(&mut self, applied: &AppliedMove) {
        self.push_event(SessionEvent::MoveApplied {
            san: applied.san.clone(),
            mover: applied.mover,
        });

        match applied.status {
            status if status.is_terminal() => {
                self.clock.stop();
                self.selection.clear();
                self.push_event(SessionEvent::GameOver(status));
            }
            GameStatus::Check(side) => {
                self.clock.start();
                self.push_event(SessionEvent::Check(side));
            }
            _ => self.clock.start(),
        }

        if self.is_ai_turn() {
            self.selection.clear();
        }
    }

    fn on_turn_change(&mut self) -> Option<AiTicket> {
        if self.is_ai_turn() {
            self.selection.clear();
        }
        self.ai_ticket()
    }

    fn ai_ticket(&self) -> Option<AiTicket> {
        self.is_ai_turn().then_some(AiTicket {
            generation: self.generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::position_from_fen;

    fn human_vs_human() -> GameSession {
        let settings = GameSettings {
            game_mode: GameMode::Human,
            ..GameSettings::default()
        };
        GameSession::with_seed(settings, 1)
    }

    #[test]
    fn test_opening_move_arms_clock() {
        let mut session = GameSession::with_seed(GameSettings::default(), 1);
        assert!(!session.clock().is_running());

        let outcome = session.attempt_move(Square::E2, Square::E4).unwrap();
        assert_eq!(outcome.applied.san, "e4");
        assert_eq!(session.game().history().len(), 1);
        assert_eq!(session.turn(), Color::Black);
        assert_eq!(session.status(), GameStatus::InProgress);
        assert!(session.clock().is_running());
        assert_eq!(outcome.ai_reply.map(|t| t.generation()), Some(0));
    }

    #[test]
    fn test_rejected_move_changes_nothing() {
        let mut session = human_vs_human();
        session.attempt_move(Square::E2, Square::E4).unwrap();
        session.tick();
        let before = session.snapshot();

        let err = session.attempt_move(Square::D7, Square::D4).unwrap_err();
        assert!(err.is_recoverable());

        let after = session.snapshot();
        assert_eq!(after.fen, before.fen);
        assert_eq!(after.moves, before.moves);
        assert_eq!(after.status, before.status);
        assert_eq!(after.clock, before.clock);
        assert!(session
            .drain_events()
            .contains(&SessionEvent::InvalidMove(MoveRejection::Illegal)));
    }

    #[test]
    fn test_two_click_move() {
        let mut session = human_vs_human();
        assert!(session.select(Square::G1).unwrap().is_none());
        assert_eq!(session.selection().origin(), Some(Square::G1));

        let outcome = session.select(Square::F3).unwrap().unwrap();
        assert_eq!(outcome.applied.san, "Nf3");
        assert!(outcome.ai_reply.is_none());
        assert!(session.selection().is_idle());
    }

    #[test]
    fn test_human_cannot_move_for_ai() {
        let mut session = GameSession::with_seed(GameSettings::default(), 1);
        session.attempt_move(Square::E2, Square::E4).unwrap();

        let err = session.attempt_move(Square::E7, Square::E5).unwrap_err();
        assert!(matches!(err, Error::InvalidMove(MoveRejection::NotYourTurn)));
        assert!(session.select(Square::E7).unwrap().is_none());
        assert!(session.selection().is_idle());
    }

    #[test]
    fn test_ai_reply_alternates_turns() {
        let mut session = GameSession::with_seed(GameSettings::default(), 9);
        let ticket = session
            .attempt_move(Square::E2, Square::E4)
            .unwrap()
            .ai_reply
            .unwrap();

        let reply = session.play_ai_reply(ticket).unwrap().unwrap();
        assert_eq!(reply.mover, Color::Black);
        assert_eq!(session.turn(), Color::White);
        assert_eq!(session.game().history().len(), 2);

        // Ticket is spent: the human is to move now.
        assert!(session.play_ai_reply(ticket).unwrap().is_none());
    }

    #[test]
    fn test_ai_reply_is_reproducible_with_seed() {
        let play = |seed| {
            let mut session = GameSession::with_seed(GameSettings::default(), seed);
            let ticket = session
                .attempt_move(Square::D2, Square::D4)
                .unwrap()
                .ai_reply
                .unwrap();
            session.play_ai_reply(ticket).unwrap().unwrap().san
        };
        assert_eq!(play(5), play(5));
    }

    #[test]
    fn test_stale_ticket_after_new_game() {
        let mut session = GameSession::with_seed(GameSettings::default(), 1);
        let ticket = session
            .attempt_move(Square::E2, Square::E4)
            .unwrap()
            .ai_reply
            .unwrap();

        session.new_game();
        let err = session.play_ai_reply(ticket).unwrap_err();
        assert!(matches!(err, Error::StaleResponse { expected: 1, found: 0 }));
        assert!(session.game().history().is_empty());
        assert!(!session.clock().is_running());
    }

    #[test]
    fn test_ai_as_white_moves_first() {
        let settings = GameSettings {
            ai_color: crate::config::AiColor::White,
            ..GameSettings::default()
        };
        let mut session = GameSession::with_seed(settings, 2);
        let ticket = session.new_game().unwrap();
        let reply = session.play_ai_reply(ticket).unwrap().unwrap();
        assert_eq!(reply.mover, Color::White);
        assert!(session.clock().is_running());
    }

    #[test]
    fn test_time_forfeit_ends_game_once() {
        let settings = GameSettings {
            game_mode: GameMode::Human,
            initial_seconds: 600,
            ..GameSettings::default()
        };
        let mut session = GameSession::with_seed(settings, 1);
        session.attempt_move(Square::E2, Square::E4).unwrap();

        let mut winners = Vec::new();
        for _ in 0..700 {
            if let Some(winner) = session.tick() {
                winners.push(winner);
            }
        }
        assert_eq!(winners, vec![Color::White]);
        assert_eq!(session.clock().remaining(Color::Black), 0);
        assert_eq!(session.clock().remaining(Color::White), 600);
        assert_eq!(session.status(), GameStatus::TimeForfeit { winner: Color::White });

        let err = session.attempt_move(Square::D2, Square::D4).unwrap_err();
        assert!(matches!(err, Error::InvalidMove(MoveRejection::GameOver)));
    }

    #[test]
    fn test_mate_stops_clock() {
        let mut session = human_vs_human();
        session.game = Game::from_position(position_from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap());
        session.clock.start();

        session.attempt_move(Square::A1, Square::A8).unwrap();
        assert_eq!(session.status(), GameStatus::Checkmate { winner: Color::White });
        assert!(!session.clock().is_running());
        assert_eq!(session.tick(), None);
        assert!(session
            .drain_events()
            .contains(&SessionEvent::GameOver(GameStatus::Checkmate { winner: Color::White })));
    }

    #[test]
    fn test_check_event() {
        let mut session = human_vs_human();
        session.game = Game::from_position(position_from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap());
        session.attempt_move(Square::A1, Square::A8).unwrap();
        assert!(session.drain_events().contains(&SessionEvent::Check(Color::Black)));
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_switching_to_ai_mode_on_ai_turn_issues_ticket() {
        let mut session = human_vs_human();
        session.attempt_move(Square::E2, Square::E4).unwrap();
        let ticket = session.set_game_mode(GameMode::Ai);
        assert_eq!(ticket.map(|t| t.generation()), Some(0));
    }

    #[test]
    fn test_new_game_uses_updated_clock_length() {
        let mut session = human_vs_human();
        let settings = GameSettings {
            initial_seconds: 180,
            ..session.settings().clone()
        };
        session.apply_settings(settings).unwrap();
        assert_eq!(session.clock().remaining(Color::White), 600);
        session.new_game();
        assert_eq!(session.clock().remaining(Color::White), 180);
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_difficulty_change_waits_for_next_game() {
        // Medium can only take the knight; Hard would give check with the queen.
        for seed in 0..20 {
            let mut session = GameSession::with_seed(GameSettings::default(), seed);
            session.game =
                Game::from_position(position_from_fen("r2qk3/8/8/8/N7/8/8/4K3 b - - 0 1").unwrap());
            session.set_difficulty(Difficulty::Hard);
            assert_eq!(session.active_difficulty(), Difficulty::Medium);

            let ticket = session.ai_ticket().unwrap();
            let reply = session.play_ai_reply(ticket).unwrap().unwrap();
            assert_eq!(reply.san, "Rxa4");

            session.new_game();
            assert_eq!(session.active_difficulty(), Difficulty::Hard);
            assert_eq!(session.snapshot().settings.ai_difficulty, Difficulty::Hard);
        }
    }

    #[test]
    fn test_settings_difficulty_applies_from_next_game() {
        let mut session = GameSession::with_seed(GameSettings::default(), 1);
        let settings = GameSettings {
            ai_difficulty: Difficulty::Easy,
            ..session.settings().clone()
        };
        session.apply_settings(settings).unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.settings.ai_difficulty, Difficulty::Easy);
        assert_eq!(snapshot.active_difficulty, Difficulty::Medium);

        session.new_game();
        assert_eq!(session.snapshot().active_difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_new_game_discards_undelivered_events() {
        let mut session = human_vs_human();
        session.attempt_move(Square::E2, Square::E4).unwrap();
        let _ = session.attempt_move(Square::E7, Square::E4);

        session.new_game();
        assert_eq!(
            session.drain_events(),
            vec![SessionEvent::NewGame { generation: 1 }]
        );
    }

    #[test]
    fn test_event_queue_is_bounded() {
        let mut session = human_vs_human();
        for _ in 0..(MAX_PENDING_EVENTS * 2) {
            let _ = session.attempt_move(Square::E2, Square::E5);
        }
        let events = session.drain_events();
        assert_eq!(events.len(), MAX_PENDING_EVENTS);
        assert!(events
            .iter()
            .all(|event| *event == SessionEvent::InvalidMove(MoveRejection::Illegal)));
    }
}
