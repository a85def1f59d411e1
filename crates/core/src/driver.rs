//! Async runtime around a session
//!
//! Two things happen on their own: the clock ticks once a second, and the
//! computer answers a move after a short pause. Both run as tokio tasks and
//! take the session lock for their whole transaction, so neither can see a
//! half-applied move.
//!
//! Methods that spawn tasks must be called from inside a tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use shakmaty::Square;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::ai::Difficulty;
use crate::config::{GameMode, GameSettings};
use crate::error::{Error, Result};
use crate::session::{AiTicket, GameSession, MoveOutcome, SessionEvent, SessionSnapshot};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<Mutex<GameSession>>,
    clock_task: Arc<Mutex<Option<ClockTask>>>,
}

/// The ticking task and the game generation it was spawned for.
struct ClockTask {
    generation: u64,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn new(session: GameSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            clock_task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    pub fn drain_events(&self) -> Vec<SessionEvent> {
        self.lock().drain_events()
    }

    pub fn select(&self, square: Square) -> Result<Option<MoveOutcome>> {
        let outcome = self.lock().select(square)?;
        if let Some(outcome) = &outcome {
            self.follow_up(outcome.ai_reply);
        }
        Ok(outcome)
    }

    pub fn attempt_move(&self, origin: Square, destination: Square) -> Result<MoveOutcome> {
        let outcome = self.lock().attempt_move(origin, destination)?;
        self.follow_up(outcome.ai_reply);
        Ok(outcome)
    }

    pub fn new_game(&self) {
        // The generation must change before the old task leaves the slot.
        let ticket = self.lock().new_game();
        self.stop_clock_task();
        self.follow_up(ticket);
    }

    pub fn apply_settings(&self, settings: GameSettings) -> Result<()> {
        let ticket = self.lock().apply_settings(settings)?;
        self.follow_up(ticket);
        Ok(())
    }

    pub fn set_difficulty(&self, difficulty: Difficulty) {
        self.lock().set_difficulty(difficulty);
    }

    pub fn set_game_mode(&self, mode: GameMode) {
        let ticket = self.lock().set_game_mode(mode);
        self.follow_up(ticket);
    }

    fn lock(&self) -> MutexGuard<'_, GameSession> {
        // A panic while holding the lock leaves the session in a consistent
        // state between transactions, so keep using it.
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn follow_up(&self, ticket: Option<AiTicket>) {
        self.ensure_clock_task();
        if let Some(ticket) = ticket {
            self.schedule_ai_reply(ticket);
        }
    }

    fn schedule_ai_reply(&self, ticket: AiTicket) {
        let delay = Duration::from_millis(self.lock().settings().ai_reply_delay_ms);
        let handle = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let result = handle.lock().play_ai_reply(ticket);
            match result {
                Ok(Some(applied)) => {
                    debug!(san = %applied.san, generation = ticket.generation(), "ai reply played");
                    handle.ensure_clock_task();
                }
                Ok(None) => debug!(generation = ticket.generation(), "ai reply no longer needed"),
                Err(Error::StaleResponse { expected, found }) => {
                    debug!(expected, found, "discarding stale ai reply");
                }
                Err(e) => warn!(error = %e, "ai reply failed"),
            }
        });
    }

    /// Spawns the ticking task if the clock runs and no task of the current
    /// generation is alive. A task left over from an earlier game is
    /// replaced.
    fn ensure_clock_task(&self) {
        let (running, generation) = {
            let session = self.lock();
            (session.clock().is_running(), session.generation())
        };
        if !running {
            return;
        }

        let mut slot = self.clock_task.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(current) = slot.as_ref() {
            if current.generation == generation && !current.task.is_finished() {
                return;
            }
        }
        if let Some(stale) = slot.take() {
            stale.task.abort();
        }

        let handle = self.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let keep_going = {
                    let mut session = handle.lock();
                    if session.generation() != generation || !session.clock().is_running() {
                        false
                    } else {
                        session.tick();
                        session.clock().is_running()
                    }
                };
                if !keep_going {
                    debug!(generation, "clock task finished");
                    break;
                }
            }
        });
        *slot = Some(ClockTask { generation, task });
    }

    fn stop_clock_task(&self) {
        let mut slot = self.clock_task.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(current) = slot.take() {
            current.task.abort();
        }
    }
}
