//! Per-side countdown clock

use serde::Serialize;
use shakmaty::Color;
use tracing::info;

use crate::rules;

/// Remaining time for both sides, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockState {
    pub white: u32,
    pub black: u32,
    pub running: bool,
}

pub struct Clock {
    white: u32,
    black: u32,
    running: bool,
}

impl Clock {
    /// A stopped clock with `initial_seconds` on both sides.
    pub fn new(initial_seconds: u32) -> Self {
        Self {
            white: initial_seconds,
            black: initial_seconds,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self, initial_seconds: u32) {
        self.white = initial_seconds;
        self.black = initial_seconds;
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining(&self, side: Color) -> u32 {
        match side {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    /// Takes one second off `side_to_move`.
    ///
    /// Returns the winner when this tick flags the side to move. The clock
    /// stops at that point, so later ticks do nothing.
    pub fn tick(&mut self, side_to_move: Color) -> Option<Color> {
        if !self.running {
            return None;
        }

        let remaining = match side_to_move {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        *remaining = remaining.saturating_sub(1);

        if *remaining == 0 {
            self.running = false;
            info!(flagged = rules::color_name(side_to_move), "clock expired");
            return Some(!side_to_move);
        }
        None
    }

    pub fn state(&self) -> ClockState {
        ClockState {
            white: self.white,
            black: self.black,
            running: self.running,
        }
    }
}

/// `m:ss` display of a number of seconds.
pub fn format_seconds(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
