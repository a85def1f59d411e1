//! Two-click move entry
//!
//! The first click picks up one of the side-to-move's pieces, the second
//! either completes a move or drops the selection.

use shakmaty::{Chess, Position, Square};

use crate::rules;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Idle,
    PieceSelected {
        origin: Square,
        destinations: Vec<Square>,
    },
}

/// What a click turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Nothing happened.
    Ignored,
    /// A piece is now selected.
    Selected(Square),
    /// The selection was dropped without a move.
    Deselected,
    /// Origin and destination are ready to be played.
    Attempt { origin: Square, destination: Square },
}

impl Selection {
    pub fn select(&mut self, square: Square, position: &Chess) -> SelectOutcome {
        match std::mem::take(self) {
            Selection::Idle => self.pick_up(square, position),
            Selection::PieceSelected { origin, destinations } => {
                if destinations.contains(&square) {
                    return SelectOutcome::Attempt { origin, destination: square };
                }
                if square != origin && owns_piece(position, square) {
                    return self.pick_up(square, position);
                }
                SelectOutcome::Deselected
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Selection::Idle;
    }

    pub fn origin(&self) -> Option<Square> {
        match self {
            Selection::Idle => None,
            Selection::PieceSelected { origin, .. } => Some(*origin),
        }
    }

    pub fn destinations(&self) -> &[Square] {
        match self {
            Selection::Idle => &[],
            Selection::PieceSelected { destinations, .. } => destinations,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Selection::Idle)
    }

    fn pick_up(&mut self, square: Square, position: &Chess) -> SelectOutcome {
        if !owns_piece(position, square) {
            return SelectOutcome::Ignored;
        }
        *self = Selection::PieceSelected {
            origin: square,
            destinations: rules::destinations(position, square),
        };
        SelectOutcome::Selected(square)
    }
}

fn owns_piece(position: &Chess, square: Square) -> bool {
    position
        .board()
        .piece_at(square)
        .is_some_and(|piece| piece.color == position.turn())
}
