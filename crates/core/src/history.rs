//! Move record kept for the history panel

use serde::Serialize;

/// One numbered row of the history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovePair {
    pub number: u32,
    pub white: String,
    pub black: Option<String>,
}

/// Append-only list of played moves in SAN.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveRecord {
    moves: Vec<String>,
}

impl MoveRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, san: String) {
        self.moves.push(san);
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// Groups the record into numbered pairs. Pair `n` holds White's move
    /// `2n-1` and Black's move `2n`.
    pub fn pairs(&self) -> Vec<MovePair> {
        self.moves
            .chunks(2)
            .enumerate()
            .map(|(idx, chunk)| MovePair {
                number: idx as u32 + 1,
                white: chunk[0].clone(),
                black: chunk.get(1).cloned(),
            })
            .collect()
    }

    /// Movetext in PGN style, e.g. `1. e4 e5 2. Nf3`.
    pub fn movetext(&self) -> String {
        self.pairs()
            .iter()
            .map(|pair| match &pair.black {
                Some(black) => format!("{}. {} {}", pair.number, pair.white, black),
                None => format!("{}. {}", pair.number, pair.white),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
