//! Computer opponent
//!
//! Difficulty tiers are filters over the legal move list, not a search:
//! Easy plays anything, Medium prefers captures, Hard prefers checks and then
//! captures. Ties are broken uniformly with the caller's random source.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Move};
use tracing::debug;

use crate::rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// Picks a move for the side to move in `position`.
///
/// `legal_moves` must not be empty; an empty list means the game is already
/// over and the caller should not be asking.
pub fn select_move<R: Rng + ?Sized>(
    position: &Chess,
    legal_moves: &[Move],
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<Move> {
    debug_assert!(!legal_moves.is_empty(), "select_move called without legal moves");

    let captures: Vec<&Move> = legal_moves.iter().filter(|mv| mv.is_capture()).collect();

    let chosen = match difficulty {
        Difficulty::Easy => legal_moves.choose(rng),
        Difficulty::Medium => captures.choose(rng).copied().or_else(|| legal_moves.choose(rng)),
        Difficulty::Hard => {
            let checks: Vec<&Move> = legal_moves
                .iter()
                .filter(|mv| rules::gives_check(position, mv))
                .collect();
            checks
                .choose(rng)
                .or_else(|| captures.choose(rng))
                .copied()
                .or_else(|| legal_moves.choose(rng))
        }
    };

    if let Some(mv) = chosen {
        debug!(difficulty = difficulty.as_str(), candidates = legal_moves.len(), chosen = ?mv, "ai move selected");
    }
    chosen.cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shakmaty::Square;

    use crate::rules::{legal_moves, position_from_fen, starting_position};

    // White: rook a1 can capture the knight on a5, queen d1 can check on d8 or h5.
    const CHECK_OR_CAPTURE: &str = "4k3/8/8/n7/8/8/8/R2QK3 w - - 0 1";

    #[test]
    fn test_same_seed_same_move() {
        let pos = starting_position();
        let moves = legal_moves(&pos);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let first = select_move(&pos, &moves, difficulty, &mut StdRng::seed_from_u64(7));
            let second = select_move(&pos, &moves, difficulty, &mut StdRng::seed_from_u64(7));
            assert!(first.is_some());
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_easy_with_five_moves_is_reproducible() {
        let pos = starting_position();
        let moves: Vec<Move> = legal_moves(&pos).into_iter().take(5).collect();
        assert_eq!(moves.len(), 5);

        let expected = select_move(&pos, &moves, Difficulty::Easy, &mut StdRng::seed_from_u64(42)).unwrap();
        assert!(moves.contains(&expected));
        for _ in 0..20 {
            let again = select_move(&pos, &moves, Difficulty::Easy, &mut StdRng::seed_from_u64(42));
            assert_eq!(again, Some(expected.clone()));
        }
    }

    #[test]
    fn test_medium_prefers_captures() {
        let pos = position_from_fen(CHECK_OR_CAPTURE).unwrap();
        let moves = legal_moves(&pos);
        for seed in 0..32 {
            let mv = select_move(&pos, &moves, Difficulty::Medium, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert!(mv.is_capture());
            assert_eq!(mv.to(), Square::A5);
        }
    }

    #[test]
    fn test_hard_prefers_checks_over_captures() {
        let pos = position_from_fen(CHECK_OR_CAPTURE).unwrap();
        let moves = legal_moves(&pos);
        assert!(moves.iter().any(|mv| mv.is_capture() && !rules::gives_check(&pos, mv)));

        for seed in 0..32 {
            let mv = select_move(&pos, &moves, Difficulty::Hard, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert!(rules::gives_check(&pos, &mv));
        }
    }

    #[test]
    fn test_hard_falls_back_to_captures_then_anything() {
        // Only capture available is Rxa5, and no move gives check.
        let pos = position_from_fen("7k/8/8/n7/8/8/6PP/R6K w - - 0 1").unwrap();
        let moves = legal_moves(&pos);
        assert!(!moves.iter().any(|mv| rules::gives_check(&pos, mv)));
        let mv = select_move(&pos, &moves, Difficulty::Hard, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(mv.to(), Square::A5);

        let quiet = starting_position();
        let moves = legal_moves(&quiet);
        let mv = select_move(&quiet, &moves, Difficulty::Hard, &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(moves.contains(&mv));
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("expert".parse::<Difficulty>().is_err());
    }
}
