//! Rules oracle backed by shakmaty
//!
//! Everything that needs to know the laws of chess goes through this module:
//! legal move generation, move application and terminal detection. The rest
//! of the crate only sequences these calls.

use shakmaty::{
    fen::Fen, san::San, Chess, Color, EnPassantMode, File, Move, Position, Role, Square,
};

use crate::error::{Error, MoveRejection, Result};

/// Halfmove clock value at which the fifty-move rule applies.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Creates the standard starting position
pub fn starting_position() -> Chess {
    Chess::default()
}

pub fn side_to_move(position: &Chess) -> Color {
    position.turn()
}

/// Every legal move in the position.
pub fn legal_moves(position: &Chess) -> Vec<Move> {
    position.legal_moves().into_iter().collect()
}

/// The square a player clicks to finish this move.
///
/// shakmaty encodes castling as king-takes-rook; players click the king's
/// destination instead.
pub fn destination(mv: &Move) -> Square {
    match mv {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            Square::from_coords(file, king.rank())
        }
        other => other.to(),
    }
}

/// Destination squares reachable from `origin`, in generation order.
pub fn destinations(position: &Chess, origin: Square) -> Vec<Square> {
    let mut squares: Vec<Square> = Vec::new();
    for mv in position.legal_moves().iter() {
        if mv.from() == Some(origin) {
            let to = destination(mv);
            if !squares.contains(&to) {
                squares.push(to);
            }
        }
    }
    squares
}

/// Resolves an origin/destination pair to a legal move.
///
/// When several moves share the pair (underpromotions) the queen promotion
/// wins; no promotion choice is offered.
pub fn find_move(position: &Chess, from: Square, to: Square) -> std::result::Result<Move, MoveRejection> {
    let piece = position
        .board()
        .piece_at(from)
        .ok_or(MoveRejection::NoPieceOnSquare)?;
    if piece.color != position.turn() {
        return Err(MoveRejection::NotYourPiece);
    }

    let candidates: Vec<Move> = position
        .legal_moves()
        .into_iter()
        .filter(|mv| mv.from() == Some(from) && destination(mv) == to)
        .collect();

    candidates
        .iter()
        .find(|mv| mv.promotion() == Some(Role::Queen))
        .or_else(|| candidates.first())
        .cloned()
        .ok_or(MoveRejection::Illegal)
}

/// Plays `mv` and returns the new position with the move's SAN.
///
/// The SAN carries `+` or `#` the same way PGN movetext does.
pub fn apply_move(position: &Chess, mv: &Move) -> std::result::Result<(Chess, String), MoveRejection> {
    let san = San::from_move(position, mv.clone()).to_string();
    let next = position
        .clone()
        .play(mv.clone())
        .map_err(|_| MoveRejection::Illegal)?;

    let suffix = if next.is_checkmate() {
        "#"
    } else if next.is_check() {
        "+"
    } else {
        ""
    };

    Ok((next, format!("{}{}", san, suffix)))
}

pub fn is_check(position: &Chess) -> bool {
    position.is_check()
}

pub fn is_checkmate(position: &Chess) -> bool {
    position.is_checkmate()
}

pub fn is_stalemate(position: &Chess) -> bool {
    position.is_stalemate()
}

/// Which of the oracle's own draw rules applies, if any.
///
/// Stalemate and repetition are reported separately and are not part of
/// this check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRule {
    InsufficientMaterial,
    FiftyMoves,
}

pub fn draw_rule(position: &Chess) -> Option<DrawRule> {
    if position.is_insufficient_material() {
        Some(DrawRule::InsufficientMaterial)
    } else if position.halfmoves() >= FIFTY_MOVE_HALFMOVES {
        Some(DrawRule::FiftyMoves)
    } else {
        None
    }
}

pub fn is_draw(position: &Chess) -> bool {
    draw_rule(position).is_some()
}

/// Whether `mv` leaves the opponent in check.
pub fn gives_check(position: &Chess, mv: &Move) -> bool {
    position
        .clone()
        .play(mv.clone())
        .map(|next| next.is_check())
        .unwrap_or(false)
}

pub fn fen(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal).to_string()
}

/// Identity of a position for repetition purposes: placement, side to move,
/// castling rights and a capturable en passant square. Move counters are left
/// out.
pub fn repetition_key(position: &Chess) -> String {
    fen(position)
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses algebraic square text such as `"e4"`.
pub fn parse_square(text: &str) -> Result<Square> {
    text.trim()
        .to_ascii_lowercase()
        .parse::<Square>()
        .map_err(|_| Error::PreconditionViolation(format!("'{}' is not a board square", text)))
}

/// Loads a position from FEN, mostly for setting up tests and demos.
pub fn position_from_fen(fen: &str) -> Result<Chess> {
    let parsed: Fen = fen
        .parse()
        .map_err(|e| Error::PreconditionViolation(format!("Invalid FEN: {}", e)))?;
    parsed
        .into_position(shakmaty::CastlingMode::Standard)
        .map_err(|e| Error::PreconditionViolation(format!("Invalid position: {}", e)))
}

pub fn color_name(color: Color) -> &'static str {
    if color == Color::White { "White" } else { "Black" }
}
