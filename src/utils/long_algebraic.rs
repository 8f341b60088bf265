//! Conversions between packed moves and UCI long algebraic notation.
//!
//! A LAN token only carries origin, target and an optional promotion
//! letter, so decoding resolves it against the legal moves of the current
//! position; that recovers the full move tag (capture, castling, en
//! passant) and rejects tokens that do not name a legal move.

use crate::game_state::chess_types::PieceKind;
use crate::game_state::make_move::move_is_legal;
use crate::game_state::position::Position;
use crate::move_generation::generator::pseudo_legal_moves;
use crate::moves::move_codes::*;
use crate::utils::algebraic::{algebraic_to_square, square_to_algebraic};

/// Long algebraic form of a move: `<from><to>[promotion]`. The null move
/// renders as `0000` per UCI convention.
pub fn move_to_lan(mv: Move) -> String {
    if mv == NULL_MOVE {
        return "0000".to_owned();
    }

    let mut out = String::new();
    out.push_str(&square_to_algebraic(move_origin(mv)).unwrap_or_else(|_| "??".to_owned()));
    out.push_str(&square_to_algebraic(move_target(mv)).unwrap_or_else(|_| "??".to_owned()));
    if let Some(kind) = move_promotion_kind(mv) {
        out.push(promotion_char(kind));
    }
    out
}

/// Resolve a LAN token to the matching legal move of `position`.
pub fn lan_to_move(lan: &str, position: &mut Position) -> Result<Move, String> {
    let bytes = lan.as_bytes();
    if bytes.len() != 4 && bytes.len() != 5 {
        return Err(format!("Invalid long algebraic move: {lan}"));
    }

    let origin = algebraic_to_square(&lan[0..2])?;
    let target = algebraic_to_square(&lan[2..4])?;
    let promotion = if bytes.len() == 5 {
        Some(char_to_promotion(bytes[4] as char)?)
    } else {
        None
    };

    for mv in pseudo_legal_moves(position) {
        if move_origin(mv) != origin
            || move_target(mv) != target
            || move_promotion_kind(mv) != promotion
        {
            continue;
        }
        if move_is_legal(position, mv) {
            return Ok(mv);
        }
    }

    Err(format!("Move is not legal in this position: {lan}"))
}

fn promotion_char(kind: PieceKind) -> char {
    match kind {
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        _ => 'q',
    }
}

fn char_to_promotion(ch: char) -> Result<PieceKind, String> {
    match ch.to_ascii_lowercase() {
        'n' => Ok(PieceKind::Knight),
        'b' => Ok(PieceKind::Bishop),
        'r' => Ok(PieceKind::Rook),
        'q' => Ok(PieceKind::Queen),
        _ => Err(format!("Invalid promotion piece character: {ch}")),
    }
}
