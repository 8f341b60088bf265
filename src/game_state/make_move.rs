//! Reversible move application.
//!
//! `do_move` pushes a fresh irreversible state and applies the reversible
//! board changes; `undo_move` restores them exactly and pops the state.
//! A null move only flips the side to move behind an en-passant-cleared
//! state, which is what null-move pruning needs.

use crate::game_state::chess_types::*;
use crate::game_state::position::Position;
use crate::move_generation::attack_tables::is_square_attacked;
use crate::moves::move_codes::*;

const A1: Square = 0;
const E1: Square = 4;
const H1: Square = 7;
const A8: Square = 56;
const E8: Square = 60;
const H8: Square = 63;

/// A castling right is cleared when the king or rook leaves its home
/// square, or when a rook is captured on it. Checking both move endpoints
/// covers all three cases.
fn update_castling_rights(position: &mut Position, origin: Square, target: Square) {
    for square in [origin, target] {
        match square {
            A1 => position.remove_castling(Color::White, CastlingSide::Queen),
            H1 => position.remove_castling(Color::White, CastlingSide::King),
            E1 => {
                position.remove_castling(Color::White, CastlingSide::Queen);
                position.remove_castling(Color::White, CastlingSide::King);
            }
            A8 => position.remove_castling(Color::Black, CastlingSide::Queen),
            H8 => position.remove_castling(Color::Black, CastlingSide::King),
            E8 => {
                position.remove_castling(Color::Black, CastlingSide::Queen);
                position.remove_castling(Color::Black, CastlingSide::King);
            }
            _ => {}
        }
    }
}

#[inline]
fn en_passant_victim_square(origin: Square, target: Square) -> Square {
    file_rank_to_square(file_of(target), rank_of(origin))
}

pub fn do_move(position: &mut Position, mv: Move) {
    let origin = move_origin(mv);
    let target = move_target(mv);
    let kind = move_kind(mv);
    let color = position.side_to_move;
    let piece = position.piece_at(origin);

    position.start_new_irreversible_state();
    position.set_captured_piece(Piece::NONE);
    position.unset_en_passant();

    if piece.kind() == PieceKind::Pawn || move_is_capture(mv) {
        position.reset_halfmove_clock();
    } else {
        position.increment_halfmove_clock();
    }

    match kind {
        MoveKind::Other => {
            position.remove_piece(origin);
            position.place_piece(target, piece);
        }
        MoveKind::DoublePawnPush => {
            position.remove_piece(origin);
            position.place_piece(target, piece);
            position.set_en_passant(file_of(origin));
        }
        MoveKind::Capture => {
            position.set_captured_piece(position.piece_at(target));
            position.remove_piece(origin);
            position.place_piece(target, piece);
        }
        MoveKind::EnPassantCapture => {
            let victim_square = en_passant_victim_square(origin, target);
            position.set_captured_piece(position.piece_at(victim_square));
            position.remove_piece(victim_square);
            position.remove_piece(origin);
            position.place_piece(target, piece);
        }
        MoveKind::KingCastle => {
            position.remove_piece(origin);
            position.place_piece(target, piece);
            let rank = rank_of(origin);
            let rook_from = file_rank_to_square(7, rank);
            let rook_to = file_rank_to_square(5, rank);
            let rook = position.piece_at(rook_from);
            position.remove_piece(rook_from);
            position.place_piece(rook_to, rook);
        }
        MoveKind::QueenCastle => {
            position.remove_piece(origin);
            position.place_piece(target, piece);
            let rank = rank_of(origin);
            let rook_from = file_rank_to_square(0, rank);
            let rook_to = file_rank_to_square(3, rank);
            let rook = position.piece_at(rook_from);
            position.remove_piece(rook_from);
            position.place_piece(rook_to, rook);
        }
        MoveKind::KnightPromotion
        | MoveKind::BishopPromotion
        | MoveKind::RookPromotion
        | MoveKind::QueenPromotion
        | MoveKind::KnightPromotionCapture
        | MoveKind::BishopPromotionCapture
        | MoveKind::RookPromotionCapture
        | MoveKind::QueenPromotionCapture => {
            if move_is_capture(mv) {
                position.set_captured_piece(position.piece_at(target));
            }
            let promoted = move_promotion_kind(mv)
                .map(|kind| Piece::new(kind, color))
                .unwrap_or(piece);
            position.remove_piece(origin);
            position.place_piece(target, promoted);
        }
    }

    update_castling_rights(position, origin, target);
    position.flip_side_to_move();
    if color == Color::Black {
        position.increment_fullmove_counter();
    }
}

pub fn undo_move(position: &mut Position, mv: Move) {
    let origin = move_origin(mv);
    let target = move_target(mv);
    let kind = move_kind(mv);

    position.flip_side_to_move();
    let color = position.side_to_move;
    if color == Color::Black {
        position.decrement_fullmove_counter();
    }
    let captured = position.captured_piece();

    match kind {
        MoveKind::Other | MoveKind::DoublePawnPush => {
            let piece = position.piece_at(target);
            position.remove_piece(target);
            position.place_piece(origin, piece);
        }
        MoveKind::Capture => {
            let piece = position.piece_at(target);
            position.remove_piece(target);
            position.place_piece(origin, piece);
            position.place_piece(target, captured);
        }
        MoveKind::EnPassantCapture => {
            let piece = position.piece_at(target);
            position.remove_piece(target);
            position.place_piece(origin, piece);
            position.place_piece(en_passant_victim_square(origin, target), captured);
        }
        MoveKind::KingCastle => {
            let king = position.piece_at(target);
            position.remove_piece(target);
            position.place_piece(origin, king);
            let rank = rank_of(origin);
            let rook = position.piece_at(file_rank_to_square(5, rank));
            position.remove_piece(file_rank_to_square(5, rank));
            position.place_piece(file_rank_to_square(7, rank), rook);
        }
        MoveKind::QueenCastle => {
            let king = position.piece_at(target);
            position.remove_piece(target);
            position.place_piece(origin, king);
            let rank = rank_of(origin);
            let rook = position.piece_at(file_rank_to_square(3, rank));
            position.remove_piece(file_rank_to_square(3, rank));
            position.place_piece(file_rank_to_square(0, rank), rook);
        }
        MoveKind::KnightPromotion
        | MoveKind::BishopPromotion
        | MoveKind::RookPromotion
        | MoveKind::QueenPromotion
        | MoveKind::KnightPromotionCapture
        | MoveKind::BishopPromotionCapture
        | MoveKind::RookPromotionCapture
        | MoveKind::QueenPromotionCapture => {
            position.remove_piece(target);
            position.place_piece(origin, Piece::new(PieceKind::Pawn, color));
            if move_is_capture(mv) {
                position.place_piece(target, captured);
            }
        }
    }

    position.backtrack_irreversible_state();
}

pub fn do_null_move(position: &mut Position) {
    position.start_new_irreversible_state();
    position.unset_en_passant();
    position.flip_side_to_move();
}

pub fn undo_null_move(position: &mut Position) {
    position.flip_side_to_move();
    position.backtrack_irreversible_state();
}

/// True if the side to move is in check.
#[inline]
pub fn is_in_check(position: &Position) -> bool {
    let color = position.side_to_move;
    is_square_attacked(position.king_square(color), color.opposite(), position)
}

/// A pseudo-legal move is legal iff the mover's king is not attacked once
/// the move has been applied. Checked by doing and undoing the move.
pub fn move_is_legal(position: &mut Position, mv: Move) -> bool {
    let mover = position.side_to_move;
    do_move(position, mv);
    let legal = !is_square_attacked(
        position.king_square(mover),
        position.side_to_move,
        position,
    );
    undo_move(position, mv);
    legal
}
