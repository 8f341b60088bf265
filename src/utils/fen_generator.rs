//! Position-to-FEN emitter, the inverse of `fen_parser`.

use crate::game_state::chess_types::*;
use crate::game_state::position::Position;
use crate::utils::algebraic::square_to_algebraic;

pub fn generate_fen(position: &Position) -> String {
    let board = generate_board_field(position);
    let side_to_move = match position.side_to_move {
        Color::White => "w",
        Color::Black => "b",
    };
    let castling = generate_castling_field(position);
    let en_passant = generate_en_passant_field(position);

    format!(
        "{} {} {} {} {} {}",
        board,
        side_to_move,
        castling,
        en_passant,
        position.halfmove_clock(),
        position.fullmove_counter
    )
}

fn generate_board_field(position: &Position) -> String {
    let mut out = String::new();

    for rank in (0..8u8).rev() {
        let mut empty_count = 0u8;

        for file in 0..8u8 {
            let piece = position.piece_at(file_rank_to_square(file, rank));
            if piece.is_some() {
                if empty_count > 0 {
                    out.push(char::from(b'0' + empty_count));
                    empty_count = 0;
                }
                out.push(piece_to_fen_char(piece));
            } else {
                empty_count += 1;
            }
        }

        if empty_count > 0 {
            out.push(char::from(b'0' + empty_count));
        }

        if rank > 0 {
            out.push('/');
        }
    }

    out
}

fn piece_to_fen_char(piece: Piece) -> char {
    let base = match piece.kind() {
        PieceKind::Pawn => 'p',
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        PieceKind::Queen => 'q',
        PieceKind::King => 'k',
    };

    match piece.color() {
        Color::White => base.to_ascii_uppercase(),
        Color::Black => base,
    }
}

fn generate_castling_field(position: &Position) -> String {
    let mut out = String::new();

    if position.has_castling_right(Color::White, CastlingSide::King) {
        out.push('K');
    }
    if position.has_castling_right(Color::White, CastlingSide::Queen) {
        out.push('Q');
    }
    if position.has_castling_right(Color::Black, CastlingSide::King) {
        out.push('k');
    }
    if position.has_castling_right(Color::Black, CastlingSide::Queen) {
        out.push('q');
    }

    if out.is_empty() {
        out.push('-');
    }

    out
}

fn generate_en_passant_field(position: &Position) -> String {
    if !position.en_passant_possible() {
        return "-".to_owned();
    }

    square_to_algebraic(position.en_passant_square()).unwrap_or_else(|_| "-".to_owned())
}
