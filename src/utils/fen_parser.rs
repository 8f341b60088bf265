//! FEN-to-Position parser.
//!
//! Builds fully-populated board state from a Forsyth-Edwards Notation
//! string: piece placement, side to move, castling rights, en-passant
//! square, and clocks. Malformed strings are rejected, but chess legality
//! beyond the grammar is not enforced — a board with nine pawns parses
//! fine, which keeps non-standard setups usable.

use crate::game_state::chess_types::*;
use crate::game_state::position::Position;
use crate::utils::algebraic::algebraic_to_square;

pub fn parse_fen(fen: &str) -> Result<Position, String> {
    let mut parts = fen.split_whitespace();

    let board_part = parts.next().ok_or("Missing board layout in FEN")?;
    let side_part = parts.next().ok_or("Missing side-to-move in FEN")?;
    let castling_part = parts.next().ok_or("Missing castling rights in FEN")?;
    let en_passant_part = parts.next().ok_or("Missing en-passant square in FEN")?;
    let halfmove_part = parts.next().ok_or("Missing halfmove clock in FEN")?;
    let fullmove_part = parts.next().ok_or("Missing fullmove counter in FEN")?;

    if parts.next().is_some() {
        return Err("FEN has extra trailing fields".to_owned());
    }

    let mut position = Position::new_empty();

    parse_board(board_part, &mut position)?;
    position.side_to_move = parse_side_to_move(side_part)?;
    parse_castling_rights(castling_part, &mut position)?;
    parse_en_passant(en_passant_part, &mut position)?;

    let halfmove = halfmove_part
        .parse::<u16>()
        .map_err(|_| format!("Invalid halfmove clock: {halfmove_part}"))?;
    position.set_halfmove_clock(halfmove.min(u8::MAX as u16) as u8);

    position.fullmove_counter = fullmove_part
        .parse::<u16>()
        .map_err(|_| format!("Invalid fullmove counter: {fullmove_part}"))?;

    Ok(position)
}

fn parse_board(board_part: &str, position: &mut Position) -> Result<(), String> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err("Board layout must contain 8 ranks".to_owned());
    }

    for (fen_rank_index, rank_str) in ranks.iter().enumerate() {
        let board_rank = 7 - fen_rank_index as u8;
        let mut file = 0u8;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(format!("Invalid empty-square count '{ch}'"));
                }
                file += empty_count as u8;
                if file > 8 {
                    return Err("Board rank overflows 8 files".to_owned());
                }
                continue;
            }

            let piece = piece_from_fen_char(ch)
                .ok_or_else(|| format!("Invalid piece character '{ch}' in board layout"))?;

            if file >= 8 {
                return Err("Board rank has too many files".to_owned());
            }

            position.place_piece(file_rank_to_square(file, board_rank), piece);
            file += 1;
        }

        if file != 8 {
            return Err("Board rank does not sum to 8 files".to_owned());
        }
    }

    Ok(())
}

fn parse_side_to_move(side_part: &str) -> Result<Color, String> {
    match side_part {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(format!("Invalid side-to-move field: {side_part}")),
    }
}

fn parse_castling_rights(castling_part: &str, position: &mut Position) -> Result<(), String> {
    if castling_part == "-" {
        return Ok(());
    }

    let mut seen: CastlingRights = 0;
    for ch in castling_part.chars() {
        let (color, side) = match ch {
            'K' => (Color::White, CastlingSide::King),
            'Q' => (Color::White, CastlingSide::Queen),
            'k' => (Color::Black, CastlingSide::King),
            'q' => (Color::Black, CastlingSide::Queen),
            _ => return Err(format!("Invalid castling rights character: {ch}")),
        };
        let bit = side.rights_bit(color);
        if seen & bit != 0 {
            return Err(format!("Repeated castling rights character: {ch}"));
        }
        seen |= bit;
        position.add_castling(color, side);
    }

    Ok(())
}

fn parse_en_passant(en_passant_part: &str, position: &mut Position) -> Result<(), String> {
    if en_passant_part == "-" {
        return Ok(());
    }

    let square = algebraic_to_square(en_passant_part)?;
    let rank = rank_of(square);
    if rank != 2 && rank != 5 {
        return Err(format!(
            "En-passant square must be on rank 3 or 6: {en_passant_part}"
        ));
    }
    position.set_en_passant(file_of(square));
    Ok(())
}

fn piece_from_fen_char(ch: char) -> Option<Piece> {
    let color = if ch.is_ascii_uppercase() {
        Color::White
    } else if ch.is_ascii_lowercase() {
        Color::Black
    } else {
        return None;
    };

    let kind = match ch.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };

    Some(Piece::new(kind, color))
}
