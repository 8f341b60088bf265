//! ASCII board rendering for logs and test diagnostics.

use crate::game_state::chess_types::*;
use crate::game_state::position::Position;

pub fn render_position(position: &Position) -> String {
    let mut out = String::new();

    for rank in (0..8u8).rev() {
        out.push(char::from(b'1' + rank));
        out.push(' ');
        for file in 0..8u8 {
            let piece = position.piece_at(file_rank_to_square(file, rank));
            let ch = if piece.is_none() {
                '.'
            } else {
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
            };
            out.push(ch);
            out.push(' ');
        }
        out.push('\n');
    }
    out.push_str("  a b c d e f g h\n");

    out
}

#[cfg(test)]
mod tests {
    use super::render_position;
    use crate::game_state::position::Position;

    #[test]
    fn starting_position_renders_all_ranks() {
        let rendered = render_position(&Position::new_game());
        assert_eq!(rendered.lines().count(), 9);
        assert!(rendered.starts_with("8 r n b q k b n r"));
        assert!(rendered.contains("1 R N B Q K B N R"));
    }
}
