//! Static evaluation and move-ordering heuristics.
//!
//! The position score blends midgame and endgame components by game phase:
//! material, piece-square tables, the bishop pair, and king-pawn distance
//! in the endgame. Move scoring for ordering combines piece-square deltas
//! with MVV-LVA and a recursive static exchange evaluation for captures.

use crate::evaluation::piece_square_tables::{square_score, PhaseScore};
use crate::game_state::chess_types::*;
use crate::game_state::make_move::{do_move, undo_move};
use crate::game_state::position::Position;
use crate::move_generation::attack_tables::attackers_of;
use crate::moves::move_codes::*;

/// Intrinsic piece values in centipawns, in piece-kind order.
pub const POINT_VALUES: [i32; 6] = [100, 325, 350, 500, 1000, 10_000];

#[inline]
pub fn piece_value(kind: PieceKind) -> i32 {
    POINT_VALUES[kind.index()]
}

/// MVV-LVA surrogate value of an attacker: the cheaper the attacker, the
/// higher the value, so low pieces capturing high pieces sort first.
#[inline]
fn attacker_value(kind: PieceKind) -> i32 {
    POINT_VALUES[POINT_VALUES.len() - 1 - kind.index()]
}

/// True if `color` has bishops on both square colors.
pub fn has_bishop_pair(position: &Position, color: Color) -> bool {
    let bishops = position.piece_bitboard(Piece::new(PieceKind::Bishop, color));
    bishops & LIGHT_SQUARES_BB != 0 && bishops & DARK_SQUARES_BB != 0
}

/// Smallest Chebyshev distance from the king of `color` to one of its own
/// pawns, clamped to `0..=5`. Matters in endgames where distant pawns fall
/// to rook attacks.
fn smallest_pawn_distance(position: &Position, color: Color) -> i32 {
    let king_square = position.king_square(color);
    let king_file = file_of(king_square) as i32;
    let king_rank = rank_of(king_square) as i32;

    let mut distance = 6;
    let mut pawns = position.piece_bitboard(Piece::new(PieceKind::Pawn, color));
    while pawns != 0 {
        let square = pawns.trailing_zeros() as Square;
        pawns &= pawns - 1;
        let file_distance = (king_file - file_of(square) as i32).abs();
        let rank_distance = (king_rank - rank_of(square) as i32).abs();
        distance = distance.min(file_distance.max(rank_distance));
    }
    distance - 1
}

fn material_balance(position: &Position) -> i32 {
    let us = position.side_to_move;
    let them = us.opposite();

    let mut material = 0;
    for kind in &ALL_PIECE_KINDS[..5] {
        let own = position.number_of_pieces(Piece::new(*kind, us)) as i32;
        let theirs = position.number_of_pieces(Piece::new(*kind, them)) as i32;
        material += piece_value(*kind) * (own - theirs);
    }
    material
}

/// Static evaluation in centipawns from the side to move's perspective.
pub fn evaluate(position: &Position) -> i32 {
    let us = position.side_to_move;
    let them = us.opposite();
    let phase = position.phase();

    let mut score = PhaseScore::default();

    for square in 0..64u8 {
        let piece = position.piece_at(square);
        if piece.is_none() {
            continue;
        }
        let table_score = square_score(piece.color(), piece.kind(), square);
        if piece.color() == us {
            score.mg += table_score.mg;
            score.eg += table_score.eg;
        } else {
            score.mg -= table_score.mg;
            score.eg -= table_score.eg;
        }
    }

    if has_bishop_pair(position, us) {
        score.mg += piece_value(PieceKind::Pawn) / 2;
        score.eg += piece_value(PieceKind::Pawn) / 2;
    }
    if has_bishop_pair(position, them) {
        score.mg -= piece_value(PieceKind::Pawn) / 2;
        score.eg -= piece_value(PieceKind::Pawn) / 2;
    }

    let material = material_balance(position);
    score.mg += material;
    score.eg += material;

    score.eg += 16 * smallest_pawn_distance(position, them);
    score.eg -= 16 * smallest_pawn_distance(position, us);

    (score.mg * (256 - phase) + score.eg * phase) / 256
}

/// Bitboard of the least valuable pieces of the side to move attacking
/// `square`, or 0 when nothing attacks it.
fn least_valuable_attackers(square: Square, position: &Position) -> Bitboard {
    let attackers = attackers_of(square, position);
    for kind in ALL_PIECE_KINDS {
        let piece = Piece::new(kind, position.side_to_move);
        let candidates = position.piece_bitboard(piece) & attackers;
        if candidates != 0 {
            return candidates;
        }
    }
    0
}

/// Total score of a capture sequence on `square`, with the least valuable
/// attacker recapturing each turn and each side free to stand pat. Must
/// only be called right after a capture, with an enemy piece on `square`.
/// A pawn reaching the back rank always recaptures into a queen.
fn evaluate_exchange(square: Square, position: &mut Position) -> i32 {
    let attackers = least_valuable_attackers(square, position);
    if attackers == 0 {
        return 0;
    }

    let from = attackers.trailing_zeros() as Square;
    let piece = position.piece_at(from);
    let back_rank = match piece.color() {
        Color::White => 7,
        Color::Black => 0,
    };
    let kind = if piece.kind() == PieceKind::Pawn && rank_of(square) == back_rank {
        MoveKind::QueenPromotionCapture
    } else {
        MoveKind::Capture
    };
    let mv = pack_move(from, square, kind);

    do_move(position, mv);
    let captured = position.captured_piece();
    let score = piece_value(captured.kind()) - evaluate_exchange(square, position);
    undo_move(position, mv);

    score.max(0)
}

fn mvv_lva(mv: Move, position: &Position) -> i32 {
    let attacker = position.piece_at(move_origin(mv));
    let victim_kind = if move_kind(mv) == MoveKind::EnPassantCapture {
        PieceKind::Pawn
    } else {
        position.piece_at(move_target(mv)).kind()
    };
    piece_value(victim_kind) + attacker_value(attacker.kind())
}

/// Score a capture for ordering. Cheap attackers taking rook-or-better
/// victims are obviously good, so the victim value is used directly; all
/// other captures run the full exchange evaluation.
fn evaluate_capture(mv: Move, position: &mut Position) -> i32 {
    let attacker_kind = position.piece_at(move_origin(mv)).kind();
    let victim_kind = if move_kind(mv) == MoveKind::EnPassantCapture {
        PieceKind::Pawn
    } else {
        position.piece_at(move_target(mv)).kind()
    };

    let mut score = mvv_lva(mv, position);
    if piece_value(attacker_kind) < piece_value(PieceKind::Rook)
        && piece_value(victim_kind) >= piece_value(PieceKind::Rook)
    {
        score += piece_value(victim_kind);
        if move_is_promotion(mv) {
            score += piece_value(PieceKind::Queen);
        }
    } else {
        do_move(position, mv);
        let captured = position.captured_piece();
        let exchange =
            piece_value(captured.kind()) - evaluate_exchange(move_target(mv), position);
        undo_move(position, mv);
        score += exchange;
    }

    score
}

/// Heuristic gain estimate for a move, used only for move ordering.
pub fn evaluate_move(mv: Move, position: &mut Position) -> i32 {
    let phase = position.phase();
    let origin = move_origin(mv);
    let target = move_target(mv);
    let piece = position.piece_at(origin);
    let color = piece.color();

    let mut score = PhaseScore::default();

    if move_is_promotion(mv) {
        // Capturing promotions are already handled by the exchange score.
        if !move_is_capture(mv) {
            let gain = piece_value(PieceKind::Queen) - piece_value(PieceKind::Pawn);
            score.mg += gain;
            score.eg += gain;
        }
        // A queen dwarfs the pawn, so where the pawn stood is irrelevant.
        let queen_score = square_score(color, PieceKind::Queen, target);
        score.mg += queen_score.mg;
        score.eg += queen_score.eg;
    } else {
        let to_score = square_score(color, piece.kind(), target);
        let from_score = square_score(color, piece.kind(), origin);
        score.mg += to_score.mg - from_score.mg;
        score.eg += to_score.eg - from_score.eg;
    }

    if move_is_capture(mv) {
        let capture_score = evaluate_capture(mv, position);
        score.mg += capture_score;
        score.eg += capture_score;
    }

    (score.mg * (256 - phase) + score.eg * phase) / 256
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::position::Position;

    /// Swap colors, mirror ranks and swap castling sides.
    fn mirror_color(position: &Position) -> Position {
        let mut mirrored = Position::new_empty();
        for square in 0..64u8 {
            let piece = position.piece_at(square);
            if piece.is_some() {
                let flipped = Piece::new(piece.kind(), piece.color().opposite());
                mirrored.place_piece(square ^ 56, flipped);
            }
        }
        mirrored.side_to_move = position.side_to_move.opposite();
        for side in [CastlingSide::Queen, CastlingSide::King] {
            if position.has_castling_right(Color::White, side) {
                mirrored.add_castling(Color::Black, side);
            }
            if position.has_castling_right(Color::Black, side) {
                mirrored.add_castling(Color::White, side);
            }
        }
        mirrored.fullmove_counter = position.fullmove_counter;
        mirrored
    }

    #[test]
    fn starting_position_evaluates_to_zero() {
        assert_eq!(evaluate(&Position::new_game()), 0);
    }

    #[test]
    fn evaluation_is_color_symmetric() {
        let fens = [
            "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQ1RK1 b kq - 4 6",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        ];
        for fen in fens {
            let position = Position::from_fen(fen).expect("FEN should parse");
            let mirrored = mirror_color(&position);
            assert_eq!(
                evaluate(&position),
                -evaluate(&mirrored),
                "asymmetric evaluation for {fen}"
            );
        }
    }

    #[test]
    fn material_advantage_dominates_the_score() {
        let up_a_queen =
            Position::from_fen("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1").expect("FEN should parse");
        assert!(evaluate(&up_a_queen) > 800);

        let down_a_rook =
            Position::from_fen("r3k3/8/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        assert!(evaluate(&down_a_rook) < -400);
    }

    #[test]
    fn bishop_pair_is_detected_by_square_color() {
        let pair = Position::from_fen("4k3/8/8/8/8/8/8/2BBK3 w - - 0 1")
            .expect("FEN should parse");
        assert!(has_bishop_pair(&pair, Color::White));

        // Two bishops on the same square color are not a pair.
        let same_color = Position::from_fen("4k3/8/8/8/8/8/8/B1B1K3 w - - 0 1")
            .expect("FEN should parse");
        assert!(!has_bishop_pair(&same_color, Color::White));
    }

    #[test]
    fn winning_capture_scores_higher_than_losing_capture() {
        // White pawn can take a defended knight (good) or the white rook
        // can take a pawn defended by another pawn (bad).
        let mut position = Position::from_fen("4k3/8/2p5/1p1n4/2P5/8/8/R3K3 w - - 0 1")
            .expect("FEN should parse");
        let pawn_takes_knight = pack_move(26, 35, MoveKind::Capture);
        let good = evaluate_move(pawn_takes_knight, &mut position);

        let mut position2 = Position::from_fen("4k3/8/2p5/1p6/8/8/8/1R2K3 w - - 0 1")
            .expect("FEN should parse");
        let rook_takes_pawn = pack_move(1, 33, MoveKind::Capture);
        let bad = evaluate_move(rook_takes_pawn, &mut position2);

        assert!(good > bad, "good={good} bad={bad}");
    }

    #[test]
    fn exchange_evaluation_sees_recaptures() {
        // Qxd5 where d5 is defended by a pawn: the queen is lost for a
        // pawn and the exchange must come out poor.
        let mut position = Position::from_fen("4k3/8/4p3/3p4/8/8/3Q4/4K3 w - - 0 1")
            .expect("FEN should parse");
        let queen_takes = pack_move(11, 35, MoveKind::Capture);
        let score = evaluate_move(queen_takes, &mut position);
        assert!(score < -300, "hanging the queen scored {score}");
    }
}
