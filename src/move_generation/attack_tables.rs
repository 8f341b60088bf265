//! Precomputed attack tables and attack queries.
//!
//! Leaper attacks (knight, king) come from 64-entry tables, slider attacks
//! from the magic tables, and pawn attacks from cheap shifts. The tables
//! are built once per process behind a `OnceLock`; every subsystem reaches
//! them through [`attack_tables`].

use std::sync::OnceLock;

use crate::game_state::chess_types::*;
use crate::game_state::position::Position;
use crate::move_generation::magics::{
    find_magics, MagicEntry, BISHOP_TABLE_SIZE, ROOK_TABLE_SIZE,
};
use crate::move_generation::rays::{
    build_ray_bitboards, shift_east, shift_north, shift_north_east, shift_north_west,
    shift_south, shift_south_east, shift_south_west, shift_west,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seed for the magic-number search; fixed so every run builds identical
/// tables.
const MAGIC_RNG_SEED: u64 = 374_583;

pub struct AttackTables {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    rook_magics: [MagicEntry; 64],
    bishop_magics: [MagicEntry; 64],
    rook_table: Vec<Bitboard>,
    bishop_table: Vec<Bitboard>,
}

static TABLES: OnceLock<AttackTables> = OnceLock::new();

#[inline]
pub fn attack_tables() -> &'static AttackTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> AttackTables {
    let rays = build_ray_bitboards();
    let mut rng = StdRng::seed_from_u64(MAGIC_RNG_SEED);

    let mut rook_table = vec![0u64; ROOK_TABLE_SIZE];
    let rook_magics = find_magics(
        |sq, occ| crate::move_generation::rays::slow_rook_attacks(&rays, sq, occ),
        &mut rook_table,
        &mut rng,
    );

    let mut bishop_table = vec![0u64; BISHOP_TABLE_SIZE];
    let bishop_magics = find_magics(
        |sq, occ| crate::move_generation::rays::slow_bishop_attacks(&rays, sq, occ),
        &mut bishop_table,
        &mut rng,
    );

    let mut knight = [0u64; 64];
    let mut king = [0u64; 64];
    for square in 0..64usize {
        let bb = 1u64 << square;

        let l1 = (bb >> 1) & 0x7f7f_7f7f_7f7f_7f7f;
        let l2 = (bb >> 2) & 0x3f3f_3f3f_3f3f_3f3f;
        let r1 = (bb << 1) & 0xfefe_fefe_fefe_fefe;
        let r2 = (bb << 2) & 0xfcfc_fcfc_fcfc_fcfc;
        let h1 = l1 | r1;
        let h2 = l2 | r2;
        knight[square] = (h1 << 16) | (h1 >> 16) | (h2 << 8) | (h2 >> 8);

        let mut attacks = shift_east(bb, 1) | shift_west(bb, 1);
        let expanded = bb | attacks;
        attacks |= shift_north(expanded, 1) | shift_south(expanded, 1);
        king[square] = attacks;
    }

    AttackTables {
        knight,
        king,
        rook_magics,
        bishop_magics,
        rook_table,
        bishop_table,
    }
}

impl AttackTables {
    #[inline]
    pub fn knight_attacks(&self, square: Square) -> Bitboard {
        self.knight[square as usize]
    }

    #[inline]
    pub fn king_attacks(&self, square: Square) -> Bitboard {
        self.king[square as usize]
    }

    #[inline]
    pub fn rook_attacks(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        self.rook_table[self.rook_magics[square as usize].table_index(occupancy)]
    }

    #[inline]
    pub fn bishop_attacks(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        self.bishop_table[self.bishop_magics[square as usize].table_index(occupancy)]
    }

    #[inline]
    pub fn queen_attacks(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        self.rook_attacks(square, occupancy) | self.bishop_attacks(square, occupancy)
    }
}

/// Squares a pawn of `color` on `square` attacks. Computed from shifts;
/// pawns are cheap enough that no table is needed.
#[inline]
pub fn pawn_attacks(square: Square, color: Color) -> Bitboard {
    let bb = 1u64 << square;
    match color {
        Color::White => shift_north_east(bb) | shift_north_west(bb),
        Color::Black => shift_south_east(bb) | shift_south_west(bb),
    }
}

/// True if any piece of `by_side` attacks `square`. Piece movement is
/// symmetric, so attacks generated *from* the square intersected with the
/// attacker bitboards answer the question; pawns use the inverse color
/// pattern since their captures are the one asymmetric movement.
pub fn is_square_attacked(square: Square, by_side: Color, position: &Position) -> bool {
    let tables = attack_tables();
    let occupancy = position.occupancy();

    let pawns = position.piece_bitboard(Piece::new(PieceKind::Pawn, by_side));
    if pawn_attacks(square, by_side.opposite()) & pawns != 0 {
        return true;
    }

    let knights = position.piece_bitboard(Piece::new(PieceKind::Knight, by_side));
    if tables.knight_attacks(square) & knights != 0 {
        return true;
    }

    let queens = position.piece_bitboard(Piece::new(PieceKind::Queen, by_side));
    let rooks_queens =
        position.piece_bitboard(Piece::new(PieceKind::Rook, by_side)) | queens;
    if tables.rook_attacks(square, occupancy) & rooks_queens != 0 {
        return true;
    }

    let bishops_queens =
        position.piece_bitboard(Piece::new(PieceKind::Bishop, by_side)) | queens;
    if tables.bishop_attacks(square, occupancy) & bishops_queens != 0 {
        return true;
    }

    let king = position.piece_bitboard(Piece::new(PieceKind::King, by_side));
    tables.king_attacks(square) & king != 0
}

/// Bitboard of all pieces of either color directly attacking `square`.
/// X-ray attackers behind another slider are not included.
pub fn attackers_of(square: Square, position: &Position) -> Bitboard {
    let tables = attack_tables();
    let occupancy = position.occupancy();

    let white_pawns = position.piece_bitboard(Piece::new(PieceKind::Pawn, Color::White));
    let black_pawns = position.piece_bitboard(Piece::new(PieceKind::Pawn, Color::Black));
    let knights = position.type_bb[PieceKind::Knight.index()];
    let kings = position.type_bb[PieceKind::King.index()];
    let queens = position.type_bb[PieceKind::Queen.index()];
    let bishops_queens = position.type_bb[PieceKind::Bishop.index()] | queens;
    let rooks_queens = position.type_bb[PieceKind::Rook.index()] | queens;

    (pawn_attacks(square, Color::White) & black_pawns)
        | (pawn_attacks(square, Color::Black) & white_pawns)
        | (tables.knight_attacks(square) & knights)
        | (tables.king_attacks(square) & kings)
        | (tables.bishop_attacks(square, occupancy) & bishops_queens)
        | (tables.rook_attacks(square, occupancy) & rooks_queens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::position::Position;

    #[test]
    fn knight_and_king_attack_counts() {
        let tables = attack_tables();
        assert_eq!(tables.knight_attacks(0).count_ones(), 2); // a1
        assert_eq!(tables.knight_attacks(27).count_ones(), 8); // d4
        assert_eq!(tables.king_attacks(0).count_ones(), 3);
        assert_eq!(tables.king_attacks(27).count_ones(), 8);
    }

    #[test]
    fn slider_attacks_respect_blockers() {
        let tables = attack_tables();
        // Rook on d4 with a blocker on d6 must not see d7.
        let attacks = tables.rook_attacks(27, 1u64 << 43);
        assert_ne!(attacks & (1u64 << 35), 0);
        assert_ne!(attacks & (1u64 << 43), 0);
        assert_eq!(attacks & (1u64 << 51), 0);

        let queen = tables.queen_attacks(27, 0);
        assert_eq!(queen.count_ones(), 27);
    }

    #[test]
    fn pawn_attack_patterns_are_asymmetric() {
        assert_eq!(pawn_attacks(28, Color::White), (1u64 << 35) | (1u64 << 37));
        assert_eq!(pawn_attacks(28, Color::Black), (1u64 << 19) | (1u64 << 21));
        // Edge files must not wrap.
        assert_eq!(pawn_attacks(24, Color::White), 1u64 << 33);
        assert_eq!(pawn_attacks(31, Color::White), 1u64 << 38);
    }

    #[test]
    fn square_attacks_in_the_starting_position() {
        let position = Position::new_game();
        // e4 and d4 are not attacked by anyone yet; e3 is covered by white
        // pawns, e6 by black pawns.
        assert!(!is_square_attacked(28, Color::Black, &position));
        assert!(is_square_attacked(20, Color::White, &position));
        assert!(is_square_attacked(44, Color::Black, &position));
        // f3 is guarded by the g1 knight and the e2/g2 pawns.
        assert!(is_square_attacked(21, Color::White, &position));
    }

    #[test]
    fn attackers_of_counts_both_sides_without_xrays() {
        let position = Position::from_fen("4k3/8/8/3p4/8/2N1N3/8/3RK3 w - - 0 1")
            .expect("FEN should parse");
        // d5 pawn square: attacked by both knights and the d1 rook... but
        // the rook is blocked by nothing on the d-file, so it counts too.
        let attackers = attackers_of(35, &position);
        assert_ne!(attackers & (1u64 << 18), 0); // Nc3
        assert_ne!(attackers & (1u64 << 20), 0); // Ne3
        assert_ne!(attackers & (1u64 << 3), 0); // Rd1
        assert_eq!(attackers.count_ones(), 3);
    }
}
