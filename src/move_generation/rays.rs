//! Ray bitboards and slow sliding-attack generation.
//!
//! A ray bitboard holds every square in one of the eight directions from a
//! square. Scanning rays for blockers is far too slow for the search, so
//! these generators are only used while the magic attack tables are built.

use crate::game_state::chess_types::{
    file_of, rank_of, Bitboard, Square, FILE_A_BB, FILE_H_BB,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

pub const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
    Direction::NorthEast,
    Direction::NorthWest,
    Direction::SouthEast,
    Direction::SouthWest,
];

impl Direction {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::East => 2,
            Direction::West => 3,
            Direction::NorthEast => 4,
            Direction::NorthWest => 5,
            Direction::SouthEast => 6,
            Direction::SouthWest => 7,
        }
    }

    /// True for directions whose squares have higher indices than the
    /// origin, which decides the blocker-scan orientation.
    #[inline]
    const fn is_positive(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::East | Direction::NorthEast | Direction::NorthWest
        )
    }
}

/// Shift one step west, dropping bits that would wrap to file H.
#[inline]
pub fn shift_west(bb: Bitboard, steps: u8) -> Bitboard {
    let mut out = bb;
    for _ in 0..steps {
        out = (out >> 1) & !FILE_H_BB;
    }
    out
}

/// Shift one step east, dropping bits that would wrap to file A.
#[inline]
pub fn shift_east(bb: Bitboard, steps: u8) -> Bitboard {
    let mut out = bb;
    for _ in 0..steps {
        out = (out << 1) & !FILE_A_BB;
    }
    out
}

#[inline]
pub fn shift_north(bb: Bitboard, steps: u8) -> Bitboard {
    bb << (8 * steps as u32)
}

#[inline]
pub fn shift_south(bb: Bitboard, steps: u8) -> Bitboard {
    bb >> (8 * steps as u32)
}

#[inline]
pub fn shift_north_east(bb: Bitboard) -> Bitboard {
    shift_east(shift_north(bb, 1), 1)
}

#[inline]
pub fn shift_north_west(bb: Bitboard) -> Bitboard {
    shift_west(shift_north(bb, 1), 1)
}

#[inline]
pub fn shift_south_east(bb: Bitboard) -> Bitboard {
    shift_east(shift_south(bb, 1), 1)
}

#[inline]
pub fn shift_south_west(bb: Bitboard) -> Bitboard {
    shift_west(shift_south(bb, 1), 1)
}

fn ray_for(direction: Direction, square: Square) -> Bitboard {
    let file = file_of(square);
    let rank = rank_of(square);
    match direction {
        Direction::North => 0x0101_0101_0101_0100u64 << square,
        Direction::South => 0x0080_8080_8080_8080u64 >> (square ^ 63),
        Direction::East => 2 * ((1u64 << (square | 7)) - (1u64 << square)),
        Direction::West => (1u64 << square) - (1u64 << (square & 56)),
        Direction::NorthEast => shift_east(0x8040_2010_0804_0200, file) << (rank as u32 * 8),
        Direction::NorthWest => shift_west(0x0102_0408_1020_4000, 7 - file) << (rank as u32 * 8),
        Direction::SouthEast => {
            shift_east(0x0002_0408_1020_4080, file) >> ((7 - rank) as u32 * 8)
        }
        Direction::SouthWest => {
            shift_west(0x0040_2010_0804_0201, 7 - file) >> ((7 - rank) as u32 * 8)
        }
    }
}

pub type RayTable = [[Bitboard; 64]; 8];

pub fn build_ray_bitboards() -> RayTable {
    let mut rays = [[0u64; 64]; 8];
    for direction in ALL_DIRECTIONS {
        for square in 0..64u8 {
            rays[direction.index()][square as usize] = ray_for(direction, square);
        }
    }
    rays
}

/// Attacks along one ray, cut off at the first blocker. A generalized bit
/// scan shares the code for all eight directions: positive rays isolate the
/// lowest blocker, negative rays keep the highest, and a sentinel bit on
/// the far board edge keeps the scan away from an empty blocker set.
pub fn ray_attacks(
    rays: &RayTable,
    occupancy: Bitboard,
    direction: Direction,
    square: Square,
) -> Bitboard {
    let attacks = rays[direction.index()][square as usize];
    let mut blockers = attacks & occupancy;
    if direction.is_positive() {
        blockers |= 0x8000_0000_0000_0000;
        blockers &= blockers.wrapping_neg();
    } else {
        blockers |= 0x1;
    }
    let first_blocker = (63 - blockers.leading_zeros()) as usize;
    attacks ^ rays[direction.index()][first_blocker]
}

pub fn slow_rook_attacks(rays: &RayTable, square: Square, occupancy: Bitboard) -> Bitboard {
    ray_attacks(rays, occupancy, Direction::North, square)
        | ray_attacks(rays, occupancy, Direction::East, square)
        | ray_attacks(rays, occupancy, Direction::South, square)
        | ray_attacks(rays, occupancy, Direction::West, square)
}

pub fn slow_bishop_attacks(rays: &RayTable, square: Square, occupancy: Bitboard) -> Bitboard {
    ray_attacks(rays, occupancy, Direction::NorthEast, square)
        | ray_attacks(rays, occupancy, Direction::SouthEast, square)
        | ray_attacks(rays, occupancy, Direction::SouthWest, square)
        | ray_attacks(rays, occupancy, Direction::NorthWest, square)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rays_from_a_center_square_have_expected_lengths() {
        let rays = build_ray_bitboards();
        let c3 = 18u8;
        assert_eq!(rays[Direction::North.index()][c3 as usize].count_ones(), 5);
        assert_eq!(rays[Direction::South.index()][c3 as usize].count_ones(), 2);
        assert_eq!(rays[Direction::East.index()][c3 as usize].count_ones(), 5);
        assert_eq!(rays[Direction::West.index()][c3 as usize].count_ones(), 2);
        assert_eq!(
            rays[Direction::NorthEast.index()][c3 as usize].count_ones(),
            5
        );
        assert_eq!(
            rays[Direction::SouthWest.index()][c3 as usize].count_ones(),
            2
        );
    }

    #[test]
    fn rook_attacks_on_empty_board_cover_rank_and_file() {
        let rays = build_ray_bitboards();
        for square in [0u8, 28, 63] {
            let attacks = slow_rook_attacks(&rays, square, 0);
            assert_eq!(attacks.count_ones(), 14);
            assert_eq!(attacks & (1u64 << square), 0);
        }
    }

    #[test]
    fn blockers_cut_rook_rays_short() {
        let rays = build_ray_bitboards();
        // Rook on a1, blocker on a3: the north ray must stop at a3.
        let attacks = slow_rook_attacks(&rays, 0, 1u64 << 16);
        assert_ne!(attacks & (1u64 << 8), 0);
        assert_ne!(attacks & (1u64 << 16), 0);
        assert_eq!(attacks & (1u64 << 24), 0);
    }

    #[test]
    fn bishop_attacks_on_empty_board_follow_diagonals() {
        let rays = build_ray_bitboards();
        assert_eq!(slow_bishop_attacks(&rays, 0, 0).count_ones(), 7);
        assert_eq!(slow_bishop_attacks(&rays, 27, 0).count_ones(), 13);
    }
}
