//! Magic-bitboard construction for sliding pieces.
//!
//! For every square we find a 64-bit multiplier that perfectly hashes all
//! relevant blocker subsets into a shared attack table. Candidates are
//! drawn from a seeded RNG so the tables are identical on every run.

use crate::game_state::chess_types::{
    file_of, rank_of, Bitboard, Square, FILE_A_BB, FILE_H_BB, RANK_1_BB, RANK_8_BB,
};
use rand::rngs::StdRng;
use rand::RngCore;

/// Shared attack-table sizes: the sum of `1 << popcount(mask)` over all 64
/// squares for each piece.
pub const ROOK_TABLE_SIZE: usize = 0x19000;
pub const BISHOP_TABLE_SIZE: usize = 0x1480;

#[derive(Debug, Clone, Copy)]
pub struct MagicEntry {
    pub mask: Bitboard,
    pub magic: u64,
    pub shift: u32,
    pub offset: usize,
}

impl MagicEntry {
    /// Index into the shared attack table for an occupancy.
    #[inline]
    pub fn table_index(&self, occupancy: Bitboard) -> usize {
        let relevant = occupancy & self.mask;
        self.offset + (relevant.wrapping_mul(self.magic) >> self.shift) as usize
    }
}

/// Magic numbers are usually sparse, so candidates with only about 1/8 of
/// their bits set converge much faster than uniform draws.
#[inline]
fn next_sparse_candidate(rng: &mut StdRng) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

/// Build the magic entries for one sliding piece and fill its shared attack
/// table. `slow_attacks` is the ray-scanning generator for that piece.
pub fn find_magics(
    slow_attacks: impl Fn(Square, Bitboard) -> Bitboard,
    table: &mut [Bitboard],
    rng: &mut StdRng,
) -> [MagicEntry; 64] {
    let mut magics = [MagicEntry {
        mask: 0,
        magic: 0,
        shift: 0,
        offset: 0,
    }; 64];

    let mut offset = 0usize;
    for square in 0..64u8 {
        // Board edges along a ray contribute no blocker information unless
        // the ray starts there, so they are stripped from the mask.
        let edges = ((FILE_A_BB | FILE_H_BB) & !file_bitboard(file_of(square)))
            | ((RANK_1_BB | RANK_8_BB) & !rank_bitboard(rank_of(square)));
        let mask = slow_attacks(square, 0) & !edges;
        let shift = 64 - mask.count_ones();

        // Enumerate every subset of the mask with the Carry-Rippler trick
        // and record the reference attack set for each.
        let mut occupancies = Vec::new();
        let mut references = Vec::new();
        let mut subset = 0u64;
        loop {
            occupancies.push(subset);
            references.push(slow_attacks(square, subset));
            subset = subset.wrapping_sub(mask) & mask;
            if subset == 0 {
                break;
            }
        }
        let size = occupancies.len();
        let slots = &mut table[offset..offset + size];

        // Try sparse candidates until one maps every subset to a unique
        // index or to an index that already carries the same attack set.
        // The per-slot attempt stamps make collisions within one attempt
        // invalidate the candidate without clearing the whole table.
        let mut attempt_stamps = vec![0u32; size];
        let mut current_attempt = 0u32;
        let mut magic = 0u64;
        let mut verified = 0usize;
        while verified < size {
            let mut candidate = next_sparse_candidate(rng);
            while (candidate.wrapping_mul(mask) >> 56).count_ones() < 6 {
                candidate = next_sparse_candidate(rng);
            }
            current_attempt += 1;

            verified = 0;
            while verified < size {
                let index = (occupancies[verified].wrapping_mul(candidate) >> shift) as usize;
                if attempt_stamps[index] < current_attempt {
                    attempt_stamps[index] = current_attempt;
                    slots[index] = references[verified];
                } else if slots[index] != references[verified] {
                    break;
                }
                verified += 1;
            }
            magic = candidate;
        }

        magics[square as usize] = MagicEntry {
            mask,
            magic,
            shift,
            offset,
        };
        offset += size;
    }

    magics
}

#[inline]
fn file_bitboard(file: u8) -> Bitboard {
    FILE_A_BB << file
}

#[inline]
fn rank_bitboard(rank: u8) -> Bitboard {
    RANK_1_BB << (8 * rank as u32)
}
