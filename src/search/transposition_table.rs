//! Fixed-capacity transposition table keyed by Zobrist hash.
//!
//! Slot index is `hash mod capacity` with the capacity chosen as the
//! largest prime below the byte budget, which spreads clustered hashes.
//! Replacement is always-overwrite; a probe hits only when the stored full
//! hash matches. The table is owned by whoever runs the search, so the
//! lifecycle is plain Rust ownership: create, resize, clear, drop.

use crate::moves::move_codes::{Move, NULL_MOVE};

/// How the stored score bounds the true score of the node.
///
/// `Exact` nodes had all moves searched inside the window. `Lower` nodes
/// had a beta cutoff, so the true score is at least the stored one.
/// `Upper` nodes never raised alpha, so the true score is at most the
/// stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy)]
pub struct NodeData {
    pub hash: u64,
    pub score: i16,
    pub depth: u8,
    pub bound: Bound,
    pub best_move: Move,
}

const EMPTY_NODE: NodeData = NodeData {
    hash: 0,
    score: 0,
    depth: 0,
    bound: Bound::Upper,
    best_move: NULL_MOVE,
};

#[derive(Debug)]
pub struct TranspositionTable {
    entries: Vec<NodeData>,
}

impl TranspositionTable {
    /// Create a table using `size_mib` mebibytes.
    pub fn new(size_mib: usize) -> Self {
        Self {
            entries: vec![EMPTY_NODE; compute_capacity(size_mib)],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash % self.entries.len() as u64) as usize
    }

    /// Look up the entry for `hash`; a hit requires the full stored hash
    /// to match.
    #[inline]
    pub fn probe(&self, hash: u64) -> Option<NodeData> {
        let entry = self.entries[self.index(hash)];
        if entry.hash == hash {
            Some(entry)
        } else {
            None
        }
    }

    /// Store an entry, overwriting whatever occupied the slot.
    #[inline]
    pub fn store(&mut self, entry: NodeData) {
        let index = self.index(entry.hash);
        self.entries[index] = entry;
    }

    /// Advisory hint that the slot for `hash` will be read soon.
    #[inline]
    pub fn prefetch(&self, hash: u64) {
        #[cfg(target_arch = "x86_64")]
        {
            use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};
            let index = self.index(hash);
            unsafe {
                _mm_prefetch::<_MM_HINT_T0>(self.entries.as_ptr().add(index) as *const i8);
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            let _ = hash;
        }
    }

    /// Reallocate to a new size. Entries that survive the capacity change
    /// keep working since lookups always verify the full hash.
    pub fn resize(&mut self, size_mib: usize) {
        self.entries.resize(compute_capacity(size_mib), EMPTY_NODE);
    }

    pub fn clear(&mut self) {
        self.entries.fill(EMPTY_NODE);
    }
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    let mut m = 2usize;
    while m * m <= n {
        if n % m == 0 {
            return false;
        }
        m += 1;
    }
    true
}

/// Greatest prime less than or equal to `n`. `n` must be at least 2.
fn find_prime(n: usize) -> usize {
    let mut p = n;
    while p > 1 {
        if is_prime(p) {
            return p;
        }
        p -= 1;
    }
    2
}

fn compute_capacity(size_mib: usize) -> usize {
    const MIB: usize = 1 << 20;
    let entry_size = std::mem::size_of::<NodeData>().max(1);
    let budget = size_mib
        .checked_mul(MIB)
        .map(|bytes| bytes / entry_size)
        .unwrap_or(usize::MAX / entry_size);
    find_prime(budget.max(2))
}
