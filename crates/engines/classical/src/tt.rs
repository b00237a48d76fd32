//! Transposition table.
//!
//! A power-of-two array of two-entry buckets indexed by the low bits of the
//! Zobrist key. Updates for a key already present are depth-gated: a shallower
//! result never overwrites a deeper one. Collisions on the full 64-bit key are
//! accepted.

use chess_core::Move;

use crate::eval::MATE_THRESHOLD;

/// How the stored score relates to the true value of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The score is the exact minimax value.
    Exact,
    /// The search failed high; the true value is at least the score.
    LowerBound,
    /// No move beat alpha; the true value is at most the score.
    UpperBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    pub key: u64,
    /// Remaining depth the entry was searched to.
    pub depth: i32,
    /// Side-to-move score, mate distances measured from this node.
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Move>,
    generation: u8,
}

pub struct TranspositionTable {
    buckets: Vec<[Option<TtEntry>; Self::WAYS]>,
    mask: usize,
    generation: u8,
}

impl TranspositionTable {
    const WAYS: usize = 2;

    /// Table using roughly `megabytes` of memory (at least one bucket).
    pub fn new(megabytes: usize) -> Self {
        let bucket_size = std::mem::size_of::<[Option<TtEntry>; Self::WAYS]>();
        let wanted = (megabytes.max(1) * 1024 * 1024) / bucket_size;
        // Largest power of two that fits.
        let count = if wanted.is_power_of_two() {
            wanted
        } else {
            (wanted.next_power_of_two() >> 1).max(1)
        };
        Self {
            buckets: vec![[None; Self::WAYS]; count],
            mask: count - 1,
            generation: 0,
        }
    }

    #[inline]
    fn bucket(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    pub fn get(&self, key: u64) -> Option<TtEntry> {
        self.buckets[self.bucket(key)]
            .iter()
            .flatten()
            .find(|e| e.key == key)
            .copied()
    }

    /// Store a search result.
    ///
    /// An entry for the same key is only replaced by an equal or deeper
    /// search. Otherwise an empty slot is used first, then one left over from
    /// an earlier search, then the shallower of the two.
    pub fn put(&mut self, key: u64, depth: i32, score: i32, bound: Bound, best_move: Option<Move>) {
        let generation = self.generation;
        let entry = TtEntry {
            key,
            depth,
            score,
            bound,
            best_move,
            generation,
        };
        let idx = self.bucket(key);
        let bucket = &mut self.buckets[idx];

        if let Some(slot) = bucket.iter_mut().find(|s| s.is_some_and(|e| e.key == key)) {
            if slot.is_some_and(|e| depth >= e.depth) {
                *slot = Some(entry);
            }
            return;
        }

        let victim = bucket
            .iter()
            .position(Option::is_none)
            .or_else(|| bucket.iter().position(|s| s.is_some_and(|e| e.generation != generation)))
            .unwrap_or_else(|| {
                let depth_of = |s: &Option<TtEntry>| s.map_or(i32::MIN, |e| e.depth);
                if depth_of(&bucket[1]) < depth_of(&bucket[0]) {
                    1
                } else {
                    0
                }
            });
        bucket[victim] = Some(entry);
    }

    /// Mark the start of a new search; older entries become preferred victims.
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            *bucket = [None; Self::WAYS];
        }
        self.generation = 0;
    }

    /// Number of entries the table can hold.
    pub fn capacity(&self) -> usize {
        self.buckets.len() * Self::WAYS
    }

    /// Occupied entries, for diagnostics.
    pub fn len(&self) -> usize {
        self.buckets.iter().flatten().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Convert a root-relative mate score into one relative to the node at `ply`.
#[inline]
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply as i32
    } else if score <= -MATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`].
#[inline]
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply as i32
    } else if score <= -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

#[cfg(test)]
#[path = "tt_tests.rs"]
mod tt_tests;
