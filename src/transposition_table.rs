/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The transposition table (C7), owned by a single search call (spec §5).
//!
//! Unlike the teacher's lock-free array of atomics (built for a
//! multi-threaded UCI engine sharing one table across search workers),
//! this engine's concurrency model is single-threaded per call (spec §5:
//! "owned by one search"), and the eviction policy the spec asks for
//! ("size reaches 0.9·max, evict oldest 25%, never evict an entry deeper
//! than the candidate's and `Exact`") is naturally expressed by a plain
//! hash map rather than a fixed-size probe array, so that's what this
//! uses.

use std::collections::HashMap;

use crate::{defs::Move, evaluation::Eval};

/// The bound of a stored score, depending on how the search obtained it.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Bound {
    /// `best_score >= beta`.
    Lower,
    /// `alpha < best_score < beta`.
    Exact,
    /// `best_score <= alpha`.
    Upper,
}

/// A single transposition table entry.
#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub score: Eval,
    pub static_eval: Eval,
    pub best_move: Option<Move>,
    pub depth: u8,
    pub bound: Bound,
    /// Insertion order, used only by the eviction policy below.
    generation: u64,
}

pub struct TranspositionTable {
    table: HashMap<u64, Entry>,
    max_entries: usize,
    next_generation: u64,
}

impl TranspositionTable {
    /// Builds an empty table sized for roughly `size_mib` mebibytes.
    #[must_use]
    pub fn with_capacity_mib(size_mib: usize) -> Self {
        let max_entries = (size_mib * 1024 * 1024 / std::mem::size_of::<Entry>()).max(1);
        Self {
            table: HashMap::with_capacity(max_entries.min(1 << 16)),
            max_entries,
            next_generation: 0,
        }
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.next_generation = 0;
    }

    #[must_use]
    pub fn load(&self, key: u64) -> Option<Entry> {
        self.table.get(&key).copied()
    }

    pub fn store(
        &mut self,
        key: u64,
        score: Eval,
        static_eval: Eval,
        best_move: Option<Move>,
        depth: u8,
        bound: Bound,
    ) {
        self.evict_if_full(depth);
        let generation = self.next_generation;
        self.next_generation += 1;
        self.table.insert(
            key,
            Entry {
                score,
                static_eval,
                best_move,
                depth,
                bound,
                generation,
            },
        );
    }

    /// When occupancy reaches 0.9 of the configured capacity, evicts the
    /// oldest quarter of entries — but never one whose depth strictly
    /// exceeds `candidate_depth` (the entry about to be inserted) and whose
    /// bound is `Exact` (spec §5).
    fn evict_if_full(&mut self, candidate_depth: u8) {
        if self.table.len() < (self.max_entries * 9) / 10 {
            return;
        }
        let evict_count = self.table.len() / 4;

        let mut by_age: Vec<(u64, u64)> =
            self.table.iter().map(|(&key, e)| (key, e.generation)).collect();
        by_age.sort_by_key(|&(_, generation)| generation);

        let mut removed = 0;
        for (key, _) in by_age {
            if removed >= evict_count {
                break;
            }
            let protected = self
                .table
                .get(&key)
                .is_some_and(|e| e.bound == Bound::Exact && e.depth > candidate_depth);
            if protected {
                continue;
            }
            self.table.remove(&key);
            removed += 1;
        }
    }

    /// Fullness per mille, for reporting.
    #[must_use]
    pub fn hashfull(&self) -> usize {
        (self.table.len() * 1000) / self.max_entries.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_loads_an_entry() {
        let mut tt = TranspositionTable::with_capacity_mib(1);
        tt.store(42, 100, 90, None, 5, Bound::Exact);
        let entry = tt.load(42).expect("entry was just stored");
        assert_eq!(entry.score, 100);
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.bound, Bound::Exact);
    }

    #[test]
    fn missing_key_returns_none() {
        let tt = TranspositionTable::with_capacity_mib(1);
        assert!(tt.load(7).is_none());
    }

    #[test]
    fn eviction_keeps_table_below_capacity() {
        let mut tt = TranspositionTable::with_capacity_mib(1);
        tt.max_entries = 100;
        for i in 0..200u64 {
            tt.store(i, 0, 0, None, 1, Bound::Upper);
        }
        assert!(tt.table.len() <= tt.max_entries);
    }
}
