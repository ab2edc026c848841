/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

use arrayvec::ArrayVec;

use crate::defs::Move;

/// The maximum number of pseudo-legal moves possible in any reachable
/// Jieqi position. Xiangqi positions rarely exceed ~80; this leaves
/// headroom.
pub const MAX_MOVES: usize = 128;

/// A fixed-capacity list of moves, avoiding a heap allocation per node.
pub type MoveList = ArrayVec<Move, MAX_MOVES>;

/// A move paired with a search/ordering score, used to sort a [`MoveList`]
/// without re-deriving the score on every comparison.
#[derive(Clone, Copy, Debug)]
pub struct ScoredMove {
    pub mv: Move,
    pub score: i32,
}

/// Selection-sorts `moves` in place by descending score, one element per
/// call to [`pick_next`]. Doing a full sort up front wastes work when a
/// beta cutoff happens after the first few moves (which is the common
/// case), so search code calls this lazily instead of sorting eagerly.
#[must_use]
pub fn pick_next(moves: &mut [ScoredMove], from: usize) -> Option<usize> {
    if from >= moves.len() {
        return None;
    }
    let mut best = from;
    for i in (from + 1)..moves.len() {
        if moves[i].score > moves[best].score {
            best = i;
        }
    }
    moves.swap(from, best);
    Some(from)
}
