/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The Alpha-Beta search family (C7, spec §4.5): PVS, iterative deepening,
//! aspiration windows, quiescence, a transposition table, and the killer /
//! history / countermove ordering heuristics.
//!
//! Unlike the teacher, which dispatches node kind (`Root`/`Pv`/`NonPv`) at
//! compile time through a `Node` trait for zero-cost specialisation, this
//! module uses two plain `bool` flags (`is_pv`, `is_root`). A chess engine
//! pushing hundreds of millions of nodes per second cares about that
//! monomorphisation; this one doesn't need to shave the branch.

mod alpha_beta;
pub mod ordering;

use std::time::{Duration, Instant};

use crate::{
    board::Board,
    defs::{Move, Side, Square},
    evaluation::Eval,
    transposition_table::TranspositionTable,
};

/// Search depths/heights fit comfortably in a `u8`; named for clarity at
/// call sites.
pub type Depth = i32;

/// Mate scores are offset from this ceiling by height, so that a mate found
/// sooner always outscores one found deeper (spec §4.5 point 2).
pub const MATE: Eval = 1_000_000;
/// A window wide enough that it never clips a real (non-mate) evaluation.
pub const INF: Eval = MATE + 1_000;

#[must_use]
pub const fn mate_in(height: u32) -> Eval {
    MATE - height as Eval
}

#[must_use]
pub const fn mated_in(height: u32) -> Eval {
    -MATE + height as Eval
}

/// The longest a principal variation / killer table needs to reach; deeper
/// recursion than this would blow the call stack long before it matters
/// (spec §9: "depths are small (<30)").
pub const MAX_PLY: usize = 128;

/// How often (in nodes) the search polls the wall clock (spec §5).
const NODES_PER_TIME_CHECK: u64 = 2_000;

/// A search's resource budget. `None` fields are unlimited.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    pub max_depth: Option<u8>,
    pub move_time: Option<Duration>,
    pub max_nodes: Option<u64>,
    /// Tightens null-move and late-move-pruning thresholds (spec §9's
    /// "more aggressive pruning" reading of the `muses` strategy).
    pub aggressive_pruning: bool,
}

impl Limits {
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_depth: None,
            move_time: None,
            max_nodes: None,
            aggressive_pruning: false,
        }
    }

    #[must_use]
    pub const fn to_depth(depth: u8) -> Self {
        Self {
            max_depth: Some(depth),
            move_time: None,
            max_nodes: None,
            aggressive_pruning: false,
        }
    }

    #[must_use]
    pub const fn to_time(move_time: Duration) -> Self {
        Self {
            max_depth: None,
            move_time: Some(move_time),
            max_nodes: None,
            aggressive_pruning: false,
        }
    }

    /// Returns `self` with [`Limits::aggressive_pruning`] set.
    #[must_use]
    pub const fn with_aggressive_pruning(mut self) -> Self {
        self.aggressive_pruning = true;
        self
    }
}

/// Killer, history, and countermove tables: reset once per search call
/// (spec §5: "owned by one search").
pub struct Histories {
    killers: [[Option<Move>; 2]; MAX_PLY],
    /// Indexed `[side][from][to]`; the classic "butterfly" layout.
    history: Box<[[[i32; Square::TOTAL]; Square::TOTAL]; Side::TOTAL]>,
    countermoves: std::collections::HashMap<Move, Move>,
}

impl Default for Histories {
    fn default() -> Self {
        Self::new()
    }
}

impl Histories {
    const MAX_HISTORY: i32 = i32::MAX / 2;

    #[must_use]
    pub fn new() -> Self {
        Self {
            killers: [[None; 2]; MAX_PLY],
            history: Box::new([[[0; Square::TOTAL]; Square::TOTAL]; Side::TOTAL]),
            countermoves: std::collections::HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.killers = [[None; 2]; MAX_PLY];
        self.history = Box::new([[[0; Square::TOTAL]; Square::TOTAL]; Side::TOTAL]);
        self.countermoves.clear();
    }

    #[must_use]
    pub fn killers(&self, height: usize) -> [Option<Move>; 2] {
        self.killers[height.min(MAX_PLY - 1)]
    }

    pub fn insert_killer(&mut self, height: usize, mv: Move) {
        let slot = &mut self.killers[height.min(MAX_PLY - 1)];
        if slot[0] != Some(mv) {
            slot[1] = slot[0];
            slot[0] = Some(mv);
        }
    }

    #[must_use]
    pub fn countermove(&self, previous: Move) -> Option<Move> {
        self.countermoves.get(&previous).copied()
    }

    pub fn set_countermove(&mut self, previous: Move, mv: Move) {
        self.countermoves.insert(previous, mv);
    }

    #[must_use]
    pub fn history_score(&self, side: Side, mv: Move) -> i32 {
        self.history[side.to_index()][mv.from().to_index()][mv.to().to_index()]
    }

    /// `+depth^2` bonus for the cutoff move, halved globally once any entry
    /// would overflow (spec §4.5 point 8).
    pub fn update_history(&mut self, side: Side, mv: Move, depth: Depth) {
        let bonus = depth * depth;
        let entry = &mut self.history[side.to_index()][mv.from().to_index()][mv.to().to_index()];
        *entry += bonus;
        if *entry > Self::MAX_HISTORY {
            for side_table in self.history.iter_mut() {
                for from in side_table.iter_mut() {
                    for to in from.iter_mut() {
                        *to /= 2;
                    }
                }
            }
        }
    }
}

/// Everything a single search call threads through its recursion: owned by
/// one call, never shared across threads (spec §5).
pub struct SearchReferences<'a> {
    pub tt: &'a mut TranspositionTable,
    pub histories: &'a mut Histories,
    pub limits: Limits,
    pub start: Instant,
    pub nodes: u64,
    pub seldepth: u32,
    stopped: bool,
    /// Every root move's most recently computed score, so a single search
    /// can serve `best_moves(n)` for any `n` (spec §4.8).
    pub root_scores: Vec<(Move, Eval)>,
}

impl<'a> SearchReferences<'a> {
    #[must_use]
    pub fn new(tt: &'a mut TranspositionTable, histories: &'a mut Histories, limits: Limits) -> Self {
        Self {
            tt,
            histories,
            limits,
            start: Instant::now(),
            nodes: 0,
            seldepth: 0,
            stopped: false,
            root_scores: Vec::new(),
        }
    }

    /// Polls the deadline every [`NODES_PER_TIME_CHECK`] nodes (spec §5).
    pub fn check_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if self.nodes % NODES_PER_TIME_CHECK == 0 {
            if let Some(max_nodes) = self.limits.max_nodes {
                if self.nodes >= max_nodes {
                    self.stopped = true;
                }
            }
            if let Some(move_time) = self.limits.move_time {
                if self.start.elapsed() >= move_time {
                    self.stopped = true;
                }
            }
        }
        self.stopped
    }

    fn record_root_score(&mut self, mv: Move, score: Eval) {
        if let Some(entry) = self.root_scores.iter_mut().find(|(m, _)| *m == mv) {
            entry.1 = score;
        } else {
            self.root_scores.push((mv, score));
        }
    }
}

/// Runs iterative deepening with aspiration windows (spec §4.5) and returns
/// every root move tried, sorted by descending score, so the caller can take
/// however many the request asked for.
pub fn search_root(
    board: &mut Board,
    tt: &mut TranspositionTable,
    histories: &mut Histories,
    limits: Limits,
) -> Vec<(Move, Eval)> {
    let legal = board.legal_moves();
    if legal.is_empty() {
        return Vec::new();
    }

    let mut refs = SearchReferences::new(tt, histories, limits);
    let mut best_score = -INF;
    let mut window_margin = 0;

    let max_depth = refs.limits.max_depth.unwrap_or(64);
    for depth in 1..=max_depth {
        refs.seldepth = 0;

        let (mut alpha, mut beta) = if depth >= 3 && window_margin > 0 {
            (best_score - window_margin, best_score + window_margin)
        } else {
            (-INF, INF)
        };
        if window_margin == 0 {
            window_margin = 500;
        }

        let score = loop {
            let score = alpha_beta::negamax(
                &mut refs,
                board,
                alpha,
                beta,
                Depth::from(depth),
                0,
                true,
                true,
                None,
            );
            if refs.check_stop() {
                break score;
            }
            if score <= alpha {
                alpha = (alpha - window_margin).max(-INF);
                window_margin *= 2;
                continue;
            }
            if score >= beta {
                beta = (beta + window_margin).min(INF);
                window_margin *= 2;
                continue;
            }
            break score;
        };

        if refs.check_stop() && depth > 1 {
            break;
        }
        best_score = score;
        window_margin = 500;
        if refs.check_stop() {
            break;
        }
    }

    let mut scores = refs.root_scores;
    scores.sort_by(|a, b| b.1.cmp(&a.1));
    scores
}
