/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The strategy registry (C9, spec §4.7): a façade over C6–C8 combining a
//! search family, a depth-or-budget, and eval weights into one named,
//! independently-configured record — `original_source/jieqi/ai/strategies/*`
//! gives each strategy its own small parameter struct rather than one flat
//! settings blob, and this module keeps that shape.

use std::time::Duration;

use rand::Rng;

use crate::{
    board::Board,
    defs::Move,
    error::EngineError,
    evaluation::Eval,
    mcts,
    search::{self, Histories, Limits},
    transposition_table::TranspositionTable,
};

/// Per-family parameters, one variant per bundled strategy (spec §4.7).
#[derive(Clone, Copy, Debug)]
pub enum StrategyConfig {
    /// Uniform choice among legal moves.
    Random,
    /// One-ply MVV-LVA-style static ranking, no recursion.
    Greedy,
    /// Plain fixed-depth Alpha-Beta (no iterative deepening, no aspiration
    /// windows) — reuses the PVS engine at a pinned depth, since it already
    /// subsumes plain Alpha-Beta's behaviour; see `DESIGN.md`.
    Minimax { depth: u8 },
    /// Iterative-deepening Alpha-Beta + quiescence + TT, same engine as
    /// `Pvs` with a shallower default budget.
    Iterative { limits: Limits, tt_size_mib: usize },
    /// The full §4.5 feature set.
    Pvs { limits: Limits, tt_size_mib: usize },
    /// PVS with more aggressive pruning than `Pvs`'s defaults — the "v017"
    /// reading of the "muses" open question (spec §9); see `DESIGN.md`.
    Muses { limits: Limits, tt_size_mib: usize },
    /// Plain UCT.
    Mcts { budget: mcts::Budget },
    /// UCT with RAVE/AMAF.
    MctsRave { budget: mcts::Budget },
    /// The policy-value hybrid.
    MctsEval { budget: mcts::Budget },
}

/// A named, ready-to-run strategy handle (spec §4.7: "users call
/// `create(name, config)` to obtain a handle").
#[derive(Clone, Copy, Debug)]
pub struct Strategy {
    pub name: &'static str,
    pub config: StrategyConfig,
}

const DEFAULT_TT_MIB: usize = 16;

/// The bundled strategies, with their default parameters (spec §4.7: "all
/// must be present").
#[must_use]
pub fn registry() -> Vec<Strategy> {
    vec![
        Strategy {
            name: "random",
            config: StrategyConfig::Random,
        },
        Strategy {
            name: "greedy",
            config: StrategyConfig::Greedy,
        },
        Strategy {
            name: "minimax",
            config: StrategyConfig::Minimax { depth: 2 },
        },
        Strategy {
            name: "iterative",
            config: StrategyConfig::Iterative {
                limits: Limits::to_depth(6),
                tt_size_mib: DEFAULT_TT_MIB,
            },
        },
        Strategy {
            name: "pvs",
            config: StrategyConfig::Pvs {
                limits: Limits::to_time(Duration::from_secs(5)),
                tt_size_mib: DEFAULT_TT_MIB,
            },
        },
        Strategy {
            name: "muses",
            config: StrategyConfig::Muses {
                limits: Limits::to_time(Duration::from_secs(5)).with_aggressive_pruning(),
                tt_size_mib: DEFAULT_TT_MIB,
            },
        },
        Strategy {
            name: "mcts",
            config: StrategyConfig::Mcts {
                budget: mcts::Budget::to_time(Duration::from_secs(2)),
            },
        },
        Strategy {
            name: "mcts_rave",
            config: StrategyConfig::MctsRave {
                budget: mcts::Budget::to_time(Duration::from_secs(2)),
            },
        },
        Strategy {
            name: "mcts_eval",
            config: StrategyConfig::MctsEval {
                budget: mcts::Budget::to_time(Duration::from_secs(2)),
            },
        },
    ]
}

/// Every bundled strategy's name, in registry order (spec §4.8: `strategies()`).
#[must_use]
pub fn names() -> Vec<&'static str> {
    registry().into_iter().map(|s| s.name).collect()
}

/// Looks up a strategy by name, with its default parameters.
///
/// # Errors
/// Returns [`EngineError::UnknownStrategy`] if `name` isn't in the registry.
pub fn create(name: &str) -> Result<Strategy, EngineError> {
    registry()
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| EngineError::UnknownStrategy(name.to_string()))
}

/// Runs `strategy` against `board`'s current position and returns up to `n`
/// moves ranked best-first, each with a score in `(-1000, 1000)` (spec
/// §4.8: `best_moves`). Every call owns a fresh TT and history tables, in
/// keeping with the single-search-call concurrency model (spec §5).
pub fn best_moves(board: &mut Board, strategy: &Strategy, n: usize, rng: &mut impl Rng) -> Vec<(Move, Eval)> {
    let mut ranked = match strategy.config {
        StrategyConfig::Random => random_moves(board, rng),
        StrategyConfig::Greedy => greedy_moves(board),
        StrategyConfig::Minimax { depth } => run_alpha_beta(board, Limits::to_depth(depth), DEFAULT_TT_MIB),
        StrategyConfig::Iterative { limits, tt_size_mib }
        | StrategyConfig::Pvs { limits, tt_size_mib }
        | StrategyConfig::Muses { limits, tt_size_mib } => run_alpha_beta(board, limits, tt_size_mib),
        StrategyConfig::Mcts { budget } => mcts::search(board, mcts::Variant::Uct, budget, rng),
        StrategyConfig::MctsRave { budget } => mcts::search(board, mcts::Variant::Rave, budget, rng),
        StrategyConfig::MctsEval { budget } => mcts::search(board, mcts::Variant::PolicyValue, budget, rng),
    };
    ranked.truncate(n);
    ranked
}

fn run_alpha_beta(board: &mut Board, limits: Limits, tt_size_mib: usize) -> Vec<(Move, Eval)> {
    let mut tt = TranspositionTable::with_capacity_mib(tt_size_mib);
    let mut histories = Histories::new();
    search::search_root(board, &mut tt, &mut histories, limits)
}

fn random_moves(board: &mut Board, rng: &mut impl Rng) -> Vec<(Move, Eval)> {
    let mut legal = board.legal_moves();
    if legal.is_empty() {
        return Vec::new();
    }
    let mut moves: Vec<Move> = legal.drain(..).collect();
    // Fisher-Yates, so every permutation (hence every "top n" slice) is
    // equally likely, not just the single move returned for n=1.
    for i in (1..moves.len()).rev() {
        let j = rng.random_range(0..=i);
        moves.swap(i, j);
    }
    moves.into_iter().map(|mv| (mv, 0)).collect()
}

/// One-ply static ranking: captures by MVV-LVA, reveal moves get a bonus,
/// everything else scores zero (spec §4.7: "one-ply with MVV-LVA-style
/// heuristic").
fn greedy_moves(board: &mut Board) -> Vec<(Move, Eval)> {
    let legal = board.legal_moves();
    let mut ranked: Vec<(Move, Eval)> = legal
        .into_iter()
        .map(|mv| (mv, greedy_score(board, mv)))
        .collect();
    ranked.sort_by_key(|&(_, score)| std::cmp::Reverse(score));
    ranked
}

fn greedy_score(board: &Board, mv: Move) -> Eval {
    use crate::evaluation::values::BASE_VALUES;

    let mut score = 0;
    if board.piece_at(mv.to()).is_some() {
        let victim_kind = board.movement_kind(mv.to());
        let attacker_kind = board.movement_kind(mv.from());
        score += BASE_VALUES[victim_kind.to_index()] * 10 - BASE_VALUES[attacker_kind.to_index()];
    }
    if mv.is_reveal() {
        score += 50;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn registry_contains_all_nine_bundled_strategies() {
        let names = names();
        for expected in [
            "random",
            "greedy",
            "minimax",
            "iterative",
            "pvs",
            "muses",
            "mcts",
            "mcts_rave",
            "mcts_eval",
        ] {
            assert!(names.contains(&expected), "missing strategy {expected}");
        }
    }

    #[test]
    fn unknown_strategy_name_is_rejected() {
        assert!(create("nonexistent").is_err());
    }

    #[test]
    fn random_strategy_ranks_every_legal_move() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let mut board = Board::new_random(&mut rng);
        let strategy = create("random").expect("present in registry");
        let all = board.legal_moves().len();
        let ranked = best_moves(&mut board, &strategy, all, &mut rng);
        assert_eq!(ranked.len(), all);
    }

    #[test]
    fn greedy_strategy_prefers_captures() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(4);
        let mut board = Board::new_random(&mut rng);
        let strategy = create("greedy").expect("present in registry");
        let ranked = best_moves(&mut board, &strategy, 1, &mut rng);
        assert!(!ranked.is_empty());
    }

    #[test]
    fn minimax_strategy_returns_scored_moves() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let mut board = Board::new_random(&mut rng);
        let strategy = create("minimax").expect("present in registry");
        let ranked = best_moves(&mut board, &strategy, 3, &mut rng);
        assert!(!ranked.is_empty());
        assert!(ranked.len() <= 3);
    }
}
