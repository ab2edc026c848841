/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The stateless request server (C10, spec §4.8): three operations over a
//! state-string, none of which carry session state across calls — every
//! call fully re-parses its input, so the engine is equally usable as a
//! subprocess, a library call, or an RPC endpoint.

use crate::{error::EngineError, evaluation::Eval, fen, search::Limits, strategy};

/// Every legal move from the position encoded by `state_string`, as plain
/// `fromto` move-strings (spec §4.8: `legal_moves`).
///
/// # Errors
/// Returns [`EngineError::MalformedState`] if `state_string` doesn't parse.
pub fn legal_moves(state_string: &str) -> Result<Vec<String>, EngineError> {
    let mut state = fen::parse(state_string)?;
    Ok(state.board.legal_moves().into_iter().map(|mv| mv.to_string()).collect())
}

/// The top-`n` moves from the position encoded by `state_string`, ranked by
/// `strategy_name`, each paired with its score (spec §4.8: `best_moves`).
/// `seed`, if given, makes the strategy's own randomness (the `random`
/// strategy's shuffle, MCTS playouts) reproducible; `None` draws from the
/// process-global RNG.
///
/// # Errors
/// Returns [`EngineError::MalformedState`] if `state_string` doesn't parse,
/// or [`EngineError::UnknownStrategy`] if `strategy_name` isn't registered.
pub fn best_moves(
    state_string: &str,
    strategy_name: &str,
    n: usize,
    limits: Option<Limits>,
    seed: Option<u64>,
) -> Result<Vec<(String, Eval)>, EngineError> {
    use rand::SeedableRng;

    let mut state = fen::parse(state_string)?;
    let mut strategy = strategy::create(strategy_name)?;
    if let Some(limits) = limits {
        override_limits(&mut strategy.config, limits);
    }

    let ranked = match seed {
        Some(seed) => {
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            strategy::best_moves(&mut state.board, &strategy, n, &mut rng)
        }
        None => {
            let mut rng = rand::rng();
            strategy::best_moves(&mut state.board, &strategy, n, &mut rng)
        }
    };
    Ok(ranked.into_iter().map(|(mv, score)| (mv.to_string(), score)).collect())
}

/// Every bundled strategy's name (spec §4.8: `strategies`).
#[must_use]
pub fn strategies() -> Vec<&'static str> {
    strategy::names()
}

/// Replaces an Alpha-Beta-family strategy's time/depth/node budget with a
/// caller-supplied one, leaving its TT size and eval weights untouched.
/// MCTS-family and zero-budget strategies (`random`, `greedy`) ignore this,
/// since they have no notion of search `Limits`.
fn override_limits(config: &mut strategy::StrategyConfig, limits: Limits) {
    match config {
        strategy::StrategyConfig::Iterative { limits: l, .. }
        | strategy::StrategyConfig::Pvs { limits: l, .. }
        | strategy::StrategyConfig::Muses { limits: l, .. } => *l = limits,
        strategy::StrategyConfig::Minimax { depth } => {
            if let Some(max_depth) = limits.max_depth {
                *depth = max_depth;
            }
        }
        strategy::StrategyConfig::Random
        | strategy::StrategyConfig::Greedy
        | strategy::StrategyConfig::Mcts { .. }
        | strategy::StrategyConfig::MctsRave { .. }
        | strategy::StrategyConfig::MctsEval { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "xxxxxxxxx/9/1x5x1/x1x1x1x1x/9/9/X1X1X1X1X/1X5X1/9/XXXXXXXXX -:- r r";

    #[test]
    fn legal_moves_from_the_initial_position() {
        let moves = legal_moves(START).expect("valid state-string");
        assert!(!moves.is_empty());
    }

    #[test]
    fn malformed_state_string_is_reported() {
        assert!(legal_moves("not a state string").is_err());
    }

    #[test]
    fn best_moves_with_random_strategy_respects_n() {
        let ranked = best_moves(START, "random", 3, None, Some(1)).expect("valid request");
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn best_moves_rejects_unknown_strategy() {
        let err = best_moves(START, "nonexistent", 1, None, None).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn strategies_lists_every_bundled_strategy() {
        assert_eq!(strategies().len(), 9);
    }
}
