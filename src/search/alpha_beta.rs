/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The Negamax routine itself (spec §4.5): TT probe, null-move pruning,
//! internal iterative deepening, PVS with LMR, futility and late-move
//! pruning, and quiescence at the horizon.

use crate::{
    board::{movegen, Board},
    defs::Move,
    evaluation::evaluate,
    transposition_table::Bound,
};

use super::{mate_in, mated_in, ordering, Depth, SearchReferences, INF, MATE};

/// The quiescence search never looks this deep past the horizon (spec
/// §4.5: "a depth cap (≈4–6) prevents unbounded explosion").
const QUIESCENCE_DEPTH_CAP: u32 = 6;
/// Null-move pruning's reduction constant `R` (spec §4.5 point 4).
const NULL_MOVE_REDUCTION: Depth = 3;
/// Delta-pruning margin added to the largest plausible capture gain.
const DELTA_MARGIN: i32 = 200;

#[allow(clippy::too_many_arguments)]
pub fn negamax(
    refs: &mut SearchReferences<'_>,
    board: &mut Board,
    mut alpha: i32,
    beta: i32,
    depth: Depth,
    height: u32,
    is_pv: bool,
    is_root: bool,
    prev_move: Option<Move>,
) -> i32 {
    if depth <= 0 {
        return quiescence(refs, board, alpha, beta, height, 0);
    }

    refs.nodes += 1;
    refs.seldepth = refs.seldepth.max(height);
    if refs.check_stop() {
        return 0;
    }

    let side = board.side_to_move();
    if board.king_square(side).is_none() {
        return mated_in(height);
    }

    let mut beta = beta;
    if !is_root {
        // Mate-distance pruning: a faster mate always beats a slower one, so
        // bounds tighter than an already-found mate score can't matter.
        alpha = alpha.max(mated_in(height));
        beta = beta.min(mate_in(height + 1));
        if alpha >= beta {
            return alpha;
        }
        if board.is_draw_by_repetition() || board.is_draw_by_move_limit() {
            return 0;
        }
    }

    let is_in_check = board.is_in_check(side);

    let tt_hit = refs.tt.load(board.key());
    if let Some(entry) = tt_hit {
        if !is_pv && i32::from(entry.depth) >= depth {
            let usable = match entry.bound {
                Bound::Exact => true,
                Bound::Lower => entry.score >= beta,
                Bound::Upper => entry.score <= alpha,
            };
            if usable {
                return entry.score;
            }
        }
    }
    let mut tt_move = tt_hit.and_then(|e| e.best_move);

    // Null-move pruning. Aggressive-pruning strategies reduce one ply deeper.
    let null_move_reduction = NULL_MOVE_REDUCTION + i32::from(refs.limits.aggressive_pruning);
    if !is_pv
        && !is_root
        && !is_in_check
        && depth > null_move_reduction
        && board.has_non_pawn_material(side)
    {
        board.make_null_move();
        let score = -negamax(
            refs,
            board,
            -beta,
            -beta + 1,
            depth - 1 - null_move_reduction,
            height + 1,
            false,
            false,
            None,
        );
        board.undo_null_move();
        if refs.check_stop() {
            return 0;
        }
        if score >= beta && score.abs() < MATE - 1_000 {
            return beta;
        }
    }

    // Internal iterative deepening: prime the TT before an expensive PV node.
    if is_pv && tt_move.is_none() && depth >= 4 {
        negamax(refs, board, alpha, beta, depth - 2, height, true, is_root, prev_move);
        tt_move = refs.tt.load(board.key()).and_then(|e| e.best_move);
    }

    let static_eval = evaluate(board);
    let pseudo_moves = movegen::generate_pseudo_legal(board);
    let scored = ordering::score_moves(board, pseudo_moves, tt_move, refs.histories, height as usize, prev_move);
    let ordered = ordering::OrderedMoves::new(scored);

    let mut best_score = -INF;
    let mut best_move: Option<Move> = None;
    let mut total_moves = 0u32;
    let mut quiets_tried: Vec<Move> = Vec::new();

    for mv in ordered {
        let is_capture = board.piece_at(mv.to()).is_some();
        let is_quiet = !is_capture && !mv.is_reveal();

        // Futility pruning.
        if !is_pv
            && !is_in_check
            && is_quiet
            && depth <= 3
            && static_eval + 150 * depth < alpha
            && total_moves > 0
        {
            continue;
        }

        // Late-move pruning. Aggressive-pruning strategies cut off sooner.
        let lmp_margin = if refs.limits.aggressive_pruning { 2 } else { 4 };
        if !is_pv && !is_in_check && is_quiet && depth <= 4 && total_moves as i32 > lmp_margin + depth * depth {
            continue;
        }

        let undo = board.apply_move(mv);
        total_moves += 1;

        let extension: Depth = i32::from(is_in_check);
        let new_depth = depth + extension - 1;

        let score = if total_moves == 1 {
            -negamax(refs, board, -beta, -alpha, new_depth, height + 1, is_pv, false, Some(mv))
        } else {
            let reduction = if is_quiet {
                reduction_amount(depth, total_moves)
            } else {
                0
            };
            let mut s = -negamax(
                refs,
                board,
                -alpha - 1,
                -alpha,
                (new_depth - reduction).max(0),
                height + 1,
                false,
                false,
                Some(mv),
            );
            if s > alpha && reduction > 0 {
                s = -negamax(refs, board, -alpha - 1, -alpha, new_depth, height + 1, false, false, Some(mv));
            }
            if is_pv && s > alpha {
                s = -negamax(refs, board, -beta, -alpha, new_depth, height + 1, true, false, Some(mv));
            }
            s
        };

        board.undo_move(mv, undo);

        if refs.check_stop() {
            return if is_root { alpha } else { 0 };
        }

        if is_quiet {
            quiets_tried.push(mv);
        }
        if is_root {
            refs.record_root_score(mv, score);
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    if is_quiet {
                        refs.histories.insert_killer(height as usize, mv);
                        refs.histories.update_history(side, mv, depth);
                        for &quiet in &quiets_tried[..quiets_tried.len().saturating_sub(1)] {
                            refs.histories.update_history(side, quiet, -depth);
                        }
                        if let Some(parent) = prev_move {
                            refs.histories.set_countermove(parent, mv);
                        }
                    }
                    break;
                }
            }
        }
    }

    if total_moves == 0 {
        return if is_in_check { mated_in(height) } else { 0 };
    }

    let bound = if best_score >= beta {
        Bound::Lower
    } else if best_move.is_none() {
        Bound::Upper
    } else {
        Bound::Exact
    };
    refs.tt.store(
        board.key(),
        best_score,
        static_eval,
        best_move,
        depth.clamp(0, 255) as u8,
        bound,
    );

    best_score
}

fn quiescence(
    refs: &mut SearchReferences<'_>,
    board: &mut Board,
    mut alpha: i32,
    beta: i32,
    height: u32,
    qdepth: u32,
) -> i32 {
    refs.nodes += 1;
    refs.seldepth = refs.seldepth.max(height);
    if refs.check_stop() {
        return 0;
    }

    let side = board.side_to_move();
    if board.king_square(side).is_none() {
        return mated_in(height);
    }
    let is_in_check = board.is_in_check(side);

    let static_eval = evaluate(board);
    let mut best_score = if is_in_check { -INF } else { static_eval };
    alpha = alpha.max(best_score);
    if alpha >= beta || qdepth >= QUIESCENCE_DEPTH_CAP {
        return alpha;
    }

    let pseudo_moves = movegen::generate_pseudo_legal(board);
    let no_move = None;
    let scored = ordering::score_moves(board, pseudo_moves, None, refs.histories, height as usize, no_move);
    let ordered = ordering::OrderedMoves::new(scored);

    for mv in ordered {
        let is_capture = board.piece_at(mv.to()).is_some();
        if !is_capture && !is_in_check {
            continue;
        }

        if !is_in_check && static_eval + DELTA_MARGIN < alpha {
            if let Some(victim) = board.piece_at(mv.to()) {
                let victim_value = crate::evaluation::values::BASE_VALUES[victim.actual_kind.to_index()];
                if static_eval + victim_value + DELTA_MARGIN < alpha {
                    continue;
                }
            }
        }

        let undo = board.apply_move(mv);
        let score = -quiescence(refs, board, -beta, -alpha, height + 1, qdepth + 1);
        board.undo_move(mv, undo);

        if refs.check_stop() {
            return 0;
        }

        if score > best_score {
            best_score = score;
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    break;
                }
            }
        }
    }

    best_score
}

/// Late-move reduction: a small table-free formula in place of the
/// teacher's precomputed `base_reductions` grid, since this engine doesn't
/// need the extra cache-friendliness at these node counts.
fn reduction_amount(depth: Depth, total_moves: u32) -> Depth {
    if depth < 3 || total_moves < 4 {
        return 0;
    }
    let mut r = 1;
    if depth >= 6 {
        r += 1;
    }
    if total_moves >= 12 {
        r += 1;
    }
    r.min(depth - 1)
}
