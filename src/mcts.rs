/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The Monte Carlo Tree Search family (C8, spec §4.6): plain UCT, RAVE/AMAF,
//! and a policy-value hybrid (`mcts_eval`), sharing one arena-of-nodes tree
//! so a single iteration loop serves all three variants.
//!
//! The spec's own design notes call this out directly: "implementers in a
//! systems language should use an arena of nodes addressed by index to avoid
//! cyclic strong references." `Node::parent`/`Node::children` are therefore
//! plain indices into `Tree::nodes`, not `Rc<RefCell<..>>`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::{
    board::{movegen, Board},
    defs::{Move, Side},
    evaluation::{normalise, raw_score, win_rate},
    movelist::MoveList,
};

/// Exploration constant for plain UCT (`c ≈ √2`, spec §4.6).
const UCT_C: f32 = std::f32::consts::SQRT_2;
/// Exploration constant once RAVE supplies its own (spec §4.6: "drops to ≈1.0").
const RAVE_C: f32 = 1.0;
/// RAVE's `k` bias constant (spec §4.6).
const RAVE_K: f32 = 1_000.0;
/// Exploration constant for the PUCT policy-value hybrid.
const PUCT_C: f32 = 1.5;

/// Random-playout depth cap for plain UCT / RAVE (spec §4.6 point 3).
const PLAYOUT_DEPTH_CAP: u32 = 80;
/// Shallow-playout depth cap for the policy-value hybrid (spec §4.6).
const EVAL_PLAYOUT_DEPTH_CAP: u32 = 8;
/// Probability a playout prefers a capture move when one is available.
const CAPTURE_BIAS: f64 = 0.85;
/// Probability a playout prefers a reveal move when one is available (and no
/// capture was already chosen).
const REVEAL_BIAS: f64 = 0.3;
/// Blend weight for the policy-value hybrid's playout component.
const EVAL_PLAYOUT_WEIGHT: f32 = 0.3;
/// Blend weight for the policy-value hybrid's evaluator component.
const EVAL_STATIC_WEIGHT: f32 = 0.7;

/// Which variant of the family drives selection and simulation.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Variant {
    Uct,
    Rave,
    PolicyValue,
}

/// A search budget: either a fixed iteration count, a wall-clock limit, or
/// both (whichever triggers first stops the search).
#[derive(Clone, Copy, Debug)]
pub struct Budget {
    pub iterations: Option<u32>,
    pub move_time: Option<Duration>,
}

impl Budget {
    #[must_use]
    pub const fn to_iterations(iterations: u32) -> Self {
        Self {
            iterations: Some(iterations),
            move_time: None,
        }
    }

    #[must_use]
    pub const fn to_time(move_time: Duration) -> Self {
        Self {
            iterations: None,
            move_time: Some(move_time),
        }
    }
}

/// A move-keyed `(visits, wins)` pair, used both per-child and in the global
/// RAVE dictionary (spec §4.6: "a global move-key → (visits, wins) dictionary
/// shared across siblings").
#[derive(Clone, Copy, Default)]
struct RaveStats {
    visits: u32,
    wins: f32,
}

struct Node {
    parent: Option<usize>,
    /// The move that was played to reach this node from its parent; `None`
    /// only for the root.
    mv: Option<Move>,
    /// The side that played `mv` (the side to move at `parent`); used to
    /// orient backpropagation.
    mover: Option<Side>,
    children: Vec<usize>,
    untried: MoveList,
    visits: u32,
    value_sum: f32,
    rave: RaveStats,
    /// PUCT prior, only meaningful for [`Variant::PolicyValue`].
    prior: f32,
}

impl Node {
    fn q(&self) -> f32 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f32
        }
    }
}

/// The arena: every node is addressed by its index, so the tree has no
/// cyclic strong references and can be dropped in one shot.
struct Tree {
    nodes: Vec<Node>,
    /// Shared across the whole tree for RAVE (spec §4.6).
    rave_table: HashMap<Move, RaveStats>,
}

impl Tree {
    fn new_root(untried: MoveList) -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                mv: None,
                mover: None,
                children: Vec::new(),
                untried,
                visits: 0,
                value_sum: 0.0,
                rave: RaveStats::default(),
                prior: 0.0,
            }],
            rave_table: HashMap::new(),
        }
    }

    fn push_child(&mut self, parent: usize, mv: Move, mover: Side, untried: MoveList, prior: f32) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent),
            mv: Some(mv),
            mover: Some(mover),
            children: Vec::new(),
            untried,
            visits: 0,
            value_sum: 0.0,
            rave: RaveStats::default(),
            prior,
        });
        self.nodes[parent].children.push(index);
        index
    }
}

/// Runs `variant` from `board`'s current position for `budget`, returning
/// every child of the root sorted by descending visit count, with a score
/// in `(-1000, 1000)` derived from its win rate (spec §4.6: "return children
/// sorted by visit count ... with score `(win_rate − 0.5)·2000`").
pub fn search(board: &mut Board, variant: Variant, budget: Budget, rng: &mut impl Rng) -> Vec<(Move, i32)> {
    let root_moves = movegen::generate_pseudo_legal(board);
    if root_moves.is_empty() {
        return Vec::new();
    }

    let mut tree = Tree::new_root(root_moves);
    let start = Instant::now();
    let mut iteration = 0u32;

    loop {
        if let Some(max_iterations) = budget.iterations {
            if iteration >= max_iterations {
                break;
            }
        }
        if let Some(move_time) = budget.move_time {
            if start.elapsed() >= move_time {
                break;
            }
        }
        if budget.iterations.is_none() && budget.move_time.is_none() && iteration >= 1 {
            break;
        }

        run_iteration(&mut tree, board, variant, rng);
        iteration += 1;
    }

    let mut ranked: Vec<(Move, i32, u32)> = tree.nodes[0]
        .children
        .iter()
        .filter_map(|&child| {
            let node = &tree.nodes[child];
            node.mv.map(|mv| {
                let win_rate = if node.visits == 0 { 0.5 } else { node.q() };
                (mv, ((win_rate - 0.5) * 2000.0) as i32, node.visits)
            })
        })
        .collect();
    ranked.sort_by_key(|&(_, _, visits)| std::cmp::Reverse(visits));
    ranked.into_iter().map(|(mv, score, _)| (mv, score)).collect()
}

/// One select → expand → simulate → backpropagate cycle.
fn run_iteration(tree: &mut Tree, board: &mut Board, variant: Variant, rng: &mut impl Rng) {
    let mut undo_stack: Vec<(Move, crate::board::Undo)> = Vec::new();
    let mut current = 0usize;

    // Select: descend while fully expanded (progressive widening for the
    // policy-value hybrid counts as "fully expanded" once the widening cap
    // is reached, not only once every move has a child).
    loop {
        let widened_cap = match variant {
            Variant::PolicyValue => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let cap = (2.0 * (tree.nodes[current].visits as f32).sqrt()).floor() as usize;
                cap.max(1)
            }
            Variant::Uct | Variant::Rave => usize::MAX,
        };
        let fully_expanded =
            tree.nodes[current].untried.is_empty() || tree.nodes[current].children.len() >= widened_cap;
        if !fully_expanded || tree.nodes[current].children.is_empty() {
            break;
        }
        let next = select_child(tree, current, variant);
        let mv = tree.nodes[next].mv.expect("non-root node has a move");
        undo_stack.push((mv, board.apply_move(mv)));
        current = next;
    }

    // Expand: pop one untried move, unless we hit the widening cap with
    // moves left over (in that case we simulate from the selected leaf
    // as-is).
    let mut leaf = current;
    if !tree.nodes[current].untried.is_empty() {
        let mover = board.side_to_move();
        let mv = tree.nodes[current].untried.pop().expect("checked non-empty");
        undo_stack.push((mv, board.apply_move(mv)));
        let child_moves = movegen::generate_pseudo_legal(board);
        let prior = if variant == Variant::PolicyValue {
            move_prior(board, mv)
        } else {
            0.0
        };
        leaf = tree.push_child(current, mv, mover, child_moves, prior);
    }

    // Simulate.
    let leaf_side = board.side_to_move();
    let (result, played) = simulate(board, variant, rng);

    // Backpropagate from the leaf up to the root via parent links — no
    // separate path bookkeeping needed, since every non-root node already
    // knows its parent. `result` is a win probability for `leaf_side`; each
    // node's own mover sees it the right way round or flipped (spec §4.6
    // point 4).
    let mut node = Some(leaf);
    while let Some(index) = node {
        backprop_one(tree, index, result, leaf_side);
        node = tree.nodes[index].parent;
    }

    if variant == Variant::Rave {
        update_rave(tree, &played, result);
    }

    for (mv, undo) in undo_stack.into_iter().rev() {
        board.undo_move(mv, undo);
    }
}

fn select_child(tree: &Tree, parent: usize, variant: Variant) -> usize {
    let parent_visits = tree.nodes[parent].visits.max(1) as f32;
    let ln_parent = (parent_visits).ln();

    tree.nodes[parent]
        .children
        .iter()
        .copied()
        .max_by(|&a, &b| {
            let score_a = child_score(tree, a, ln_parent, parent_visits, variant);
            let score_b = child_score(tree, b, ln_parent, parent_visits, variant);
            score_a.total_cmp(&score_b)
        })
        .expect("caller checked children is non-empty")
}

fn child_score(tree: &Tree, child: usize, ln_parent: f32, parent_visits: f32, variant: Variant) -> f32 {
    let node = &tree.nodes[child];
    let visits = node.visits as f32;

    match variant {
        Variant::Uct => {
            if node.visits == 0 {
                return f32::INFINITY;
            }
            node.q() + UCT_C * (ln_parent / visits).sqrt()
        }
        Variant::Rave => {
            if node.visits == 0 {
                return f32::INFINITY;
            }
            let beta = (RAVE_K / (3.0 * visits + RAVE_K)).sqrt();
            let rave_value = if node.rave.visits == 0 {
                node.q()
            } else {
                node.rave.wins / node.rave.visits as f32
            };
            let ucb = node.q() + RAVE_C * (ln_parent / visits).sqrt();
            beta * rave_value + (1.0 - beta) * ucb
        }
        Variant::PolicyValue => node.q() + PUCT_C * node.prior * (parent_visits.sqrt() / (1.0 + visits)),
    }
}

/// A heuristic move prior for the policy-value hybrid (spec §4.6: "captures
/// get high prior; reveal-across-river bonus; rook/cannon/horse bonus").
fn move_prior(board: &Board, mv: Move) -> f32 {
    let mut prior = 0.1_f32;
    if board.piece_at(mv.to()).is_some() {
        prior += 0.5;
    }
    if mv.is_reveal() {
        let side = board.side_to_move();
        prior += if mv.to().in_own_half(side.flip()) { 0.3 } else { 0.1 };
    }
    let kind = board.movement_kind(mv.from());
    use crate::defs::PieceKind;
    if matches!(kind, PieceKind::ROOK | PieceKind::CANNON | PieceKind::HORSE) {
        prior += 0.15;
    }
    prior.min(1.0)
}

/// Random playout biased towards captures and reveals, returning a win
/// probability for the side to move at the *start* of the playout (i.e. the
/// leaf node's side to move) together with the list of moves played, for
/// RAVE updates.
fn simulate(board: &mut Board, variant: Variant, rng: &mut impl Rng) -> (f32, Vec<Move>) {
    let leaf_side = board.side_to_move();
    let depth_cap = if variant == Variant::PolicyValue {
        EVAL_PLAYOUT_DEPTH_CAP
    } else {
        PLAYOUT_DEPTH_CAP
    };

    let mut undone: Vec<(Move, crate::board::Undo)> = Vec::new();
    let mut played = Vec::new();
    let mut plies = 0;
    let mut decisive = false;

    while plies < depth_cap {
        if board.king_square(board.side_to_move()).is_none() {
            decisive = true;
            break;
        }
        let moves = movegen::generate_pseudo_legal(board);
        if moves.is_empty() {
            break;
        }
        let mv = pick_playout_move(board, &moves, rng);
        played.push(mv);
        undone.push((mv, board.apply_move(mv)));
        plies += 1;
    }

    let result = if decisive {
        let winner = board.side_to_move().flip();
        if winner == leaf_side {
            1.0
        } else {
            0.0
        }
    } else if plies >= depth_cap {
        let raw = raw_score(board, leaf_side);
        win_rate(normalise(raw))
    } else {
        0.5
    };

    let playout_value = result;
    let final_value = if variant == Variant::PolicyValue {
        let raw = raw_score(board, leaf_side);
        let static_value = win_rate(normalise(raw));
        EVAL_PLAYOUT_WEIGHT * playout_value + EVAL_STATIC_WEIGHT * static_value
    } else {
        playout_value
    };

    for (mv, undo) in undone.into_iter().rev() {
        board.undo_move(mv, undo);
    }

    (final_value, played)
}

fn pick_playout_move(board: &Board, moves: &MoveList, rng: &mut impl Rng) -> Move {
    if rng.random_bool(CAPTURE_BIAS) {
        if let Some(mv) = moves.iter().find(|mv| board.piece_at(mv.to()).is_some()) {
            return *mv;
        }
    }
    if rng.random_bool(REVEAL_BIAS) {
        if let Some(mv) = moves.iter().find(|mv| mv.is_reveal()) {
            return *mv;
        }
    }
    moves[rng.random_range(0..moves.len())]
}

/// Adds `result` (a win probability for `leaf_side`) to `node`, flipping it
/// if the move that produced `node` was played by the other side (spec §4.6
/// point 4: "adding result for the player whose turn produced the child,
/// else 1-result").
fn backprop_one(tree: &mut Tree, node_index: usize, result: f32, leaf_side: Side) {
    let node = &mut tree.nodes[node_index];
    node.visits += 1;
    let Some(mover) = node.mover else { return };
    node.value_sum += if mover == leaf_side { result } else { 1.0 - result };
}

fn update_rave(tree: &mut Tree, played: &[Move], result: f32) {
    for &mv in played {
        let entry = tree.rave_table.entry(mv).or_default();
        entry.visits += 1;
        entry.wins += result;
    }
    // Propagate into every tree node whose move matches one played during
    // the simulation (AMAF: "all moves as first"), at every level.
    for node in &mut tree.nodes {
        if let Some(mv) = node.mv {
            if played.contains(&mv) {
                node.rave.visits += 1;
                node.rave.wins += result;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn uct_search_returns_root_moves_sorted_by_visits() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut board = Board::new_random(&mut rng);
        let results = search(&mut board, Variant::Uct, Budget::to_iterations(64), &mut rng);
        assert!(!results.is_empty());
        for &(_, score) in &results {
            assert!((-1000..=1000).contains(&score));
        }
    }

    #[test]
    fn rave_search_runs_without_panicking() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(9);
        let mut board = Board::new_random(&mut rng);
        let results = search(&mut board, Variant::Rave, Budget::to_iterations(32), &mut rng);
        assert!(!results.is_empty());
    }

    #[test]
    fn policy_value_search_runs_without_panicking() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(13);
        let mut board = Board::new_random(&mut rng);
        let results = search(&mut board, Variant::PolicyValue, Budget::to_iterations(32), &mut rng);
        assert!(!results.is_empty());
    }

    #[test]
    fn search_with_no_legal_moves_returns_empty() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut board = Board::empty();
        let results = search(&mut board, Variant::Uct, Budget::to_iterations(4), &mut rng);
        assert!(results.is_empty());
    }
}
