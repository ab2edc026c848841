/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The position evaluator (C6): material, piece-square tables, mobility,
//! check, and a hidden-piece differential, normalised to a bounded score
//! (spec §4.4).

use crate::{
    board::{movegen, Board, Phase},
    defs::Side,
};

pub mod piece_square_tables;
pub mod values;

/// A raw evaluation, in centi-pawns, from a fixed side's perspective.
pub type Eval = i32;

/// `normalise`'s curvature constant (spec §4.4).
const NORMALISE_K: f32 = 20_000.0;

/// Static evaluation of `board`, from the side-to-move's perspective.
/// Mobility uses pseudo-legal move counts (spec §4.4), so this does not
/// need `&mut Board`.
#[must_use]
pub fn evaluate(board: &Board) -> Eval {
    let raw = raw_score(board, Side::RED);
    if board.side_to_move() == Side::RED {
        raw
    } else {
        -raw
    }
}

/// The raw material/PST/mobility/check/hidden-piece score, always from
/// `perspective`'s point of view, independent of whose turn it is.
#[must_use]
pub fn raw_score(board: &Board, perspective: Side) -> Eval {
    let mut score = 0i32;
    let phase = phase_of(board);

    for square in board.occupied() {
        let piece = board.piece_at(square).expect("occupied square has a piece");
        let kind = board.movement_kind(square);
        let sign = if piece.side == perspective { 1 } else { -1 };

        let material = values::material_value(kind, piece.hidden, square, piece.side);
        score += sign * material;
        if !piece.hidden {
            score += sign * piece_square_tables::pst_value(kind, piece.side, square);
        }
    }

    score += mobility_term(board, perspective);
    score += check_term(board, perspective);
    score += hidden_piece_term(board, perspective, phase);

    score
}

fn mobility_term(board: &Board, perspective: Side) -> Eval {
    let own = movegen::generate_pseudo_legal_for(board, perspective).len() as i32;
    let enemy = movegen::generate_pseudo_legal_for(board, perspective.flip()).len() as i32;
    10 * (own - enemy)
}

fn check_term(board: &Board, perspective: Side) -> Eval {
    let mut score = 0;
    if board.is_in_check(perspective) {
        score -= 500;
    }
    if board.is_in_check(perspective.flip()) {
        score += 500;
    }
    score
}

/// Early game: a player's own hidden pieces are worth more than the
/// opponent's (information asymmetry). Late game: the opposite — revealed
/// pieces dominate the term instead. Blended by [`Phase::fraction`].
fn hidden_piece_term(board: &Board, perspective: Side, phase: Phase) -> Eval {
    let own_hidden = count_hidden(board, perspective);
    let enemy_hidden = count_hidden(board, perspective.flip());
    let own_revealed = board.side_bb(perspective).count() as i32 - own_hidden;
    let enemy_revealed = board.side_bb(perspective.flip()).count() as i32 - enemy_hidden;

    let early = 50 * (own_hidden - enemy_hidden);
    let late = 30 * (own_revealed - enemy_revealed);
    let f = phase.fraction();
    (f * early as f32 + (1.0 - f) * late as f32) as i32
}

fn count_hidden(board: &Board, side: Side) -> i32 {
    board
        .side_bb(side)
        .into_iter()
        .filter(|&sq| board.piece_at(sq).is_some_and(|p| p.hidden))
        .count() as i32
}

/// The game phase implied by `board`'s current material, computed fresh
/// rather than maintained incrementally (this board is small enough — at
/// most 32 pieces — that the extra bookkeeping in [`Board`] isn't worth
/// it).
#[must_use]
pub fn phase_of(board: &Board) -> Phase {
    let mut phase = Phase::default();
    for square in board.occupied() {
        let kind = board.movement_kind(square);
        phase = phase.add(kind);
    }
    phase
}

/// Maps a raw score to `(-1000, 1000)` (spec §4.4).
#[must_use]
pub fn normalise(raw: Eval) -> f32 {
    1000.0 * (raw as f32 / NORMALISE_K).tanh()
}

/// Maps a normalised score to a win probability in `(0, 1)`.
#[must_use]
pub fn win_rate(normalised: f32) -> f32 {
    1.0 / (1.0 + (-normalised / 500.0).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen;

    #[test]
    fn normalise_is_bounded_and_monotonic() {
        assert!(normalise(1_000_000) < 1000.0);
        assert!(normalise(-1_000_000) > -1000.0);
        assert!(normalise(500) > normalise(0));
        assert_eq!(normalise(0), 0.0);
    }

    #[test]
    fn win_rate_of_even_score_is_half() {
        assert!((win_rate(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn side_to_move_perspective_flips_with_turn() {
        let s_red = "4k4/4R4/9/9/9/9/9/9/9/4K4 -:- r r";
        let s_black = "4k4/4R4/9/9/9/9/9/9/9/4K4 -:- b r";
        let red_state = fen::parse(s_red).expect("valid");
        let black_state = fen::parse(s_black).expect("valid");
        // same material, opposite side to move: the rook favours red either way
        assert!(evaluate(&red_state.board) > 0);
        assert!(evaluate(&black_state.board) < 0);
    }

    #[test]
    fn material_dominates_a_lone_rook_vs_lone_king() {
        let s = "4k4/4R4/9/9/9/9/9/9/9/4K4 -:- r r";
        let state = fen::parse(s).expect("valid");
        assert!(raw_score(&state.board, Side::RED) > 5_000);
    }
}
