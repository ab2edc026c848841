/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! Move ordering (spec §4.5 point 6): TT move, MVV-LVA captures, killers,
//! countermove, history, and a reveal-move bonus.

use crate::{
    board::Board,
    defs::{Move, Side},
    evaluation::values::BASE_VALUES,
    movelist::{pick_next, MoveList, ScoredMove},
};

use super::Histories;

const TT_MOVE_SCORE: i32 = 1_000_000;
const CAPTURE_BASE: i32 = 100_000;
const KILLER_SCORES: [i32; 2] = [9_000, 8_000];
const COUNTERMOVE_SCORE: i32 = 7_000;
const REVEAL_ACROSS_RIVER_BONUS: i32 = 300;
const REVEAL_BONUS: i32 = 100;

/// Scores `moves` for ordering at `height`, given the TT's suggested move (if
/// any) and the previous move played (for countermove lookup).
#[must_use]
pub fn score_moves(
    board: &Board,
    moves: MoveList,
    tt_move: Option<Move>,
    histories: &Histories,
    height: usize,
    previous_move: Option<Move>,
) -> Vec<ScoredMove> {
    let side = board.side_to_move();
    let killers = histories.killers(height);
    let countermove = previous_move.and_then(|prev| histories.countermove(prev));

    moves
        .into_iter()
        .map(|mv| ScoredMove {
            mv,
            score: score_one(board, side, mv, tt_move, histories, killers, countermove),
        })
        .collect()
}

fn score_one(
    board: &Board,
    side: Side,
    mv: Move,
    tt_move: Option<Move>,
    histories: &Histories,
    killers: [Option<Move>; 2],
    countermove: Option<Move>,
) -> i32 {
    if tt_move == Some(mv) {
        return TT_MOVE_SCORE;
    }

    let mut score = if board.piece_at(mv.to()).is_some() {
        let victim_kind = board.movement_kind(mv.to());
        let attacker_kind = board.movement_kind(mv.from());
        let victim_value = BASE_VALUES[victim_kind.to_index()];
        let attacker_value = BASE_VALUES[attacker_kind.to_index()];
        CAPTURE_BASE + victim_value * 10 - attacker_value
    } else if killers[0] == Some(mv) {
        KILLER_SCORES[0]
    } else if killers[1] == Some(mv) {
        KILLER_SCORES[1]
    } else if countermove == Some(mv) {
        COUNTERMOVE_SCORE
    } else {
        histories.history_score(side, mv)
    };

    if mv.is_reveal() {
        score += if mv.to().in_own_half(side.flip()) {
            REVEAL_ACROSS_RIVER_BONUS
        } else {
            REVEAL_BONUS
        };
    }

    score
}

/// An iterator that lazily selection-sorts `scored` in descending order,
/// without sorting moves that a beta cutoff never examines.
pub struct OrderedMoves {
    scored: Vec<ScoredMove>,
    next: usize,
}

impl OrderedMoves {
    #[must_use]
    pub const fn new(scored: Vec<ScoredMove>) -> Self {
        Self { scored, next: 0 }
    }
}

impl Iterator for OrderedMoves {
    type Item = Move;

    fn next(&mut self) -> Option<Self::Item> {
        let index = pick_next(&mut self.scored, self.next)?;
        self.next += 1;
        Some(self.scored[index].mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use rand::SeedableRng;

    #[test]
    fn tt_move_sorts_first() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        let board = Board::new_random(&mut rng);
        let moves = crate::board::movegen::generate_pseudo_legal(&board);
        let tt_move = moves[moves.len() / 2];
        let histories = Histories::new();
        let scored = score_moves(&board, moves, Some(tt_move), &histories, 0, None);
        let mut ordered = OrderedMoves::new(scored);
        assert_eq!(ordered.next(), Some(tt_move));
    }
}
