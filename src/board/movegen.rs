/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! Pseudo-legal move generation (C4): consults the attack tables for each
//! piece's current movement type and filters out destinations occupied by
//! a friendly piece. [`Board::legal_moves`](super::Board::legal_moves)
//! layers the self-check filter on top of this.

use crate::{
    defs::{Move, MoveKind, PieceKind, Side, Square},
    lookups,
    movelist::MoveList,
};

use super::Board;

/// Pseudo-legal moves for the side to move.
#[must_use]
pub fn generate_pseudo_legal(board: &Board) -> MoveList {
    generate_for(board, board.side_to_move())
}

/// Pseudo-legal moves for an arbitrary side, regardless of whose turn it
/// actually is. Used by the evaluator's mobility term (spec §4.4), which
/// needs both sides' move counts without mutating whose turn it is.
#[must_use]
pub fn generate_pseudo_legal_for(board: &Board, side: Side) -> MoveList {
    generate_for(board, side)
}

fn generate_for(board: &Board, side: Side) -> MoveList {
    let mut moves = MoveList::new();
    let own = board.side_bb(side);
    let occupied = board.occupied();

    for square in own {
        let piece = board.piece_at(square).expect("bitboard/mailbox desync");
        let kind = board.movement_kind(square);
        let move_kind = if piece.hidden {
            MoveKind::RevealAndMove
        } else {
            MoveKind::Plain
        };

        match kind {
            PieceKind::KING => {
                for &dest in lookups::king_targets(square) {
                    push_if_not_own(&mut moves, board, side, square, dest, move_kind);
                }
                if let Some(enemy_king) = board.king_square(side.flip()) {
                    if enemy_king.col() == square.col()
                        && board_file_clear(board, square, enemy_king, occupied)
                    {
                        moves.push(Move::new(square, enemy_king, move_kind));
                    }
                }
            }
            PieceKind::ADVISOR => {
                for &dest in lookups::advisor_targets(square) {
                    if piece.hidden && !dest.in_palace() {
                        continue;
                    }
                    push_if_not_own(&mut moves, board, side, square, dest, move_kind);
                }
            }
            PieceKind::ELEPHANT => {
                for dest in lookups::elephant_targets(square, occupied) {
                    if piece.hidden && !dest.in_own_half(side) {
                        continue;
                    }
                    push_if_not_own(&mut moves, board, side, square, dest, move_kind);
                }
            }
            PieceKind::HORSE => {
                for dest in lookups::horse_targets(square, occupied) {
                    push_if_not_own(&mut moves, board, side, square, dest, move_kind);
                }
            }
            PieceKind::ROOK => {
                for dest in lookups::rook_targets(square, occupied) {
                    push_if_not_own(&mut moves, board, side, square, dest, move_kind);
                }
            }
            PieceKind::CANNON => {
                for dest in lookups::cannon_move_targets(square, occupied) {
                    moves.push(Move::new(square, dest, move_kind));
                }
                for dest in lookups::cannon_capture_targets(square, occupied) {
                    push_if_not_own(&mut moves, board, side, square, dest, move_kind);
                }
            }
            PieceKind::PAWN => {
                for dest in lookups::pawn_targets(square, side) {
                    push_if_not_own(&mut moves, board, side, square, dest, move_kind);
                }
            }
            _ => {}
        }
    }

    moves
}

fn push_if_not_own(moves: &mut MoveList, board: &Board, side: Side, from: Square, to: Square, kind: MoveKind) {
    if board.piece_at(to).is_some_and(|p| p.side == side) {
        return;
    }
    moves.push(Move::new(from, to, kind));
}

fn board_file_clear(board: &Board, a: Square, b: Square, occupied: crate::bitboard::Bitboard) -> bool {
    let (lo, hi) = if a.row() < b.row() { (a, b) } else { (b, a) };
    for row in (lo.row() + 1)..hi.row() {
        if occupied.contains(Square::new(row, a.col())) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, PieceState};
    use rand::SeedableRng;

    #[test]
    fn pawn_before_river_has_one_target() {
        // a red pawn on its own half, far from other pieces: forward only
        let mut board = Board::empty();
        let sq = Square::new(3, 0);
        board.set_piece(
            sq,
            PieceState {
                side: crate::defs::Side::RED,
                hidden: false,
                actual_kind: PieceKind::PAWN,
            },
        );
        let moves = generate_pseudo_legal(&board);
        assert_eq!(moves.len(), 1);
    }

    #[test]
    fn pawn_after_river_has_up_to_three_targets() {
        let mut board = Board::empty();
        let sq = Square::new(5, 4);
        board.set_piece(
            sq,
            PieceState {
                side: crate::defs::Side::RED,
                hidden: false,
                actual_kind: PieceKind::PAWN,
            },
        );
        let moves = generate_pseudo_legal(&board);
        assert_eq!(moves.len(), 3);
    }

    #[test]
    fn random_startpos_generates_only_own_side_moves() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let board = Board::new_random(&mut rng);
        let moves = generate_pseudo_legal(&board);
        assert!(!moves.is_empty());
        for mv in moves {
            assert_eq!(
                board.piece_at(mv.from()).map(|p| p.side),
                Some(board.side_to_move())
            );
        }
    }
}
