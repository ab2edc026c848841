/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The board representation (C3) and legal-move generation (C4).

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{
    bitboard::Bitboard,
    defs::{Move, MoveKind, PieceKind, Side, Square},
    lookups::{self, start_kind},
};

/// Incrementally-maintained accumulators, separated for neatness (mirrors
/// the teacher's `board/accumulators.rs`).
mod accumulators;
/// Pseudo-legal move generation per piece kind.
pub mod movegen;
/// Zobrist-style position hashing.
pub mod zobrist;

pub use accumulators::Phase;

/// A piece's full internal state (only ever visible to the engine itself;
/// [`crate::fen`] redacts it per viewer before it leaves the crate).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PieceState {
    pub side: Side,
    pub hidden: bool,
    pub actual_kind: PieceKind,
}

/// A captured piece, recorded in the order captures happened.
#[derive(Clone, Copy, Debug)]
pub struct CapturedPiece {
    pub side: Side,
    pub kind: PieceKind,
    pub was_hidden: bool,
    pub captor: Side,
    pub move_index: u32,
}

/// The outcome of a position, from the perspective of the side to move.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The game continues.
    Ongoing,
    /// The side to move has no legal moves and is in check: a loss.
    Checkmated,
    /// The side to move has no legal moves and is not in check: a draw.
    Stalemate,
    /// The side to move's king has already been captured: a loss.
    KingCaptured,
    /// Threefold repetition, or the move-limit has been reached: a draw.
    Repetition,
}

impl Outcome {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

/// Opaque record of what [`Board::apply_move`] did, passed back to
/// [`Board::undo_move`] to reverse it exactly. Spec §4.2/§8: apply then
/// undo must restore the board (including the hash) exactly.
#[derive(Clone, Copy, Debug)]
pub struct Undo {
    captured: Option<PieceState>,
    was_hidden: bool,
}

/// A Jieqi position.
#[derive(Clone)]
pub struct Board {
    mailbox: [Option<PieceState>; Square::TOTAL],
    occupied: Bitboard,
    occupied_by_side: [Bitboard; Side::TOTAL],
    side_to_move: Side,
    ply: u32,
    key: u64,
    /// The zobrist key after every move played so far, including the
    /// starting position at index 0. Used for threefold-repetition
    /// detection.
    history: Vec<u64>,
    captured: Vec<CapturedPiece>,
    /// The move-number ceiling after which a game is a draw regardless of
    /// repetition (spec §4.2: "a configurable move-limit").
    move_limit: u32,
}

/// The 15 non-king actual kinds shuffled onto one side's starting squares.
const SHUFFLE_POOL: [PieceKind; 15] = [
    PieceKind::ROOK,
    PieceKind::ROOK,
    PieceKind::HORSE,
    PieceKind::HORSE,
    PieceKind::ELEPHANT,
    PieceKind::ELEPHANT,
    PieceKind::ADVISOR,
    PieceKind::ADVISOR,
    PieceKind::CANNON,
    PieceKind::CANNON,
    PieceKind::PAWN,
    PieceKind::PAWN,
    PieceKind::PAWN,
    PieceKind::PAWN,
    PieceKind::PAWN,
];

impl Board {
    /// An empty board, red to move, no history.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            mailbox: [None; Square::TOTAL],
            occupied: Bitboard::empty(),
            occupied_by_side: [Bitboard::empty(); Side::TOTAL],
            side_to_move: Side::RED,
            ply: 0,
            key: 0,
            history: vec![0],
            captured: Vec::new(),
            move_limit: 400,
        }
    }

    /// Creates a freshly-shuffled initial position: both kings revealed,
    /// the remaining 15 pieces per side shuffled onto their colour's
    /// starting squares (spec §3 Lifecycle).
    #[must_use]
    pub fn new_random(rng: &mut impl Rng) -> Self {
        let mut board = Self::empty();
        for side in [Side::RED, Side::BLACK] {
            let back_row = if side == Side::RED { 0 } else { 9 };
            board.set_piece(
                Square::new(back_row, 4),
                PieceState {
                    side,
                    hidden: false,
                    actual_kind: PieceKind::KING,
                },
            );

            let mut pool = SHUFFLE_POOL;
            pool.shuffle(rng);
            let squares: Vec<Square> = (0..Square::TOTAL as u8)
                .map(Square)
                .filter(|&sq| {
                    start_kind(sq).is_some_and(|k| k != PieceKind::KING) && start_side(sq) == Some(side)
                })
                .collect();
            debug_assert_eq!(squares.len(), pool.len());
            for (square, kind) in squares.into_iter().zip(pool) {
                board.set_piece(
                    square,
                    PieceState {
                        side,
                        hidden: true,
                        actual_kind: kind,
                    },
                );
            }
        }
        board.key = board.recompute_key();
        board.history = vec![board.key];
        board
    }

    /// Builds a board from an explicit piece layout, e.g. one parsed from a
    /// state-string (spec §4.3). `captured` is the already-reconstructed
    /// capture history; the position hash is computed fresh from `pieces`
    /// and `side_to_move`, with no prior history entries.
    #[must_use]
    pub fn from_pieces(
        pieces: &[(Square, PieceState)],
        side_to_move: Side,
        captured: Vec<CapturedPiece>,
        move_limit: u32,
    ) -> Self {
        let mut board = Self::empty();
        board.move_limit = move_limit;
        for &(square, piece) in pieces {
            board.set_piece(square, piece);
        }
        board.side_to_move = side_to_move;
        board.captured = captured;
        board.key = board.recompute_key();
        board.history = vec![board.key];
        board
    }

    fn set_piece(&mut self, square: Square, piece: PieceState) {
        self.occupied |= Bitboard::from(square);
        self.occupied_by_side[piece.side.to_index()] |= Bitboard::from(square);
        self.mailbox[square.to_index()] = Some(piece);
    }

    fn recompute_key(&self) -> u64 {
        let mut key = zobrist::side_to_move_key(self.side_to_move);
        for (index, piece) in self.mailbox.iter().enumerate() {
            if let Some(piece) = piece {
                let square = Square(index as u8);
                let kind = self.movement_kind_of(square, piece);
                key ^= zobrist::piece_key(square, piece.side, kind, piece.hidden);
            }
        }
        key
    }

    #[must_use]
    pub const fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    #[must_use]
    pub const fn ply(&self) -> u32 {
        self.ply
    }

    #[must_use]
    pub const fn key(&self) -> u64 {
        self.key
    }

    #[must_use]
    pub const fn occupied(&self) -> Bitboard {
        self.occupied
    }

    #[must_use]
    pub fn side_bb(&self, side: Side) -> Bitboard {
        self.occupied_by_side[side.to_index()]
    }

    #[must_use]
    pub fn piece_at(&self, square: Square) -> Option<PieceState> {
        self.mailbox[square.to_index()]
    }

    #[must_use]
    pub fn captured(&self) -> &[CapturedPiece] {
        &self.captured
    }

    pub fn set_move_limit(&mut self, limit: u32) {
        self.move_limit = limit;
    }

    /// The movement type a piece at `square` currently has: its own actual
    /// kind if revealed, or the kind fixed by the square if hidden (spec
    /// §3/§4.2).
    #[must_use]
    pub fn movement_kind(&self, square: Square) -> PieceKind {
        let piece = self.mailbox[square.to_index()].expect("no piece on square");
        self.movement_kind_of(square, &piece)
    }

    fn movement_kind_of(&self, square: Square, piece: &PieceState) -> PieceKind {
        if piece.hidden {
            start_kind(square).expect("hidden piece must be on a starting square")
        } else {
            piece.actual_kind
        }
    }

    #[must_use]
    pub fn king_square(&self, side: Side) -> Option<Square> {
        (0..Square::TOTAL as u8).map(Square).find(|&sq| {
            self.mailbox[sq.to_index()]
                .is_some_and(|p| p.side == side && p.actual_kind == PieceKind::KING)
        })
    }

    /// True if `target` is attacked by any piece belonging to `by_side`,
    /// under each attacker's own movement type (spec §4.2: a hidden
    /// advisor attacks as an advisor, never as its true identity).
    #[must_use]
    pub fn attacked_by(&self, target: Square, by_side: Side) -> bool {
        for square in self.side_bb(by_side) {
            let piece = self.mailbox[square.to_index()].expect("bitboard/mailbox desync");
            let kind = self.movement_kind_of(square, &piece);
            if kind == PieceKind::KING {
                if lookups::king_targets(square).contains(&target) {
                    return true;
                }
                if square.col() == target.col()
                    && self.mailbox[target.to_index()].is_some_and(|p| p.actual_kind == PieceKind::KING)
                    && self.file_clear_between(square, target)
                {
                    return true;
                }
                continue;
            }
            if self.attacks_from(square, by_side, kind, piece.hidden).contains(target) {
                return true;
            }
        }
        false
    }

    /// True if no piece stands between `a` and `b` on their shared file
    /// (used for the flying-general rule).
    fn file_clear_between(&self, a: Square, b: Square) -> bool {
        let (lo, hi) = if a.row() < b.row() { (a, b) } else { (b, a) };
        for row in (lo.row() + 1)..hi.row() {
            if self.occupied.contains(Square::new(row, a.col())) {
                return false;
            }
        }
        true
    }

    /// The forward attack set of a hypothetical piece of `kind` belonging
    /// to `side`, standing at `square` (king excluded: handled by the
    /// caller, since its attack set depends on the opposing king's
    /// location too).
    fn attacks_from(&self, square: Square, side: Side, kind: PieceKind, hidden: bool) -> Bitboard {
        let mut bb = Bitboard::empty();
        match kind {
            PieceKind::ADVISOR => {
                for &dest in lookups::advisor_targets(square) {
                    if !hidden || dest.in_palace() {
                        bb |= Bitboard::from(dest);
                    }
                }
            }
            PieceKind::ELEPHANT => {
                for dest in lookups::elephant_targets(square, self.occupied) {
                    if !hidden || dest.in_own_half(side) {
                        bb |= Bitboard::from(dest);
                    }
                }
            }
            PieceKind::HORSE => {
                for dest in lookups::horse_targets(square, self.occupied) {
                    bb |= Bitboard::from(dest);
                }
            }
            PieceKind::ROOK => {
                for dest in lookups::rook_targets(square, self.occupied) {
                    bb |= Bitboard::from(dest);
                }
            }
            PieceKind::CANNON => {
                for dest in lookups::cannon_capture_targets(square, self.occupied) {
                    bb |= Bitboard::from(dest);
                }
            }
            PieceKind::PAWN => {
                for dest in lookups::pawn_targets(square, side) {
                    bb |= Bitboard::from(dest);
                }
            }
            PieceKind::KING | PieceKind::NONE => {}
            _ => {}
        }
        bb
    }

    /// Applies `mv`, mutating `self` in place, and returns an [`Undo`] that
    /// exactly reverses it.
    pub fn apply_move(&mut self, mv: Move) -> Undo {
        let from = mv.from();
        let to = mv.to();
        let mut piece = self.mailbox[from.to_index()].expect("no piece to move");
        let was_hidden = piece.hidden;
        let from_kind = self.movement_kind_of(from, &piece);
        let captured = self.mailbox[to.to_index()];

        self.key ^= zobrist::piece_key(from, piece.side, from_kind, was_hidden);
        if let Some(cap) = captured {
            let cap_kind = self.movement_kind_of(to, &cap);
            self.key ^= zobrist::piece_key(to, cap.side, cap_kind, cap.hidden);
            self.occupied_by_side[cap.side.to_index()] &= !Bitboard::from(to);
            self.captured.push(CapturedPiece {
                side: cap.side,
                kind: cap.actual_kind,
                was_hidden: cap.hidden,
                captor: piece.side,
                move_index: self.ply,
            });
        }

        if matches!(mv_kind(mv), MoveKind::RevealAndMove) {
            piece.hidden = false;
        }
        let to_kind = self.movement_kind_of(to, &piece);
        self.key ^= zobrist::piece_key(to, piece.side, to_kind, piece.hidden);

        self.occupied &= !Bitboard::from(from);
        self.occupied |= Bitboard::from(to);
        self.occupied_by_side[piece.side.to_index()] &= !Bitboard::from(from);
        self.occupied_by_side[piece.side.to_index()] |= Bitboard::from(to);
        self.mailbox[from.to_index()] = None;
        self.mailbox[to.to_index()] = Some(piece);

        self.key ^= zobrist::side_to_move_key(self.side_to_move);
        self.side_to_move = self.side_to_move.flip();
        self.key ^= zobrist::side_to_move_key(self.side_to_move);

        self.ply += 1;
        self.history.push(self.key);

        Undo {
            captured,
            was_hidden,
        }
    }

    /// Exactly reverses a previous call to [`Self::apply_move`].
    pub fn undo_move(&mut self, mv: Move, undo: Undo) {
        self.history.pop();
        self.ply -= 1;

        self.key ^= zobrist::side_to_move_key(self.side_to_move);
        self.side_to_move = self.side_to_move.flip();
        self.key ^= zobrist::side_to_move_key(self.side_to_move);

        let from = mv.from();
        let to = mv.to();
        let mut piece = self.mailbox[to.to_index()].expect("no piece to undo");
        let to_kind = self.movement_kind_of(to, &piece);
        self.key ^= zobrist::piece_key(to, piece.side, to_kind, piece.hidden);

        piece.hidden = undo.was_hidden;
        self.occupied &= !Bitboard::from(to);
        self.occupied_by_side[piece.side.to_index()] &= !Bitboard::from(to);

        if let Some(cap) = undo.captured {
            self.mailbox[to.to_index()] = Some(cap);
            self.occupied |= Bitboard::from(to);
            self.occupied_by_side[cap.side.to_index()] |= Bitboard::from(to);
            let cap_kind = self.movement_kind_of(to, &cap);
            self.key ^= zobrist::piece_key(to, cap.side, cap_kind, cap.hidden);
            self.captured.pop();
        } else {
            self.mailbox[to.to_index()] = None;
        }

        self.mailbox[from.to_index()] = Some(piece);
        self.occupied |= Bitboard::from(from);
        self.occupied_by_side[piece.side.to_index()] |= Bitboard::from(from);
        let from_kind = self.movement_kind_of(from, &piece);
        self.key ^= zobrist::piece_key(from, piece.side, from_kind, piece.hidden);
    }

    /// Passes the turn without moving a piece: flips the side to move and
    /// nothing else. Used only by null-move pruning (spec §4.5), never by
    /// ordinary play.
    pub fn make_null_move(&mut self) {
        self.key ^= zobrist::side_to_move_key(self.side_to_move);
        self.side_to_move = self.side_to_move.flip();
        self.key ^= zobrist::side_to_move_key(self.side_to_move);
        self.ply += 1;
        self.history.push(self.key);
    }

    /// Reverses a previous call to [`Self::make_null_move`].
    pub fn undo_null_move(&mut self) {
        self.history.pop();
        self.ply -= 1;
        self.key ^= zobrist::side_to_move_key(self.side_to_move);
        self.side_to_move = self.side_to_move.flip();
        self.key ^= zobrist::side_to_move_key(self.side_to_move);
    }

    /// True if `side` has at least one piece other than pawns and the king
    /// (null-move pruning is unsound in pawn/king-only endgames, spec §4.5).
    #[must_use]
    pub fn has_non_pawn_material(&self, side: Side) -> bool {
        self.side_bb(side).into_iter().any(|sq| {
            !matches!(
                self.movement_kind(sq),
                PieceKind::PAWN | PieceKind::KING
            )
        })
    }

    #[must_use]
    pub fn is_in_check(&self, side: Side) -> bool {
        match self.king_square(side) {
            Some(sq) => self.attacked_by(sq, side.flip()),
            None => false,
        }
    }

    /// Generates every legal move for the side to move: pseudo-legal moves
    /// with the self-check filter applied (spec §4.2).
    #[must_use]
    pub fn legal_moves(&mut self) -> crate::movelist::MoveList {
        let side = self.side_to_move;
        let pseudo = movegen::generate_pseudo_legal(self);
        let mut out = crate::movelist::MoveList::new();
        for mv in pseudo {
            let undo = self.apply_move(mv);
            if !self.is_in_check(side) {
                out.push(mv);
            }
            self.undo_move(mv, undo);
        }
        out
    }

    /// Counts how many times the current position's key has occurred in
    /// this game's history so far.
    #[must_use]
    pub fn repetition_count(&self) -> usize {
        self.history.iter().filter(|&&k| k == self.key).count()
    }

    #[must_use]
    pub fn is_draw_by_repetition(&self) -> bool {
        self.repetition_count() >= 3
    }

    #[must_use]
    pub fn is_draw_by_move_limit(&self) -> bool {
        self.ply >= self.move_limit
    }

    /// The outcome of the position from the side-to-move's perspective.
    /// Does not mutate `self`, but needs `&mut` because legal-move
    /// generation does (for the apply/undo legality filter).
    pub fn outcome(&mut self) -> Outcome {
        if self.king_square(self.side_to_move).is_none() {
            return Outcome::KingCaptured;
        }
        if self.is_draw_by_repetition() || self.is_draw_by_move_limit() {
            return Outcome::Repetition;
        }
        if self.legal_moves().is_empty() {
            return if self.is_in_check(self.side_to_move) {
                Outcome::Checkmated
            } else {
                Outcome::Stalemate
            };
        }
        Outcome::Ongoing
    }
}

/// Which side's starting layout occupies `square`'s row, if any.
const fn start_side(square: Square) -> Option<Side> {
    match square.row() {
        0 | 2 | 3 => Some(Side::RED),
        6 | 7 | 9 => Some(Side::BLACK),
        _ => None,
    }
}

/// Small helper so [`Board::apply_move`] can read a move's kind without
/// exposing the private field directly.
fn mv_kind(mv: Move) -> MoveKind {
    if mv.is_reveal() {
        MoveKind::RevealAndMove
    } else {
        MoveKind::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_rng(seed: u64) -> rand::rngs::StdRng {
        use rand::SeedableRng;
        rand::rngs::StdRng::seed_from_u64(seed)
    }

    #[test]
    fn random_setup_has_both_kings_and_full_piece_counts() {
        let mut rng = seeded_rng(1);
        let board = Board::new_random(&mut rng);
        for side in [Side::RED, Side::BLACK] {
            assert!(board.king_square(side).is_some());
            assert_eq!(board.side_bb(side).count(), 16);
        }
    }

    #[test]
    fn apply_then_undo_restores_hash_and_occupancy() {
        let mut rng = seeded_rng(2);
        let mut board = Board::new_random(&mut rng);
        let before_key = board.key();
        let before_occ = board.occupied();
        let mv = board.legal_moves()[0];
        let undo = board.apply_move(mv);
        assert_ne!(board.key(), before_key);
        board.undo_move(mv, undo);
        assert_eq!(board.key(), before_key);
        assert_eq!(board.occupied(), before_occ);
    }

    #[test]
    fn legal_moves_never_leave_own_king_in_check() {
        let mut rng = seeded_rng(3);
        let mut board = Board::new_random(&mut rng);
        let side = board.side_to_move();
        for mv in board.legal_moves() {
            let undo = board.apply_move(mv);
            assert!(!board.is_in_check(side));
            board.undo_move(mv, undo);
        }
    }

    #[test]
    fn identical_positions_hash_identically() {
        let mut rng = seeded_rng(4);
        let board_a = Board::new_random(&mut rng);
        let mut board_b = board_a.clone();
        assert_eq!(board_a.key(), board_b.recompute_key());
        let _ = &mut board_b;
    }
}
