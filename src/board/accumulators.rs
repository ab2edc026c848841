/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! Game-phase tracking, used by the evaluator to taper piece-square values
//! (mirrors the teacher's `board/accumulators.rs` phase field, generalised
//! from chess material weights to Jieqi's).

use crate::defs::PieceKind;

/// A coarse material-based measure of how far into the game a position is:
/// `0` is a completely empty board (endgame-like), [`Phase::MAX`] is the
/// starting position (opening-like).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
pub struct Phase(pub u16);

impl Phase {
    /// Phase contribution of a single non-pawn, non-king piece.
    const fn weight(kind: PieceKind) -> u16 {
        match kind.0 {
            k if k == PieceKind::ROOK.0 => 4,
            k if k == PieceKind::CANNON.0 => 3,
            k if k == PieceKind::HORSE.0 => 2,
            k if k == PieceKind::ELEPHANT.0 => 1,
            k if k == PieceKind::ADVISOR.0 => 1,
            _ => 0,
        }
    }

    /// Phase of the full starting position: 2 rooks + 2 cannons + 2 horses
    /// + 2 elephants + 2 advisors per side.
    pub const MAX: Self = Self(2 * (4 + 3 + 2 + 1 + 1) * 2);

    /// Adds a piece's contribution (call when a piece is revealed onto the
    /// board or appears via setup; hidden pieces still count, since their
    /// presence alone signals "midgame" uncertainty even before reveal).
    #[must_use]
    pub const fn add(self, kind: PieceKind) -> Self {
        Self(self.0 + Self::weight(kind))
    }

    /// `0.0` (endgame) to `1.0` (opening).
    #[must_use]
    pub fn fraction(self) -> f32 {
        f32::from(self.0.min(Self::MAX.0)) / f32::from(Self::MAX.0)
    }
}
