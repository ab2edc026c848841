/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! Material values for the evaluator (spec §4.4).

use crate::defs::PieceKind;

use super::Eval;

/// Base material values in centi-pawns, indexed by [`PieceKind::to_index`].
pub const BASE_VALUES: [Eval; PieceKind::TOTAL] = [
    100_000, // king
    2_000,   // advisor
    2_000,   // elephant
    4_000,   // horse
    9_000,   // rook
    4_500,   // cannon
    1_000,   // pawn, before crossing the river
];

/// A pawn's value once it has crossed the river.
pub const PAWN_ACROSS_RIVER_VALUE: Eval = 2_000;

/// The expected value of a still-hidden piece: the weighted average of the
/// 15-piece shuffle pool, reflecting that its true identity is unknown but
/// bounded.
pub const HIDDEN_PIECE_VALUE: Eval = 3_200;

/// Material value of the piece described by `kind`/`hidden`/`square`/`side`.
#[must_use]
pub fn material_value(
    kind: PieceKind,
    hidden: bool,
    square: crate::defs::Square,
    side: crate::defs::Side,
) -> Eval {
    if hidden {
        return HIDDEN_PIECE_VALUE;
    }
    if kind == PieceKind::PAWN && !square.in_own_half(side) {
        return PAWN_ACROSS_RIVER_VALUE;
    }
    BASE_VALUES[kind.to_index()]
}
