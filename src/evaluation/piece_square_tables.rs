/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! Piece-square tables (spec §4.4: "rooks prefer open files and opponent's
//! half; horses and cannons prefer centre; pawns reward advance").
//!
//! Unlike the teacher's tables (which are lifted verbatim from PeSTO, a
//! chess-specific reference), there is no equivalent published table for
//! Jieqi, so these are derived programmatically from the board's geometry
//! — centrality and rank-advancement — rather than hand-tuned constants.

use lazy_static::lazy_static;

use crate::defs::{PieceKind, Side, Square};

use super::Eval;

lazy_static! {
    /// `TABLES[kind][side][square]`, in centi-pawns.
    static ref TABLES: [[[Eval; Square::TOTAL]; Side::TOTAL]; PieceKind::TOTAL] = generate();
}

/// A column's distance-from-centre bonus: highest (4) on the centre file,
/// lowest (0) on the edge files.
fn centrality(col: u8) -> i32 {
    4 - (i32::from(col) - 4).abs()
}

/// A row's distance-from-the-river bonus: highest (4) near the middle two
/// ranks, lowest (0) on either back rank.
fn centre_rank(row: u8) -> i32 {
    4 - ((2 * i32::from(row) - 9).abs() / 2)
}

/// How many ranks `square` has advanced into the opponent's half, from
/// `side`'s perspective: `0` at the home back rank, `9` at the enemy's.
fn advance(row: u8, side: Side) -> i32 {
    if side == Side::RED {
        i32::from(row)
    } else {
        9 - i32::from(row)
    }
}

fn value_for(kind: PieceKind, side: Side, square: Square) -> Eval {
    let row = square.row();
    let col = square.col();
    let raw = match kind {
        PieceKind::KING => -10 * (i32::from(col) - 4).abs(),
        PieceKind::ADVISOR | PieceKind::ELEPHANT => 4 * centrality(col),
        PieceKind::HORSE => 8 * centrality(col) + 6 * centre_rank(row),
        PieceKind::CANNON => 6 * centrality(col) + 4 * centre_rank(row) + 3 * advance(row, side),
        PieceKind::ROOK => 4 * centrality(col) + 10 * advance(row, side),
        PieceKind::PAWN => 18 * advance(row, side),
        _ => 0,
    };
    raw
}

fn generate() -> [[[Eval; Square::TOTAL]; Side::TOTAL]; PieceKind::TOTAL] {
    std::array::from_fn(|kind| {
        std::array::from_fn(|side| {
            std::array::from_fn(|square| {
                value_for(PieceKind(kind as u8), Side(side as u8), Square(square as u8))
            })
        })
    })
}

/// The piece-square bonus for `kind`/`side` standing on `square`.
#[must_use]
pub fn pst_value(kind: PieceKind, side: Side, square: Square) -> Eval {
    TABLES[kind.to_index()][side.to_index()][square.to_index()]
}
