/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! Zobrist-style position hashing (C3 position hash).
//!
//! Combines, for every occupied square, `(square, side, movement-kind,
//! hidden-flag)`, plus the side to move, per spec §4.2. Keys are generated
//! once from a fixed seed with a splitmix64 stream: not cryptographically
//! secure (explicitly a non-goal), but stable across runs, which is all the
//! apply/undo round-trip and distinctness properties in spec §8 require.

use lazy_static::lazy_static;

use crate::defs::{PieceKind, Side, Square};

struct Table {
    /// `squares[square][side][kind][hidden as usize]`.
    squares: [[[[u64; 2]; PieceKind::TOTAL]; Side::TOTAL]; Square::TOTAL],
    side_to_move: u64,
}

lazy_static! {
    static ref TABLE: Table = generate();
}

/// A splitmix64 step, used only to seed a deterministic, stable stream of
/// keys at start-up (not for any gameplay randomness).
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn generate() -> Table {
    let mut state = 0xD1CE_B00D_A5EE_D5EEu64;
    let mut squares = [[[[0u64; 2]; PieceKind::TOTAL]; Side::TOTAL]; Square::TOTAL];
    for square in &mut squares {
        for side in square {
            for kind in side {
                for hidden_slot in kind {
                    *hidden_slot = splitmix64(&mut state);
                }
            }
        }
    }
    Table {
        squares,
        side_to_move: splitmix64(&mut state),
    }
}

/// The key contribution of a single piece on a square.
#[must_use]
pub fn piece_key(square: Square, side: Side, kind: PieceKind, hidden: bool) -> u64 {
    TABLE.squares[square.to_index()][side.to_index()][kind.to_index()][usize::from(hidden)]
}

/// The key contribution of the side to move (XORed in only when it is
/// black's move, so the empty board with red to move hashes to zero).
#[must_use]
pub fn side_to_move_key(side: Side) -> u64 {
    if side == Side::BLACK {
        TABLE.side_to_move
    } else {
        0
    }
}
