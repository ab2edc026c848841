/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! Precomputed attack tables (C2).
//!
//! For the non-sliding kinds (king, advisor, elephant, horse, pawn) the
//! candidate-target lists are precomputed once into [`LOOKUP`] (mirroring
//! the teacher's `Lookup` struct in `lookups.rs`/`movegen.rs`). For the
//! sliding kinds (rook, cannon) only the four directional *rays* from each
//! square are precomputed; the occupancy-dependent blocker scan happens at
//! call time in [`rook_targets`]/[`cannon_move_targets`]/
//! [`cannon_capture_targets`], since a 90-square board gains nothing from
//! magic-bitboard-style full precomputation.

use arrayvec::ArrayVec;
use lazy_static::lazy_static;

use crate::{
    bitboard::Bitboard,
    defs::{PieceKind, Side, Square},
};

/// A diagonal-two move together with the intervening "eye" square.
#[derive(Clone, Copy)]
pub struct Blocked {
    pub blocker: Square,
    pub dest: Square,
}

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
/// Horse move offsets paired with the orthogonally-adjacent "leg" offset
/// that must be empty for the move to be possible.
const HORSE_MOVES: [((i8, i8), (i8, i8)); 8] = [
    ((2, 1), (1, 0)),
    ((2, -1), (1, 0)),
    ((-2, 1), (-1, 0)),
    ((-2, -1), (-1, 0)),
    ((1, 2), (0, 1)),
    ((-1, 2), (0, 1)),
    ((1, -2), (0, -1)),
    ((-1, -2), (0, -1)),
];

/// Precomputed non-sliding attack tables, one entry per square.
pub struct Lookup {
    king: [ArrayVec<Square, 4>; Square::TOTAL],
    advisor: [ArrayVec<Square, 4>; Square::TOTAL],
    elephant: [ArrayVec<Blocked, 4>; Square::TOTAL],
    horse: [ArrayVec<Blocked, 8>; Square::TOTAL],
    /// The four directional rays from each square, nearest square first,
    /// stopping at the board edge. Used by the sliding kinds.
    rays: [[ArrayVec<Square, 9>; 4]; Square::TOTAL],
}

lazy_static! {
    pub static ref LOOKUP: Lookup = Lookup::generate();
}

impl Lookup {
    fn generate() -> Self {
        let mut king: [ArrayVec<Square, 4>; Square::TOTAL] = std::array::from_fn(|_| ArrayVec::new());
        let mut advisor: [ArrayVec<Square, 4>; Square::TOTAL] = std::array::from_fn(|_| ArrayVec::new());
        let mut elephant: [ArrayVec<Blocked, 4>; Square::TOTAL] = std::array::from_fn(|_| ArrayVec::new());
        let mut horse: [ArrayVec<Blocked, 8>; Square::TOTAL] = std::array::from_fn(|_| ArrayVec::new());
        let mut rays: [[ArrayVec<Square, 9>; 4]; Square::TOTAL] =
            std::array::from_fn(|_| std::array::from_fn(|_| ArrayVec::new()));

        for index in 0..Square::TOTAL {
            let square = Square(index as u8);

            for (dr, dc) in ORTHOGONAL {
                if let Some(dest) = square.offset(dr, dc) {
                    if dest.in_palace() {
                        king[index].push(dest);
                    }
                }
            }

            for (dr, dc) in DIAGONAL {
                if let Some(dest) = square.offset(dr, dc) {
                    advisor[index].push(dest);
                }
            }

            for (dr, dc) in DIAGONAL {
                let eye = square.offset(dr, dc);
                let dest = square.offset(dr * 2, dc * 2);
                if let (Some(eye), Some(dest)) = (eye, dest) {
                    elephant[index].push(Blocked { blocker: eye, dest });
                }
            }

            for ((dr, dc), (lr, lc)) in HORSE_MOVES {
                let leg = square.offset(lr, lc);
                let dest = square.offset(dr, dc);
                if let (Some(leg), Some(dest)) = (leg, dest) {
                    horse[index].push(Blocked { blocker: leg, dest });
                }
            }

            for (dir_index, (dr, dc)) in ORTHOGONAL.into_iter().enumerate() {
                let mut current = square;
                while let Some(next) = current.offset(dr, dc) {
                    rays[index][dir_index].push(next);
                    current = next;
                }
            }
        }

        Self {
            king,
            advisor,
            elephant,
            horse,
            rays,
        }
    }
}

/// Movement type a hidden piece has, based purely on the square it starts
/// on. `None` if no hidden piece can ever legally stand on that square.
#[must_use]
pub fn start_kind(square: Square) -> Option<PieceKind> {
    let row = square.row();
    let col = square.col();
    let back = match row {
        0 => Some(Side::RED),
        9 => Some(Side::BLACK),
        _ => None,
    };
    if let Some(_side) = back {
        return Some(match col {
            0 | 8 => PieceKind::ROOK,
            1 | 7 => PieceKind::HORSE,
            2 | 6 => PieceKind::ELEPHANT,
            3 | 5 => PieceKind::ADVISOR,
            4 => PieceKind::KING,
            _ => return None,
        });
    }
    if (row == 2 && (col == 1 || col == 7)) || (row == 7 && (col == 1 || col == 7)) {
        return Some(PieceKind::CANNON);
    }
    if (row == 3 || row == 6) && col % 2 == 0 {
        return Some(PieceKind::PAWN);
    }
    None
}

/// King targets: one step orthogonal, confined to the palace. The
/// flying-general capture is handled separately by the board, since it
/// depends on the position of the opposing king rather than being a fixed
/// per-square table.
#[must_use]
pub fn king_targets(square: Square) -> &'static [Square] {
    &LOOKUP.king[square.to_index()]
}

/// Advisor targets: one diagonal step. Callers filter to the palace
/// themselves when the advisor is hidden (spec §4.1/§9).
#[must_use]
pub fn advisor_targets(square: Square) -> &'static [Square] {
    &LOOKUP.advisor[square.to_index()]
}

/// Elephant targets: a two-step diagonal "field" move, blocked if the
/// intervening "eye" square is occupied.
#[must_use]
pub fn elephant_targets(square: Square, occupied: Bitboard) -> ArrayVec<Square, 4> {
    LOOKUP.elephant[square.to_index()]
        .iter()
        .filter(|b| !occupied.contains(b.blocker))
        .map(|b| b.dest)
        .collect()
}

/// Horse targets: an L-shape move, blocked if the orthogonally-adjacent
/// "leg" square is occupied.
#[must_use]
pub fn horse_targets(square: Square, occupied: Bitboard) -> ArrayVec<Square, 8> {
    LOOKUP.horse[square.to_index()]
        .iter()
        .filter(|b| !occupied.contains(b.blocker))
        .map(|b| b.dest)
        .collect()
}

/// Rook targets: every empty square along a ray, plus the first occupied
/// square (a potential capture).
#[must_use]
pub fn rook_targets(square: Square, occupied: Bitboard) -> ArrayVec<Square, 17> {
    let mut out = ArrayVec::new();
    for ray in &LOOKUP.rays[square.to_index()] {
        for &target in ray {
            out.push(target);
            if occupied.contains(target) {
                break;
            }
        }
    }
    out
}

/// Cannon non-capture targets: identical to the rook's quiet slide (zero
/// intervening pieces allowed, and the blocker itself is excluded).
#[must_use]
pub fn cannon_move_targets(square: Square, occupied: Bitboard) -> ArrayVec<Square, 17> {
    let mut out = ArrayVec::new();
    for ray in &LOOKUP.rays[square.to_index()] {
        for &target in ray {
            if occupied.contains(target) {
                break;
            }
            out.push(target);
        }
    }
    out
}

/// Cannon capture targets: exactly one intervening piece (of either
/// colour) between the cannon and the target.
#[must_use]
pub fn cannon_capture_targets(square: Square, occupied: Bitboard) -> ArrayVec<Square, 4> {
    let mut out = ArrayVec::new();
    for ray in &LOOKUP.rays[square.to_index()] {
        let mut screens = 0u8;
        for &target in ray {
            if occupied.contains(target) {
                screens += 1;
                if screens == 2 {
                    out.push(target);
                    break;
                }
            }
        }
    }
    out
}

/// Pawn targets: one step forward, plus (after crossing the river) one
/// step to either side. Never backward.
#[must_use]
pub fn pawn_targets(square: Square, side: Side) -> ArrayVec<Square, 3> {
    let mut out = ArrayVec::new();
    let forward: i8 = if side == Side::RED { 1 } else { -1 };
    if let Some(dest) = square.offset(forward, 0) {
        out.push(dest);
    }
    if !square.in_own_half(side) {
        if let Some(dest) = square.offset(0, 1) {
            out.push(dest);
        }
        if let Some(dest) = square.offset(0, -1) {
            out.push(dest);
        }
    }
    out
}
