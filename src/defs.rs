/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 *
 * This program is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
 * Public License for more details.
 */

use std::fmt::{self, Display, Formatter};

use crate::error::ParseError;

/// The number of ranks on a Jieqi board.
pub const RANKS: u8 = 10;
/// The number of files on a Jieqi board.
pub const FILES: u8 = 9;
/// The total number of squares on the board.
pub const SQUARES: usize = RANKS as usize * FILES as usize;

/// A side: red or black, or `NONE` for an empty square.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Side(pub u8);

#[allow(dead_code)]
impl Side {
    pub const RED: Self = Self(0);
    pub const BLACK: Self = Self(1);
    pub const NONE: Self = Self(2);
    pub const TOTAL: usize = 2;

    /// Returns the opposite side.
    #[must_use]
    pub const fn flip(self) -> Self {
        Self(self.0 ^ 1)
    }

    #[must_use]
    pub const fn to_index(self) -> usize {
        self.0 as usize
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(if *self == Self::RED { "red" } else { "black" })
    }
}

/// A piece kind: the seven Jieqi movement types, or `NONE` for an empty
/// square.
///
/// The internal order is deliberately the same as the [`PieceKind::CHARS`]
/// table, to keep the FEN codec a single array index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PieceKind(pub u8);

#[allow(dead_code)]
impl PieceKind {
    pub const KING: Self = Self(0);
    pub const ADVISOR: Self = Self(1);
    pub const ELEPHANT: Self = Self(2);
    pub const HORSE: Self = Self(3);
    pub const ROOK: Self = Self(4);
    pub const CANNON: Self = Self(5);
    pub const PAWN: Self = Self(6);
    pub const TOTAL: usize = 7;
    pub const NONE: Self = Self(7);

    /// Upper-case (red, revealed) FEN characters, indexed by [`Self::0`].
    const CHARS: [char; Self::TOTAL] = ['K', 'A', 'E', 'H', 'R', 'C', 'P'];

    #[must_use]
    pub const fn to_index(self) -> usize {
        self.0 as usize
    }

    /// Returns the upper-case (red) FEN character for this kind.
    #[must_use]
    pub fn to_char(self) -> char {
        crate::util::get_unchecked(&Self::CHARS, self.to_index())
    }

    /// Parses an upper-case piece-kind letter.
    pub fn from_char(c: char) -> Result<Self, ParseError> {
        Self::CHARS
            .iter()
            .position(|&k| k == c.to_ascii_uppercase())
            .map(|i| Self(i as u8))
            .ok_or(ParseError::InvalidToken)
    }
}

/// A square on the board.
///
/// Row 0 is the red back rank, row 9 is the black back rank (matching the
/// spec's row numbering); file 0 is the `a`-file. `Square(row * 9 + col)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Square(pub u8);

#[allow(dead_code)]
impl Square {
    pub const TOTAL: usize = SQUARES;

    #[must_use]
    pub const fn new(row: u8, col: u8) -> Self {
        Self(row * FILES + col)
    }

    #[must_use]
    pub const fn row(self) -> u8 {
        self.0 / FILES
    }

    #[must_use]
    pub const fn col(self) -> u8 {
        self.0 % FILES
    }

    #[must_use]
    pub const fn to_index(self) -> usize {
        self.0 as usize
    }

    /// True if this square lies in one of the two 3x3 palaces.
    #[must_use]
    pub const fn in_palace(self) -> bool {
        let col = self.col();
        if col < 3 || col > 5 {
            return false;
        }
        let row = self.row();
        row <= 2 || row >= 7
    }

    /// True if this square is on `side`'s own half of the board (i.e. has
    /// not crossed the river).
    #[must_use]
    pub const fn in_own_half(self, side: Side) -> bool {
        if side.0 == Side::RED.0 {
            self.row() <= 4
        } else {
            self.row() >= 5
        }
    }

    /// Offsets this square by `(d_row, d_col)`, returning `None` if the
    /// result falls off the board.
    #[must_use]
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = i8::try_from(self.row()).ok()? + d_row;
        let col = i8::try_from(self.col()).ok()? + d_col;
        if (0..RANKS as i8).contains(&row) && (0..FILES as i8).contains(&col) {
            Some(Self::new(row as u8, col as u8))
        } else {
            None
        }
    }
}

impl Display for Square {
    /// Prints a square as `<file-letter><row-digit>`, e.g. `a0`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col()) as char, self.row())
    }
}

impl std::str::FromStr for Square {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let file = chars.next().ok_or(ParseError::ExpectedToken)?;
        let rank = chars.next().ok_or(ParseError::ExpectedToken)?;
        if chars.next().is_some() {
            return Err(ParseError::InvalidToken);
        }
        if !('a'..='i').contains(&file) || !('0'..='9').contains(&rank) {
            return Err(ParseError::InvalidToken);
        }
        let col = file as u8 - b'a';
        let row = rank as u8 - b'0';
        Ok(Self::new(row, col))
    }
}

/// The kind of a move: whether it reveals a hidden piece.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MoveKind {
    Plain,
    RevealAndMove,
}

/// A move descriptor: `(kind, from, to)`, per spec §3.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    kind: MoveKind,
}

impl Move {
    #[must_use]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self { from, to, kind }
    }

    #[must_use]
    pub const fn from(self) -> Square {
        self.from
    }

    #[must_use]
    pub const fn to(self) -> Square {
        self.to
    }

    #[must_use]
    pub const fn is_reveal(self) -> bool {
        matches!(self.kind, MoveKind::RevealAndMove)
    }
}

impl Display for Move {
    /// Prints a move as `[+]<from><to>`, per spec §4.3. The `=<kind>`
    /// revealed-kind annotation is appended separately by
    /// [`crate::fen::describe_move`] since it depends on post-move board
    /// state, not the move alone.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_reveal() {
            f.write_str("+")?;
        }
        write!(f, "{}{}", self.from, self.to)
    }
}

impl std::str::FromStr for Move {
    type Err = ParseError;

    /// Parses `[+]<file><rank><file><rank>`, ignoring any trailing
    /// `=<kind>` annotation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (reveal, rest) = s.strip_prefix('+').map_or((false, s), |r| (true, r));
        let rest = rest.split('=').next().ok_or(ParseError::ExpectedToken)?;
        if rest.len() != 4 {
            return Err(ParseError::InvalidToken);
        }
        let from = rest[0..2].parse()?;
        let to = rest[2..4].parse()?;
        let kind = if reveal {
            MoveKind::RevealAndMove
        } else {
            MoveKind::Plain
        };
        Ok(Self::new(from, to, kind))
    }
}
