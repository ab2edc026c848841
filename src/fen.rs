/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The state-string codec (C5): parses and emits the four-field textual
//! state string under the viewer-dependent redaction rules of spec §4.3.
//!
//! Hidden pieces never disclose their actual kind in the *board* field,
//! even to the side that owns them — the engine is not privileged over the
//! players it serves. [`parse`] therefore has to invent a concrete actual
//! kind for every still-hidden piece it reads, consistent with what is
//! publicly countable (the fixed 15-piece shuffle pool per side, minus
//! pieces already known to be revealed or known-captured). It does this by
//! shuffling the remaining pool with a RNG seeded from the input string
//! itself, so the same string always determinises to the same board.

use rand::{seq::SliceRandom, SeedableRng};

use crate::{
    board::{Board, CapturedPiece, PieceState},
    defs::{Move, PieceKind, Side, Square},
    error::ParseError,
    lookups::start_kind,
};

/// A parsed state-string: the board plus the viewer it was parsed/emitted
/// for. Round-tripping ([`parse`] then [`emit`]) is only meaningful with
/// the same viewer, since the captured-piece redaction depends on it.
pub struct GameState {
    pub board: Board,
    pub viewer: Side,
}

/// The 15 non-king kinds each side starts with, used to fill in the pool
/// of undetermined hidden-piece identities during [`parse`].
const POOL: [PieceKind; 15] = [
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

#[derive(Clone, Copy)]
enum RawCell {
    Empty,
    Hidden(Side),
    Revealed(Side, PieceKind),
}

/// Parses a four-field state-string into a [`GameState`].
pub fn parse(s: &str) -> Result<GameState, ParseError> {
    let mut fields = s.split_whitespace();
    let board_field = fields.next().ok_or(ParseError::WrongFieldCount)?;
    let captured_field = fields.next().ok_or(ParseError::WrongFieldCount)?;
    let turn_field = fields.next().ok_or(ParseError::WrongFieldCount)?;
    let viewer_field = fields.next().ok_or(ParseError::WrongFieldCount)?;
    if fields.next().is_some() {
        return Err(ParseError::WrongFieldCount);
    }

    let cells = parse_board_field(board_field)?;
    let turn = parse_side(turn_field)?;
    let viewer = parse_side(viewer_field)?;
    let captured = parse_captured_field(captured_field, viewer)?;

    let pieces = determinise(cells, &captured, s)?;
    let board = Board::from_pieces(&pieces, turn, captured, 400);
    Ok(GameState { board, viewer })
}

/// Emits `state` back into its four-field textual form, redacted for
/// `state.viewer` per spec §4.3.
#[must_use]
pub fn emit(state: &GameState) -> String {
    let board = emit_board_field(&state.board);
    let captured = emit_captured_field(&state.board, state.viewer);
    let turn = side_char(state.board.side_to_move());
    let viewer = side_char(state.viewer);
    format!("{board} {captured} {turn} {viewer}")
}

/// Annotates a just-applied move with its revealed-kind suffix (spec §4.3,
/// e.g. `+a0a1=P`), by reading the piece now standing on `mv.to()`.
#[must_use]
pub fn describe_move(mv: Move, board_after_apply: &Board) -> String {
    let mut out = mv.to_string();
    if mv.is_reveal() {
        if let Some(piece) = board_after_apply.piece_at(mv.to()) {
            let letter = piece.actual_kind.to_char();
            let letter = if piece.side == Side::BLACK {
                letter.to_ascii_lowercase()
            } else {
                letter
            };
            out.push('=');
            out.push(letter);
        }
    }
    out
}

fn parse_side(field: &str) -> Result<Side, ParseError> {
    match field {
        "r" => Ok(Side::RED),
        "b" => Ok(Side::BLACK),
        _ => Err(ParseError::InvalidToken),
    }
}

const fn side_char(side: Side) -> char {
    if side.0 == Side::RED.0 {
        'r'
    } else {
        'b'
    }
}

fn parse_board_field(field: &str) -> Result<Vec<RawCell>, ParseError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 10 {
        return Err(ParseError::WrongFieldCount);
    }
    let mut cells = vec![RawCell::Empty; Square::TOTAL];
    // the board's first printed rank is row 9 (black's back rank)
    for (print_index, rank) in ranks.iter().enumerate() {
        let row = 9 - print_index as u8;
        let mut col = 0u8;
        for c in rank.chars() {
            if col >= 9 {
                return Err(ParseError::InvalidToken);
            }
            if let Some(n) = c.to_digit(10) {
                if n == 0 {
                    return Err(ParseError::InvalidToken);
                }
                col += n as u8;
                continue;
            }
            let square = Square::new(row, col);
            let cell = match c {
                'X' => RawCell::Hidden(Side::RED),
                'x' => RawCell::Hidden(Side::BLACK),
                _ => {
                    let side = if c.is_ascii_uppercase() { Side::RED } else { Side::BLACK };
                    RawCell::Revealed(side, PieceKind::from_char(c)?)
                }
            };
            cells[square.to_index()] = cell;
            col += 1;
        }
        if col != 9 {
            return Err(ParseError::InvalidToken);
        }
    }
    Ok(cells)
}

fn parse_captured_field(field: &str, viewer: Side) -> Result<Vec<CapturedPiece>, ParseError> {
    let mut halves = field.split(':');
    let red_list = halves.next().ok_or(ParseError::WrongFieldCount)?;
    let black_list = halves.next().ok_or(ParseError::WrongFieldCount)?;
    if halves.next().is_some() {
        return Err(ParseError::WrongFieldCount);
    }
    let mut out = Vec::new();
    let mut move_index = 0;
    for (owner, list) in [(Side::RED, red_list), (Side::BLACK, black_list)] {
        if list == "-" {
            continue;
        }
        for c in list.chars() {
            let entry = if c == '?' {
                let captor = owner.flip();
                if captor == viewer {
                    // The viewer themselves would know a piece they captured;
                    // an unresolved '?' only makes sense for the opponent's captures.
                    return Err(ParseError::InvalidToken);
                }
                CapturedPiece {
                    side: owner,
                    kind: PieceKind::NONE,
                    was_hidden: true,
                    captor,
                    move_index,
                }
            } else if c.is_ascii_uppercase() {
                CapturedPiece {
                    side: owner,
                    kind: PieceKind::from_char(c)?,
                    was_hidden: false,
                    captor: owner.flip(),
                    move_index,
                }
            } else {
                CapturedPiece {
                    side: owner,
                    kind: PieceKind::from_char(c)?,
                    was_hidden: true,
                    captor: viewer,
                    move_index,
                }
            };
            out.push(entry);
            move_index += 1;
        }
    }
    Ok(out)
}

/// Fills in a concrete (but unobservable) actual kind for every hidden
/// on-board piece, by shuffling what remains of each side's 15-piece pool
/// after subtracting pieces already known (revealed on the board, or
/// known-captured) — seeded from the input string so parsing is stable.
fn determinise(
    cells: Vec<RawCell>,
    captured: &[CapturedPiece],
    seed_source: &str,
) -> Result<Vec<(Square, PieceState)>, ParseError> {
    let mut pieces = Vec::new();
    let mut hidden_squares: [Vec<Square>; 2] = [Vec::new(), Vec::new()];
    let mut pool: [Vec<PieceKind>; 2] = [POOL.to_vec(), POOL.to_vec()];

    for (index, cell) in cells.into_iter().enumerate() {
        let square = Square(index as u8);
        match cell {
            RawCell::Empty => {}
            RawCell::Hidden(side) => {
                match start_kind(square) {
                    None => return Err(ParseError::InvalidToken),
                    // Only a king can ever stand on a king's starting
                    // square, hidden or not, so it determinises directly
                    // rather than drawing from the 15-piece shuffle pool.
                    Some(PieceKind::KING) => pieces.push((
                        square,
                        PieceState {
                            side,
                            hidden: true,
                            actual_kind: PieceKind::KING,
                        },
                    )),
                    Some(_) => hidden_squares[side.to_index()].push(square),
                }
            }
            RawCell::Revealed(side, kind) => {
                if kind != PieceKind::KING {
                    remove_one(&mut pool[side.to_index()], kind)?;
                }
                pieces.push((
                    square,
                    PieceState {
                        side,
                        hidden: false,
                        actual_kind: kind,
                    },
                ));
            }
        }
    }

    for cap in captured {
        if cap.kind != PieceKind::NONE && cap.kind != PieceKind::KING {
            remove_one(&mut pool[cap.side.to_index()], cap.kind)?;
        }
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed_fnv(seed_source));
    for side in [Side::RED, Side::BLACK] {
        let squares = &hidden_squares[side.to_index()];
        let mut kinds = std::mem::take(&mut pool[side.to_index()]);
        if kinds.len() != squares.len() {
            return Err(ParseError::InvalidToken);
        }
        kinds.shuffle(&mut rng);
        for (&square, kind) in squares.iter().zip(kinds) {
            pieces.push((
                square,
                PieceState {
                    side,
                    hidden: true,
                    actual_kind: kind,
                },
            ));
        }
    }

    Ok(pieces)
}

fn remove_one(pool: &mut Vec<PieceKind>, kind: PieceKind) -> Result<(), ParseError> {
    let pos = pool.iter().position(|&k| k == kind).ok_or(ParseError::InvalidToken)?;
    pool.remove(pos);
    Ok(())
}

/// A small FNV-1a hash, used only to seed the hidden-piece determinisation
/// RNG deterministically from the input text.
fn seed_fnv(s: &str) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for byte in s.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

fn emit_board_field(board: &Board) -> String {
    let mut ranks = Vec::with_capacity(10);
    for row in (0..10u8).rev() {
        let mut rank = String::new();
        let mut run = 0u8;
        for col in 0..9u8 {
            match board.piece_at(Square::new(row, col)) {
                None => run += 1,
                Some(piece) => {
                    if run > 0 {
                        rank.push((b'0' + run) as char);
                        run = 0;
                    }
                    let c = if piece.hidden {
                        if piece.side == Side::RED {
                            'X'
                        } else {
                            'x'
                        }
                    } else {
                        let letter = piece.actual_kind.to_char();
                        if piece.side == Side::RED {
                            letter
                        } else {
                            letter.to_ascii_lowercase()
                        }
                    };
                    rank.push(c);
                }
            }
        }
        if run > 0 {
            rank.push((b'0' + run) as char);
        }
        ranks.push(rank);
    }
    ranks.join("/")
}

fn emit_captured_field(board: &Board, viewer: Side) -> String {
    let mut lists = [String::new(), String::new()];
    for cap in board.captured() {
        let c = if !cap.was_hidden {
            let letter = cap.kind.to_char();
            letter
        } else if cap.captor == viewer {
            cap.kind.to_char().to_ascii_lowercase()
        } else {
            '?'
        };
        lists[cap.side.to_index()].push(c);
    }
    for list in &mut lists {
        if list.is_empty() {
            *list = "-".to_string();
        }
    }
    format!("{}:{}", lists[0], lists[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    const S1: &str = "xxxxxxxxx/9/1x5x1/x1x1x1x1x/9/9/X1X1X1X1X/1X5X1/9/XXXXXXXXX -:- r r";

    #[test]
    fn parses_and_reemits_the_initial_position() {
        let state = parse(S1).expect("valid state-string");
        assert_eq!(state.board.side_to_move(), Side::RED);
        let out = emit(&state);
        // the board and turn/viewer fields are stable; captured stays "-:-"
        let mut fields = out.split_whitespace();
        assert_eq!(fields.next().unwrap(), S1.split_whitespace().next().unwrap());
        assert_eq!(fields.nth(1).unwrap(), "r");
        assert_eq!(fields.next().unwrap(), "r");
    }

    #[test]
    fn initial_position_has_32_pieces_with_full_per_kind_counts() {
        let state = parse(S1).expect("valid state-string");
        assert_eq!(state.board.side_bb(Side::RED).count(), 16);
        assert_eq!(state.board.side_bb(Side::BLACK).count(), 16);
    }

    #[test]
    fn string_level_round_trip_is_stable() {
        let state = parse(S1).expect("valid state-string");
        let once = emit(&state);
        let twice = emit(&parse(&once).expect("valid re-parse"));
        assert_eq!(once, twice);
    }

    #[test]
    fn viewer_asymmetry_on_known_hidden_capture() {
        // red captured a still-hidden black piece: red knows it (lower-case
        // letter in black's loss list), black does not (redacted to `?`).
        let s_red_view = "4k4/9/9/9/9/9/9/9/9/4K4 -:r r r";
        let s_black_view = "4k4/9/9/9/9/9/9/9/9/4K4 -:? r b";
        let red_state = parse(s_red_view).expect("valid");
        let black_state = parse(s_black_view).expect("valid");
        assert_eq!(emit(&red_state).split_whitespace().nth(1).unwrap(), "-:r");
        assert_eq!(emit(&black_state).split_whitespace().nth(1).unwrap(), "-:?");
    }

    #[test]
    fn wrong_rank_count_is_rejected() {
        assert!(parse("9/9/9 -:- r r").is_err());
    }
}
