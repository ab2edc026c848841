/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

/// An error parsing a single token (a square, a move, a FEN field, ...).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ParseError {
    /// A token was outside an expected range or otherwise malformed.
    InvalidToken,
    /// Expected a token but found nothing.
    ExpectedToken,
    /// The wrong number of tokens/fields were present.
    WrongFieldCount,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::InvalidToken => "invalid token",
            Self::ExpectedToken => "expected a token, found none",
            Self::WrongFieldCount => "wrong number of fields",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ParseError {}

/// The public-facing error kinds from spec §7.
///
/// Kinds 4 (deadline reached) and 5 (internal invariant violation) are
/// intentionally absent: a deadline is absorbed into a best-so-far result
/// before it ever reaches a caller, and an invariant violation is a
/// programming error that should `panic!`/`debug_assert!` rather than be
/// represented here.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed state-string: missing field, wrong rank count, invalid
    /// piece character, per-kind count exceeded, etc.
    #[error("malformed state-string: {0}")]
    MalformedState(#[from] ParseError),

    /// A requested move is not present in the legal move set for the given
    /// state.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// The requested strategy name is not in the registry.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
}

impl EngineError {
    /// The process exit code this error should map to, per spec §6.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MalformedState(_) => 2,
            Self::IllegalMove(_) => 2,
            Self::UnknownStrategy(_) => 3,
        }
    }
}
