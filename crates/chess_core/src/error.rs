//! Error types for the board adapter and UCI parsing.

use thiserror::Error;

use crate::types::Move;

/// A move was pushed that is not legal in the current position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal move {mv} in position {fen}")]
pub struct IllegalMoveError {
    pub mv: Move,
    pub fen: String,
}

/// A FEN string could not be turned into a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid FEN: {fen}")]
pub struct FenError {
    pub fen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UciError {
    #[error("malformed move text `{0}`")]
    MalformedMove(String),

    #[error("move `{0}` is not legal here")]
    IllegalMove(String),

    #[error("expected `startpos` or `fen`, got `{0}`")]
    UnknownPositionKind(String),

    #[error(transparent)]
    Fen(#[from] FenError),
}
