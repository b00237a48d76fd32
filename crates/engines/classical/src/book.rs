//! Opening book lookup.
//!
//! A book maps positions to weighted candidate moves. Lookups are keyed by
//! the position hash, so a line reached by transposition still finds its
//! entries. Every candidate is re-checked for legality before it is played.

use std::collections::HashMap;
use std::path::Path;

use chess_core::{parse_uci_move, FenError, Move, Position};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// A candidate move with its relative weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    pub mv: Move,
    pub weight: u32,
}

/// Position-keyed weighted move lookup.
pub trait OpeningBook: Send {
    /// Candidate moves stored for `pos`, possibly empty.
    fn entries(&self, pos: &Position) -> Vec<BookEntry>;
}

#[derive(Debug, Error)]
pub enum BookError {
    #[error("failed to read book file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse book: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Fen(#[from] FenError),
}

#[derive(Debug, Deserialize)]
struct BookFile {
    #[serde(default, rename = "position")]
    positions: Vec<BookPosition>,
}

#[derive(Debug, Deserialize)]
struct BookPosition {
    fen: String,
    #[serde(default)]
    moves: Vec<BookMove>,
}

#[derive(Debug, Deserialize)]
struct BookMove {
    mv: String,
    #[serde(default = "default_weight")]
    weight: u32,
}

fn default_weight() -> u32 {
    1
}

/// In-memory book keyed by position hash.
#[derive(Debug, Clone, Default)]
pub struct MemoryBook {
    lines: HashMap<u64, Vec<BookEntry>>,
}

impl MemoryBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(fen, [(uci_move, weight)])` pairs.
    ///
    /// Moves that are not legal in their position are skipped with a warning.
    pub fn from_lines<'a, I, M>(lines: I) -> Result<Self, BookError>
    where
        I: IntoIterator<Item = (&'a str, M)>,
        M: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut book = Self::new();
        for (fen, moves) in lines {
            let pos = Position::from_fen(fen)?;
            for (text, weight) in moves {
                book.insert_uci(&pos, text, weight);
            }
        }
        Ok(book)
    }

    /// Parse a TOML book:
    ///
    /// ```toml
    /// [[position]]
    /// fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    /// moves = [{ mv = "e2e4", weight = 10 }, { mv = "d2d4", weight = 8 }]
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, BookError> {
        let file: BookFile = toml::from_str(text)?;
        Self::from_lines(
            file.positions
                .iter()
                .map(|p| (p.fen.as_str(), p.moves.iter().map(|m| (m.mv.as_str(), m.weight)))),
        )
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn insert(&mut self, pos: &Position, mv: Move, weight: u32) {
        let entries = self.lines.entry(pos.hash()).or_default();
        match entries.iter_mut().find(|e| e.mv == mv) {
            Some(existing) => existing.weight = existing.weight.saturating_add(weight),
            None => entries.push(BookEntry { mv, weight }),
        }
    }

    fn insert_uci(&mut self, pos: &Position, text: &str, weight: u32) {
        match parse_uci_move(pos, text) {
            Ok(mv) => self.insert(pos, mv, weight),
            Err(err) => warn!(fen = %pos.fen(), mv = text, %err, "skipping book move"),
        }
    }

    /// Number of positions in the book.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl OpeningBook for MemoryBook {
    fn entries(&self, pos: &Position) -> Vec<BookEntry> {
        self.lines.get(&pos.hash()).cloned().unwrap_or_default()
    }
}

/// Weighted random choice among the legal, positively weighted candidates.
pub fn pick_book_move<R: Rng + ?Sized>(book: &dyn OpeningBook, pos: &Position, rng: &mut R) -> Option<Move> {
    let candidates: Vec<BookEntry> = book
        .entries(pos)
        .into_iter()
        .filter(|e| e.weight > 0 && pos.is_legal(e.mv))
        .collect();
    let dist = WeightedIndex::new(candidates.iter().map(|e| e.weight)).ok()?;
    Some(candidates[dist.sample(rng)].mv)
}

#[cfg(test)]
#[path = "book_tests.rs"]
mod book_tests;
