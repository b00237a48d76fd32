pub mod board;
pub mod error;
pub mod time_control;
pub mod types;
pub mod uci;

// Re-export core game logic (not engine-specific)
pub use board::*;
pub use error::*;
pub use time_control::*;
pub use types::*;
pub use uci::*;

// =============================================================================
// Engine trait: implemented by every move-choosing engine
// =============================================================================

/// What an engine answers to one `go`.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// `None` only when the side to move has no legal move.
    pub best_move: Option<Move>,
    /// Centipawns for the side to move; mate scores sit near `±MATE_SCORE`.
    pub score: i32,
    /// Deepest fully completed iteration
    pub depth: u8,
    pub nodes: u64,
    /// A time or node limit cut the last iteration short.
    pub stopped: bool,
}

impl SearchResult {
    /// A result carrying a move that was chosen without searching.
    pub fn instant(best_move: Option<Move>) -> Self {
        Self {
            best_move,
            score: 0,
            depth: 0,
            nodes: 0,
            stopped: false,
        }
    }
}

/// A move-choosing engine as seen by the UCI front end.
pub trait Engine: Send {
    /// Pick a move for `pos` within `limits`. `pos` is left as it was.
    fn search(&mut self, pos: &Position, limits: SearchLimits) -> SearchResult;

    fn name(&self) -> &str;

    fn author(&self) -> &str {
        "chess-lab"
    }

    /// Drop hash table, killer and history state from the previous game.
    fn new_game(&mut self) {}

    /// Apply a UCI option; `false` when the name or value is not understood.
    fn set_option(&mut self, _name: &str, _value: &str) -> bool {
        false
    }
}

// =============================================================================
// Alternate move sources (external engines, scripted players, ...)
// =============================================================================

/// Anything that can be asked for a move outside the built-in search.
///
/// Failures are not errors at this level: a source that cannot answer
/// returns `None` and the caller falls back to its own search.
pub trait MoveSource: Send {
    /// Ask for a move in `pos` within `budget`.
    fn request_move(&mut self, pos: &Position, budget: &MoveBudget) -> Option<Move>;

    /// Forget anything carried over from the previous game.
    fn new_game(&mut self) {}

    fn name(&self) -> &str;
}

/// A source that never has an answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMoveSource;

impl MoveSource for NullMoveSource {
    fn request_move(&mut self, _pos: &Position, _budget: &MoveBudget) -> Option<Move> {
        None
    }

    fn name(&self) -> &str {
        "null"
    }
}
