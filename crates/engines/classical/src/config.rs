//! Engine configuration loaded from TOML.

use std::path::Path;
use std::time::Duration;

use chess_core::MoveBudget;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eval::MATE_THRESHOLD;
use crate::search::SearchOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where moves come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveSourceKind {
    /// The built-in search.
    #[default]
    Internal,
    /// An external engine, with the built-in search as fallback.
    Sidecar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum iterative-deepening depth.
    pub depth: u8,
    /// Wall-clock budget per move.
    pub time_limit_secs: f64,
    /// Search deeper once the board thins out.
    pub adaptive_depth: bool,
    pub quiescence_depth: usize,
    pub null_move_pruning: bool,
    pub late_move_reductions: bool,
    /// Half-width in centipawns; 0 disables aspiration windows.
    pub aspiration_window: i32,
    pub node_limit: Option<u64>,
    pub tt_size_mb: usize,
    pub use_book: bool,
    /// Fixed seed for book choices; random when unset.
    pub book_seed: Option<u64>,
    pub move_source: MoveSourceKind,
    /// Think time handed to the sidecar; 0 asks it to search to `depth`.
    pub sidecar_movetime_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            time_limit_secs: 10.0,
            adaptive_depth: true,
            quiescence_depth: 4,
            null_move_pruning: true,
            late_move_reductions: true,
            aspiration_window: 50,
            node_limit: None,
            tt_size_mb: 16,
            use_book: true,
            book_seed: None,
            move_source: MoveSourceKind::Internal,
            sidecar_movetime_ms: 1000,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            quiescence_depth: self.quiescence_depth,
            null_move: self.null_move_pruning,
            lmr: self.late_move_reductions,
            aspiration_window: self.aspiration_window.clamp(0, MATE_THRESHOLD),
        }
    }

    /// The per-move time budget, if positive.
    pub fn move_time(&self) -> Option<Duration> {
        if self.time_limit_secs > 0.0 {
            Duration::try_from_secs_f64(self.time_limit_secs).ok()
        } else {
            None
        }
    }

    pub fn sidecar_budget(&self) -> MoveBudget {
        match self.sidecar_movetime_ms {
            0 => MoveBudget::Depth(self.depth.max(1)),
            ms => MoveBudget::MoveTime(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
