use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::MAX_SKILL_LEVEL;

/// Settings for the external UCI engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    /// Binary to run; searched for on PATH and in common install locations when unset.
    pub path: Option<PathBuf>,
    /// Extra command-line arguments.
    pub args: Vec<String>,
    pub skill_level: u8,
    pub ready_timeout_ms: u64,
    /// Grace period on top of `go movetime` before the request is abandoned.
    pub move_timeout_margin_ms: u64,
    /// Upper bound for `go depth` requests.
    pub depth_timeout_ms: u64,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            skill_level: 10,
            ready_timeout_ms: 10_000,
            move_timeout_margin_ms: 2_000,
            depth_timeout_ms: 30_000,
        }
    }
}

impl SidecarConfig {
    pub fn skill_level(&self) -> u8 {
        self.skill_level.min(MAX_SKILL_LEVEL)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn move_timeout_margin(&self) -> Duration {
        Duration::from_millis(self.move_timeout_margin_ms)
    }

    pub fn depth_timeout(&self) -> Duration {
        Duration::from_millis(self.depth_timeout_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
