//! Commands sent to the sidecar and parsing of its replies.

use std::time::Duration;

use chess_core::{MoveBudget, Position};

/// Highest skill level the sidecar understands.
pub const MAX_SKILL_LEVEL: u8 = 20;

pub fn position_command(pos: &Position) -> String {
    format!("position fen {}", pos.fen())
}

pub fn go_command(budget: &MoveBudget) -> String {
    match budget {
        MoveBudget::Depth(depth) => format!("go depth {}", (*depth).max(1)),
        MoveBudget::MoveTime(time) => format!("go movetime {}", millis(*time).max(1)),
    }
}

pub fn skill_command(level: u8) -> String {
    format!("setoption name Skill Level value {}", level.min(MAX_SKILL_LEVEL))
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// A parsed `bestmove` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    /// Move text, `None` when the engine reported no move.
    pub mv: Option<String>,
    pub ponder: Option<String>,
}

/// Parse `bestmove <move> [ponder <move>]`; other lines give `None`.
pub fn parse_bestmove(line: &str) -> Option<BestMove> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "bestmove" {
        return None;
    }
    let mv = tokens
        .next()
        .filter(|m| !matches!(*m, "(none)" | "0000"))
        .map(str::to_string);
    let ponder = match (tokens.next(), tokens.next()) {
        (Some("ponder"), Some(p)) => Some(p.to_string()),
        _ => None,
    };
    Some(BestMove { mv, ponder })
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod protocol_tests;
