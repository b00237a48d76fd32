//! Arguments of the UCI `go` command and how they turn into search limits.

use std::time::Duration;

use chess_core::{Color, SearchLimits};

/// Moves assumed to remain when the GUI does not send `movestogo`.
const DEFAULT_MOVES_TO_GO: u32 = 30;
/// Never plan to use more than this share of the remaining clock.
const MAX_CLOCK_FRACTION: f64 = 0.25;
const MIN_MOVE_TIME: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u8>,
    pub movetime: Option<Duration>,
    pub nodes: Option<u64>,
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movestogo: Option<u32>,
    pub infinite: bool,
}

impl GoParams {
    /// Parse the tokens after `go`. Unknown or malformed values are skipped.
    pub fn parse(args: &[&str]) -> Self {
        let mut params = Self::default();
        let mut iter = args.iter().copied();
        while let Some(key) = iter.next() {
            match key {
                "infinite" => params.infinite = true,
                "depth" => params.depth = iter.next().and_then(|v| v.parse().ok()),
                "nodes" => params.nodes = iter.next().and_then(|v| v.parse().ok()),
                "movestogo" => params.movestogo = iter.next().and_then(|v| v.parse().ok()),
                "movetime" => params.movetime = iter.next().and_then(millis),
                "wtime" => params.wtime = iter.next().and_then(millis),
                "btime" => params.btime = iter.next().and_then(millis),
                "winc" => params.winc = iter.next().and_then(millis),
                "binc" => params.binc = iter.next().and_then(millis),
                _ => {}
            }
        }
        params
    }

    /// Thinking time for `side`, from `movetime` or the clock.
    pub fn allotted_time(&self, side: Color) -> Option<Duration> {
        if self.infinite {
            return None;
        }
        if let Some(t) = self.movetime {
            return Some(t);
        }
        let (clock, inc) = match side {
            Color::White => (self.wtime?, self.winc.unwrap_or_default()),
            Color::Black => (self.btime?, self.binc.unwrap_or_default()),
        };
        let moves = self.movestogo.unwrap_or(DEFAULT_MOVES_TO_GO).max(1);
        let planned = clock / moves + inc.mul_f64(0.8);
        Some(planned.min(clock.mul_f64(MAX_CLOCK_FRACTION)).max(MIN_MOVE_TIME))
    }

    /// True when the GUI fixed neither depth nor time.
    pub fn is_unbounded(&self) -> bool {
        self.depth.is_none()
            && self.nodes.is_none()
            && self.movetime.is_none()
            && self.wtime.is_none()
            && self.btime.is_none()
            && !self.infinite
    }

    /// Limits for `side`, falling back to `default_depth` and `default_time`
    /// when the command leaves them open.
    pub fn limits(&self, side: Color, default_depth: u8, default_time: Option<Duration>) -> SearchLimits {
        let time = if self.is_unbounded() {
            default_time
        } else {
            self.allotted_time(side)
        };
        let depth = match self.depth {
            Some(d) => d.max(1),
            None if self.is_unbounded() => default_depth.max(1),
            None => u8::MAX,
        };
        let limits = match time {
            Some(t) => SearchLimits::depth_and_time(depth, t),
            None => SearchLimits::depth(depth),
        };
        match self.nodes {
            Some(n) => limits.with_nodes(n),
            None => limits,
        }
    }
}

fn millis(v: &str) -> Option<Duration> {
    // Clocks can go negative in some GUIs.
    v.parse::<i64>()
        .ok()
        .map(|ms| Duration::from_millis(ms.max(0) as u64))
}

#[cfg(test)]
#[path = "go_tests.rs"]
mod go_tests;
