//! Time control and search limits for chess engines.
//!
//! Engines poll [`TimeControl::check`] every few thousand nodes; once the time
//! or node budget is spent the shared stop flag is raised and stays raised
//! until [`TimeControl::reset`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Nodes between two clock reads.
pub const DEFAULT_CHECK_INTERVAL: u64 = 1024;

/// What a single `go` may spend.
///
/// Every limit that is set applies; the first one reached ends the search,
/// which then answers with the move of the last completed iteration.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Iterative deepening stops after this many plies.
    pub depth: u8,
    /// Wall-clock budget for the move; `None` thinks until another limit hits.
    pub move_time: Option<Duration>,
    pub nodes: Option<u64>,
    /// Clock and stop flag polled by the search.
    pub time_control: TimeControl,
}

impl SearchLimits {
    /// Fixed depth, no clock.
    pub fn depth(depth: u8) -> Self {
        Self {
            depth,
            move_time: None,
            nodes: None,
            time_control: TimeControl::new(None),
        }
    }

    /// Depth cap plus a clock.
    pub fn depth_and_time(depth: u8, move_time: Duration) -> Self {
        Self {
            depth,
            move_time: Some(move_time),
            nodes: None,
            time_control: TimeControl::new(Some(move_time)),
        }
    }

    /// Clock only; depth is left open.
    pub fn time(move_time: Duration) -> Self {
        Self {
            depth: u8::MAX,
            move_time: Some(move_time),
            nodes: None,
            time_control: TimeControl::new(Some(move_time)),
        }
    }

    /// Add a node budget on top of the existing limits.
    pub fn with_nodes(mut self, nodes: u64) -> Self {
        self.nodes = Some(nodes);
        self.time_control.node_limit = Some(nodes);
        self
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.time_control.is_stopped()
    }

    pub fn start(&mut self) {
        self.time_control.start();
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::depth(4)
    }
}

/// Clock, node budget and stop flag for one search.
///
/// Clones share the stop flag, so a clone kept by another thread can call
/// [`TimeControl::stop`] to end a running search.
#[derive(Debug, Clone)]
pub struct TimeControl {
    stopped: Arc<AtomicBool>,
    start_time: Option<Instant>,
    time_limit: Option<Duration>,
    node_limit: Option<u64>,
    /// Nodes between clock reads.
    check_interval: u64,
}

impl TimeControl {
    /// A controller with an optional hard time limit and no node budget.
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            start_time: None,
            time_limit,
            node_limit: None,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    pub fn with_node_limit(mut self, nodes: Option<u64>) -> Self {
        self.node_limit = nodes;
        self
    }

    /// Replace the time limit; clones keep sharing the stop flag.
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    /// Start the clock. A stop raised before this call stays in force.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Lower the stop flag so these limits can drive another search.
    pub fn reset(&mut self) {
        self.start_time = None;
        self.stopped.store(false, Ordering::SeqCst);
    }

    /// Raise the stop flag; every clone sees it.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Read the clock and node counter, raising the stop flag when either
    /// budget is spent.
    ///
    /// # Returns
    /// true when the search must stop.
    pub fn check(&self, nodes: u64) -> bool {
        if self.is_stopped() {
            return true;
        }

        let out_of_nodes = self.node_limit.is_some_and(|limit| nodes >= limit);
        let out_of_time = match (self.time_limit, self.start_time) {
            (Some(limit), Some(start)) => start.elapsed() >= limit,
            _ => false,
        };
        if out_of_nodes || out_of_time {
            self.stop();
            return true;
        }
        false
    }

    /// Returns true every `check_interval` nodes.
    #[inline]
    pub fn should_check(&self, nodes: u64) -> bool {
        nodes % self.check_interval == 0
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn node_limit(&self) -> Option<u64> {
        self.node_limit
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|s| s.elapsed()).unwrap_or(Duration::ZERO)
    }

    /// Time left before the hard limit, `None` without one.
    pub fn remaining(&self) -> Option<Duration> {
        let limit = self.time_limit?;
        Some(limit.saturating_sub(self.elapsed()))
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Effort granted to an alternate move source such as an external engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveBudget {
    /// Search to a fixed depth in plies.
    Depth(u8),
    /// Think for a fixed wall-clock time.
    MoveTime(Duration),
}

impl From<&SearchLimits> for MoveBudget {
    fn from(limits: &SearchLimits) -> Self {
        match limits.move_time {
            Some(t) => MoveBudget::MoveTime(t),
            None => MoveBudget::Depth(limits.depth),
        }
    }
}

#[cfg(test)]
#[path = "time_control_tests.rs"]
mod time_control_tests;
