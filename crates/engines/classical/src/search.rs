//! Iterative-deepening negamax with alpha-beta pruning.
//!
//! Each iteration searches the root with principal-variation discipline,
//! probing the transposition table, pruning with null moves and late-move
//! reductions, and handing the horizon to quiescence search. Only completed
//! iterations update the answer, so an aborted search still returns the best
//! move of the deepest finished depth.

use std::time::Duration;

use chess_core::{Move, Position, SearchLimits, SearchResult, TimeControl};
use tracing::{debug, trace};

use crate::eval::{is_endgame, mated_in, DRAW_SCORE, MATE_SCORE, MATE_THRESHOLD};
use crate::ordering::MoveOrderer;
use crate::tt::{score_from_tt, score_to_tt, Bound, TranspositionTable};

/// Larger than any reachable score.
pub const INFINITY: i32 = MATE_SCORE + 1;

/// Depth reduction applied to the null-move search.
pub const NULL_MOVE_REDUCTION: i32 = 2;
/// Index from which quiet moves become candidates for a reduction.
pub const LMR_MIN_MOVE_INDEX: usize = 2;
/// Fraction of the move time after which the search must stop.
pub const HARD_LIMIT_FRACTION: f64 = 0.8;
/// Fraction of the move time after which no new iteration is started.
pub const SOFT_LIMIT_FRACTION: f64 = 0.5;

/// Search toggles. Every pruning heuristic can be switched off so the plain
/// alpha-beta result can be checked against a full-width search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub quiescence_depth: usize,
    pub null_move: bool,
    pub lmr: bool,
    /// Half-width of the aspiration window; 0 always searches the full window.
    pub aspiration_window: i32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            quiescence_depth: 4,
            null_move: true,
            lmr: true,
            aspiration_window: 50,
        }
    }
}

/// Counters from the last search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    /// Deepest ply reached, quiescence included.
    pub seldepth: usize,
    pub completed_depth: u8,
    pub elapsed: Duration,
    /// Null-move searches tried.
    pub null_move_tries: u64,
    /// Root re-searches after the aspiration window failed.
    pub aspiration_researches: u32,
}

/// Search state owned by one engine instance.
pub struct Searcher {
    pub(crate) tt: TranspositionTable,
    pub(crate) orderer: MoveOrderer,
    pub(crate) options: SearchOptions,
    pub(crate) tc: TimeControl,
    pub(crate) nodes: u64,
    pub(crate) seldepth: usize,
    pub(crate) stopped: bool,
    null_move_tries: u64,
    aspiration_researches: u32,
    root_best: Option<Move>,
    stats: SearchStats,
}

impl Searcher {
    pub fn new(options: SearchOptions) -> Self {
        Self::with_tt_size(options, 16)
    }

    pub fn with_tt_size(options: SearchOptions, tt_mb: usize) -> Self {
        Self {
            tt: TranspositionTable::new(tt_mb),
            orderer: MoveOrderer::new(),
            options,
            tc: TimeControl::new(None),
            nodes: 0,
            seldepth: 0,
            stopped: false,
            null_move_tries: 0,
            aspiration_researches: 0,
            root_best: None,
            stats: SearchStats::default(),
        }
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn set_options(&mut self, options: SearchOptions) {
        self.options = options;
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Forget everything learned in previous games.
    pub fn reset(&mut self) {
        self.tt.clear();
        self.orderer.clear();
    }

    /// Search `pos` within `limits`.
    ///
    /// `best_move` is `None` only when the position has no legal moves. When
    /// not even depth 1 completes, the first move in ordering order is
    /// returned with `depth == 0`.
    pub fn search(&mut self, pos: &Position, limits: &SearchLimits) -> SearchResult {
        let mut root = pos.clone();
        self.nodes = 0;
        self.seldepth = 0;
        self.stopped = false;
        self.null_move_tries = 0;
        self.aspiration_researches = 0;
        self.tt.new_search();
        self.orderer.new_search();

        let hard = limits.move_time.map(|t| t.mul_f64(HARD_LIMIT_FRACTION));
        let soft = limits.move_time.map(|t| t.mul_f64(SOFT_LIMIT_FRACTION));
        self.tc = limits
            .time_control
            .clone()
            .with_time_limit(hard)
            .with_node_limit(limits.nodes);
        self.tc.start();
        if self.tc.is_stopped() {
            debug!("stop requested before the search started");
            self.stopped = true;
        }

        let mut moves = root.legal_moves();
        if moves.is_empty() {
            let score = if root.in_check() { mated_in(0) } else { DRAW_SCORE };
            self.finish(0);
            return SearchResult {
                score,
                ..SearchResult::instant(None)
            };
        }
        self.orderer.order(&root, &mut moves, 0, None);

        let mut best: Option<(Move, i32)> = None;
        let mut completed = 0u8;
        for depth in 1..=limits.depth.max(1) {
            if self.stopped {
                break;
            }
            if best.is_some() && soft.is_some_and(|soft| self.tc.elapsed() >= soft) {
                debug!(depth, "not enough time left for another iteration");
                break;
            }

            let score = self.aspiration_search(&mut root, depth as i32, best.map(|(_, s)| s));
            if self.stopped {
                debug!(depth, "iteration aborted");
                break;
            }
            let Some(mv) = self.root_best else {
                break;
            };
            best = Some((mv, score));
            completed = depth;

            debug!(
                depth,
                score,
                nodes = self.nodes,
                seldepth = self.seldepth,
                elapsed_ms = self.tc.elapsed().as_millis() as u64,
                best = %mv,
                "iteration complete"
            );

            // A mate inside the full-width horizon cannot get any shorter.
            if score >= MATE_THRESHOLD && MATE_SCORE - score <= depth as i32 {
                break;
            }
        }

        self.finish(completed);
        let (best_move, score) = best.unwrap_or((moves[0], 0));
        SearchResult {
            best_move: Some(best_move),
            score,
            depth: completed,
            nodes: self.nodes,
            stopped: self.stopped,
        }
    }

    fn finish(&mut self, completed: u8) {
        self.stats = SearchStats {
            nodes: self.nodes,
            seldepth: self.seldepth,
            completed_depth: completed,
            elapsed: self.tc.elapsed(),
            null_move_tries: self.null_move_tries,
            aspiration_researches: self.aspiration_researches,
        };
    }

    /// Root search in a narrow window around the previous score, falling
    /// back to the full window when the result lands outside it.
    fn aspiration_search(&mut self, pos: &mut Position, depth: i32, previous: Option<i32>) -> i32 {
        let width = self.options.aspiration_window.clamp(0, MATE_THRESHOLD);
        if let Some(prev) = previous.filter(|_| depth >= 3 && width > 0) {
            let alpha = (prev - width).max(-INFINITY);
            let beta = (prev + width).min(INFINITY);
            let score = self.negamax(pos, depth, alpha, beta, 0, true);
            if self.stopped || (score > alpha && score < beta) {
                return score;
            }
            trace!(depth, score, alpha, beta, "aspiration window failed");
            self.aspiration_researches += 1;
        }
        self.negamax(pos, depth, -INFINITY, INFINITY, 0, true)
    }

    /// Raise the stop flag once the budget is spent; polled every
    /// [`chess_core::DEFAULT_CHECK_INTERVAL`] nodes.
    pub(crate) fn poll_stop(&mut self) -> bool {
        if !self.stopped && self.tc.should_check(self.nodes) && self.tc.check(self.nodes) {
            self.stopped = true;
        }
        self.stopped
    }

    /// Fail-soft negamax. Scores are from the side to move's view.
    fn negamax(
        &mut self,
        pos: &mut Position,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        ply: usize,
        allow_null: bool,
    ) -> i32 {
        self.nodes += 1;
        if self.poll_stop() {
            return 0;
        }

        let root = ply == 0;
        if root {
            self.root_best = None;
        } else if pos.is_fifty_moves() || pos.is_insufficient_material() || pos.is_repetition(2) {
            return DRAW_SCORE;
        }

        if depth <= 0 {
            return self.quiescence(pos, alpha, beta, 0, ply);
        }

        let key = pos.hash();
        let original_alpha = alpha;
        let mut tt_move = None;
        if let Some(entry) = self.tt.get(key) {
            tt_move = entry.best_move;
            if !root && entry.depth >= depth {
                let score = score_from_tt(entry.score, ply);
                match entry.bound {
                    Bound::Exact => return score,
                    Bound::LowerBound if score >= beta => return score,
                    Bound::UpperBound if score <= alpha => return score,
                    _ => {}
                }
            }
        }

        let mut moves = pos.legal_moves();
        let in_check = pos.in_check();
        if moves.is_empty() {
            return if in_check { mated_in(ply) } else { DRAW_SCORE };
        }

        if self.options.null_move
            && !root
            && allow_null
            && depth >= 3
            && !in_check
            && beta < MATE_THRESHOLD
            && !is_endgame(pos)
        {
            if let Some(mut passed) = pos.scoped_null() {
                self.null_move_tries += 1;
                let reduced = depth - 1 - NULL_MOVE_REDUCTION;
                let score = -self.negamax(&mut passed, reduced, -beta, -beta + 1, ply + 1, false);
                drop(passed);
                if self.stopped {
                    return 0;
                }
                if score >= beta {
                    return beta;
                }
            }
        }

        self.orderer.order(pos, &mut moves, ply, tt_move);

        let mut best_score = -INFINITY;
        let mut best_move = None;
        for (i, &mv) in moves.iter().enumerate() {
            let quiet = !pos.is_capture(mv) && !pos.is_promotion(mv);
            let Ok(mut child) = pos.scoped(mv) else {
                continue;
            };

            let score = if i == 0 {
                -self.negamax(&mut child, depth - 1, -beta, -alpha, ply + 1, true)
            } else {
                let reduce = self.options.lmr
                    && i >= LMR_MIN_MOVE_INDEX
                    && depth >= 3
                    && quiet
                    && !in_check
                    && !child.in_check();
                let probe_depth = if reduce { depth - 2 } else { depth - 1 };
                let mut score = -self.negamax(&mut child, probe_depth, -alpha - 1, -alpha, ply + 1, true);
                if reduce && score > alpha {
                    score = -self.negamax(&mut child, depth - 1, -alpha - 1, -alpha, ply + 1, true);
                }
                if score > alpha && score < beta {
                    score = -self.negamax(&mut child, depth - 1, -beta, -alpha, ply + 1, true);
                }
                score
            };
            drop(child);

            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
                if root {
                    self.root_best = Some(mv);
                }
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                if quiet {
                    self.orderer.killers.store(ply, mv);
                }
                self.orderer.history.record(mv, depth);
                break;
            }
        }

        let bound = if best_score <= original_alpha {
            Bound::UpperBound
        } else if best_score >= beta {
            Bound::LowerBound
        } else {
            Bound::Exact
        };
        self.tt.put(key, depth, score_to_tt(best_score, ply), bound, best_move);
        best_score
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new(SearchOptions::default())
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
