//! Classical Chess Engine
//!
//! Iterative-deepening alpha-beta search over a hand-tuned evaluation, with
//! an optional opening book and an optional external move source in front
//! of it.
//!
//! Moves are chosen in this order:
//! 1. the only legal move, without searching;
//! 2. the alternate source when configured (bad or missing answers are ignored);
//! 3. the opening book;
//! 4. the search;
//! 5. any legal move.

pub mod book;
pub mod config;
pub mod eval;
pub mod ordering;
pub mod pst;
pub mod quiescence;
pub mod search;
pub mod tt;

use chess_core::{
    Engine, Move, MoveBudget, MoveSource, Position, SearchLimits, SearchResult,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

pub use book::{pick_book_move, BookEntry, BookError, MemoryBook, OpeningBook};
pub use config::{ConfigError, EngineConfig, MoveSourceKind};
pub use eval::{evaluate, evaluate_for, MATE_SCORE, MATE_THRESHOLD};
pub use search::{SearchOptions, SearchStats, Searcher};

/// Classical chess engine: search state plus the optional book and
/// alternate move source.
pub struct ClassicalEngine {
    config: EngineConfig,
    searcher: Searcher,
    book: Option<Box<dyn OpeningBook>>,
    alternate: Option<Box<dyn MoveSource>>,
    rng: StdRng,
}

impl ClassicalEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let rng = match config.book_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            searcher: Searcher::with_tt_size(config.search_options(), config.tt_size_mb),
            config,
            book: None,
            alternate: None,
            rng,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the configuration. The hash table is rebuilt only when its
    /// size changes.
    pub fn set_config(&mut self, config: EngineConfig) {
        if config.tt_size_mb != self.config.tt_size_mb {
            self.searcher = Searcher::with_tt_size(config.search_options(), config.tt_size_mb);
        } else {
            self.searcher.set_options(config.search_options());
        }
        if let Some(seed) = config.book_seed.filter(|&s| Some(s) != self.config.book_seed) {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.config = config;
    }

    pub fn set_depth(&mut self, depth: u8) {
        self.config.depth = depth.max(1);
    }

    pub fn set_time_limit(&mut self, seconds: f64) {
        self.config.time_limit_secs = if seconds.is_nan() { 0.01 } else { seconds.max(0.01) };
    }

    pub fn set_book(&mut self, book: Box<dyn OpeningBook>) {
        self.book = Some(book);
    }

    pub fn set_alternate_source(&mut self, source: Box<dyn MoveSource>) {
        self.alternate = Some(source);
    }

    /// Clear everything carried over from earlier games.
    pub fn reset(&mut self) {
        self.searcher.reset();
        if let Some(source) = self.alternate.as_mut() {
            source.new_game();
        }
    }

    /// Static evaluation from the side to move's view.
    pub fn get_evaluation(&self, pos: &Position) -> i32 {
        evaluate(pos)
    }

    /// Counters from the most recent search.
    pub fn last_stats(&self) -> SearchStats {
        self.searcher.stats()
    }

    /// Best move under `config`; `None` only when there is no legal move.
    pub fn get_best_move(&mut self, pos: &Position, config: &EngineConfig) -> Option<Move> {
        self.searcher.set_options(config.search_options());
        let depth = if config.adaptive_depth {
            adaptive_depth(config.depth.max(1), pos.occupied().len() as usize)
        } else {
            config.depth.max(1)
        };
        let mut limits = match config.move_time() {
            Some(t) => SearchLimits::depth_and_time(depth, t),
            None => SearchLimits::depth(depth),
        };
        if let Some(nodes) = config.node_limit {
            limits = limits.with_nodes(nodes);
        }
        let result = self.choose(pos, config, limits, config.sidecar_budget());
        self.searcher.set_options(self.config.search_options());
        result.best_move
    }

    /// Best move under the stored configuration.
    pub fn best_move(&mut self, pos: &Position) -> Option<Move> {
        let config = self.config.clone();
        self.get_best_move(pos, &config)
    }

    fn choose(&mut self, pos: &Position, config: &EngineConfig, limits: SearchLimits, budget: MoveBudget) -> SearchResult {
        let moves = pos.legal_moves();
        match moves.as_slice() {
            [] => return SearchResult::instant(None),
            [only] => {
                debug!(mv = %only, "single legal move");
                return SearchResult::instant(Some(*only));
            }
            _ => {}
        }

        if config.move_source == MoveSourceKind::Sidecar {
            if let Some(mv) = self.ask_alternate(pos, &budget) {
                return SearchResult::instant(Some(mv));
            }
        }

        if config.use_book {
            if let Some(book) = self.book.as_deref() {
                if let Some(mv) = pick_book_move(book, pos, &mut self.rng) {
                    info!(mv = %mv, "book move");
                    return SearchResult::instant(Some(mv));
                }
            }
        }

        let result = self.searcher.search(pos, &limits);
        if result.best_move.is_some() {
            return result;
        }

        warn!("search produced no move, playing a random legal move");
        SearchResult::instant(moves.choose(&mut self.rng).copied())
    }

    fn ask_alternate(&mut self, pos: &Position, budget: &MoveBudget) -> Option<Move> {
        let Some(source) = self.alternate.as_mut() else {
            warn!("sidecar requested but no alternate source is attached");
            return None;
        };
        match source.request_move(pos, budget) {
            Some(mv) if pos.is_legal(mv) => {
                info!(source = source.name(), mv = %mv, "alternate source move");
                Some(mv)
            }
            Some(mv) => {
                warn!(source = source.name(), mv = %mv, fen = %pos.fen(), "alternate source suggested an illegal move");
                None
            }
            None => {
                warn!(source = source.name(), "alternate source gave no move, searching instead");
                None
            }
        }
    }
}

impl Default for ClassicalEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Deepen the search when few pieces remain.
pub fn adaptive_depth(depth: u8, pieces: usize) -> u8 {
    let boosted = match pieces {
        0..=10 => depth.saturating_add(2).min(7),
        11..=20 => depth.saturating_add(1).min(6),
        _ => depth,
    };
    boosted.max(depth)
}

impl Engine for ClassicalEngine {
    fn search(&mut self, pos: &Position, mut limits: SearchLimits) -> SearchResult {
        if limits.nodes.is_none() {
            if let Some(nodes) = self.config.node_limit {
                limits = limits.with_nodes(nodes);
            }
        }
        let budget = MoveBudget::from(&limits);
        let config = self.config.clone();
        self.choose(pos, &config, limits, budget)
    }

    fn name(&self) -> &str {
        "Classical"
    }

    fn new_game(&mut self) {
        self.reset();
    }

    fn set_option(&mut self, name: &str, value: &str) -> bool {
        let value = value.trim();
        match name.to_ascii_lowercase().as_str() {
            "depth" => value.parse().map(|d| self.set_depth(d)).is_ok(),
            "movetime" => value
                .parse::<u64>()
                .map(|ms| self.set_time_limit(ms as f64 / 1000.0))
                .is_ok(),
            "ownbook" => value.parse().map(|on| self.config.use_book = on).is_ok(),
            "quiescencedepth" => value
                .parse()
                .map(|q| {
                    let mut config = self.config.clone();
                    config.quiescence_depth = q;
                    self.set_config(config);
                })
                .is_ok(),
            "hash" => value
                .parse::<usize>()
                .map(|mb| {
                    let mut config = self.config.clone();
                    config.tt_size_mb = mb.max(1);
                    self.set_config(config);
                })
                .is_ok(),
            _ => false,
        }
    }
}
