//! End-to-end move selection through the `ClassicalEngine` facade.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chess_core::{parse_uci_move, Color, Engine, Move, MoveBudget, MoveSource, NullMoveSource, Position, SearchLimits};
use classical_engine::{ClassicalEngine, EngineConfig, MemoryBook, MoveSourceKind};

fn pos(fen: &str) -> Position {
    Position::from_fen(fen).unwrap()
}

fn uci(p: &Position, text: &str) -> Move {
    parse_uci_move(p, text).unwrap()
}

fn quick_config() -> EngineConfig {
    EngineConfig {
        depth: 3,
        time_limit_secs: 5.0,
        book_seed: Some(1),
        ..EngineConfig::default()
    }
}

/// Always answers with the same move, legal or not.
struct Scripted {
    mv: Move,
    new_games: Arc<AtomicUsize>,
}

impl MoveSource for Scripted {
    fn request_move(&mut self, _pos: &Position, _budget: &MoveBudget) -> Option<Move> {
        Some(self.mv)
    }

    fn new_game(&mut self) {
        self.new_games.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[test]
fn test_single_legal_move_is_returned() {
    let p = pos("k7/8/8/8/8/8/1q6/K7 w - - 0 1");
    assert_eq!(p.legal_moves().len(), 1);

    let mut engine = ClassicalEngine::with_config(quick_config());
    assert_eq!(engine.best_move(&p), Some(uci(&p, "a1b2")));

    let result = engine.search(&p, SearchLimits::depth(6));
    assert_eq!(result.best_move, Some(uci(&p, "a1b2")));
    assert_eq!(result.depth, 0, "no search needed");
}

#[test]
fn test_no_legal_moves_gives_none() {
    let mated = pos("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
    let mut engine = ClassicalEngine::with_config(quick_config());
    assert_eq!(engine.best_move(&mated), None);
}

#[test]
fn test_finds_mate_in_one_through_facade() {
    let p = pos("6k1/5ppp/8/8/8/8/5PPP/4Q1K1 w - - 0 1");
    let mut engine = ClassicalEngine::with_config(quick_config());
    let mv = engine.best_move(&p).unwrap();
    let mut after = p.clone();
    after.push(mv).unwrap();
    assert!(after.is_checkmate());
}

#[test]
fn test_queen_and_king_convert_against_lone_king() {
    let mut game = pos("8/8/8/4k3/8/8/8/3QK3 w - - 0 1");
    let mut engine = ClassicalEngine::with_config(EngineConfig {
        depth: 4,
        time_limit_secs: 3.0,
        ..EngineConfig::default()
    });

    for _ in 0..120 {
        if game.is_game_over() {
            break;
        }
        let mv = engine.best_move(&game).expect("game is not over");
        game.push(mv).unwrap();
    }

    assert!(game.is_checkmate(), "expected mate, game ended at {}", game.fen());
    assert_eq!(game.side_to_move(), Color::Black);
}

#[test]
fn test_sidecar_without_answer_falls_back_to_search() {
    let p = pos("6k1/5ppp/8/8/8/8/5PPP/4Q1K1 w - - 0 1");
    let config = EngineConfig {
        move_source: MoveSourceKind::Sidecar,
        ..quick_config()
    };
    let mut engine = ClassicalEngine::with_config(config);
    engine.set_alternate_source(Box::new(NullMoveSource));

    let mv = engine.best_move(&p).unwrap();
    let mut after = p.clone();
    after.push(mv).unwrap();
    assert!(after.is_checkmate());
}

#[test]
fn test_sidecar_illegal_answer_is_ignored() {
    let p = pos("6k1/5ppp/8/8/8/8/5PPP/4Q1K1 w - - 0 1");
    let start = Position::startpos();
    let counter = Arc::new(AtomicUsize::new(0));
    let config = EngineConfig {
        move_source: MoveSourceKind::Sidecar,
        ..quick_config()
    };
    let mut engine = ClassicalEngine::with_config(config);
    engine.set_alternate_source(Box::new(Scripted {
        mv: uci(&start, "b1c3"),
        new_games: counter.clone(),
    }));

    let mv = engine.best_move(&p).unwrap();
    assert!(p.is_legal(mv));
    assert_ne!(mv, uci(&start, "b1c3"));

    engine.reset();
    assert_eq!(counter.load(Ordering::SeqCst), 1, "reset notifies the alternate source");
}

#[test]
fn test_sidecar_legal_answer_is_played() {
    let start = Position::startpos();
    let config = EngineConfig {
        move_source: MoveSourceKind::Sidecar,
        ..quick_config()
    };
    let mut engine = ClassicalEngine::with_config(config);
    engine.set_alternate_source(Box::new(Scripted {
        mv: uci(&start, "a2a3"),
        new_games: Arc::new(AtomicUsize::new(0)),
    }));
    assert_eq!(engine.best_move(&start), Some(uci(&start, "a2a3")));

    // With the internal source configured the sidecar is never asked.
    let internal = quick_config();
    let chosen = engine.get_best_move(&start, &internal).unwrap();
    assert!(start.is_legal(chosen));
}

#[test]
fn test_book_move_preferred_over_search() {
    let start = Position::startpos();
    let book = MemoryBook::from_lines([(start.fen().as_str(), vec![("b1a3", 1)])]).unwrap();
    let mut engine = ClassicalEngine::with_config(quick_config());
    engine.set_book(Box::new(book));
    assert_eq!(engine.best_move(&start), Some(uci(&start, "b1a3")));

    let no_book = EngineConfig {
        use_book: false,
        ..quick_config()
    };
    let searched = engine.get_best_move(&start, &no_book).unwrap();
    assert_ne!(searched, uci(&start, "b1a3"), "a rim knight is not the search's choice");
}

#[test]
fn test_setters_clamp() {
    let mut engine = ClassicalEngine::new();
    engine.set_depth(0);
    assert_eq!(engine.config().depth, 1);
    engine.set_time_limit(-3.0);
    assert!((engine.config().time_limit_secs - 0.01).abs() < 1e-9);
    engine.set_time_limit(2.5);
    assert!((engine.config().time_limit_secs - 2.5).abs() < 1e-9);
}

#[test]
fn test_uci_options() {
    let mut engine = ClassicalEngine::new();
    assert!(engine.set_option("Depth", "6"));
    assert_eq!(engine.config().depth, 6);
    assert!(engine.set_option("MoveTime", "250"));
    assert!((engine.config().time_limit_secs - 0.25).abs() < 1e-9);
    assert!(engine.set_option("OwnBook", "false"));
    assert!(!engine.config().use_book);
    assert!(engine.set_option("QuiescenceDepth", "2"));
    assert_eq!(engine.config().quiescence_depth, 2);
    assert!(engine.set_option("Hash", "1"));
    assert_eq!(engine.config().tt_size_mb, 1);

    assert!(!engine.set_option("Depth", "deep"));
    assert!(!engine.set_option("Ponder", "true"));
}

#[test]
fn test_get_evaluation_is_side_relative() {
    let engine = ClassicalEngine::new();
    let white_up = pos("4k3/8/8/8/8/8/8/3QK3 w - - 0 1");
    let black_to_move = pos("4k3/8/8/8/8/8/8/3QK3 b - - 0 1");
    assert!(engine.get_evaluation(&white_up) > 500);
    assert!(engine.get_evaluation(&black_to_move) < -500);
}

#[test]
fn test_engine_trait_search_with_time() {
    let mut engine = ClassicalEngine::with_config(EngineConfig {
        use_book: false,
        ..quick_config()
    });
    let start = Position::startpos();
    let result = engine.search(&start, SearchLimits::time(std::time::Duration::from_millis(200)));
    assert!(start.is_legal(result.best_move.unwrap()));
    assert!(result.depth >= 1);
    engine.new_game();
}

#[test]
fn test_adaptive_depth() {
    use classical_engine::adaptive_depth;
    assert_eq!(adaptive_depth(4, 32), 4);
    assert_eq!(adaptive_depth(4, 18), 5);
    assert_eq!(adaptive_depth(4, 6), 6);
    assert_eq!(adaptive_depth(6, 6), 7);
    assert_eq!(adaptive_depth(9, 6), 9, "never shallower than asked");
    assert_eq!(adaptive_depth(255, 5), 255);
    assert_eq!(adaptive_depth(254, 15), 254);
}

#[test]
fn test_huge_time_limit_searches_by_depth() {
    let mut engine = ClassicalEngine::with_config(EngineConfig {
        depth: 2,
        use_book: false,
        ..quick_config()
    });
    engine.set_time_limit(1e30);
    let start = Position::startpos();
    assert!(start.is_legal(engine.best_move(&start).unwrap()));
    assert_eq!(engine.last_stats().completed_depth, 2);
}

#[test]
fn test_oversized_aspiration_window() {
    let mut engine = ClassicalEngine::with_config(EngineConfig {
        depth: 4,
        adaptive_depth: false,
        aspiration_window: i32::MAX,
        use_book: false,
        ..quick_config()
    });
    let p = pos("r2q1rk1/pp2bppp/2n1pn2/3p4/3P4/2NBPN2/PP3PPP/R2Q1RK1 w - - 0 10");
    assert!(p.is_legal(engine.best_move(&p).unwrap()));
    assert_eq!(engine.last_stats().completed_depth, 4);
}
