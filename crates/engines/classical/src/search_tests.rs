use std::time::{Duration, Instant};

use super::*;
use crate::eval::static_eval;

fn pos(fen: &str) -> Position {
    Position::from_fen(fen).unwrap()
}

fn plain_options() -> SearchOptions {
    SearchOptions {
        null_move: false,
        lmr: false,
        ..SearchOptions::default()
    }
}

/// Full-width minimax with the same leaf and draw rules as the real search.
fn reference_negamax(searcher: &mut Searcher, pos: &mut Position, depth: i32, ply: usize) -> i32 {
    if ply > 0 && (pos.is_fifty_moves() || pos.is_insufficient_material() || pos.is_repetition(2)) {
        return DRAW_SCORE;
    }
    if depth <= 0 {
        return searcher.quiescence(pos, -INFINITY, INFINITY, 0, ply);
    }
    let moves = pos.legal_moves();
    if moves.is_empty() {
        return if pos.in_check() { mated_in(ply) } else { DRAW_SCORE };
    }
    let mut best = -INFINITY;
    for mv in moves {
        let mut child = pos.scoped(mv).unwrap();
        best = best.max(-reference_negamax(searcher, &mut child, depth - 1, ply + 1));
    }
    best
}

#[test]
fn test_pruning_does_not_change_the_score() {
    let fens = [
        "8/5pk1/6p1/8/3K4/8/5PP1/8 w - - 0 40",
        "4k3/8/8/3q4/4P3/8/1r6/3NK3 w - - 0 1",
        "4r1k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1",
        "6k1/pp3ppp/8/3r4/8/2N5/PP3PPP/6K1 b - - 0 25",
    ];
    for fen in fens {
        let p = pos(fen);
        let mut searcher = Searcher::new(plain_options());
        let result = searcher.search(&p, &SearchLimits::depth(3));

        let mut reference = Searcher::new(plain_options());
        let expected = reference_negamax(&mut reference, &mut p.clone(), 3, 0);

        assert_eq!(result.depth, 3, "{fen}");
        assert_eq!(result.score, expected, "alpha-beta disagrees with minimax for {fen}");
    }
}

#[test]
fn test_failed_aspiration_window_is_searched_again() {
    let fens = [
        "4k3/8/8/3q4/4P3/8/1r6/3NK3 w - - 0 1",
        "4r1k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1",
        "6k1/pp3ppp/8/3r4/8/2N5/PP3PPP/6K1 b - - 0 25",
    ];
    let mut researches = 0;
    for fen in fens {
        let p = pos(fen);
        let mut searcher = Searcher::new(SearchOptions {
            aspiration_window: 1,
            ..plain_options()
        });
        let result = searcher.search(&p, &SearchLimits::depth(3));
        researches += searcher.stats().aspiration_researches;

        let mut reference = Searcher::new(plain_options());
        let expected = reference_negamax(&mut reference, &mut p.clone(), 3, 0);
        assert_eq!(result.score, expected, "{fen}");
    }
    assert!(researches > 0, "a one-centipawn window should miss at least once");
}

#[test]
fn test_full_window_search_never_researches() {
    let p = pos("4r1k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1");
    let mut searcher = Searcher::new(SearchOptions {
        aspiration_window: 0,
        ..plain_options()
    });
    searcher.search(&p, &SearchLimits::depth(4));
    assert_eq!(searcher.stats().aspiration_researches, 0);
}

#[test]
fn test_null_move_skipped_in_endgame() {
    let kpk = pos("8/8/4k3/8/8/4K3/4P3/8 w - - 0 1");
    assert!(crate::eval::is_endgame(&kpk));
    let mut searcher = Searcher::default();
    let result = searcher.search(&kpk, &SearchLimits::depth(6));
    assert_eq!(result.depth, 6);
    assert_eq!(searcher.stats().null_move_tries, 0);

    let middlegame = pos("r2q1rk1/pp2bppp/2n1pn2/3p4/3P4/2NBPN2/PP3PPP/R2Q1RK1 w - - 0 10");
    searcher.search(&middlegame, &SearchLimits::depth(4));
    assert!(searcher.stats().null_move_tries > 0);
}

#[test]
fn test_null_move_skipped_while_in_check() {
    let checked = pos("rnb1kbnr/pppp1ppp/8/4p3/7q/5P2/PPPPP1PP/RNBQKBNR w KQkq - 1 3");
    assert!(checked.in_check());
    let mut searcher = Searcher::default();
    searcher.negamax(&mut checked.clone(), 3, -100, 100, 1, true);
    assert_eq!(searcher.null_move_tries, 0);

    let quiet = pos("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
    let mut searcher = Searcher::default();
    searcher.negamax(&mut quiet.clone(), 3, -100, 100, 1, true);
    assert!(searcher.null_move_tries > 0);
}

#[test]
fn test_stop_before_search_starts() {
    let p = Position::startpos();
    let limits = SearchLimits::depth(30);
    limits.time_control.stop();

    let started = Instant::now();
    let mut searcher = Searcher::default();
    let result = searcher.search(&p, &limits);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(result.stopped);
    assert_eq!(result.depth, 0);
    assert!(p.is_legal(result.best_move.unwrap()));
}

#[test]
fn test_finds_mate_in_one() {
    let p = pos("6k1/5ppp/8/8/8/8/5PPP/4Q1K1 w - - 0 1");
    for depth in 1..=3 {
        let mut searcher = Searcher::default();
        let result = searcher.search(&p, &SearchLimits::depth(depth));
        let mv = result.best_move.expect("a move");

        let mut after = p.clone();
        after.push(mv).unwrap();
        assert!(after.is_checkmate(), "depth {depth} played {mv}");
        assert_eq!(result.score, MATE_SCORE - 1);
    }
}

#[test]
fn test_depth_one_from_startpos() {
    let p = Position::startpos();
    let mut searcher = Searcher::default();
    let result = searcher.search(&p, &SearchLimits::depth(1));
    assert_eq!(result.depth, 1);
    assert!(p.legal_moves().contains(&result.best_move.unwrap()));
    assert!(result.nodes > 20);
}

#[test]
fn test_search_is_deterministic() {
    let p = pos("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3");
    let first = Searcher::default().search(&p, &SearchLimits::depth(3));
    let second = Searcher::default().search(&p, &SearchLimits::depth(3));
    assert_eq!(first.best_move, second.best_move);
    assert_eq!(first.score, second.score);

    let mut reused = Searcher::default();
    reused.search(&Position::startpos(), &SearchLimits::depth(3));
    reused.reset();
    let third = reused.search(&p, &SearchLimits::depth(3));
    assert_eq!(first.best_move, third.best_move);
    assert_eq!(first.score, third.score);
}

#[test]
fn test_wins_hanging_queen_with_all_heuristics() {
    let p = pos("4k3/8/8/3q4/4P3/8/1r6/3NK3 w - - 0 1");
    let result = Searcher::default().search(&p, &SearchLimits::depth(4));
    let expected = chess_core::parse_uci_move(&p, "e4d5").unwrap();
    assert_eq!(result.best_move, Some(expected));
    assert!(result.score > static_eval(&p) + 500);
}

#[test]
fn test_time_budget_still_returns_a_move() {
    let p = pos("r2q1rk1/pp2bppp/2n1pn2/3p4/3P4/2NBPN2/PP3PPP/R2Q1RK1 w - - 0 10");
    let started = Instant::now();
    let mut searcher = Searcher::default();
    let result = searcher.search(&p, &SearchLimits::time(Duration::from_millis(100)));

    assert!(started.elapsed() < Duration::from_secs(5));
    let mv = result.best_move.expect("anytime search always has a move");
    assert!(p.is_legal(mv));
    assert!(result.depth < u8::MAX);
}

#[test]
fn test_node_limit_aborts_iteration() {
    let p = Position::startpos();
    let mut searcher = Searcher::default();
    let result = searcher.search(&p, &SearchLimits::depth(30).with_nodes(5_000));
    assert!(result.stopped);
    assert!(result.depth < 30);
    assert!(p.is_legal(result.best_move.unwrap()));
    assert_eq!(searcher.stats().completed_depth, result.depth);
}

#[test]
fn test_external_stop_is_honoured() {
    let p = Position::startpos();
    let limits = SearchLimits::depth(30);
    let handle = limits.time_control.clone();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        handle.stop();
    });
    let result = Searcher::default().search(&p, &limits);
    stopper.join().unwrap();
    assert!(result.stopped);
    assert!(result.best_move.is_some());
}

#[test]
fn test_no_moves_no_best_move() {
    let mated = pos("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
    let result = Searcher::default().search(&mated, &SearchLimits::depth(3));
    assert_eq!(result.best_move, None);
    assert_eq!(result.score, mated_in(0));

    let stalemate = pos("k7/8/1Q6/8/8/8/8/1K6 b - - 0 1");
    let result = Searcher::default().search(&stalemate, &SearchLimits::depth(3));
    assert_eq!(result.best_move, None);
    assert_eq!(result.score, DRAW_SCORE);
}

#[test]
fn test_search_fills_transposition_table() {
    let mut searcher = Searcher::default();
    searcher.search(&Position::startpos(), &SearchLimits::depth(3));
    assert!(!searcher.tt.is_empty());
    let root = searcher.tt.get(Position::startpos().hash()).expect("root entry");
    assert_eq!(root.depth, 3);
    assert!(root.best_move.is_some());

    searcher.reset();
    assert!(searcher.tt.is_empty());
}

#[test]
fn test_search_restores_the_position() {
    let p = pos("r3k2r/ppp2ppp/2n5/3pp3/1b1PP1b1/2N2N2/PPP2PPP/R1B1KB1R w KQkq - 0 8");
    let fen = p.fen();
    Searcher::default().search(&p, &SearchLimits::depth(3));
    assert_eq!(p.fen(), fen);
}

// ============================================================================
// Quiescence
// ============================================================================

#[test]
fn test_quiescence_stands_pat_in_quiet_position() {
    let mut p = Position::startpos();
    let mut searcher = Searcher::default();
    assert_eq!(
        searcher.quiescence(&mut p, -INFINITY, INFINITY, 0, 0),
        static_eval(&Position::startpos())
    );
}

#[test]
fn test_quiescence_resolves_captures() {
    let mut p = pos("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1");
    let stand_pat = static_eval(&p);
    let mut searcher = Searcher::default();
    let score = searcher.quiescence(&mut p, -INFINITY, INFINITY, 0, 0);
    assert!(score > stand_pat + 500, "capturing the queen must be seen");
}

#[test]
fn test_quiescence_respects_its_depth_cap() {
    let fens = [
        "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
        "r2q1rk1/pp2bppp/2n1pn2/3p4/3P4/2NBPN2/PP3PPP/R2Q1RK1 w - - 0 10",
    ];
    for max in 0..=3 {
        for fen in fens {
            let mut searcher = Searcher::new(SearchOptions {
                quiescence_depth: max,
                ..SearchOptions::default()
            });
            searcher.quiescence(&mut pos(fen), -INFINITY, INFINITY, 0, 0);
            assert!(searcher.seldepth <= max, "{fen} reached ply {}", searcher.seldepth);
        }
    }
}

#[test]
fn test_quiescence_scores_mate() {
    let mut mated = pos("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
    let mut searcher = Searcher::default();
    assert_eq!(searcher.quiescence(&mut mated, -INFINITY, INFINITY, 0, 5), mated_in(5));
}
