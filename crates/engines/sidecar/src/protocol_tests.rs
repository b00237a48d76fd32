use super::*;

#[test]
fn test_position_command_uses_fen() {
    assert_eq!(
        position_command(&Position::startpos()),
        "position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );
}

#[test]
fn test_go_command() {
    assert_eq!(go_command(&MoveBudget::Depth(8)), "go depth 8");
    assert_eq!(go_command(&MoveBudget::Depth(0)), "go depth 1");
    assert_eq!(go_command(&MoveBudget::MoveTime(Duration::from_millis(750))), "go movetime 750");
    assert_eq!(go_command(&MoveBudget::MoveTime(Duration::ZERO)), "go movetime 1");
}

#[test]
fn test_skill_is_clamped() {
    assert_eq!(skill_command(5), "setoption name Skill Level value 5");
    assert_eq!(skill_command(99), "setoption name Skill Level value 20");
}

#[test]
fn test_parse_bestmove() {
    assert_eq!(
        parse_bestmove("bestmove e2e4 ponder e7e5"),
        Some(BestMove {
            mv: Some("e2e4".into()),
            ponder: Some("e7e5".into()),
        })
    );
    assert_eq!(
        parse_bestmove("bestmove a7a8q"),
        Some(BestMove {
            mv: Some("a7a8q".into()),
            ponder: None,
        })
    );
}

#[test]
fn test_parse_bestmove_without_move() {
    assert_eq!(parse_bestmove("bestmove (none)").unwrap().mv, None);
    assert_eq!(parse_bestmove("bestmove 0000").unwrap().mv, None);
    assert_eq!(parse_bestmove("bestmove").unwrap().mv, None);
}

#[test]
fn test_other_lines_are_not_bestmove() {
    assert_eq!(parse_bestmove("info depth 12 score cp 31"), None);
    assert_eq!(parse_bestmove("readyok"), None);
    assert_eq!(parse_bestmove(""), None);
    assert_eq!(parse_bestmove("bestmoves e2e4"), None);
}
