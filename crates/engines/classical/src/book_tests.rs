use std::io::Write;

use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn uci(pos: &Position, text: &str) -> Move {
    parse_uci_move(pos, text).unwrap()
}

#[test]
fn test_lookup_by_position() {
    let book = MemoryBook::from_lines([(START, vec![("e2e4", 3), ("d2d4", 1)])]).unwrap();
    let start = Position::startpos();

    let entries = book.entries(&start);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], BookEntry { mv: uci(&start, "e2e4"), weight: 3 });

    let mut after = start.clone();
    after.push(uci(&start, "e2e4")).unwrap();
    assert!(book.entries(&after).is_empty());
}

#[test]
fn test_duplicate_moves_accumulate_weight() {
    let book = MemoryBook::from_lines([(START, vec![("e2e4", 3)]), (START, vec![("e2e4", 2)])]).unwrap();
    assert_eq!(book.len(), 1);
    assert_eq!(book.entries(&Position::startpos())[0].weight, 5);
}

#[test]
fn test_illegal_moves_are_skipped() {
    let book = MemoryBook::from_lines([(START, vec![("e2e5", 10), ("g1f3", 1)])]).unwrap();
    let entries = book.entries(&Position::startpos());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].mv, uci(&Position::startpos(), "g1f3"));
}

#[test]
fn test_bad_fen_is_an_error() {
    let err = MemoryBook::from_lines([("not a fen", vec![("e2e4", 1)])]).unwrap_err();
    assert!(matches!(err, BookError::Fen(_)));
}

#[test]
fn test_pick_respects_weights_and_seed() {
    let book = MemoryBook::from_lines([(START, vec![("e2e4", 1), ("d2d4", 0)])]).unwrap();
    let start = Position::startpos();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        assert_eq!(pick_book_move(&book, &start, &mut rng), Some(uci(&start, "e2e4")));
    }

    let book = MemoryBook::from_lines([(START, vec![("e2e4", 1), ("d2d4", 1), ("c2c4", 1)])]).unwrap();
    let picks = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..10)
            .map(|_| pick_book_move(&book, &start, &mut rng).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(picks(42), picks(42), "same seed, same choices");
}

#[test]
fn test_pick_skips_entries_illegal_in_position() {
    // A book whose only entry no longer fits the position it is asked about.
    struct Stale(Move);
    impl OpeningBook for Stale {
        fn entries(&self, _pos: &Position) -> Vec<BookEntry> {
            vec![BookEntry { mv: self.0, weight: 5 }]
        }
    }
    let start = Position::startpos();
    let mut after = start.clone();
    after.push(uci(&start, "e2e4")).unwrap();

    let book = Stale(uci(&start, "e2e4"));
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(pick_book_move(&book, &after, &mut rng), None);
    assert!(pick_book_move(&book, &start, &mut rng).is_some());
}

#[test]
fn test_empty_book_has_no_move() {
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(pick_book_move(&MemoryBook::new(), &Position::startpos(), &mut rng), None);
}

#[test]
fn test_load_toml_book() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[[position]]
fen = "{START}"
moves = [{{ mv = "e2e4", weight = 10 }}, {{ mv = "d2d4" }}]

[[position]]
fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
moves = [{{ mv = "c7c5", weight = 4 }}]
"#
    )
    .unwrap();

    let book = MemoryBook::load(file.path()).unwrap();
    assert_eq!(book.len(), 2);

    let start = Position::startpos();
    let entries = book.entries(&start);
    assert_eq!(entries[1], BookEntry { mv: uci(&start, "d2d4"), weight: 1 });

    let mut after = start.clone();
    after.push(uci(&start, "e2e4")).unwrap();
    assert_eq!(book.entries(&after)[0].mv, uci(&after, "c7c5"));
}

#[test]
fn test_load_reports_errors() {
    assert!(matches!(MemoryBook::load("/definitely/not/here.toml"), Err(BookError::Io(_))));
    assert!(matches!(MemoryBook::from_toml_str("[[position]]\nfen = 3"), Err(BookError::Parse(_))));
}
