//! Basic chess vocabulary shared by every crate in the workspace.
//!
//! The primitive types come from `cozy-chess`; this module adds the small
//! square and colour helpers the evaluators lean on.

pub use cozy_chess::{BitBoard, Board, Color, File, Move, Piece, Rank, Square};

/// The side that is not `color`.
#[inline]
pub fn opponent(color: Color) -> Color {
    match color {
        Color::White => Color::Black,
        Color::Black => Color::White,
    }
}

/// Array index for per-colour tables (White = 0, Black = 1).
#[inline]
pub fn color_idx(color: Color) -> usize {
    match color {
        Color::White => 0,
        Color::Black => 1,
    }
}

/// Array index for per-piece tables (Pawn = 0 .. King = 5).
#[inline]
pub fn piece_idx(piece: Piece) -> usize {
    piece as usize
}

#[inline]
pub fn file_of(sq: Square) -> usize {
    sq.file() as usize
}

#[inline]
pub fn rank_of(sq: Square) -> usize {
    sq.rank() as usize
}

/// Rank counted from `color`'s own back rank (0 = home rank, 7 = promotion rank).
#[inline]
pub fn relative_rank(color: Color, sq: Square) -> usize {
    match color {
        Color::White => rank_of(sq),
        Color::Black => 7 - rank_of(sq),
    }
}

/// Square from signed file/rank coordinates, `None` when off the board.
pub fn square_at(file: i32, rank: i32) -> Option<Square> {
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some(Square::new(File::index(file as usize), Rank::index(rank as usize)))
    } else {
        None
    }
}

/// Vertical mirror (a1 <-> a8).
#[inline]
pub fn flip_rank(sq: Square) -> Square {
    Square::index(sq as usize ^ 56)
}

/// Squares on a single file.
pub fn file_mask(file: usize) -> BitBoard {
    BitBoard(0x0101_0101_0101_0101u64 << file)
}

/// Files either side of `file`, excluding `file` itself.
pub fn adjacent_files_mask(file: usize) -> BitBoard {
    let mut mask = 0u64;
    if file > 0 {
        mask |= file_mask(file - 1).0;
    }
    if file < 7 {
        mask |= file_mask(file + 1).0;
    }
    BitBoard(mask)
}

/// Squares strictly in front of `rank` from `color`'s point of view.
pub fn forward_ranks_mask(color: Color, rank: usize) -> BitBoard {
    match color {
        Color::White if rank >= 7 => BitBoard(0),
        Color::White => BitBoard(!0u64 << (8 * (rank + 1))),
        Color::Black if rank == 0 => BitBoard(0),
        Color::Black => BitBoard(!0u64 >> (8 * (8 - rank))),
    }
}

/// Algebraic name of a square, e.g. `e4`.
pub fn sq_to_coord(sq: Square) -> String {
    sq.to_string()
}

/// Parse an algebraic square name.
pub fn coord_to_sq(c: &str) -> Option<Square> {
    c.parse().ok()
}

/// Lowercase promotion suffix used in coordinate notation.
pub fn promotion_char(piece: Piece) -> char {
    match piece {
        Piece::Queen => 'q',
        Piece::Rook => 'r',
        Piece::Bishop => 'b',
        Piece::Knight => 'n',
        Piece::Pawn => 'p',
        Piece::King => 'k',
    }
}
