//! Position adapter over `cozy-chess`.
//!
//! `cozy-chess` boards are immutable snapshots; this wrapper keeps a stack of
//! them so search code can make and unmake moves, and a hash history so
//! repetitions can be detected.

use std::fmt;
use std::ops::{Deref, DerefMut};

use cozy_chess::{get_bishop_moves, get_king_moves, get_knight_moves, get_pawn_attacks, get_rook_moves};

use crate::error::{FenError, IllegalMoveError};
use crate::types::*;

#[derive(Clone, Debug)]
struct Snapshot {
    board: Board,
    mv: Option<Move>,
    reversible_start: usize,
}

/// A game position plus the history needed to undo moves and detect
/// repetitions.
#[derive(Clone, Debug)]
pub struct Position {
    board: Board,
    undo: Vec<Snapshot>,
    /// Hash of every position since the root, current one last.
    hashes: Vec<u64>,
    /// First index in `hashes` that can repeat the current position.
    reversible_start: usize,
}

impl Position {
    pub fn startpos() -> Self {
        Self::from_board(Board::default())
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let board = fen.trim().parse::<Board>().map_err(|_| FenError {
            fen: fen.to_string(),
        })?;
        Ok(Self::from_board(board))
    }

    pub fn from_board(board: Board) -> Self {
        let hash = board.hash();
        Self {
            board,
            undo: Vec::new(),
            hashes: vec![hash],
            reversible_start: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    // =========================================================================
    // Make / unmake
    // =========================================================================

    /// Play `mv`, keeping the previous state for [`Position::pop`].
    ///
    /// # Returns
    /// `IllegalMoveError` without touching the position when `mv` is not legal.
    pub fn push(&mut self, mv: Move) -> Result<(), IllegalMoveError> {
        if !self.board.is_legal(mv) {
            return Err(IllegalMoveError {
                mv,
                fen: self.fen(),
            });
        }
        let mut next = self.board.clone();
        next.play(mv);
        let irreversible = next.halfmove_clock() == 0;
        self.advance(next, Some(mv), irreversible);
        Ok(())
    }

    /// Pass the turn. Returns false (and does nothing) while in check.
    pub fn push_null(&mut self) -> bool {
        match self.board.null_move() {
            Some(next) => {
                self.advance(next, None, true);
                true
            }
            None => false,
        }
    }

    /// Undo the last `push` or `push_null`.
    ///
    /// Returns the move that was undone; `None` when the history is empty or
    /// the undone ply was a null move.
    pub fn pop(&mut self) -> Option<Move> {
        self.undo_last().flatten()
    }

    /// Number of plies that can currently be popped.
    pub fn ply_count(&self) -> usize {
        self.undo.len()
    }

    /// Play `mv` for the lifetime of the returned guard.
    pub fn scoped(&mut self, mv: Move) -> Result<MoveGuard<'_>, IllegalMoveError> {
        self.push(mv)?;
        Ok(MoveGuard { pos: self })
    }

    /// Pass the turn for the lifetime of the returned guard.
    pub fn scoped_null(&mut self) -> Option<MoveGuard<'_>> {
        if self.push_null() {
            Some(MoveGuard { pos: self })
        } else {
            None
        }
    }

    fn advance(&mut self, next: Board, mv: Option<Move>, irreversible: bool) {
        let prev = std::mem::replace(&mut self.board, next);
        self.undo.push(Snapshot {
            board: prev,
            mv,
            reversible_start: self.reversible_start,
        });
        self.hashes.push(self.board.hash());
        if irreversible {
            self.reversible_start = self.hashes.len() - 1;
        }
    }

    fn undo_last(&mut self) -> Option<Option<Move>> {
        let snap = self.undo.pop()?;
        self.board = snap.board;
        self.reversible_start = snap.reversible_start;
        self.hashes.pop();
        Some(snap.mv)
    }

    // =========================================================================
    // Move generation and game state
    // =========================================================================

    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        self.board.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    pub fn has_legal_moves(&self) -> bool {
        self.board.generate_moves(|mvs| mvs.into_iter().next().is_some())
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.board.is_legal(mv)
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn hash(&self) -> u64 {
        self.board.hash()
    }

    pub fn halfmove_clock(&self) -> u32 {
        u32::from(self.board.halfmove_clock())
    }

    pub fn fullmove_number(&self) -> u32 {
        u32::from(self.board.fullmove_number())
    }

    pub fn checkers(&self) -> BitBoard {
        self.board.checkers()
    }

    pub fn in_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn is_checkmate(&self) -> bool {
        self.in_check() && !self.has_legal_moves()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.in_check() && !self.has_legal_moves()
    }

    /// Neither side can ever deliver mate: bare kings, a single minor piece,
    /// or only bishops that all stand on one square colour.
    pub fn is_insufficient_material(&self) -> bool {
        let b = &self.board;
        let heavy = b.pieces(Piece::Pawn) | b.pieces(Piece::Rook) | b.pieces(Piece::Queen);
        if !heavy.is_empty() {
            return false;
        }
        let knights = b.pieces(Piece::Knight).len();
        let bishops = b.pieces(Piece::Bishop);
        match knights {
            0 => {
                const DARK_SQUARES: u64 = 0xAA55_AA55_AA55_AA55;
                let on_dark = (bishops & BitBoard(DARK_SQUARES)).len();
                on_dark == 0 || on_dark == bishops.len()
            }
            1 => bishops.is_empty(),
            _ => false,
        }
    }

    /// The current position has occurred at least `count` times since the
    /// last irreversible move, the current occurrence included.
    pub fn is_repetition(&self, count: usize) -> bool {
        let current = self.board.hash();
        let window = &self.hashes[self.reversible_start..];
        let seen = window
            .iter()
            .rev()
            .step_by(2)
            .filter(|&&h| h == current)
            .count();
        seen >= count
    }

    pub fn is_fifty_moves(&self) -> bool {
        self.board.halfmove_clock() >= 100
    }

    pub fn is_game_over(&self) -> bool {
        !self.has_legal_moves()
            || self.is_insufficient_material()
            || self.is_fifty_moves()
            || self.is_repetition(3)
    }

    // =========================================================================
    // Piece queries
    // =========================================================================

    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        Some((self.board.color_on(sq)?, self.board.piece_on(sq)?))
    }

    pub fn pieces(&self, color: Color, piece: Piece) -> BitBoard {
        self.board.colors(color) & self.board.pieces(piece)
    }

    pub fn color_pieces(&self, color: Color) -> BitBoard {
        self.board.colors(color)
    }

    pub fn occupied(&self) -> BitBoard {
        self.board.occupied()
    }

    pub fn king(&self, color: Color) -> Square {
        self.board.king(color)
    }

    /// Pieces of `color` that attack `sq` with the current occupancy.
    pub fn attackers(&self, color: Color, sq: Square) -> BitBoard {
        let b = &self.board;
        let occ = b.occupied();
        let diagonal = b.pieces(Piece::Bishop) | b.pieces(Piece::Queen);
        let orthogonal = b.pieces(Piece::Rook) | b.pieces(Piece::Queen);
        let all = (get_knight_moves(sq) & b.pieces(Piece::Knight))
            | (get_king_moves(sq) & b.pieces(Piece::King))
            | (get_pawn_attacks(sq, opponent(color)) & b.pieces(Piece::Pawn))
            | (get_bishop_moves(sq, occ) & diagonal)
            | (get_rook_moves(sq, occ) & orthogonal);
        all & b.colors(color)
    }

    pub fn has_kingside_castling(&self, color: Color) -> bool {
        self.board.castle_rights(color).short.is_some()
    }

    pub fn has_queenside_castling(&self, color: Color) -> bool {
        self.board.castle_rights(color).long.is_some()
    }

    pub fn en_passant(&self) -> Option<File> {
        self.board.en_passant()
    }

    // =========================================================================
    // Move classification
    // =========================================================================

    pub fn moved_piece(&self, mv: Move) -> Option<Piece> {
        self.board.piece_on(mv.from)
    }

    pub fn is_castling(&self, mv: Move) -> bool {
        self.moved_piece(mv) == Some(Piece::King)
            && self.board.color_on(mv.to) == Some(self.side_to_move())
    }

    pub fn is_en_passant(&self, mv: Move) -> bool {
        self.moved_piece(mv) == Some(Piece::Pawn)
            && mv.from.file() != mv.to.file()
            && self.board.piece_on(mv.to).is_none()
    }

    pub fn is_capture(&self, mv: Move) -> bool {
        self.board.colors(opponent(self.side_to_move())).has(mv.to) || self.is_en_passant(mv)
    }

    pub fn is_promotion(&self, mv: Move) -> bool {
        mv.promotion.is_some()
    }

    /// Piece removed by `mv`; en passant reports a pawn.
    pub fn captured_piece(&self, mv: Move) -> Option<Piece> {
        if self.is_en_passant(mv) {
            return Some(Piece::Pawn);
        }
        if self.board.colors(opponent(self.side_to_move())).has(mv.to) {
            self.board.piece_on(mv.to)
        } else {
            None
        }
    }

    /// Whether `mv` leaves the opponent in check. Works on a copy.
    pub fn gives_check(&self, mv: Move) -> bool {
        if !self.board.is_legal(mv) {
            return false;
        }
        let mut next = self.board.clone();
        next.play(mv);
        !next.checkers().is_empty()
    }

    /// Moves of the side not on move, as if it were their turn. `None` while
    /// the side to move is in check.
    pub fn opponent_moves(&self) -> Option<Vec<Move>> {
        let passed = self.board.null_move()?;
        let mut moves = Vec::with_capacity(64);
        passed.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        Some(moves)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)
    }
}

/// Squares attacked by a `piece` of `color` standing on `sq`.
pub fn attacks_from(piece: Piece, color: Color, sq: Square, occupied: BitBoard) -> BitBoard {
    match piece {
        Piece::Pawn => get_pawn_attacks(sq, color),
        Piece::Knight => get_knight_moves(sq),
        Piece::Bishop => get_bishop_moves(sq, occupied),
        Piece::Rook => get_rook_moves(sq, occupied),
        Piece::Queen => get_bishop_moves(sq, occupied) | get_rook_moves(sq, occupied),
        Piece::King => get_king_moves(sq),
    }
}

/// Keeps a move on the board until dropped, then takes it back.
///
/// Dereferences to the position after the move.
pub struct MoveGuard<'a> {
    pos: &'a mut Position,
}

impl Deref for MoveGuard<'_> {
    type Target = Position;

    fn deref(&self) -> &Position {
        self.pos
    }
}

impl DerefMut for MoveGuard<'_> {
    fn deref_mut(&mut self) -> &mut Position {
        self.pos
    }
}

impl Drop for MoveGuard<'_> {
    fn drop(&mut self) {
        self.pos.undo_last();
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;
