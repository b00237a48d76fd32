//! Move ordering heuristics.
//!
//! Every candidate gets an additive score: hash move, MVV-LVA for captures,
//! promotions, killer and history bonuses, checks, castling, and a couple of
//! opening nudges. The list is then sorted best first. Scoring works on
//! copies of the board, so the position passed in is never touched.

use std::cmp::Reverse;

use chess_core::{relative_rank, Move, Piece, Position, Square};

use crate::pst::piece_value;

/// Maximum number of plies to track killer moves
pub const MAX_KILLER_PLY: usize = 128;

pub const TT_MOVE_BONUS: i32 = 10_000;
pub const QUEEN_PROMOTION_BONUS: i32 = 900;
pub const MINOR_PROMOTION_BONUS: i32 = 500;
pub const KILLER_BONUS: [i32; 2] = [80, 70];
/// Upper bound on the history contribution, below any capture of a real piece.
pub const HISTORY_CAP: i32 = 60;
pub const CHECK_BONUS: i32 = 50;
pub const CASTLING_BONUS: i32 = 60;
pub const DEVELOPMENT_BONUS: i32 = 30;
pub const CENTER_PAWN_BONUS: i32 = 25;

const CENTER: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

/// Two quiet moves per ply that recently caused a beta cutoff.
#[derive(Debug, Clone)]
pub struct KillerMoves {
    slots: Vec<[Option<Move>; 2]>,
}

impl KillerMoves {
    pub fn new() -> Self {
        Self {
            slots: vec![[None; 2]; MAX_KILLER_PLY],
        }
    }

    /// Record a cutoff move; the newest killer sits in slot 0.
    pub fn store(&mut self, ply: usize, mv: Move) {
        let Some(slot) = self.slots.get_mut(ply) else {
            return;
        };
        if slot[0] == Some(mv) {
            return;
        }
        slot[1] = slot[0];
        slot[0] = Some(mv);
    }

    pub fn get(&self, ply: usize) -> [Option<Move>; 2] {
        self.slots.get(ply).copied().unwrap_or([None; 2])
    }

    pub fn clear(&mut self) {
        self.slots.fill([None; 2]);
    }
}

impl Default for KillerMoves {
    fn default() -> Self {
        Self::new()
    }
}

/// Cutoff counts indexed by from/to square.
#[derive(Debug, Clone)]
pub struct HistoryTable {
    scores: Box<[[i32; 64]; 64]>,
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            scores: Box::new([[0; 64]; 64]),
        }
    }

    /// Credit `mv` with `depth²` for a cutoff.
    pub fn record(&mut self, mv: Move, depth: i32) {
        let entry = &mut self.scores[mv.from as usize][mv.to as usize];
        *entry = entry.saturating_add(depth * depth);
    }

    pub fn get(&self, mv: Move) -> i32 {
        self.scores[mv.from as usize][mv.to as usize]
    }

    /// Ordering bonus, capped at [`HISTORY_CAP`].
    pub fn bonus(&self, mv: Move) -> i32 {
        self.get(mv).min(HISTORY_CAP)
    }

    pub fn clear(&mut self) {
        for row in self.scores.iter_mut() {
            row.fill(0);
        }
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Killer and history state plus the scoring function that uses it.
#[derive(Debug, Clone, Default)]
pub struct MoveOrderer {
    pub killers: KillerMoves,
    pub history: HistoryTable,
}

impl MoveOrderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort `moves` best first for the node at `ply`.
    pub fn order(&self, pos: &Position, moves: &mut [Move], ply: usize, tt_move: Option<Move>) {
        let opening = crate::eval::is_opening(pos);
        moves.sort_by_cached_key(|&mv| Reverse(self.score(pos, mv, ply, tt_move, opening)));
    }

    /// Additive ordering score of a single move.
    pub fn score(&self, pos: &Position, mv: Move, ply: usize, tt_move: Option<Move>, opening: bool) -> i32 {
        let mut score = 0;

        if tt_move == Some(mv) {
            score += TT_MOVE_BONUS;
        }

        let mover = pos.moved_piece(mv);
        if let Some(victim) = pos.captured_piece(mv) {
            let aggressor = mover.map_or(0, piece_value);
            score += 10 * piece_value(victim) - aggressor;
        }

        match mv.promotion {
            Some(Piece::Queen) => score += QUEEN_PROMOTION_BONUS,
            Some(_) => score += MINOR_PROMOTION_BONUS,
            None => {}
        }

        let killers = self.killers.get(ply);
        if let Some(i) = killers.iter().position(|&k| k == Some(mv)) {
            score += KILLER_BONUS[i];
        }

        score += self.history.bonus(mv);

        if pos.gives_check(mv) {
            score += CHECK_BONUS;
        }
        if pos.is_castling(mv) {
            score += CASTLING_BONUS;
        }

        if opening {
            let color = pos.side_to_move();
            match mover {
                Some(Piece::Knight | Piece::Bishop) if relative_rank(color, mv.from) == 0 => {
                    score += DEVELOPMENT_BONUS;
                }
                Some(Piece::Pawn) if CENTER.contains(&mv.to) => score += CENTER_PAWN_BONUS,
                _ => {}
            }
        }

        score
    }

    /// Reset per-search state. History carries over between searches.
    pub fn new_search(&mut self) {
        self.killers.clear();
    }

    pub fn clear(&mut self) {
        self.killers.clear();
        self.history.clear();
    }
}

#[cfg(test)]
#[path = "ordering_tests.rs"]
mod ordering_tests;
