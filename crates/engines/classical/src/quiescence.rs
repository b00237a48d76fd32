//! Quiescence search.
//!
//! Past the main horizon only captures, promotions and, for the first
//! couple of plies, checking moves are played until the position is quiet.
//! The stand-pat score assumes the side to move can always decline to
//! capture, which does not hold in zugzwang.

use chess_core::{Move, Position};

use crate::eval::{mated_in, static_eval, DRAW_SCORE};
use crate::search::Searcher;

/// Quiescence plies in which quiet checking moves are still tried.
pub const QUIESCENCE_CHECK_PLIES: usize = 2;

impl Searcher {
    /// Fail-hard quiescence search from `ply` plies below the root.
    ///
    /// `qdepth` counts plies spent in quiescence so far; at the configured
    /// maximum the static evaluation is returned.
    pub fn quiescence(&mut self, pos: &mut Position, mut alpha: i32, beta: i32, qdepth: usize, ply: usize) -> i32 {
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);
        if self.poll_stop() {
            return 0;
        }

        let moves = pos.legal_moves();
        if moves.is_empty() {
            return if pos.in_check() { mated_in(ply) } else { DRAW_SCORE };
        }

        let stand_pat = static_eval(pos);
        if qdepth >= self.options.quiescence_depth {
            return stand_pat;
        }
        if stand_pat >= beta {
            return beta;
        }
        alpha = alpha.max(stand_pat);

        let mut tactical = tactical_moves(pos, moves, qdepth < QUIESCENCE_CHECK_PLIES);
        self.orderer.order(pos, &mut tactical, ply, None);

        for mv in tactical {
            let Ok(mut child) = pos.scoped(mv) else {
                continue;
            };
            let score = -self.quiescence(&mut child, -beta, -alpha, qdepth + 1, ply + 1);
            drop(child);

            if self.stopped {
                return 0;
            }
            if score >= beta {
                return beta;
            }
            alpha = alpha.max(score);
        }
        alpha
    }
}

/// Captures and promotions, plus checking moves when `checks` is set.
pub fn tactical_moves(pos: &Position, moves: Vec<Move>, checks: bool) -> Vec<Move> {
    moves
        .into_iter()
        .filter(|&mv| pos.is_capture(mv) || pos.is_promotion(mv) || (checks && pos.gives_check(mv)))
        .collect()
}
