//! Hand-tuned positional evaluation.
//!
//! Every term is computed from White's point of view and the total is then
//! signed for the side asked about. The evaluation reads the position only;
//! the same position always gets the same score.

use std::ops::RangeInclusive;

use chess_core::{
    adjacent_files_mask, attacks_from, file_mask, file_of, forward_ranks_mask, opponent, rank_of,
    relative_rank, square_at, BitBoard, Color, Piece, Position, Square,
};

use crate::pst::{piece_value, square_bonus};

/// Score of the side to move when it is checkmated at the root.
pub const MATE_SCORE: i32 = 30_000;
/// Scores at or beyond this magnitude encode a forced mate.
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;
pub const DRAW_SCORE: i32 = 0;

pub const BISHOP_PAIR_BONUS: i32 = 50;

/// Non-king material at or below which a side counts as reduced to an endgame.
pub const ENDGAME_MATERIAL_THRESHOLD: i32 = 1300;
/// Full-move number before which the opening terms apply.
pub const OPENING_MOVE_LIMIT: u32 = 10;
/// Minimum number of pieces on the board for the opening terms.
pub const OPENING_MIN_PIECES: u32 = 28;
/// Material lead that switches on the mop-up term.
pub const MOP_UP_MARGIN: i32 = 400;
/// Relative ranks (0-based) where a minor piece can be an outpost.
const OUTPOST_RANKS: RangeInclusive<usize> = 4..=6;

const CENTER: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];
const EXTENDED_CENTER: [Square; 12] = [
    Square::C3,
    Square::D3,
    Square::E3,
    Square::F3,
    Square::C4,
    Square::F4,
    Square::C5,
    Square::F5,
    Square::C6,
    Square::D6,
    Square::E6,
    Square::F6,
];

/// Score for being checkmated `ply` plies from the root.
#[inline]
pub fn mated_in(ply: usize) -> i32 {
    -MATE_SCORE + ply as i32
}

#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_THRESHOLD
}

/// Game phase flags used by the evaluation and the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub opening: bool,
    pub endgame: bool,
}

impl Phase {
    pub fn of(pos: &Position) -> Self {
        Self {
            opening: is_opening(pos),
            endgame: is_endgame(pos),
        }
    }
}

/// The individual evaluation terms, all from White's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalTerms {
    pub material: i32,
    pub placement: i32,
    pub pawns: i32,
    pub king_safety: i32,
    pub mobility: i32,
    pub center: i32,
    pub coordination: i32,
}

impl EvalTerms {
    pub fn total(&self) -> i32 {
        self.material
            + self.placement
            + self.pawns
            + self.king_safety
            + self.mobility
            + self.center
            + self.coordination
    }
}

/// Score for a finished game, from the side to move's view.
///
/// Checkmate scores `mated_in(ply)`; stalemate, dead positions, the
/// fifty-move rule and threefold repetition score a draw.
pub fn terminal_score(pos: &Position, ply: usize) -> Option<i32> {
    if !pos.has_legal_moves() {
        return Some(if pos.in_check() { mated_in(ply) } else { DRAW_SCORE });
    }
    if pos.is_insufficient_material() || pos.is_fifty_moves() || pos.is_repetition(3) {
        return Some(DRAW_SCORE);
    }
    None
}

/// Evaluates the position from the side-to-move's perspective.
///
/// Returns a score in centipawns:
/// - Positive = good for side to move
/// - Negative = bad for side to move
/// - 0 = equal position or a drawn game
pub fn evaluate(pos: &Position) -> i32 {
    evaluate_for(pos, pos.side_to_move())
}

/// Evaluates the position from `color`'s perspective.
pub fn evaluate_for(pos: &Position, color: Color) -> i32 {
    let stm_score = terminal_score(pos, 0).unwrap_or_else(|| static_eval(pos));
    if color == pos.side_to_move() {
        stm_score
    } else {
        -stm_score
    }
}

/// Non-terminal evaluation from the side to move's perspective.
///
/// Callers are expected to have ruled out mate and stalemate already.
pub fn static_eval(pos: &Position) -> i32 {
    let white = eval_terms(pos).total();
    match pos.side_to_move() {
        Color::White => white,
        Color::Black => -white,
    }
}

/// Breaks the static evaluation down by term.
pub fn eval_terms(pos: &Position) -> EvalTerms {
    let phase = Phase::of(pos);
    EvalTerms {
        material: material(pos),
        placement: placement(pos, phase.endgame),
        pawns: side_diff(|c| pawn_structure(pos, c)),
        king_safety: king_safety(pos, phase.endgame),
        mobility: mobility(pos),
        center: center_control(pos),
        coordination: side_diff(|c| coordination(pos, c, phase.opening)),
    }
}

fn side_diff(mut f: impl FnMut(Color) -> i32) -> i32 {
    f(Color::White) - f(Color::Black)
}

fn count(bb: BitBoard) -> i32 {
    bb.len() as i32
}

// =============================================================================
// Phase detection
// =============================================================================

/// Material excluding the king.
pub fn non_king_material(pos: &Position, color: Color) -> i32 {
    [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
        .into_iter()
        .map(|p| piece_value(p) * count(pos.pieces(color, p)))
        .sum()
}

fn minor_count(pos: &Position, color: Color) -> i32 {
    count(pos.pieces(color, Piece::Knight) | pos.pieces(color, Piece::Bishop))
}

/// Queens gone with at most one minor each, both sides thin on material, or
/// a lone queen facing at most a single minor piece.
pub fn is_endgame(pos: &Position) -> bool {
    let wq = count(pos.pieces(Color::White, Piece::Queen));
    let bq = count(pos.pieces(Color::Black, Piece::Queen));
    let wm = minor_count(pos, Color::White);
    let bm = minor_count(pos, Color::Black);
    let w_mat = non_king_material(pos, Color::White);
    let b_mat = non_king_material(pos, Color::Black);
    let queen = piece_value(Piece::Queen);

    (wq == 0 && bq == 0 && wm <= 1 && bm <= 1)
        || (w_mat <= ENDGAME_MATERIAL_THRESHOLD && b_mat <= ENDGAME_MATERIAL_THRESHOLD)
        || (wq == 1 && w_mat == queen && bm <= 1 && bq == 0)
        || (bq == 1 && b_mat == queen && wm <= 1 && wq == 0)
}

pub fn is_opening(pos: &Position) -> bool {
    pos.fullmove_number() < OPENING_MOVE_LIMIT && count(pos.occupied()) as u32 >= OPENING_MIN_PIECES
}

// =============================================================================
// Material and placement
// =============================================================================

fn material(pos: &Position) -> i32 {
    side_diff(|c| {
        let bishops = count(pos.pieces(c, Piece::Bishop));
        let pair = if bishops >= 2 { BISHOP_PAIR_BONUS } else { 0 };
        non_king_material(pos, c) + pair
    })
}

fn placement(pos: &Position, endgame: bool) -> i32 {
    let mut score = 0;
    for sq in pos.occupied() {
        if let Some((color, piece)) = pos.piece_at(sq) {
            let bonus = square_bonus(piece, color, sq, endgame);
            score += if color == Color::White { bonus } else { -bonus };
        }
    }
    score
}

// =============================================================================
// Pawn structure
// =============================================================================

/// One step towards `color`'s own back rank.
fn backward(color: Color) -> i32 {
    match color {
        Color::White => -1,
        Color::Black => 1,
    }
}

/// Friendly pawns diagonally behind `sq`.
fn pawn_supporters(pos: &Position, color: Color, sq: Square) -> i32 {
    let (f, r) = (file_of(sq) as i32, rank_of(sq) as i32 + backward(color));
    let pawns = pos.pieces(color, Piece::Pawn);
    [-1, 1]
        .into_iter()
        .filter_map(|df| square_at(f + df, r))
        .filter(|&s| pawns.has(s))
        .count() as i32
}

fn pawn_structure(pos: &Position, color: Color) -> i32 {
    let own = pos.pieces(color, Piece::Pawn);
    let enemy = pos.pieces(opponent(color), Piece::Pawn);
    let mut score = 0;

    for file in 0..8 {
        let on_file = count(own & file_mask(file));
        if on_file > 1 {
            score -= 15 * (on_file - 1);
        }
    }

    for sq in own {
        let file = file_of(sq);
        let rank = rank_of(sq);
        let rel = relative_rank(color, sq) as i32;
        let ahead = forward_ranks_mask(color, rank);
        let neighbours = adjacent_files_mask(file);
        let supporters = pawn_supporters(pos, color, sq);

        if (enemy & (neighbours | file_mask(file)) & ahead).is_empty() {
            score += 20 + 2 * rel * rel + 10 * supporters;
        }

        if (own & neighbours).is_empty() {
            score -= 20;
        }

        if !(own & neighbours & ahead).is_empty() && !can_advance_safely(pos, color, sq) {
            score -= 10;
        }

        score += 5 * supporters;
    }
    score
}

fn can_advance_safely(pos: &Position, color: Color, sq: Square) -> bool {
    let forward = -backward(color);
    let (f, r) = (file_of(sq) as i32, rank_of(sq) as i32);
    let Some(stop) = square_at(f, r + forward) else {
        return false;
    };
    if pos.piece_at(stop).is_some() {
        return false;
    }
    let enemy = pos.pieces(opponent(color), Piece::Pawn);
    ![-1, 1]
        .into_iter()
        .filter_map(|df| square_at(f + df, r + 2 * forward))
        .any(|s| enemy.has(s))
}

// =============================================================================
// King safety
// =============================================================================

fn attacker_weight(piece: Piece) -> i32 {
    match piece {
        Piece::Queen => 4,
        Piece::Rook => 3,
        Piece::Bishop | Piece::Knight => 2,
        Piece::Pawn | Piece::King => 1,
    }
}

/// Squares within `radius` of `sq`, optionally including `sq` itself.
fn king_zone(sq: Square, radius: i32, include_center: bool) -> impl Iterator<Item = Square> {
    let (f, r) = (file_of(sq) as i32, rank_of(sq) as i32);
    (-radius..=radius)
        .flat_map(move |df| (-radius..=radius).map(move |dr| (df, dr)))
        .filter(move |&(df, dr)| include_center || df != 0 || dr != 0)
        .filter_map(move |(df, dr)| square_at(f + df, r + dr))
}

/// Twice the Manhattan distance from `sq` to the board centre.
fn center_distance2(sq: Square) -> i32 {
    (7 - 2 * file_of(sq) as i32).abs() + (7 - 2 * rank_of(sq) as i32).abs()
}

fn king_distance(a: Square, b: Square) -> i32 {
    (file_of(a) as i32 - file_of(b) as i32).abs() + (rank_of(a) as i32 - rank_of(b) as i32).abs()
}

fn king_safety(pos: &Position, endgame: bool) -> i32 {
    if endgame {
        endgame_king_activity(pos)
    } else {
        side_diff(|c| middlegame_king_safety(pos, c))
    }
}

fn middlegame_king_safety(pos: &Position, color: Color) -> i32 {
    let mut score = 0;
    if pos.has_kingside_castling(color) {
        score += 40;
    }
    if pos.has_queenside_castling(color) {
        score += 30;
    }

    let king = pos.king(color);
    let kf = file_of(king) as i32;
    if relative_rank(color, king) == 0 {
        match kf {
            6 | 7 => score += 60,
            0..=2 => score += 50,
            _ => {}
        }
    }

    // Pawn shield on the two ranks in front of the king.
    let own_pawns = pos.pieces(color, Piece::Pawn);
    let forward = -backward(color);
    let kr = rank_of(king) as i32;
    for df in -1..=1 {
        for step in 1..=2 {
            if let Some(sq) = square_at(kf + df, kr + forward * step) {
                if own_pawns.has(sq) {
                    let distance = df.abs() + step;
                    score += (15 - 5 * distance).max(5);
                }
            }
        }
    }

    // Enemy pressure on the radius-2 zone.
    let enemy = opponent(color);
    let mut attackers = 0;
    let mut weight = 0;
    for sq in king_zone(king, 2, false) {
        for from in pos.attackers(enemy, sq) {
            attackers += 1;
            if let Some((_, piece)) = pos.piece_at(from) {
                weight += attacker_weight(piece);
            }
        }
    }
    if attackers > 0 {
        let mut penalty = 5 * attackers + 5 * weight;
        if attackers >= 2 {
            penalty *= 2;
        }
        if attackers >= 3 {
            penalty = penalty * 3 / 2;
        }
        score -= penalty;
    }
    score
}

fn endgame_king_activity(pos: &Position) -> i32 {
    let wk = pos.king(Color::White);
    let bk = pos.king(Color::Black);
    let mut score = 5 * (center_distance2(bk) - center_distance2(wk));

    let df = (file_of(wk) as i32 - file_of(bk) as i32).abs();
    let dr = (rank_of(wk) as i32 - rank_of(bk) as i32).abs();
    if (df == 0 && dr == 2) || (dr == 0 && df == 2) {
        // The side that does not have to move holds the opposition.
        score += match pos.side_to_move() {
            Color::White => -20,
            Color::Black => 20,
        };
    }

    // Mop-up: the stronger side walks its king towards the defending one.
    let lead = non_king_material(pos, Color::White) - non_king_material(pos, Color::Black);
    if lead.abs() >= MOP_UP_MARGIN {
        let proximity = 4 * (14 - king_distance(wk, bk));
        score += if lead > 0 { proximity } else { -proximity };
    }
    score
}

// =============================================================================
// Mobility and centre control
// =============================================================================

/// (all moves, quiet moves) counted from attack sets, for positions in check.
fn pseudo_mobility(pos: &Position, color: Color) -> (i32, i32) {
    let occ = pos.occupied();
    let own = pos.color_pieces(color);
    let enemy = pos.color_pieces(opponent(color));
    let mut total = 0;
    let mut quiet = 0;
    for sq in own {
        let Some((_, piece)) = pos.piece_at(sq) else {
            continue;
        };
        let targets = if piece == Piece::Pawn {
            let push = square_at(file_of(sq) as i32, rank_of(sq) as i32 - backward(color))
                .filter(|&s| !occ.has(s));
            let captures = count(attacks_from(piece, color, sq, occ) & enemy);
            let pushes = push.is_some() as i32;
            quiet += pushes;
            captures + pushes
        } else {
            let reach = attacks_from(piece, color, sq, occ) & !own;
            quiet += count(reach & !enemy);
            count(reach)
        };
        total += targets;
    }
    (total, quiet)
}

fn mobility(pos: &Position) -> i32 {
    let stm = pos.side_to_move();
    let (stm_counts, other_counts) = match pos.opponent_moves() {
        Some(theirs) => {
            let ours = pos.legal_moves();
            let our_quiet = ours.iter().filter(|&&m| !pos.is_capture(m)).count() as i32;
            let stm_pieces = pos.color_pieces(stm);
            let their_quiet = theirs.iter().filter(|m| !stm_pieces.has(m.to)).count() as i32;
            ((ours.len() as i32, our_quiet), (theirs.len() as i32, their_quiet))
        }
        None => (pseudo_mobility(pos, stm), pseudo_mobility(pos, opponent(stm))),
    };
    let ((wt, wq), (bt, bq)) = match stm {
        Color::White => (stm_counts, other_counts),
        Color::Black => (other_counts, stm_counts),
    };

    let mut score = 2 * (wt - bt) + (wq - bq);
    if pos.in_check() {
        score += match stm {
            Color::White => -50,
            Color::Black => 50,
        };
    }
    score
}

fn center_control(pos: &Position) -> i32 {
    let control = |sq: Square| count(pos.attackers(Color::White, sq)) - count(pos.attackers(Color::Black, sq));
    let core: i32 = CENTER.iter().map(|&sq| 10 * control(sq)).sum();
    let ring: i32 = EXTENDED_CENTER.iter().map(|&sq| 5 * control(sq)).sum();
    core + ring
}

// =============================================================================
// Piece coordination
// =============================================================================

fn coordination(pos: &Position, color: Color, opening: bool) -> i32 {
    let enemy = opponent(color);
    let own_pawns = pos.pieces(color, Piece::Pawn);
    let enemy_pawns = pos.pieces(enemy, Piece::Pawn);
    let occ = pos.occupied();
    let mut score = 0;

    if opening {
        score += 15 * development(pos, color);
    }

    // Pressure on the enemy king and its neighbours.
    for sq in king_zone(pos.king(enemy), 1, true) {
        score += 3 * count(pos.attackers(color, sq));
    }

    // Protected pieces.
    for sq in pos.color_pieces(color) {
        score += 2 * count(pos.attackers(color, sq));
    }

    let rooks = pos.pieces(color, Piece::Rook);
    for sq in rooks {
        let file = file_mask(file_of(sq));
        if (own_pawns & file).is_empty() {
            score += if (enemy_pawns & file).is_empty() { 25 } else { 15 };
        }
        // Count each connected pair once, from its lower square.
        let partners = attacks_from(Piece::Rook, color, sq, occ) & rooks;
        score += 20 * partners.into_iter().filter(|&other| other as usize > sq as usize).count() as i32;
    }

    score + outposts(pos, color)
}

/// Minor pieces on their fifth to seventh rank that no enemy pawn can chase away.
fn outposts(pos: &Position, color: Color) -> i32 {
    let enemy_pawns = pos.pieces(opponent(color), Piece::Pawn);
    let minors = pos.pieces(color, Piece::Knight) | pos.pieces(color, Piece::Bishop);
    let mut score = 0;
    for sq in minors {
        if !OUTPOST_RANKS.contains(&relative_rank(color, sq)) {
            continue;
        }
        let guarded_by_pawn =
            !(enemy_pawns & adjacent_files_mask(file_of(sq)) & forward_ranks_mask(color, rank_of(sq))).is_empty();
        if !guarded_by_pawn {
            score += 15;
            if pawn_supporters(pos, color, sq) > 0 {
                score += 10;
            }
        }
    }
    score
}

/// Minor pieces that have left their starting squares.
fn development(pos: &Position, color: Color) -> i32 {
    let (knight_homes, bishop_homes) = match color {
        Color::White => ([Square::B1, Square::G1], [Square::C1, Square::F1]),
        Color::Black => ([Square::B8, Square::G8], [Square::C8, Square::F8]),
    };
    let knights = pos.pieces(color, Piece::Knight);
    let bishops = pos.pieces(color, Piece::Bishop);
    let moved_knights = knight_homes.iter().filter(|&&sq| !knights.has(sq)).count();
    let moved_bishops = bishop_homes.iter().filter(|&&sq| !bishops.has(sq)).count();
    (moved_knights + moved_bishops) as i32
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod eval_tests;
