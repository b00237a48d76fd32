//! Coordinate move notation as used by the UCI protocol.
//!
//! Internally castling is king-takes-own-rook; on the wire it is the king's
//! two-square step (`e1g1`).

use crate::board::Position;
use crate::error::UciError;
use crate::types::*;

pub fn move_to_uci(pos: &Position, mv: Move) -> String {
    let mut to = mv.to;
    if pos.is_castling(mv) {
        let file = if file_of(mv.to) > file_of(mv.from) {
            File::G
        } else {
            File::C
        };
        to = Square::new(file, mv.from.rank());
    }
    let mut s = String::with_capacity(5);
    s.push_str(&sq_to_coord(mv.from));
    s.push_str(&sq_to_coord(to));
    if let Some(p) = mv.promotion {
        s.push(promotion_char(p));
    }
    s
}

/// Find the legal move written as `txt`.
///
/// Accepts standard castling (`e1g1`) as well as the king-takes-rook form
/// (`e1h1`).
pub fn parse_uci_move(pos: &Position, txt: &str) -> Result<Move, UciError> {
    let txt = txt.trim();
    if !(4..=5).contains(&txt.len()) || !txt.is_ascii() {
        return Err(UciError::MalformedMove(txt.to_string()));
    }
    if coord_to_sq(&txt[0..2]).is_none() || coord_to_sq(&txt[2..4]).is_none() {
        return Err(UciError::MalformedMove(txt.to_string()));
    }
    let wanted = txt.to_ascii_lowercase();

    pos.legal_moves()
        .into_iter()
        .find(|&m| move_to_uci(pos, m) == wanted || m.to_string() == wanted)
        .ok_or_else(|| UciError::IllegalMove(txt.to_string()))
}

/// Apply the arguments of a UCI `position` command.
///
/// Supports `startpos [moves ...]` and `fen <six fields> [moves ...]`. On
/// error `pos` is left untouched.
pub fn set_position_from_uci(pos: &mut Position, args: &[&str]) -> Result<(), UciError> {
    let moves_at = args.iter().position(|&a| a == "moves");
    let (setup, moves) = match moves_at {
        Some(i) => (&args[..i], &args[i + 1..]),
        None => (args, &args[args.len()..]),
    };

    let mut next = match setup.first() {
        None | Some(&"startpos") => Position::startpos(),
        Some(&"fen") => Position::from_fen(&setup[1..].join(" "))?,
        Some(other) => return Err(UciError::UnknownPositionKind(other.to_string())),
    };

    for txt in moves {
        let mv = parse_uci_move(&next, txt)?;
        next.push(mv)
            .map_err(|_| UciError::IllegalMove(txt.to_string()))?;
    }

    *pos = next;
    Ok(())
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
