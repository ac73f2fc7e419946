use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Board;
use crate::config::SuperkoRule;
use crate::rules::history::{BoardHistory, hash, hash_with_turn};
use crate::types::{Position, Stone, StoneColor};

/// Why a placement was refused. Returned as a value; validation never mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rejection {
    #[error("the point is already occupied")]
    Occupied,
    #[error("the placed stone would have no liberties")]
    Suicide,
    #[error("the move retakes a ko immediately")]
    SimpleKo,
    #[error("the move repeats an earlier board position")]
    PositionalSuperko,
    #[error("the move repeats an earlier position with the same side to move")]
    SituationalSuperko,
    #[error("the game is not being played")]
    OutOfPhase,
    #[error("it is not this side's turn")]
    WrongTurn,
    #[error("the point is outside the board")]
    OffBoard,
}

/// Repetition check applied after the simple-ko test.
#[derive(Debug, Clone, Copy)]
pub struct SuperkoCheck<'a> {
    pub rule: SuperkoRule,
    pub history: &'a BoardHistory,
}

/// A legal placement and the stones it would remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub captured: BTreeSet<Position>,
}

/// Checks a placement of `color` at `pos`, short-circuiting on the first failure:
/// occupancy, suicide, simple ko against `last_move`, then superko if requested.
pub fn validate(
    board: &Board,
    pos: Position,
    color: StoneColor,
    last_move: Option<Position>,
    superko: Option<SuperkoCheck<'_>>,
) -> Result<Accepted, Rejection> {
    if !pos.is_on(board.size()) {
        return Err(Rejection::OffBoard);
    }
    if board.is_occupied(pos) {
        return Err(Rejection::Occupied);
    }

    let mut result = board.clone();
    result.place(Stone::unlinked(pos, color));
    let captured = result.resolve_captures(color);

    if captured.contains(&pos) {
        return Err(Rejection::Suicide);
    }
    if captured.len() == 1 && last_move.is_some_and(|last| captured.contains(&last)) {
        return Err(Rejection::SimpleKo);
    }

    if let Some(check) = superko {
        for &gone in &captured {
            result.remove(gone);
        }
        match check.rule {
            SuperkoRule::None => {}
            SuperkoRule::Positional => {
                if check.history.contains(&hash(&result)) {
                    return Err(Rejection::PositionalSuperko);
                }
            }
            SuperkoRule::Situational => {
                if check.history.contains(&hash_with_turn(&result, color)) {
                    return Err(Rejection::SituationalSuperko);
                }
            }
        }
    }

    Ok(Accepted { captured })
}

/// Boolean form of [`validate`].
pub fn is_legal(
    board: &Board,
    pos: Position,
    color: StoneColor,
    last_move: Option<Position>,
    superko: Option<SuperkoCheck<'_>>,
) -> bool {
    validate(board, pos, color, last_move, superko).is_ok()
}
