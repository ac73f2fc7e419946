use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::board::{Board, neighbors};
use crate::types::{Position, StoneColor};

/// Area score of a single board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub winner: StoneColor,
    pub black_score: f64,
    pub white_score: f64,
}

/// Per-color point tally before komi.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AreaCount {
    pub black: usize,
    pub white: usize,
}

impl AreaCount {
    fn add(&mut self, color: StoneColor, amount: usize) {
        match color {
            StoneColor::Black => self.black += amount,
            StoneColor::White => self.white += amount,
        }
    }
}

/// Stones + owned territory + dead-stone credit, per color.
///
/// Zero-liberty groups are removed first and credited to the opponent; empty
/// regions bordered by a single color belong to it, mixed regions are dame.
pub fn area(board: &Board) -> AreaCount {
    let mut cleaned = board.clone();
    let mut total = AreaCount::default();

    for color in [StoneColor::Black, StoneColor::White] {
        for group in board.groups_of(color) {
            if board.liberties(&group).is_empty() {
                total.add(color.opponent(), group.len());
                for pos in group.stones {
                    cleaned.remove(pos);
                }
            }
        }
    }

    total.add(StoneColor::Black, cleaned.count(StoneColor::Black));
    total.add(StoneColor::White, cleaned.count(StoneColor::White));

    let mut visited = BTreeSet::new();
    for pos in cleaned.size().positions() {
        if cleaned.is_occupied(pos) || visited.contains(&pos) {
            continue;
        }
        let (region, owner) = empty_region(&cleaned, pos, &mut visited);
        if let Some(owner) = owner {
            total.add(owner, region);
        }
    }

    total
}

/// Chinese-style area score with komi added to White once.
///
/// Black wins when its score exceeds half the board plus komi.
pub fn score(board: &Board, komi: f64) -> ScoreResult {
    let count = area(board);
    let black_score = count.black as f64;
    let white_score = count.white as f64 + komi;
    let threshold = board.size().points() as f64 / 2.0 + komi;

    ScoreResult {
        winner: if black_score > threshold {
            StoneColor::Black
        } else {
            StoneColor::White
        },
        black_score,
        white_score,
    }
}

/// Flood-fills the empty region containing `start`. Returns its size and its
/// owner, `None` when the border is mixed or absent.
fn empty_region(
    board: &Board,
    start: Position,
    visited: &mut BTreeSet<Position>,
) -> (usize, Option<StoneColor>) {
    let mut queue = VecDeque::from([start]);
    let mut size = 0usize;
    let mut border: Option<StoneColor> = None;
    let mut neutral = false;

    while let Some(pos) = queue.pop_front() {
        if !visited.insert(pos) {
            continue;
        }
        size += 1;

        for &next in neighbors(pos, board.size()) {
            match board.color_at(next) {
                Some(color) => match border {
                    None => border = Some(color),
                    Some(seen) if seen != color => neutral = true,
                    Some(_) => {}
                },
                None if !visited.contains(&next) => queue.push_back(next),
                None => {}
            }
        }
    }

    (size, if neutral { None } else { border })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::board_with;
    use crate::config::DEFAULT_KOMI;
    use crate::types::BoardSize;

    #[test]
    fn lone_black_stone_owns_the_whole_board() {
        let board = board_with(BoardSize::Nine, &[(5, 5)], &[]);

        let result = score(&board, DEFAULT_KOMI);

        assert_eq!(result.black_score, 81.0);
        assert_eq!(result.white_score, DEFAULT_KOMI);
        assert_eq!(result.winner, StoneColor::Black);
    }

    #[test]
    fn empty_board_is_all_dame() {
        let board = Board::new(BoardSize::Nine);

        let result = score(&board, 6.5);

        assert_eq!(result.black_score, 0.0);
        assert_eq!(result.white_score, 6.5);
        assert_eq!(result.winner, StoneColor::White);
    }

    #[test]
    fn wall_splits_territory_and_mixed_column_is_dame() {
        // Black wall on column 4, white wall on column 6, column 5 between them
        // touches both colors.
        let black: Vec<(u8, u8)> = (1..=9).map(|y| (4, y)).collect();
        let white: Vec<(u8, u8)> = (1..=9).map(|y| (6, y)).collect();
        let board = board_with(BoardSize::Nine, &black, &white);

        let count = area(&board);

        assert_eq!(count.black, 9 + 27);
        assert_eq!(count.white, 9 + 27);
    }

    #[test]
    fn zero_liberty_groups_are_credited_to_the_opponent() {
        // A white stone with no liberties left on the board (only possible in
        // a hand-built position) counts for black once removed.
        let board = board_with(BoardSize::Nine, &[(2, 1), (1, 2)], &[(1, 1)]);

        let count = area(&board);

        // 2 black stones + 1 credited capture + 78 empty points + the freed corner.
        assert_eq!(count.black, 2 + 1 + 79);
        assert_eq!(count.white, 0);
    }
}
