use std::collections::HashMap;

use crate::board::Board;
use crate::config::SuperkoRule;
use crate::types::StoneColor;

const STONE_SEPARATOR: &str = ";";
const TURN_MARKER: &str = "|";

/// Order-independent fingerprint of the board contents:
/// `"<x,y>:<b|w>"` per stone, sorted by position and joined by `;`.
pub fn hash(board: &Board) -> String {
    let mut entries: Vec<_> = board.stones().map(|s| (s.position, s.color)).collect();
    entries.sort_unstable();
    entries
        .iter()
        .map(|(pos, color)| format!("{pos}:{}", color.initial()))
        .collect::<Vec<_>>()
        .join(STONE_SEPARATOR)
}

/// [`hash`] plus a trailing side marker.
pub fn hash_with_turn(board: &Board, side: StoneColor) -> String {
    format!("{}{TURN_MARKER}{}", hash(board), side.initial())
}

/// Key stored after `mover` produced `board`.
///
/// Situational keys carry the side that just moved, which determines the side
/// to move next.
pub fn history_key(board: &Board, mover: StoneColor, rule: SuperkoRule) -> String {
    match rule {
        SuperkoRule::Positional => hash(board),
        SuperkoRule::Situational | SuperkoRule::None => hash_with_turn(board, mover),
    }
}

/// Ordered log of board keys with constant-time membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardHistory {
    keys: Vec<String>,
    seen: HashMap<String, usize>,
}

impl BoardHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains_key(key)
    }

    /// Appends a key. Returns `false` when the key was already present.
    pub fn record(&mut self, key: String) -> bool {
        let count = self.seen.entry(key.clone()).or_insert(0);
        *count += 1;
        let fresh = *count == 1;
        self.keys.push(key);
        fresh
    }

    /// Drops the most recent key.
    pub fn pop(&mut self) -> Option<String> {
        let key = self.keys.pop()?;
        if let Some(count) = self.seen.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.seen.remove(&key);
            }
        }
        Some(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::{board_with, p};
    use crate::types::{BoardSize, Stone};

    #[test]
    fn hash_ignores_insertion_order() {
        let mut forward = Board::new(BoardSize::Nine);
        let mut backward = Board::new(BoardSize::Nine);
        let stones = [
            Stone::unlinked(p(3, 3), StoneColor::Black),
            Stone::unlinked(p(1, 9), StoneColor::White),
            Stone::unlinked(p(7, 2), StoneColor::Black),
        ];
        for stone in stones {
            forward.place(stone);
        }
        for stone in stones.into_iter().rev() {
            backward.place(stone);
        }

        assert_eq!(hash(&forward), hash(&backward));
        assert_eq!(hash(&forward), "1,9:w;3,3:b;7,2:b");
    }

    #[test]
    fn hash_differs_for_different_colors_or_points() {
        let a = board_with(BoardSize::Nine, &[(3, 3)], &[(4, 4)]);
        let swapped = board_with(BoardSize::Nine, &[(4, 4)], &[(3, 3)]);
        let moved = board_with(BoardSize::Nine, &[(3, 3)], &[(4, 5)]);

        assert_ne!(hash(&a), hash(&swapped));
        assert_ne!(hash(&a), hash(&moved));
    }

    #[test]
    fn turn_marker_separates_sides() {
        let board = board_with(BoardSize::Nine, &[(3, 3)], &[]);

        assert_ne!(
            hash_with_turn(&board, StoneColor::Black),
            hash_with_turn(&board, StoneColor::White)
        );
        assert!(hash_with_turn(&board, StoneColor::White).starts_with(&hash(&board)));
    }

    #[test]
    fn history_pop_restores_membership() {
        let mut history = BoardHistory::new();

        assert!(history.record("x".to_string()));
        assert!(history.record("y".to_string()));
        assert!(!history.record("x".to_string()));
        assert_eq!(history.len(), 3);

        assert_eq!(history.pop().as_deref(), Some("x"));
        assert!(history.contains("x"));
        assert_eq!(history.pop().as_deref(), Some("y"));
        assert!(!history.contains("y"));
        assert_eq!(history.keys(), &["x".to_string()]);
    }
}
