use std::collections::{BTreeMap, BTreeSet, VecDeque};

use once_cell::sync::Lazy;

use crate::types::{BoardSize, Position, Stone, StoneColor};

/// Precomputed 4-neighbourhoods for one board extent.
struct Adjacency {
    size: BoardSize,
    neighbors: Vec<Vec<Position>>,
}

impl Adjacency {
    fn build(size: BoardSize) -> Self {
        let n = size.get();
        let neighbors = size
            .positions()
            .map(|Position { x, y }| {
                let mut around = Vec::with_capacity(4);
                if x > 1 {
                    around.push(Position::new(x - 1, y));
                }
                if x < n {
                    around.push(Position::new(x + 1, y));
                }
                if y > 1 {
                    around.push(Position::new(x, y - 1));
                }
                if y < n {
                    around.push(Position::new(x, y + 1));
                }
                around
            })
            .collect();
        Self { size, neighbors }
    }

    fn get(&self, pos: Position) -> &[Position] {
        if !pos.is_on(self.size) {
            return &[];
        }
        let n = self.size.get() as usize;
        &self.neighbors[(pos.x as usize - 1) * n + (pos.y as usize - 1)]
    }
}

static ADJACENCY_9: Lazy<Adjacency> = Lazy::new(|| Adjacency::build(BoardSize::Nine));
static ADJACENCY_13: Lazy<Adjacency> = Lazy::new(|| Adjacency::build(BoardSize::Thirteen));
static ADJACENCY_19: Lazy<Adjacency> = Lazy::new(|| Adjacency::build(BoardSize::Nineteen));

/// Orthogonal neighbours of `pos` clipped to `[1, N]`. Empty for off-board positions.
pub fn neighbors(pos: Position, size: BoardSize) -> &'static [Position] {
    let table: &'static Adjacency = match size {
        BoardSize::Nine => &ADJACENCY_9,
        BoardSize::Thirteen => &ADJACENCY_13,
        BoardSize::Nineteen => &ADJACENCY_19,
    };
    table.get(pos)
}

/// A maximal 4-connected set of same-colored stones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub color: StoneColor,
    pub stones: BTreeSet<Position>,
}

impl Group {
    pub fn contains(&self, pos: Position) -> bool {
        self.stones.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.stones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }
}

/// One reality's board: position → stone, fixed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: BoardSize,
    stones: BTreeMap<Position, Stone>,
}

impl Board {
    pub fn new(size: BoardSize) -> Self {
        Self {
            size,
            stones: BTreeMap::new(),
        }
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn get(&self, pos: Position) -> Option<&Stone> {
        self.stones.get(&pos)
    }

    pub fn color_at(&self, pos: Position) -> Option<StoneColor> {
        self.stones.get(&pos).map(|stone| stone.color)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.stones.contains_key(&pos)
    }

    /// Places a stone. Returns `false` and leaves the board unchanged when the
    /// point is occupied or off the board.
    pub fn place(&mut self, stone: Stone) -> bool {
        if !stone.position.is_on(self.size) || self.is_occupied(stone.position) {
            return false;
        }
        self.stones.insert(stone.position, stone);
        true
    }

    pub fn remove(&mut self, pos: Position) -> Option<Stone> {
        self.stones.remove(&pos)
    }

    /// Re-points the mate of the stone at `pos`. Returns `false` if no stone is there.
    pub fn set_mate(&mut self, pos: Position, mate: Position) -> bool {
        match self.stones.get_mut(&pos) {
            Some(stone) => {
                stone.mate = mate;
                true
            }
            None => false,
        }
    }

    pub fn stones(&self) -> impl Iterator<Item = &Stone> {
        self.stones.values()
    }

    pub fn len(&self) -> usize {
        self.stones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }

    pub fn count(&self, color: StoneColor) -> usize {
        self.stones.values().filter(|s| s.color == color).count()
    }

    /// Same stone/color multiset, ignoring mate links.
    pub fn same_position(&self, other: &Board) -> bool {
        self.size == other.size
            && self.stones.len() == other.stones.len()
            && self
                .stones
                .iter()
                .zip(other.stones.iter())
                .all(|((pa, a), (pb, b))| pa == pb && a.color == b.color)
    }

    /// Partition of every `color` stone into maximal groups (breadth-first).
    pub fn groups_of(&self, color: StoneColor) -> Vec<Group> {
        let mut visited = BTreeSet::new();
        let mut groups = Vec::new();

        for stone in self.stones.values().filter(|s| s.color == color) {
            if visited.contains(&stone.position) {
                continue;
            }
            let group = self.flood_group(stone.position, color);
            visited.extend(group.stones.iter().copied());
            groups.push(group);
        }

        groups
    }

    /// The group containing the stone at `pos`, if any.
    pub fn group_at(&self, pos: Position) -> Option<Group> {
        let color = self.color_at(pos)?;
        Some(self.flood_group(pos, color))
    }

    /// Empty points adjacent to any stone of the group.
    pub fn liberties(&self, group: &Group) -> BTreeSet<Position> {
        group
            .stones
            .iter()
            .flat_map(|&pos| neighbors(pos, self.size))
            .filter(|n| !self.is_occupied(**n))
            .copied()
            .collect()
    }

    /// Stones removed after `moving` has just played: dead opposing groups
    /// first, then any of the mover's own groups left without liberties.
    ///
    /// The board itself is not modified.
    pub fn resolve_captures(&self, moving: StoneColor) -> BTreeSet<Position> {
        let mut work = self.clone();
        let mut removed = BTreeSet::new();

        for color in [moving.opponent(), moving] {
            let dead: Vec<Position> = work
                .groups_of(color)
                .into_iter()
                .filter(|group| work.liberties(group).is_empty())
                .flat_map(|group| group.stones)
                .collect();
            for pos in dead {
                work.remove(pos);
                removed.insert(pos);
            }
        }

        removed
    }

    fn flood_group(&self, start: Position, color: StoneColor) -> Group {
        let mut stones = BTreeSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if !stones.insert(current) {
                continue;
            }
            for &next in neighbors(current, self.size) {
                if !stones.contains(&next) && self.color_at(next) == Some(color) {
                    queue.push_back(next);
                }
            }
        }

        Group { color, stones }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn p(x: u8, y: u8) -> Position {
        Position::new(x, y)
    }

    pub(crate) fn board_with(size: BoardSize, black: &[(u8, u8)], white: &[(u8, u8)]) -> Board {
        let mut board = Board::new(size);
        for &(x, y) in black {
            assert!(board.place(Stone::unlinked(p(x, y), StoneColor::Black)));
        }
        for &(x, y) in white {
            assert!(board.place(Stone::unlinked(p(x, y), StoneColor::White)));
        }
        board
    }

    #[test]
    fn t01_corner_edge_and_center_neighbor_counts() {
        assert_eq!(neighbors(p(1, 1), BoardSize::Nine), &[p(2, 1), p(1, 2)]);
        assert_eq!(neighbors(p(5, 1), BoardSize::Nine).len(), 3);
        assert_eq!(neighbors(p(5, 5), BoardSize::Nine).len(), 4);
        assert_eq!(neighbors(p(19, 19), BoardSize::Nineteen).len(), 2);
        assert!(neighbors(p(10, 10), BoardSize::Nine).is_empty());
    }

    #[test]
    fn groups_partition_stones_by_connectivity() {
        // Two black chains and one isolated stone.
        let board = board_with(
            BoardSize::Nine,
            &[(1, 1), (1, 2), (2, 2), (5, 5), (7, 7), (7, 8)],
            &[(2, 1)],
        );

        let mut sizes: Vec<usize> = board
            .groups_of(StoneColor::Black)
            .iter()
            .map(Group::len)
            .collect();
        sizes.sort_unstable();

        assert_eq!(sizes, vec![1, 2, 3]);
        assert_eq!(board.groups_of(StoneColor::White).len(), 1);
    }

    #[test]
    fn liberties_are_shared_empty_neighbors() {
        let board = board_with(BoardSize::Nine, &[(5, 5), (5, 6)], &[(4, 5)]);
        let group = board.group_at(p(5, 5)).expect("stone at 5,5");

        let libs = board.liberties(&group);

        assert_eq!(libs.len(), 5);
        assert!(!libs.contains(&p(4, 5)));
    }

    #[test]
    fn enemy_capture_is_resolved_before_self_check() {
        // White at 1,1 is in atari; black fills 1,2 where black itself would
        // have no liberties without the capture.
        let board = board_with(
            BoardSize::Nine,
            &[(2, 1), (1, 2)],
            &[(1, 1), (2, 2), (1, 3)],
        );

        let removed = board.resolve_captures(StoneColor::Black);

        assert_eq!(removed, BTreeSet::from([p(1, 1)]));
    }

    #[test]
    fn suicide_removes_the_movers_group() {
        let board = board_with(BoardSize::Nine, &[(1, 1)], &[(2, 1), (1, 2)]);

        let removed = board.resolve_captures(StoneColor::Black);

        assert_eq!(removed, BTreeSet::from([p(1, 1)]));
    }

    #[test]
    fn place_refuses_occupied_and_off_board_points() {
        let mut board = board_with(BoardSize::Nine, &[(3, 3)], &[]);

        assert!(!board.place(Stone::unlinked(p(3, 3), StoneColor::White)));
        assert!(!board.place(Stone::unlinked(p(10, 3), StoneColor::White)));
        assert_eq!(board.color_at(p(3, 3)), Some(StoneColor::Black));
        assert_eq!(board.len(), 1);
    }
}
