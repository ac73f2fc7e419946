use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{BoardSide, Position, Stone, StoneColor};

/// A stone taken off one board during a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "WireRemoved")]
pub struct RemovedStone {
    pub stone: Stone,
    pub board: BoardSide,
}

/// What one logical move changed: the stone placed on board A (its mate is
/// the board B point) and every removal, tagged with its board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireRecord")]
pub struct MoveRecord {
    pub add: Vec<Stone>,
    pub reduce: Vec<RemovedStone>,
}

impl MoveRecord {
    pub fn placed(&self) -> Option<&Stone> {
        self.add.first()
    }

    pub fn removed_on(&self, side: BoardSide) -> impl Iterator<Item = &Stone> {
        self.reduce
            .iter()
            .filter(move |removed| removed.board == side)
            .map(|removed| &removed.stone)
    }

    /// `(board, position)` of every removal, sorted.
    pub fn removal_keys(&self) -> Vec<(BoardSide, Position)> {
        let mut keys: Vec<_> = self
            .reduce
            .iter()
            .map(|removed| (removed.board, removed.stone.position))
            .collect();
        keys.sort_unstable();
        keys
    }
}

/// Color and point actually played on `side` for each record, in order.
///
/// Board B sees the inverted color for the first two (anchor) moves and
/// plays at the mate point of the board A stone.
pub fn board_moves(records: &[MoveRecord], side: BoardSide) -> Vec<(StoneColor, Position)> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let stone = record.placed()?;
            Some(match side {
                BoardSide::A => (stone.color, stone.position),
                BoardSide::B if index <= 1 => (stone.color.opponent(), stone.mate),
                BoardSide::B => (stone.color, stone.mate),
            })
        })
        .collect()
}

/// CRC-32 of the canonical JSON encoding of the record log.
pub fn checksum(records: &[MoveRecord]) -> Result<u32, EngineError> {
    let payload = serde_json::to_vec(records)?;
    Ok(crc32fast::hash(&payload))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireRemoved {
    position: Position,
    #[serde(rename = "type")]
    color: StoneColor,
    #[serde(rename = "brother")]
    mate: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    board: Option<u8>,
}

impl From<RemovedStone> for WireRemoved {
    fn from(removed: RemovedStone) -> Self {
        Self {
            position: removed.stone.position,
            color: removed.stone.color,
            mate: removed.stone.mate,
            board: Some(removed.board.tag()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WireRecord {
    #[serde(default)]
    add: Vec<Stone>,
    #[serde(default)]
    reduce: Vec<WireRemoved>,
}

impl TryFrom<WireRecord> for MoveRecord {
    type Error = EngineError;

    /// Untagged removals come from the legacy dual-delete format and are split
    /// into one removal per board.
    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        let mut reduce = Vec::with_capacity(wire.reduce.len());
        for entry in wire.reduce {
            let stone = Stone {
                position: entry.position,
                color: entry.color,
                mate: entry.mate,
            };
            match entry.board {
                Some(tag) => reduce.push(RemovedStone {
                    stone,
                    board: BoardSide::from_tag(tag)?,
                }),
                None => {
                    reduce.push(RemovedStone {
                        stone,
                        board: BoardSide::A,
                    });
                    reduce.push(RemovedStone {
                        stone: Stone {
                            position: stone.mate,
                            color: stone.color,
                            mate: stone.position,
                        },
                        board: BoardSide::B,
                    });
                }
            }
        }
        Ok(Self {
            add: wire.add,
            reduce,
        })
    }
}
