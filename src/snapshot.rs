//! Room snapshots as stored by the server and handed to reconnecting clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::Board;
use crate::clock::TimeControl;
use crate::config::{DEFAULT_KOMI, RuleConfig, SuperkoRule};
use crate::error::EngineError;
use crate::game::{GameSession, GameStatus, QuantumPhase, SessionSeed};
use crate::record::{self, MoveRecord};
use crate::types::{BoardSide, BoardSize, Position, Stone, StoneColor};

/// Persisted room state. Snake-case keys from older servers are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(default, alias = "room_id")]
    pub room_id: String,
    #[serde(default)]
    pub status: GameStatus,
    #[serde(default, alias = "owner_id", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Side to move.
    #[serde(default = "black_to_move")]
    pub round: StoneColor,
    /// Board A as `[position, stone]` pairs.
    #[serde(default, deserialize_with = "board_entries")]
    pub board: Vec<(Position, Stone)>,
    #[serde(default, alias = "moves")]
    pub move_count: usize,
    #[serde(default, alias = "black_lost")]
    pub black_lost: u32,
    #[serde(default, alias = "white_lost")]
    pub white_lost: u32,
    #[serde(default, alias = "model")]
    pub board_size: BoardSize,
    #[serde(default, alias = "chessman_records")]
    pub records: Vec<MoveRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<QuantumPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub komi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superko: Option<SuperkoRule>,
    #[serde(
        default,
        alias = "time_control",
        alias = "timeControlConfig",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_control: Option<TimeControl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_crc: Option<u32>,
    /// Position the record log starts from, for rooms resumed without records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<SeedState>,
}

/// Board A and counters of a session resumed from a bare board list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedState {
    #[serde(default, deserialize_with = "board_entries")]
    pub board: Vec<(Position, Stone)>,
    pub round: StoneColor,
    #[serde(default)]
    pub black_lost: u32,
    #[serde(default)]
    pub white_lost: u32,
}

/// Room metadata the engine carries through but never interprets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: String,
    pub owner_id: Option<String>,
    pub time_control: Option<TimeControl>,
}

fn black_to_move() -> StoneColor {
    StoneColor::Black
}

/// Older servers wrote an empty board as `{}` and some wrote a keyed map.
#[derive(Deserialize)]
#[serde(untagged)]
enum BoardEntries {
    List(Vec<(Position, Stone)>),
    Map(BTreeMap<Position, Stone>),
}

fn board_entries<'de, D>(deserializer: D) -> Result<Vec<(Position, Stone)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match BoardEntries::deserialize(deserializer)? {
        BoardEntries::List(entries) => entries,
        BoardEntries::Map(entries) => entries.into_iter().collect(),
    })
}

impl SessionSnapshot {
    /// Snapshot of a live session. Board A is exported as the board list and
    /// the record log is sealed with its checksum.
    pub fn capture(session: &GameSession, room: RoomInfo) -> Result<Self, EngineError> {
        let records = session.records().to_vec();
        let records_crc = Some(record::checksum(&records)?);
        let config = session.config();
        Ok(Self {
            room_id: room.room_id,
            status: session.status(),
            owner_id: room.owner_id,
            round: session.to_move(),
            board: session
                .board(BoardSide::A)
                .stones()
                .map(|stone| (stone.position, *stone))
                .collect(),
            move_count: session.move_count(),
            black_lost: session.lost(StoneColor::Black),
            white_lost: session.lost(StoneColor::White),
            board_size: config.board_size,
            records,
            phase: Some(session.phase()),
            komi: Some(config.komi),
            superko: Some(config.superko),
            time_control: room.time_control,
            records_crc,
            seed: session.seed().map(SeedState::of),
        })
    }

    pub fn room_info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            owner_id: self.owner_id.clone(),
            time_control: self.time_control,
        }
    }

    pub fn rule_config(&self) -> RuleConfig {
        RuleConfig::new(self.board_size, self.komi.unwrap_or(DEFAULT_KOMI))
            .with_superko(self.superko.unwrap_or_default())
    }

    /// Rebuilds a session. The record log is authoritative when present and is
    /// replayed on top of the stored seed, if any. Without records the board
    /// list seeds a session that has no history to replay.
    pub fn restore(&self) -> Result<GameSession, EngineError> {
        if let Some(expected) = self.records_crc {
            let actual = record::checksum(&self.records)?;
            if actual != expected {
                return Err(EngineError::ChecksumMismatch { expected, actual });
            }
        }

        let config = self.rule_config();
        let seed = match &self.seed {
            Some(seed) => Some(seed.build(self.board_size)?),
            None if self.records.is_empty() && !self.board.is_empty() => {
                Some(self.legacy_seed().build(self.board_size)?)
            }
            None => None,
        };
        let session = if !self.records.is_empty() {
            let session =
                GameSession::with_records(config, seed, self.status, self.records.clone())?;
            self.check_replay(&session);
            session
        } else if let Some(seed) = seed {
            let mut session = GameSession::from_seed(config, seed);
            session.set_status(self.status);
            session
        } else {
            let mut session = GameSession::new(config);
            session.set_status(self.status);
            session
        };

        if let Some(phase) = self.phase
            && phase != session.phase()
        {
            warn!(stored = ?phase, derived = ?session.phase(), "snapshot phase disagrees with its stones");
        }
        debug!(
            room = %self.room_id,
            records = session.records().len(),
            phase = ?session.phase(),
            "snapshot restored"
        );
        Ok(session)
    }

    /// The board list of a snapshot written before records were kept.
    fn legacy_seed(&self) -> SeedState {
        SeedState {
            board: self.board.clone(),
            round: self.round,
            black_lost: self.black_lost,
            white_lost: self.white_lost,
        }
    }

    fn check_replay(&self, session: &GameSession) {
        let mut listed = Board::new(self.board_size);
        for &(key, stone) in &self.board {
            listed.place(Stone {
                position: key,
                ..stone
            });
        }
        if !listed.same_position(session.board(BoardSide::A)) {
            warn!(room = %self.room_id, "snapshot board list differs from the replayed records");
        }
        if self.round != session.to_move() {
            warn!(stored = ?self.round, derived = ?session.to_move(), "snapshot turn differs from the replayed records");
        }
        for (color, stored) in [
            (StoneColor::Black, self.black_lost),
            (StoneColor::White, self.white_lost),
        ] {
            if stored != session.lost(color) {
                warn!(?color, stored, derived = session.lost(color), "snapshot capture count differs");
            }
        }
    }
}

impl SeedState {
    fn of(seed: &SessionSeed) -> Self {
        Self {
            board: seed
                .board_a
                .stones()
                .map(|stone| (stone.position, *stone))
                .collect(),
            round: seed.to_move,
            black_lost: seed.black_lost,
            white_lost: seed.white_lost,
        }
    }

    /// Board pair for the listed stones.
    ///
    /// Board B holds each stone at its mate point. Stones linked to a
    /// different point are the anchors; a lone anchor still shows the
    /// inverted color on board B.
    fn build(&self, size: BoardSize) -> Result<SessionSeed, EngineError> {
        let mut board_a = Board::new(size);
        let mut board_b = Board::new(size);
        let mut black_anchor = None;
        let mut white_anchor = None;
        let lone = self.board.len() == 1;

        for &(key, stone) in &self.board {
            let stone = Stone {
                position: key,
                ..stone
            };
            if !key.is_on(size) || !stone.mate.is_on(size) {
                return Err(EngineError::Snapshot(format!(
                    "stone {key} (mate {}) lies outside a {n}x{n} board",
                    stone.mate,
                    n = size.get()
                )));
            }
            if !board_a.place(stone) {
                return Err(EngineError::Snapshot(format!("two stones listed at {key}")));
            }
            let color_b = if lone { stone.color.opponent() } else { stone.color };
            if !board_b.place(Stone {
                position: stone.mate,
                color: color_b,
                mate: key,
            }) {
                return Err(EngineError::Snapshot(format!(
                    "two stones share the mate point {}",
                    stone.mate
                )));
            }
            if lone || stone.mate != key {
                match stone.color {
                    StoneColor::Black => black_anchor = Some(key),
                    StoneColor::White => white_anchor = Some(key),
                }
            }
        }

        Ok(SessionSeed {
            board_a,
            board_b,
            black_anchor,
            white_anchor,
            to_move: self.round,
            black_lost: self.black_lost,
            white_lost: self.white_lost,
        })
    }
}
