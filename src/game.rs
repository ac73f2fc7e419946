use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::board::Board;
use crate::config::RuleConfig;
use crate::error::EngineError;
use crate::record::{MoveRecord, RemovedStone};
use crate::rules::{BoardHistory, Rejection, SuperkoCheck, history_key, validate};
use crate::rules::scoring;
use crate::types::{BoardSide, Position, Stone, StoneColor};

/// Quantum move-sequencing state. `Common` is final for the rest of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuantumPhase {
    #[default]
    #[serde(alias = "black")]
    BlackPending,
    #[serde(alias = "white")]
    WhitePending,
    Common,
}

impl QuantumPhase {
    /// Phase after `moves` accepted moves.
    pub fn after_moves(moves: usize) -> Self {
        match moves {
            0 => Self::BlackPending,
            1 => Self::WhitePending,
            _ => Self::Common,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Waiting,
    Playing,
    Finished,
}

/// A logical move as the player clicked it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub position: Position,
    pub color: StoneColor,
}

impl MoveIntent {
    pub fn new(position: Position, color: StoneColor) -> Self {
        Self { position, color }
    }
}

/// Operations accepted by [`GameSession::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Command {
    PlaceStone(MoveIntent),
    Undo,
    ReviewGoto { index: usize },
}

/// Combined score of both realities: area score per board, komi once for White.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionScore {
    pub black_points: f64,
    pub white_points: f64,
    /// `None` on an exact tie.
    pub winner: Option<StoneColor>,
}

impl SessionScore {
    pub fn of(board_a: &Board, board_b: &Board, komi: f64) -> Self {
        let a = scoring::area(board_a);
        let b = scoring::area(board_b);
        let black_points = (a.black + b.black) as f64;
        let white_points = (a.white + b.white) as f64 + komi;
        let winner = if black_points > white_points {
            Some(StoneColor::Black)
        } else if white_points > black_points {
            Some(StoneColor::White)
        } else {
            None
        };
        Self {
            black_points,
            white_points,
            winner,
        }
    }
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSummary {
    pub record: MoveRecord,
    pub phase: QuantumPhase,
    pub to_move: StoneColor,
    pub last_move_a: Option<Position>,
    pub last_move_b: Option<Position>,
    pub score: SessionScore,
}

/// Why a whole move was refused. Board-level reasons are kept for both
/// realities so callers can explain which side failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum MoveRejection {
    #[error("{0}")]
    Session(Rejection),
    #[error("illegal on board A: {a:?}, board B: {b:?}")]
    Boards {
        a: Option<Rejection>,
        b: Option<Rejection>,
    },
}

impl MoveRejection {
    /// Every reason involved, board A first.
    pub fn reasons(&self) -> Vec<Rejection> {
        match *self {
            Self::Session(reason) => vec![reason],
            Self::Boards { a, b } => a.into_iter().chain(b).collect(),
        }
    }
}

/// Board pair and bookkeeping at a given point of the record log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFrame {
    pub index: usize,
    pub board_a: Vec<Stone>,
    pub board_b: Vec<Stone>,
    pub phase: QuantumPhase,
    pub score: SessionScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "data", rename_all = "camelCase")]
pub enum CommandOutcome {
    Moved(MoveSummary),
    Rejected(MoveRejection),
    Undone,
    Review(ReviewFrame),
}

/// Serializable view of a live session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub status: GameStatus,
    pub phase: QuantumPhase,
    pub to_move: StoneColor,
    pub move_count: usize,
    pub board_a: Vec<Stone>,
    pub board_b: Vec<Stone>,
    pub black_anchor: Option<Position>,
    pub white_anchor: Option<Position>,
    pub last_move_a: Option<Position>,
    pub last_move_b: Option<Position>,
    pub black_lost: u32,
    pub white_lost: u32,
    pub score: SessionScore,
}

/// Starting position of a session restored without its record log.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SessionSeed {
    pub board_a: Board,
    pub board_b: Board,
    pub black_anchor: Option<Position>,
    pub white_anchor: Option<Position>,
    pub to_move: StoneColor,
    pub black_lost: u32,
    pub white_lost: u32,
}

/// Dual placement derived from one intent.
#[derive(Debug, Clone, Copy)]
struct MovePlan {
    a: Stone,
    b: Stone,
}

/// Two entangled Go boards and everything needed to play, undo and replay.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: RuleConfig,
    status: GameStatus,
    board_a: Board,
    board_b: Board,
    phase: QuantumPhase,
    to_move: StoneColor,
    black_anchor: Option<Position>,
    white_anchor: Option<Position>,
    last_move_a: Option<Position>,
    last_move_b: Option<Position>,
    /// Last move on each board when it removed exactly one stone there.
    ko_a: Option<Position>,
    ko_b: Option<Position>,
    history_a: BoardHistory,
    history_b: BoardHistory,
    records: Vec<MoveRecord>,
    black_lost: u32,
    white_lost: u32,
    score: SessionScore,
    /// Moves already on the board before `records[0]` (legacy restores only).
    base_moves: usize,
    seed: Option<Box<SessionSeed>>,
}

impl GameSession {
    pub fn new(config: RuleConfig) -> Self {
        let board_a = Board::new(config.board_size);
        let board_b = Board::new(config.board_size);
        let score = SessionScore::of(&board_a, &board_b, config.komi);
        Self {
            config,
            status: GameStatus::Waiting,
            board_a,
            board_b,
            phase: QuantumPhase::BlackPending,
            to_move: StoneColor::Black,
            black_anchor: None,
            white_anchor: None,
            last_move_a: None,
            last_move_b: None,
            ko_a: None,
            ko_b: None,
            history_a: BoardHistory::new(),
            history_b: BoardHistory::new(),
            records: Vec::new(),
            black_lost: 0,
            white_lost: 0,
            score,
            base_moves: 0,
            seed: None,
        }
    }

    /// Session resumed from a bare board pair with no record log.
    pub(crate) fn from_seed(config: RuleConfig, seed: SessionSeed) -> Self {
        let mut session = Self::new(config);
        let placed = seed.board_a.len();
        session.base_moves = placed.min(2);
        session.phase = QuantumPhase::after_moves(placed);
        session.board_a = seed.board_a.clone();
        session.board_b = seed.board_b.clone();
        session.black_anchor = seed.black_anchor;
        session.white_anchor = seed.white_anchor;
        session.to_move = seed.to_move;
        session.black_lost = seed.black_lost;
        session.white_lost = seed.white_lost;
        if placed > 0 {
            // The key of the current position, produced by the side that just moved.
            let mover = seed.to_move.opponent();
            let rule = config.superko;
            session
                .history_a
                .record(history_key(&session.board_a, mover, rule));
            session
                .history_b
                .record(history_key(&session.board_b, mover, rule));
        }
        session.score = SessionScore::of(&session.board_a, &session.board_b, config.komi);
        session.seed = Some(Box::new(seed));
        session
    }

    /// Session rebuilt by replaying a stored record log, on top of `seed`
    /// when the game was resumed from a bare board.
    pub(crate) fn with_records(
        config: RuleConfig,
        seed: Option<SessionSeed>,
        status: GameStatus,
        records: Vec<MoveRecord>,
    ) -> Result<Self, EngineError> {
        let mut session = match seed {
            Some(seed) => Self::from_seed(config, seed),
            None => Self::new(config),
        };
        session.status = status;
        session.records = records;
        session.rebuild()?;
        Ok(session)
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn start(&mut self) {
        self.status = GameStatus::Playing;
    }

    pub fn finish(&mut self) {
        self.status = GameStatus::Finished;
    }

    pub(crate) fn set_status(&mut self, status: GameStatus) {
        self.status = status;
    }

    /// Starting position of a session resumed without its record log.
    pub(crate) fn seed(&self) -> Option<&SessionSeed> {
        self.seed.as_deref()
    }

    pub fn board(&self, side: BoardSide) -> &Board {
        match side {
            BoardSide::A => &self.board_a,
            BoardSide::B => &self.board_b,
        }
    }

    pub fn phase(&self) -> QuantumPhase {
        self.phase
    }

    pub fn to_move(&self) -> StoneColor {
        self.to_move
    }

    pub fn black_anchor(&self) -> Option<Position> {
        self.black_anchor
    }

    pub fn white_anchor(&self) -> Option<Position> {
        self.white_anchor
    }

    pub fn last_move(&self, side: BoardSide) -> Option<Position> {
        match side {
            BoardSide::A => self.last_move_a,
            BoardSide::B => self.last_move_b,
        }
    }

    /// Point a single-stone recapture may not take back on the next move.
    pub fn ko_point(&self, side: BoardSide) -> Option<Position> {
        match side {
            BoardSide::A => self.ko_a,
            BoardSide::B => self.ko_b,
        }
    }

    pub fn history(&self, side: BoardSide) -> &BoardHistory {
        match side {
            BoardSide::A => &self.history_a,
            BoardSide::B => &self.history_b,
        }
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn move_count(&self) -> usize {
        self.base_moves + self.records.len()
    }

    pub fn lost(&self, color: StoneColor) -> u32 {
        match color {
            StoneColor::Black => self.black_lost,
            StoneColor::White => self.white_lost,
        }
    }

    pub fn score(&self) -> SessionScore {
        self.score
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            status: self.status,
            phase: self.phase,
            to_move: self.to_move,
            move_count: self.move_count(),
            board_a: self.board_a.stones().copied().collect(),
            board_b: self.board_b.stones().copied().collect(),
            black_anchor: self.black_anchor,
            white_anchor: self.white_anchor,
            last_move_a: self.last_move_a,
            last_move_b: self.last_move_b,
            black_lost: self.black_lost,
            white_lost: self.white_lost,
            score: self.score,
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, EngineError> {
        match command {
            Command::PlaceStone(intent) => Ok(match self.play(intent) {
                Ok(summary) => CommandOutcome::Moved(summary),
                Err(rejection) => CommandOutcome::Rejected(rejection),
            }),
            Command::Undo => self.undo().map(|()| CommandOutcome::Undone),
            Command::ReviewGoto { index } => self.review(index).map(CommandOutcome::Review),
        }
    }

    /// Plays one logical move on both boards, or on neither.
    pub fn play(&mut self, intent: MoveIntent) -> Result<MoveSummary, MoveRejection> {
        if self.status != GameStatus::Playing {
            return Err(MoveRejection::Session(Rejection::OutOfPhase));
        }
        if intent.color != self.to_move {
            return Err(MoveRejection::Session(Rejection::WrongTurn));
        }
        if !intent.position.is_on(self.config.board_size) {
            return Err(MoveRejection::Session(Rejection::OffBoard));
        }

        let plan = self.plan(intent);
        let a = self.check(BoardSide::A, plan.a).err();
        let b = self.check(BoardSide::B, plan.b).err();
        if a.is_some() || b.is_some() {
            warn!(
                position = %intent.position,
                color = ?intent.color,
                board_a = ?a,
                board_b = ?b,
                "move rejected"
            );
            return Err(MoveRejection::Boards { a, b });
        }

        let record = self.commit(plan);
        debug!(
            position = %intent.position,
            color = ?intent.color,
            removed = record.reduce.len(),
            phase = ?self.phase,
            "move committed"
        );

        Ok(MoveSummary {
            record,
            phase: self.phase,
            to_move: self.to_move,
            last_move_a: self.last_move_a,
            last_move_b: self.last_move_b,
            score: self.score,
        })
    }

    /// Takes back the last two records (one move per side).
    ///
    /// Placed stones are lifted from both boards and removed stones are put
    /// back on the board they were taken from, re-linking their mates.
    pub fn undo(&mut self) -> Result<(), EngineError> {
        if self.records.len() < 2 {
            return Err(EngineError::NothingToUndo(self.records.len()));
        }

        for _ in 0..2 {
            let Some(record) = self.records.pop() else {
                break;
            };
            self.revert(&record);
            self.history_a.pop();
            self.history_b.pop();
            self.roll_back_phase(self.base_moves + self.records.len());
        }

        match self.records.last().cloned() {
            Some(record) => self.restore_markers(&record),
            None => {
                self.last_move_a = None;
                self.last_move_b = None;
                self.ko_a = None;
                self.ko_b = None;
            }
        }
        self.score = SessionScore::of(&self.board_a, &self.board_b, self.config.komi);
        debug!(records = self.records.len(), "undo applied");
        Ok(())
    }

    /// A session rebuilt from scratch by re-applying `records[..index]`.
    ///
    /// Uses the same placement, capture and closure path as live play.
    pub fn replay_to(&self, index: usize) -> Result<GameSession, EngineError> {
        if index > self.records.len() {
            return Err(EngineError::ReplayOutOfRange {
                index,
                len: self.records.len(),
            });
        }

        let mut replay = match &self.seed {
            Some(seed) => Self::from_seed(self.config, (**seed).clone()),
            None => Self::new(self.config),
        };
        replay.status = self.status;

        for (i, recorded) in self.records[..index].iter().enumerate() {
            let Some(stone) = recorded.placed() else {
                warn!(index = i, "record without a placement skipped during replay");
                continue;
            };
            let plan = replay.plan(MoveIntent::new(stone.position, stone.color));
            let replayed = replay.commit(plan);
            if replayed.removal_keys() != recorded.removal_keys() {
                warn!(index = i, "replayed removals differ from the recorded ones");
            }
        }

        debug!(index, "replay finished");
        Ok(replay)
    }

    /// Review frame at `index` without touching the live session.
    pub fn review(&self, index: usize) -> Result<ReviewFrame, EngineError> {
        let replay = self.replay_to(index)?;
        Ok(ReviewFrame {
            index,
            board_a: replay.board_a.stones().copied().collect(),
            board_b: replay.board_b.stones().copied().collect(),
            phase: replay.phase,
            score: replay.score,
        })
    }

    /// Replaces live board state by replaying the full record log.
    pub fn rebuild(&mut self) -> Result<(), EngineError> {
        *self = self.replay_to(self.records.len())?;
        Ok(())
    }

    /// Maps an intent onto the board A and board B placements.
    fn plan(&self, intent: MoveIntent) -> MovePlan {
        let color = intent.color;
        let (pos_a, pos_b) = match (self.phase, self.black_anchor, self.white_anchor) {
            (QuantumPhase::Common, Some(black), Some(white))
                if intent.position == black || intent.position == white =>
            {
                match color {
                    StoneColor::Black => (black, white),
                    StoneColor::White => (white, black),
                }
            }
            _ => (intent.position, intent.position),
        };
        let color_b = if self.phase == QuantumPhase::Common {
            color
        } else {
            color.opponent()
        };

        MovePlan {
            a: Stone {
                position: pos_a,
                color,
                mate: pos_b,
            },
            b: Stone {
                position: pos_b,
                color: color_b,
                mate: pos_a,
            },
        }
    }

    fn check(&self, side: BoardSide, stone: Stone) -> Result<(), Rejection> {
        let superko = SuperkoCheck {
            rule: self.config.superko,
            history: self.history(side),
        };
        validate(
            self.board(side),
            stone.position,
            stone.color,
            self.ko_point(side),
            Some(superko),
        )
        .map(|_| ())
    }

    /// Applies a plan unconditionally: placement, phase transition, captures
    /// with entanglement closure, history, record, score and turn.
    fn commit(&mut self, plan: MovePlan) -> MoveRecord {
        let mut record = MoveRecord {
            add: vec![plan.a],
            reduce: Vec::new(),
        };

        if !self.board_a.place(plan.a) {
            warn!(position = %plan.a.position, "board A point already occupied on commit");
        }
        if !self.board_b.place(plan.b) {
            warn!(position = %plan.b.position, "board B point already occupied on commit");
        }

        match self.phase {
            QuantumPhase::BlackPending => {
                self.black_anchor = Some(plan.a.position);
                self.phase = QuantumPhase::WhitePending;
            }
            QuantumPhase::WhitePending => {
                self.white_anchor = Some(plan.a.position);
                self.link_anchors();
                self.phase = QuantumPhase::Common;
            }
            QuantumPhase::Common => {}
        }
        self.last_move_a = Some(plan.a.position);
        self.last_move_b = Some(plan.b.position);

        let captured_a = self.board_a.resolve_captures(plan.a.color);
        let captured_b = self.board_b.resolve_captures(plan.b.color);

        let mut doomed_a = captured_a.clone();
        let mut doomed_b = captured_b.clone();
        for pos in &captured_a {
            if let Some(stone) = self.board_a.get(*pos)
                && self.board_b.is_occupied(stone.mate)
            {
                doomed_b.insert(stone.mate);
            }
        }
        for pos in &captured_b {
            if let Some(stone) = self.board_b.get(*pos)
                && self.board_a.is_occupied(stone.mate)
            {
                doomed_a.insert(stone.mate);
            }
        }

        for (side, doomed) in [(BoardSide::A, doomed_a), (BoardSide::B, doomed_b)] {
            let single = doomed.len() == 1;
            let placed = match side {
                BoardSide::A => plan.a.position,
                BoardSide::B => plan.b.position,
            };
            *self.ko_mut(side) = single.then_some(placed);
            for pos in doomed {
                match self.board_mut(side).remove(pos) {
                    Some(stone) => {
                        self.count_lost(stone.color, 1);
                        record.reduce.push(RemovedStone { stone, board: side });
                    }
                    None => warn!(?side, position = %pos, "closure removal of an absent stone"),
                }
            }
        }

        let rule = self.config.superko;
        self.history_a
            .record(history_key(&self.board_a, plan.a.color, rule));
        self.history_b
            .record(history_key(&self.board_b, plan.b.color, rule));

        self.records.push(record.clone());
        self.score = SessionScore::of(&self.board_a, &self.board_b, self.config.komi);
        self.to_move = self.to_move.opponent();
        record
    }

    /// Cross-links the two anchors on both boards.
    fn link_anchors(&mut self) {
        let (Some(black), Some(white)) = (self.black_anchor, self.white_anchor) else {
            return;
        };
        for board in [&mut self.board_a, &mut self.board_b] {
            board.set_mate(black, white);
            board.set_mate(white, black);
        }
    }

    fn revert(&mut self, record: &MoveRecord) {
        if let Some(placed) = record.placed() {
            if self.board_a.remove(placed.position).is_none() {
                warn!(position = %placed.position, "undo: placed stone already gone from board A");
            }
            if self.board_b.remove(placed.mate).is_none() {
                warn!(position = %placed.mate, "undo: placed stone already gone from board B");
            }
        }

        for removed in &record.reduce {
            let stone = removed.stone;
            if !self.board_mut(removed.board).place(stone) {
                warn!(side = ?removed.board, position = %stone.position, "undo: restore point occupied");
                continue;
            }
            self.board_mut(removed.board.other())
                .set_mate(stone.mate, stone.position);
            self.count_lost(stone.color, -1);
        }

        self.to_move = self.to_move.opponent();
    }

    /// Last-move and ko markers as they stood right after `record` was played.
    fn restore_markers(&mut self, record: &MoveRecord) {
        let Some(stone) = record.placed() else {
            return;
        };
        self.last_move_a = Some(stone.position);
        self.last_move_b = Some(stone.mate);
        self.ko_a = (record.removed_on(BoardSide::A).count() == 1).then_some(stone.position);
        self.ko_b = (record.removed_on(BoardSide::B).count() == 1).then_some(stone.mate);
    }

    /// Undoes the phase transition of the move at game index `moves`, if any.
    fn roll_back_phase(&mut self, moves: usize) {
        if moves >= 2 {
            return;
        }
        if moves == 1 {
            self.white_anchor = None;
            if let Some(black) = self.black_anchor {
                self.board_a.set_mate(black, black);
                self.board_b.set_mate(black, black);
            }
        } else {
            self.black_anchor = None;
        }
        self.phase = QuantumPhase::after_moves(moves);
    }

    fn board_mut(&mut self, side: BoardSide) -> &mut Board {
        match side {
            BoardSide::A => &mut self.board_a,
            BoardSide::B => &mut self.board_b,
        }
    }

    fn ko_mut(&mut self, side: BoardSide) -> &mut Option<Position> {
        match side {
            BoardSide::A => &mut self.ko_a,
            BoardSide::B => &mut self.ko_b,
        }
    }

    fn count_lost(&mut self, color: StoneColor, delta: i32) {
        let counter = match color {
            StoneColor::Black => &mut self.black_lost,
            StoneColor::White => &mut self.white_lost,
        };
        *counter = counter.saturating_add_signed(delta);
    }
}
