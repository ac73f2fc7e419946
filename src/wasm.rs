//! JavaScript entry point. Thin wrapper: every rule lives in [`GameSession`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::Serializer;
use tracing::debug;
use wasm_bindgen::prelude::*;

use crate::clock::{self, Clock, TimeControl};
use crate::config::{DEFAULT_KOMI, RuleConfig, SuperkoRule};
use crate::game::{Command, CommandOutcome, GameSession, GameStatus, MoveIntent};
use crate::snapshot::{RoomInfo, SessionSnapshot};
use crate::types::{BoardSize, Position, StoneColor};

/// Options accepted by `new QuantumGo(options)`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GameOptions {
    board_size: Option<BoardSize>,
    komi: Option<f64>,
    superko: Option<SuperkoRule>,
    room_id: String,
    owner_id: Option<String>,
    time_control: Option<TimeControl>,
}

impl GameOptions {
    fn rule_config(&self) -> RuleConfig {
        RuleConfig::new(
            self.board_size.unwrap_or_default(),
            self.komi.unwrap_or(DEFAULT_KOMI),
        )
        .with_superko(self.superko.unwrap_or_default())
    }
}

fn js_error(err: impl fmt::Display) -> JsValue {
    JsError::new(&err.to_string()).into()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(js_error)
}

#[wasm_bindgen]
pub struct QuantumGo {
    session: GameSession,
    clock: Clock,
    room: RoomInfo,
}

#[wasm_bindgen]
impl QuantumGo {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<QuantumGo, JsValue> {
        let options: GameOptions = if options.is_undefined() || options.is_null() {
            GameOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(js_error)?
        };
        let session = GameSession::new(options.rule_config());
        debug!(room = %options.room_id, size = session.config().board_size.get(), "session created");
        Ok(Self {
            session,
            clock: Clock::new(options.time_control),
            room: RoomInfo {
                room_id: options.room_id,
                owner_id: options.owner_id,
                time_control: options.time_control,
            },
        })
    }

    #[wasm_bindgen(js_name = fromSnapshot)]
    pub fn from_snapshot(snapshot: JsValue) -> Result<QuantumGo, JsValue> {
        let snapshot: SessionSnapshot =
            serde_wasm_bindgen::from_value(snapshot).map_err(js_error)?;
        let session = snapshot.restore().map_err(js_error)?;
        let mut game = Self {
            clock: Clock::new(snapshot.time_control),
            room: snapshot.room_info(),
            session,
        };
        game.resume_clock();
        Ok(game)
    }

    pub fn start(&mut self) {
        self.session.start();
        self.resume_clock();
    }

    pub fn finish(&mut self) {
        self.session.finish();
    }

    /// Plays `color` at the `"x,y"` key. Illegal moves come back as a
    /// `rejected` outcome rather than an exception.
    pub fn play(&mut self, position: &str, color: &str) -> Result<JsValue, JsValue> {
        let position: Position = position.parse().map_err(js_error)?;
        let color: StoneColor = color.parse().map_err(js_error)?;
        let outcome = self
            .session
            .execute(Command::PlaceStone(MoveIntent::new(position, color)))
            .map_err(js_error)?;
        if let CommandOutcome::Moved(summary) = &outcome {
            let now = clock::now_ms();
            self.clock.finish_move(color, now);
            self.clock.start_turn(summary.to_move, now);
        }
        to_js(&outcome)
    }

    pub fn undo(&mut self) -> Result<(), JsValue> {
        self.session.execute(Command::Undo).map_err(js_error)?;
        self.resume_clock();
        Ok(())
    }

    pub fn review(&self, index: usize) -> Result<JsValue, JsValue> {
        to_js(&self.session.review(index).map_err(js_error)?)
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.view())
    }

    pub fn records(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.records())
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let snapshot =
            SessionSnapshot::capture(&self.session, self.room.clone()).map_err(js_error)?;
        to_js(&snapshot)
    }

    /// Milliseconds left for `color`, or `undefined` when untimed or idle.
    #[wasm_bindgen(js_name = msUntilTimeout)]
    pub fn ms_until_timeout(&self, color: &str) -> Result<Option<f64>, JsValue> {
        let color: StoneColor = color.parse().map_err(js_error)?;
        Ok(self
            .clock
            .ms_until_timeout(color, clock::now_ms())
            .map(|ms| ms as f64))
    }
}

impl QuantumGo {
    fn resume_clock(&mut self) {
        if self.session.status() == GameStatus::Playing {
            self.clock
                .start_turn(self.session.to_move(), clock::now_ms());
        }
    }
}
