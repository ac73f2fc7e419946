//! Quantum Go rules engine: two entangled Go boards played as one game.

use wasm_bindgen::prelude::*;

pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod record;
pub mod rules;
pub mod snapshot;
pub mod types;
pub mod wasm;

pub use config::{RuleConfig, SuperkoRule};
pub use error::EngineError;
pub use game::{
    Command, CommandOutcome, GameSession, GameStatus, MoveIntent, MoveRejection, MoveSummary,
    QuantumPhase, ReviewFrame, SessionScore,
};
pub use record::{MoveRecord, RemovedStone};
pub use rules::Rejection;
pub use snapshot::{RoomInfo, SeedState, SessionSnapshot};
pub use types::{BoardSide, BoardSize, Position, Stone, StoneColor};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
