//! Per-board Go rules: legality, repetition tracking and area scoring.

pub mod history;
pub mod legality;
pub mod scoring;

pub use history::{BoardHistory, hash, hash_with_turn, history_key};
pub use legality::{Accepted, Rejection, SuperkoCheck, is_legal, validate};
pub use scoring::{AreaCount, ScoreResult, area, score};
