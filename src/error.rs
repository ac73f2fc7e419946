use thiserror::Error;

/// Failures at the engine boundary. Illegal moves are not errors; see
/// [`crate::rules::Rejection`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid position key {0:?} (expected \"x,y\" with 1-based coordinates)")]
    InvalidPosition(String),
    #[error("invalid stone color {0:?} (expected \"black\" or \"white\")")]
    InvalidColor(String),
    #[error("unsupported board size {0} (expected 9, 13 or 19)")]
    UnsupportedBoardSize(u8),
    #[error("invalid board tag {0} (expected 1 or 2)")]
    InvalidBoardTag(u8),
    #[error("replay index {index} is past the end of the record log ({len} records)")]
    ReplayOutOfRange { index: usize, len: usize },
    #[error("nothing to undo: {0} record(s) in the log, two are required")]
    NothingToUndo(usize),
    #[error("record log checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("malformed snapshot: {0}")]
    Snapshot(String),
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
