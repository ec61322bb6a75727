//! Level loading errors

use thiserror::Error;

/// Failure to build a level from a layout or level file
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level layout has no rows")]
    EmptyLayout,

    #[error("layout row {row} is {found} tiles wide, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("no built-in level {world}-{level}")]
    UnknownLevel { world: u32, level: u32 },

    #[error("invalid level file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read level file: {0}")]
    Io(#[from] std::io::Error),
}
