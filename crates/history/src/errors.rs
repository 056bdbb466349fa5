//! History error types

use thiserror::Error;

/// Errors raised by the diff engine and the history stack.
#[derive(Debug, Error, Clone)]
pub enum HistoryError {
    /// A JSON pointer did not resolve inside the target document
    #[error("invalid pointer: {0}")]
    InvalidPointer(String),

    /// An array index pointed past the end of the array
    #[error("index out of bounds: {0}")]
    OutOfBounds(String),

    /// State failed to serialize or deserialize
    #[error("state codec failure: {0}")]
    Codec(String),

    /// Internal invariant broken (a delta chain without a keyframe)
    #[error("internal error: {0}")]
    Internal(String),
}
