//! Document store error types

use thiserror::Error;

use flowdeck_core_types::FlowdeckError;

#[derive(Debug, Error, Clone)]
pub enum DocError {
    /// Document does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying filesystem failure
    #[error("io failure: {0}")]
    Io(String),

    /// Document exists but cannot be decoded
    #[error("corrupt document at {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// Operation refused because it would orphan other documents
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<std::io::Error> for DocError {
    fn from(err: std::io::Error) -> Self {
        DocError::Io(err.to_string())
    }
}

impl From<DocError> for FlowdeckError {
    fn from(value: DocError) -> Self {
        FlowdeckError::new(value.to_string())
    }
}
