//! Execution error types

use thiserror::Error;

/// Errors that abort a run outright, as opposed to per-node failures which
/// are captured in the node results.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The graph failed structural validation
    #[error("invalid flow: {0}")]
    InvalidFlow(String),

    /// The flow-level timeout elapsed
    #[error("flow execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}
