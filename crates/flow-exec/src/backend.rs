//! Seam to the remote automation backend

use async_trait::async_trait;
use flow_graph::ActionKind;
use shot_store::ShotFormat;
use thiserror::Error;

use crate::runner::RunContext;

/// One node's worth of backend work. Implemented by the REST client; tests
/// substitute scripted mocks.
#[async_trait]
pub trait ActionBackend: Send + Sync {
    async fn execute(
        &self,
        action: &ActionKind,
        ctx: &RunContext,
    ) -> Result<ActionOutcome, BackendError>;
}

/// Successful action response.
#[derive(Clone, Debug, Default)]
pub struct ActionOutcome {
    /// Structured payload returned by the backend (extracted text lives
    /// under `data.text`)
    pub data: Option<serde_json::Value>,

    /// Decoded screenshot, when the action produced one
    pub screenshot: Option<ScreenshotPayload>,
}

/// Decoded screenshot bytes from the backend.
#[derive(Clone, Debug)]
pub struct ScreenshotPayload {
    pub format: ShotFormat,
    pub bytes: Vec<u8>,
}

/// Backend failure, classified for the retry loop. Validation failures mean
/// the node itself is wrong and retrying cannot help; transient failures
/// (network, timeouts, 5xx) are retried with backoff.
#[derive(Debug, Error, Clone)]
pub enum BackendError {
    #[error("validation rejected: {0}")]
    Validation(String),

    #[error("transient backend failure: {0}")]
    Transient(String),

    #[error("fatal backend failure: {0}")]
    Fatal(String),
}

impl BackendError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }
}
