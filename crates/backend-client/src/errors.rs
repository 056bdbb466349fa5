//! Client error types and retry classification

use flow_exec::BackendError;
use thiserror::Error;

/// Transport-level client failure.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configured base URL is unusable
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    /// Connection-level failure before any response arrived
    #[error("request failed: {0}")]
    Http(String),

    /// The per-request timeout elapsed
    #[error("request timed out")]
    Timeout,

    /// Non-success HTTP status from the backend
    #[error("backend returned {code}: {message}")]
    Status { code: u16, message: String },

    /// The response body did not match the expected shape
    #[error("response decode failed: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Http(err.to_string())
        }
    }

    /// Classification consumed by the executor's retry loop: network
    /// failures, timeouts, 408/429 and 5xx are transient; any other status
    /// means the request itself is wrong and retrying cannot help.
    pub fn into_backend_error(self) -> BackendError {
        match self {
            ClientError::Http(message) => BackendError::Transient(message),
            ClientError::Timeout => BackendError::Transient("request timed out".into()),
            ClientError::Status { code, message } if retryable_status(code) => {
                BackendError::Transient(format!("HTTP {code}: {message}"))
            }
            ClientError::Status { code, message } => {
                BackendError::Validation(format!("HTTP {code}: {message}"))
            }
            ClientError::Decode(message) => BackendError::Fatal(message),
            ClientError::InvalidBaseUrl(message) => BackendError::Fatal(message),
        }
    }
}

fn retryable_status(code: u16) -> bool {
    code == 408 || code == 429 || code >= 500
}
