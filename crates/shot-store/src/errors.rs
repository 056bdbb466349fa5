use flowdeck_core_types::FlowdeckError;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum ShotErrKind {
    #[error("shot not found")]
    NotFound,
    #[error("shot corrupt")]
    Corrupt,
    #[error("io failure: {0}")]
    IoFailed(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Debug, Error)]
#[error(transparent)]
pub struct ShotError(pub ShotErrKind);

impl ShotError {
    pub fn new(kind: ShotErrKind) -> Self {
        Self(kind)
    }

    pub fn kind(&self) -> &ShotErrKind {
        &self.0
    }
}

impl From<ShotErrKind> for ShotError {
    fn from(kind: ShotErrKind) -> Self {
        ShotError(kind)
    }
}

impl From<std::io::Error> for ShotError {
    fn from(err: std::io::Error) -> Self {
        ShotError(ShotErrKind::IoFailed(err.to_string()))
    }
}

impl From<ShotError> for FlowdeckError {
    fn from(value: ShotError) -> Self {
        FlowdeckError::new(value.to_string())
    }
}
