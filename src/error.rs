use thiserror::Error;

/// Failures surfaced by the scenario service.
///
/// Every variant maps to exactly one HTTP status in the api layer.
#[derive(Error, Debug)]
pub enum RoiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidId(String),

    #[error("Scenario store unavailable: {0}")]
    StoreUnavailable(String),
}

impl RoiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Failures raised by a repository backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store operation timed out")]
    Timeout,

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Scenario {0} already exists")]
    Conflict(String),
}

impl From<StoreError> for RoiError {
    fn from(err: StoreError) -> Self {
        RoiError::StoreUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RoiError>;
