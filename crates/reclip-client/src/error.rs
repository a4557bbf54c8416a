//! Client error types.

use reclip_models::{JobId, RemoteUrlError, UploadValidationError};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got an answer (connect, timeout, reset).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with an error envelope.
    #[error("{0}")]
    Server(String),

    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(#[from] RemoteUrlError),

    #[error("Job {job_id} failed: {reason}")]
    JobFailed { job_id: JobId, reason: String },

    #[error("Job {job_id} abandoned after {attempts} unsuccessful polls")]
    PollLimitExceeded { job_id: JobId, attempts: u32 },

    #[error("Job {0} was cancelled")]
    Cancelled(JobId),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl ClientError {
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True if the transport itself failed and no server answer exists.
    ///
    /// Only these errors may be replayed on the in-memory provider; server
    /// error envelopes are never masked.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// True if a poll that failed this way should simply be tried again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::Json(_) | ClientError::Server(_)
        )
    }
}

impl From<UploadValidationError> for ClientError {
    fn from(err: UploadValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}
