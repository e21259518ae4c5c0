//! Style client error types.

use thiserror::Error;

pub type StyleResult<T> = Result<T, StyleError>;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("Style service unavailable: {0}")]
    Unavailable(String),

    #[error("Style transfer timed out after {0} seconds")]
    Timeout(u64),

    #[error("Style not supported by provider: {0}")]
    Unsupported(String),

    #[error("Style request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StyleError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StyleError::Unavailable(_) | StyleError::Timeout(_) | StyleError::Network(_)
        )
    }

    /// Classify a transport error.
    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            StyleError::Timeout(timeout_secs)
        } else if err.is_connect() {
            StyleError::Unavailable(err.to_string())
        } else {
            StyleError::Network(err)
        }
    }
}
