//! Style service request/response types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use invite_models::StyleTag;

/// A style-transfer job for one finished video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRequest {
    /// Video to restyle
    pub video_path: PathBuf,
    pub style: StyleTag,
    /// Full provider prompt
    pub prompt: String,
    /// Directory the provider should write into
    pub output_dir: PathBuf,
}

/// Successful response of `POST /v1/style`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleResponse {
    pub output_path: PathBuf,
}

/// Error body returned by the service on 4xx/5xx.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
