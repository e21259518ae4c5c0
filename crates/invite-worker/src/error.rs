//! Worker error types.

use thiserror::Error;

use invite_media::MediaError;
use invite_models::{StyleParseError, TemplateError};
use invite_style::StyleError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported style: {0}")]
    UnsupportedStyle(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(#[from] TemplateError),

    #[error("Template catalog could not be loaded: {0}")]
    CatalogLoad(String),

    #[error("Scene '{scene_id}' failed to render: {source}")]
    SceneRender {
        scene_id: String,
        #[source]
        source: MediaError,
    },

    #[error("Clip {index} has format {found}, expected {expected}")]
    IncompatibleClipFormat {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Composition failed: {0}")]
    Composition(#[source] MediaError),

    #[error("Enhancement failed: {0}")]
    Enhancement(String),

    #[error("Style transfer failed: {0}")]
    Style(#[from] StyleError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job already exists: {0}")]
    DuplicateJob(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StyleParseError> for WorkerError {
    fn from(e: StyleParseError) -> Self {
        Self::UnsupportedStyle(e.0)
    }
}

impl WorkerError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn enhancement(msg: impl Into<String>) -> Self {
        Self::Enhancement(msg.into())
    }

    pub fn scene_render(scene_id: impl Into<String>, source: MediaError) -> Self {
        Self::SceneRender {
            scene_id: scene_id.into(),
            source,
        }
    }

    /// Errors reported synchronously by `submit`; no job is created.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            WorkerError::TemplateNotFound(_)
                | WorkerError::InvalidRequest(_)
                | WorkerError::UnsupportedStyle(_)
                | WorkerError::InvalidTemplate(_)
        )
    }

    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::TemplateNotFound(_) => "template_not_found",
            WorkerError::InvalidRequest(_) => "invalid_request",
            WorkerError::UnsupportedStyle(_) => "unsupported_style",
            WorkerError::InvalidTemplate(_) => "invalid_template",
            WorkerError::CatalogLoad(_) => "catalog_load",
            WorkerError::SceneRender { .. } => "scene_render",
            WorkerError::IncompatibleClipFormat { .. } => "incompatible_clip_format",
            WorkerError::Composition(_) => "composition",
            WorkerError::Enhancement(_) => "enhancement",
            WorkerError::Style(StyleError::Timeout(_)) => "style_timeout",
            WorkerError::Style(_) => "style_unavailable",
            WorkerError::Media(_) => "media",
            WorkerError::JobNotFound(_) => "job_not_found",
            WorkerError::DuplicateJob(_) => "duplicate_job",
            WorkerError::Io(_) => "io",
        }
    }
}
