//! Shared data models for the invitation video generator.
//!
//! This crate provides Serde-serializable types for:
//! - Templates, scenes and their text/media elements
//! - Project data and placeholder resolution
//! - Generation requests and job status
//! - Style tags and render profile

pub mod encoding;
pub mod job;
pub mod media;
pub mod project;
pub mod request;
pub mod style;
pub mod template;

// Re-export common types
pub use encoding::RenderProfile;
pub use job::{GenerationJob, JobId, JobResult, JobStatus, PipelineStage, StyleOutcome};
pub use media::{MediaFile, MediaKind};
pub use project::{
    referenced_keys, resolve_placeholders, wrap_text, PlaceholderPolicy, ProjectData,
    PLACEHOLDER_KEYS,
};
pub use request::{Customization, GenerationRequest};
pub use style::{StyleParseError, StyleTag};
pub use template::{
    Background, MediaElement, Scene, Template, TemplateError, TemplateSummary, TextAlign,
    TextElement,
};
