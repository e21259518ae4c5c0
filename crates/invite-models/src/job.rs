//! Generation job state and result types.
//!
//! A job is in exactly one [`JobStatus`] at a time. `result` and `error` are
//! mutually exclusive and each implies a terminal status. Transitions are
//! only made through the methods on [`GenerationJob`], which reject moves out
//! of a terminal state.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::style::StyleTag;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Externally visible job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, pipeline not started yet
    #[default]
    Queued,
    /// Pipeline running
    Processing,
    /// Video produced
    Completed,
    /// Pipeline stopped with an error
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finer-grained pipeline position, one per state machine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    #[default]
    Queued,
    LoadingTemplate,
    ProcessingMedia,
    Rendering,
    Composing,
    Enhancing,
    Styling,
    Completed,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Queued => "queued",
            PipelineStage::LoadingTemplate => "loading_template",
            PipelineStage::ProcessingMedia => "processing_media",
            PipelineStage::Rendering => "rendering",
            PipelineStage::Composing => "composing",
            PipelineStage::Enhancing => "enhancing",
            PipelineStage::Styling => "styling",
            PipelineStage::Completed => "completed",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to the style-transfer step of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StyleOutcome {
    /// The request asked for the default look
    #[default]
    NotRequested,
    /// The output is the styled video
    Applied { style: StyleTag },
    /// Styling failed and the unstyled video was kept
    Skipped { style: StyleTag, reason: String },
}

impl StyleOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, StyleOutcome::Skipped { .. })
    }
}

/// Final artifact of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobResult {
    /// Artifact ID (same as the job ID)
    pub id: String,
    /// Path on disk
    pub path: PathBuf,
    /// Public URL under the output prefix
    pub url: String,
    pub duration_seconds: f64,
    pub size_bytes: u64,
    /// Container format, always "mp4"
    pub format: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub style: StyleOutcome,
}

/// One generation job as seen by polling clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationJob {
    pub id: JobId,
    pub template_id: String,
    pub session_id: String,
    pub status: JobStatus,
    pub stage: PipelineStage,
    /// 0-100, non-decreasing while processing
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Non-fatal issues handled during the run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Monotonic update counter
    pub event_seq: u64,
}

impl GenerationJob {
    /// Create a queued job.
    pub fn new(id: JobId, template_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            template_id: template_id.into(),
            session_id: session_id.into(),
            status: JobStatus::Queued,
            stage: PipelineStage::Queued,
            progress: 0,
            message: Some("Queued".to_string()),
            result: None,
            error: None,
            warnings: Vec::new(),
            created_at: now,
            updated_at: now,
            event_seq: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.event_seq += 1;
    }

    /// Queued -> Processing. Returns false if the job already left `Queued`.
    pub fn start(&mut self) -> bool {
        if self.status != JobStatus::Queued {
            return false;
        }
        self.status = JobStatus::Processing;
        self.stage = PipelineStage::LoadingTemplate;
        self.message = Some("Loading template".to_string());
        self.touch();
        true
    }

    /// Record a checkpoint. Progress never decreases.
    pub fn advance(&mut self, stage: PipelineStage, progress: u8, message: impl Into<String>) -> bool {
        if self.status != JobStatus::Processing {
            return false;
        }
        self.stage = stage;
        self.progress = self.progress.max(progress.min(100));
        self.message = Some(message.into());
        self.touch();
        true
    }

    /// Attach a non-fatal warning.
    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
        self.touch();
    }

    /// Processing -> Completed with a result.
    pub fn complete(&mut self, result: JobResult) -> bool {
        if self.status != JobStatus::Processing {
            return false;
        }
        self.status = JobStatus::Completed;
        self.stage = PipelineStage::Completed;
        self.progress = 100;
        self.message = Some("Video generation complete".to_string());
        self.result = Some(result);
        self.error = None;
        self.touch();
        true
    }

    /// Any non-terminal state -> Failed.
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.stage = PipelineStage::Failed;
        self.message = Some("Video generation failed".to_string());
        self.error = Some(error.into());
        self.result = None;
        self.touch();
        true
    }
}
