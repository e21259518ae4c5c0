//! Structured job logging utilities.
//!
//! Every job lifecycle event carries `job_id` and `operation` as fields so
//! one job can be followed through interleaved concurrent output.

use tracing::{error, info, warn, Span};

use invite_models::JobId;

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a logger for a job and operation (e.g. "generate_video").
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of a job operation.
    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    /// Log a stage checkpoint.
    pub fn log_progress(&self, stage: &str, progress: u8, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            stage = stage,
            progress = progress,
            "Job progress: {}", message
        );
    }

    /// Log a locally handled problem.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Log a pipeline-fatal error with the stage it happened in.
    pub fn log_error(&self, stage: &str, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            stage = stage,
            "Job error: {}", message
        );
    }

    /// Log the completion of a job operation.
    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}
