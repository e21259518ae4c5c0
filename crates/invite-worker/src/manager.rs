//! Job manager: request admission and status queries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use validator::Validate;

use invite_media::fs_utils::sanitize_path_component;
use invite_media::Transcoder;
use invite_models::{GenerationJob, GenerationRequest, JobId, PlaceholderPolicy, StyleTag, Template};
use invite_style::StyleAdapter;

use crate::catalog::TemplateCatalog;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::pipeline::{Pipeline, PipelineJob};
use crate::store::JobStore;

const DEFAULT_SESSION: &str = "default";

/// Accepts generation requests and runs each one as an independent task.
///
/// At most `max_concurrent_jobs` pipelines run at once; the rest wait in
/// `queued` for a permit.
pub struct JobManager {
    config: Arc<WorkerConfig>,
    catalog: Arc<dyn TemplateCatalog>,
    store: Arc<JobStore>,
    pipeline: Arc<Pipeline>,
    job_semaphore: Arc<Semaphore>,
}

impl JobManager {
    pub fn new(
        config: WorkerConfig,
        catalog: Arc<dyn TemplateCatalog>,
        transcoder: Arc<dyn Transcoder>,
        style_adapter: Option<Arc<dyn StyleAdapter>>,
    ) -> Self {
        let config = Arc::new(config.normalized());
        let store = Arc::new(JobStore::new());
        let pipeline = Arc::new(Pipeline::new(
            config.clone(),
            store.clone(),
            transcoder,
            style_adapter,
        ));
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));

        Self {
            config,
            catalog,
            store,
            pipeline,
            job_semaphore,
        }
    }

    /// Validate `request`, record a queued job and start its pipeline.
    ///
    /// Rejected requests create no job.
    pub async fn submit(&self, request: GenerationRequest) -> WorkerResult<JobId> {
        let template_id = request.template_id.clone();
        self.admit(request).await.inspect_err(|e| {
            if e.is_rejection() {
                metrics::record_job_rejected(e.kind());
                warn!(template_id = %template_id, error = %e, "Generation request rejected");
            }
        })
    }

    async fn admit(&self, request: GenerationRequest) -> WorkerResult<JobId> {
        request
            .validate()
            .map_err(|e| WorkerError::invalid_request(e.to_string()))?;

        let template = self
            .catalog
            .get(&request.template_id)
            .ok_or_else(|| WorkerError::TemplateNotFound(request.template_id.clone()))?;
        let style: StyleTag = request.style.parse()?;

        if self.config.placeholder_policy == PlaceholderPolicy::Strict {
            check_required_fields(&template, &request)?;
        }

        let id = JobId::new();
        let session = sanitize_path_component(&request.session_id, DEFAULT_SESSION);
        self.store
            .insert(GenerationJob::new(id.clone(), &template.id, &session))
            .await?;
        metrics::record_job_submitted(&template.id);
        info!(job_id = %id, template_id = %template.id, style = %style, "Generation job queued");

        let job = PipelineJob {
            id: id.clone(),
            template,
            request,
            style,
            session,
        };
        self.spawn(job);

        Ok(id)
    }

    fn spawn(&self, job: PipelineJob) {
        let store = Arc::clone(&self.store);
        let pipeline = Arc::clone(&self.pipeline);
        let semaphore = Arc::clone(&self.job_semaphore);
        let max_jobs = self.config.max_concurrent_jobs;

        tokio::spawn(async move {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(job_id = %job.id, "Job semaphore closed");
                    let _ = store.fail(&job.id, "worker shutting down").await;
                    return;
                }
            };
            metrics::set_jobs_running(max_jobs.saturating_sub(semaphore.available_permits()));

            match store.begin(&job.id).await {
                Ok(true) => pipeline.run(job).await,
                Ok(false) => debug!(job_id = %job.id, "Job already claimed, skipping"),
                Err(e) => warn!(job_id = %job.id, "Cannot start job: {}", e),
            }

            drop(permit);
            metrics::set_jobs_running(max_jobs.saturating_sub(semaphore.available_permits()));
        });
    }

    /// Current snapshot of a job. Reading has no side effects.
    pub async fn get_status(&self, id: &JobId) -> Option<GenerationJob> {
        self.store.get(id).await
    }

    /// Poll until the job is terminal.
    pub async fn wait_for(&self, id: &JobId, interval: Duration) -> Option<GenerationJob> {
        loop {
            let job = self.store.get(id).await?;
            if job.is_terminal() {
                return Some(job);
            }
            tokio::time::sleep(interval).await;
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<dyn TemplateCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}

/// Reject a request whose template shows a placeholder left empty.
fn check_required_fields(template: &Template, request: &GenerationRequest) -> WorkerResult<()> {
    let mut missing: Vec<&str> = Vec::new();
    for element in template.scenes.iter().flat_map(|s| &s.text_elements) {
        for key in request.text.empty_references(&element.content) {
            if !missing.contains(&key) {
                missing.push(key);
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(WorkerError::invalid_request(format!(
            "template '{}' needs values for: {}",
            template.id,
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use invite_media::FfmpegTranscoder;
    use invite_models::{ProjectData, RenderProfile};

    fn manager(policy: PlaceholderPolicy) -> JobManager {
        let config = WorkerConfig {
            placeholder_policy: policy,
            ..Default::default()
        };
        JobManager::new(
            config,
            Arc::new(InMemoryCatalog::builtin().unwrap()),
            Arc::new(FfmpegTranscoder::new(RenderProfile::default())),
            None,
        )
    }

    #[tokio::test]
    async fn test_unknown_template_creates_no_job() {
        let manager = manager(PlaceholderPolicy::Lenient);
        let err = manager
            .submit(GenerationRequest::new("does-not-exist"))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::TemplateNotFound(ref id) if id == "does-not-exist"));
        assert!(manager.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_unsupported_style_rejected() {
        let manager = manager(PlaceholderPolicy::Lenient);
        let request = GenerationRequest::new("elegant-engagement").with_style("pixel-art");

        let err = manager.submit(request).await.unwrap_err();
        assert!(matches!(err, WorkerError::UnsupportedStyle(_)));
        assert!(manager.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_template_id_is_not_found() {
        let manager = manager(PlaceholderPolicy::Lenient);
        let err = manager.submit(GenerationRequest::new("")).await.unwrap_err();
        assert!(matches!(err, WorkerError::TemplateNotFound(ref id) if id.is_empty()));
        assert!(manager.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_strict_policy_lists_missing_fields() {
        let manager = manager(PlaceholderPolicy::Strict);
        let request = GenerationRequest::new("elegant-engagement").with_text(ProjectData {
            bride: "Ann".into(),
            groom: "Ben".into(),
            ..Default::default()
        });

        let err = manager.submit(request).await.unwrap_err();
        match err {
            WorkerError::InvalidRequest(msg) => {
                assert!(msg.contains("date"));
                assert!(!msg.contains("bride"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_session_sanitized() {
        assert_eq!(sanitize_path_component("", DEFAULT_SESSION), "default");
        assert_eq!(sanitize_path_component("../etc", DEFAULT_SESSION), "___etc");
    }
}
