//! Per-job generation pipeline.
//!
//! One run drives a job through
//! `queued -> loading template -> processing media -> rendering -> composing
//! -> enhancing -> styling? -> completed | failed`, publishing each transition
//! to the [`JobStore`]. Stages run strictly in sequence; only scene rendering
//! fans out internally.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::fs;
use tracing::Instrument;

use invite_media::fs_utils::{move_file, remove_dir_best_effort, remove_file_best_effort};
use invite_media::{MediaError, Transcoder};
use invite_models::{GenerationRequest, JobId, JobResult, PipelineStage, StyleOutcome, StyleTag, Template};
use invite_style::StyleAdapter;

use crate::compositor::Compositor;
use crate::config::WorkerConfig;
use crate::enhancer::Enhancer;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::media::MediaLibrary;
use crate::metrics;
use crate::renderer::SceneRenderer;
use crate::store::JobStore;
use crate::styling::StyleStage;

/// Everything a pipeline run needs, fixed at submit time.
#[derive(Debug, Clone)]
pub struct PipelineJob {
    pub id: JobId,
    /// Snapshot taken at submit; later catalog updates do not reach the run
    pub template: Arc<Template>,
    pub request: GenerationRequest,
    pub style: StyleTag,
    /// Sanitized session directory name
    pub session: String,
}

pub struct Pipeline {
    config: Arc<WorkerConfig>,
    store: Arc<JobStore>,
    transcoder: Arc<dyn Transcoder>,
    renderer: SceneRenderer,
    compositor: Compositor,
    enhancer: Enhancer,
    styler: StyleStage,
}

impl Pipeline {
    pub fn new(
        config: Arc<WorkerConfig>,
        store: Arc<JobStore>,
        transcoder: Arc<dyn Transcoder>,
        style_adapter: Option<Arc<dyn StyleAdapter>>,
    ) -> Self {
        Self {
            renderer: SceneRenderer::new(transcoder.clone(), &config),
            compositor: Compositor::new(transcoder.clone(), config.concat_timeout),
            enhancer: Enhancer::new(transcoder.clone(), config.fade_seconds, config.enhance_timeout),
            styler: StyleStage::new(style_adapter, config.style_timeout, config.style_failure_policy),
            config,
            store,
            transcoder,
        }
    }

    /// Run a job that has already been claimed with [`JobStore::begin`].
    ///
    /// Never returns an error: the outcome is recorded on the job.
    pub async fn run(&self, job: PipelineJob) {
        let logger = JobLogger::new(&job.id, "generate_video");
        let span = logger.create_span();

        async {
            logger.log_start(&job.template.id);
            let work_dir = work_dir(&self.config, &job.session, &job.id);

            match self.execute(&job, &logger, &work_dir).await {
                Ok(result) => {
                    remove_dir_best_effort(&work_dir).await;
                    let url = result.url.clone();
                    if let Err(e) = self.store.complete(&job.id, result).await {
                        logger.log_error(PipelineStage::Completed.as_str(), &e.to_string());
                        return;
                    }
                    metrics::record_job_finished("completed");
                    logger.log_completion(&url);
                }
                Err(e) => {
                    let stage = self
                        .store
                        .get(&job.id)
                        .await
                        .map(|j| j.stage)
                        .unwrap_or(PipelineStage::Failed);
                    logger.log_error(stage.as_str(), &e.to_string());

                    if !self.config.keep_failed_artifacts {
                        remove_dir_best_effort(&work_dir).await;
                    }
                    if let Err(store_err) = self.store.fail(&job.id, e.to_string()).await {
                        logger.log_error(stage.as_str(), &store_err.to_string());
                    }
                    metrics::record_job_finished(e.kind());
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        job: &PipelineJob,
        logger: &JobLogger,
        work_dir: &Path,
    ) -> WorkerResult<JobResult> {
        let request = &job.request;
        let template = job.template.as_ref();

        fs::create_dir_all(work_dir).await?;
        self.checkpoint(job, logger, PipelineStage::LoadingTemplate, 20, "Template loaded")
            .await?;

        // Media
        let started = Instant::now();
        let classified = MediaLibrary::classify(&request.media_files).await;
        for warning in &classified.skipped {
            self.warn(job, logger, warning).await?;
        }
        let slots = classified.library.assign_slots(template);
        metrics::record_stage_duration(PipelineStage::ProcessingMedia.as_str(), started.elapsed().as_secs_f64());
        self.checkpoint(job, logger, PipelineStage::ProcessingMedia, 40, "Media processed")
            .await?;

        // Scenes
        let started = Instant::now();
        let message = format!("Rendering {} scenes", template.scenes.len());
        self.checkpoint(job, logger, PipelineStage::Rendering, 40, &message)
            .await?;
        let rendered = self
            .renderer
            .render_template(template, &request.text, &slots, work_dir)
            .await?;
        for warning in &rendered.warnings {
            self.warn(job, logger, warning).await?;
        }
        metrics::record_stage_duration(PipelineStage::Rendering.as_str(), started.elapsed().as_secs_f64());

        // Base video
        let started = Instant::now();
        self.checkpoint(job, logger, PipelineStage::Composing, 40, "Concatenating scenes")
            .await?;
        let base = self
            .compositor
            .concat(&rendered.clips, &work_dir.join("base.mp4"))
            .await?;
        metrics::record_stage_duration(PipelineStage::Composing.as_str(), started.elapsed().as_secs_f64());
        self.checkpoint(job, logger, PipelineStage::Enhancing, 60, "Base video created")
            .await?;

        // Effects
        let started = Instant::now();
        let enhanced = self
            .enhancer
            .enhance(&base, &request.customization, work_dir)
            .await?;
        metrics::record_stage_duration(PipelineStage::Enhancing.as_str(), started.elapsed().as_secs_f64());

        // Style
        let mut final_video = enhanced.clone();
        let mut style_outcome = StyleOutcome::NotRequested;
        if !job.style.is_default() {
            let started = Instant::now();
            // Without an adapter the style is skipped, so no styling progress is shown
            if self.styler.has_adapter() {
                self.checkpoint(job, logger, PipelineStage::Styling, 80, "Effects applied")
                    .await?;
            }
            let styled = self
                .styler
                .apply(
                    &enhanced,
                    job.style,
                    request.customization.style_prompt.as_deref(),
                    work_dir,
                )
                .await?;
            if let StyleOutcome::Skipped { reason, .. } = &styled.outcome {
                metrics::record_style_fallback(job.style.as_str());
                self.warn(job, logger, &format!("Style '{}' not applied: {}", job.style, reason))
                    .await?;
            }
            metrics::record_stage_duration(PipelineStage::Styling.as_str(), started.elapsed().as_secs_f64());
            final_video = styled.path;
            style_outcome = styled.outcome;
        }

        let output = output_path(&self.config, &job.session, &job.id);
        self.publish(job, &final_video, &output, style_outcome).await
    }

    /// Move the finished video into place and describe it.
    async fn publish(
        &self,
        job: &PipelineJob,
        source: &Path,
        output: &Path,
        style: StyleOutcome,
    ) -> WorkerResult<JobResult> {
        move_file(source, output).await?;

        let probe_timeout = self.config.enhance_timeout;
        let described = async {
            let info = tokio::time::timeout(probe_timeout, self.transcoder.probe(output))
                .await
                .map_err(|_| MediaError::Timeout(probe_timeout.as_secs()))??;
            let size = fs::metadata(output).await?.len();
            Ok::<_, WorkerError>((info.duration, size))
        }
        .await;

        let (duration_seconds, size_bytes) = match described {
            Ok(d) => d,
            Err(e) => {
                remove_file_best_effort(output).await;
                return Err(e);
            }
        };

        Ok(JobResult {
            id: job.id.to_string(),
            path: output.to_path_buf(),
            url: self.public_url(&job.session, output),
            duration_seconds,
            size_bytes,
            format: "mp4".to_string(),
            created_at: Utc::now(),
            style,
        })
    }

    fn public_url(&self, session: &str, output: &Path) -> String {
        let file_name = output
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        format!(
            "{}/{}/{}",
            self.config.public_url_prefix.trim_end_matches('/'),
            session,
            file_name
        )
    }

    async fn checkpoint(
        &self,
        job: &PipelineJob,
        logger: &JobLogger,
        stage: PipelineStage,
        progress: u8,
        message: &str,
    ) -> WorkerResult<()> {
        logger.log_progress(stage.as_str(), progress, message);
        self.store.advance(&job.id, stage, progress, message).await
    }

    async fn warn(&self, job: &PipelineJob, logger: &JobLogger, warning: &str) -> WorkerResult<()> {
        logger.log_warning(warning);
        self.store.warn(&job.id, warning).await
    }
}

/// Scratch directory owned by one job run.
pub fn work_dir(config: &WorkerConfig, session: &str, id: &JobId) -> PathBuf {
    config.output_root.join(session).join(id.as_str())
}

/// Final output location of a job.
pub fn output_path(config: &WorkerConfig, session: &str, id: &JobId) -> PathBuf {
    config.output_root.join(session).join(format!("{}.mp4", id))
}
