//! Post-composition effects: fades and background music.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs;
use tracing::{debug, info};

use invite_media::fs_utils::remove_file_best_effort;
use invite_media::{FadeSpec, MediaError, MediaResult, Transcoder};
use invite_models::Customization;

use crate::error::{WorkerError, WorkerResult};

pub struct Enhancer {
    transcoder: Arc<dyn Transcoder>,
    fade_seconds: f64,
    timeout: Duration,
}

impl Enhancer {
    pub fn new(transcoder: Arc<dyn Transcoder>, fade_seconds: f64, timeout: Duration) -> Self {
        Self {
            transcoder,
            fade_seconds,
            timeout,
        }
    }

    /// Apply fades and music to `base`, writing a new file in `work_dir`.
    ///
    /// `base` is never modified. With neither effect requested the result is
    /// a stream copy of `base`.
    pub async fn enhance(
        &self,
        base: &Path,
        customization: &Customization,
        work_dir: &Path,
    ) -> WorkerResult<PathBuf> {
        let mut current = base.to_path_buf();
        let mut intermediate: Option<PathBuf> = None;

        if customization.fades_enabled() && self.fade_seconds > 0.0 {
            let info = self
                .bounded(self.transcoder.probe(base))
                .await
                .map_err(|e| WorkerError::enhancement(format!("probe failed: {e}")))?;

            let faded = work_dir.join("faded.mp4");
            let fades = FadeSpec {
                fade_in: self.fade_seconds,
                fade_out: self.fade_seconds,
                total_duration: info.duration,
            };
            debug!(fade_seconds = self.fade_seconds, duration = info.duration, "Applying fades");

            self.run_step(self.transcoder.apply_fades(&current, &faded, &fades), &faded, "fade")
                .await?;
            current = faded.clone();
            intermediate = Some(faded);
        }

        if let Some(music) = &customization.background_music {
            if !fs::try_exists(music).await.unwrap_or(false) {
                return Err(WorkerError::enhancement(format!(
                    "background music not found: {}",
                    music.display()
                )));
            }

            let enhanced = work_dir.join("enhanced.mp4");
            self.run_step(self.transcoder.mux_audio(&current, music, &enhanced), &enhanced, "audio mux")
                .await?;
            current = enhanced;
        }

        if current == base {
            let enhanced = work_dir.join("enhanced.mp4");
            self.run_step(self.transcoder.remux(base, &enhanced), &enhanced, "remux")
                .await?;
            current = enhanced;
        }

        if let Some(path) = intermediate.filter(|p| *p != current) {
            remove_file_best_effort(&path).await;
        }

        info!(output = %current.display(), "Enhancement complete");
        Ok(current)
    }

    async fn bounded<T>(&self, op: impl Future<Output = MediaResult<T>>) -> MediaResult<T> {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(MediaError::Timeout(self.timeout.as_secs())),
        }
    }

    async fn run_step(
        &self,
        op: impl Future<Output = MediaResult<()>>,
        output: &Path,
        step: &str,
    ) -> WorkerResult<()> {
        if let Err(e) = self.bounded(op).await {
            remove_file_best_effort(output).await;
            return Err(WorkerError::enhancement(format!("{step} failed: {e}")));
        }
        Ok(())
    }
}
