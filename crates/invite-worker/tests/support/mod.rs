//! Shared fixtures for worker integration tests.
//!
//! [`FakeTranscoder`] writes small JSON documents instead of real videos so
//! the full pipeline can run without ffmpeg.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::fs;

use invite_media::{FadeSpec, MediaError, MediaResult, SceneSpec, Transcoder, VideoInfo};
use invite_models::{GenerationJob, JobId, StyleTag};
use invite_style::{StyleAdapter, StyleError, StyleRequest, StyleResult};
use invite_worker::{InMemoryCatalog, JobManager, WorkerConfig};

/// Stand-in for a video file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FakeVideo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: String,
    pub duration: f64,
    pub has_audio: bool,
    pub fades: bool,
    pub scenes: Vec<String>,
    pub overlays: usize,
    pub texts: Vec<String>,
    pub styled: Option<StyleTag>,
}

impl FakeVideo {
    pub async fn read(path: &Path) -> MediaResult<Self> {
        let body = fs::read_to_string(path)
            .await
            .map_err(|_| MediaError::FileNotFound(path.to_path_buf()))?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn write(&self, path: &Path) -> MediaResult<()> {
        fs::write(path, serde_json::to_vec(self)?).await?;
        Ok(())
    }
}

/// [`Transcoder`] producing [`FakeVideo`] files.
#[derive(Debug, Default)]
pub struct FakeTranscoder {
    /// Scene rendered at 1280x720 instead of 1920x1080
    pub mismatch_scene: Option<String>,
    /// Scene whose render fails
    pub fail_scene: Option<String>,
    pub render_delay: Duration,
    /// Probes of the published video never return
    pub stall_output_probe: bool,
    renders: AtomicUsize,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mismatch(mut self, scene_id: &str) -> Self {
        self.mismatch_scene = Some(scene_id.to_string());
        self
    }

    pub fn with_failure(mut self, scene_id: &str) -> Self {
        self.fail_scene = Some(scene_id.to_string());
        self
    }

    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    pub fn with_stalled_output_probe(mut self) -> Self {
        self.stall_output_probe = true;
        self
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn render_scene(&self, spec: &SceneSpec, output: &Path) -> MediaResult<()> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if !self.render_delay.is_zero() {
            tokio::time::sleep(self.render_delay).await;
        }
        if self.fail_scene.as_deref() == Some(spec.scene_id.as_str()) {
            return Err(MediaError::ffmpeg_failed("drawtext failed", None, Some(1)));
        }

        let (width, height) = if self.mismatch_scene.as_deref() == Some(spec.scene_id.as_str()) {
            (1280, 720)
        } else {
            (1920, 1080)
        };

        FakeVideo {
            width,
            height,
            fps: 30.0,
            codec: "h264".into(),
            duration: spec.duration,
            has_audio: false,
            fades: false,
            scenes: vec![spec.scene_id.clone()],
            overlays: spec.overlays.len(),
            texts: spec.texts.iter().map(|t| t.text.clone()).collect(),
            styled: None,
        }
        .write(output)
        .await
    }

    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if self.stall_output_probe && !name.starts_with("scene_") && name != "base.mp4" {
            std::future::pending::<()>().await;
        }
        let video = FakeVideo::read(path).await?;
        let size = fs::metadata(path).await?.len();
        Ok(VideoInfo {
            duration: video.duration,
            width: video.width,
            height: video.height,
            fps: video.fps,
            codec: video.codec,
            has_audio: video.has_audio,
            size,
        })
    }

    async fn concat(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()> {
        let mut joined: Option<FakeVideo> = None;
        for clip in clips {
            let video = FakeVideo::read(clip).await?;
            match joined.as_mut() {
                None => joined = Some(video),
                Some(acc) => {
                    acc.duration += video.duration;
                    acc.overlays += video.overlays;
                    acc.scenes.extend(video.scenes);
                    acc.texts.extend(video.texts);
                }
            }
        }
        let joined = joined.ok_or_else(|| MediaError::invalid_argument("nothing to concatenate"))?;
        joined.write(output).await
    }

    async fn apply_fades(&self, input: &Path, output: &Path, _fades: &FadeSpec) -> MediaResult<()> {
        let mut video = FakeVideo::read(input).await?;
        video.fades = true;
        video.write(output).await
    }

    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
        if !audio.exists() {
            return Err(MediaError::FileNotFound(audio.to_path_buf()));
        }
        let mut muxed = FakeVideo::read(video).await?;
        muxed.has_audio = true;
        muxed.write(output).await
    }

    async fn remux(&self, input: &Path, output: &Path) -> MediaResult<()> {
        let mut video = FakeVideo::read(input).await?;
        video.has_audio = false;
        video.write(output).await
    }
}

mock! {
    pub Styler {}

    #[async_trait]
    impl StyleAdapter for Styler {
        async fn apply_style(&self, request: &StyleRequest) -> StyleResult<PathBuf>;
    }
}

/// Restyle a [`FakeVideo`] into the request's output directory.
pub fn fake_style(request: &StyleRequest) -> StyleResult<PathBuf> {
    let body = std::fs::read_to_string(&request.video_path)
        .map_err(|e| StyleError::RequestFailed(e.to_string()))?;
    let mut video: FakeVideo = serde_json::from_str(&body)?;
    video.styled = Some(request.style);

    let output = request.output_dir.join("styled.mp4");
    std::fs::write(&output, serde_json::to_vec(&video)?)
        .map_err(|e| StyleError::RequestFailed(e.to_string()))?;
    Ok(output)
}

/// Adapter that never answers in time.
pub struct HangingStyler;

#[async_trait]
impl StyleAdapter for HangingStyler {
    async fn apply_style(&self, _request: &StyleRequest) -> StyleResult<PathBuf> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(StyleError::Unavailable("unreachable".into()))
    }
}

/// Config rooted in a temporary directory.
pub fn test_config(dir: &TempDir) -> WorkerConfig {
    WorkerConfig {
        output_root: dir.path().join("outputs"),
        assets_dir: dir.path().join("assets"),
        ..Default::default()
    }
}

pub fn test_manager(
    config: WorkerConfig,
    transcoder: Arc<FakeTranscoder>,
    style_adapter: Option<Arc<dyn StyleAdapter>>,
) -> JobManager {
    let catalog = InMemoryCatalog::builtin().expect("built-in templates");
    JobManager::new(config, Arc::new(catalog), transcoder, style_adapter)
}

/// Poll until the job is terminal, failing the test after ten seconds.
pub async fn wait_terminal(manager: &JobManager, id: &JobId) -> GenerationJob {
    tokio::time::timeout(
        Duration::from_secs(10),
        manager.wait_for(id, Duration::from_millis(5)),
    )
    .await
    .expect("job did not finish in time")
    .expect("job exists")
}
