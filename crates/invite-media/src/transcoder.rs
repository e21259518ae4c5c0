//! Media-processing capability used by the generation pipeline.
//!
//! [`Transcoder`] is the seam between pipeline logic and the external ffmpeg
//! process. [`FfmpegTranscoder`] shells out; tests substitute their own.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use invite_models::RenderProfile;

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::fade_filter;
use crate::fs_utils::{concat_list_contents, remove_file_best_effort};
use crate::probe::{probe_video, VideoInfo};
use crate::scene::{build_scene_command, text_file_paths, SceneSpec};

/// Fade parameters for a whole video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSpec {
    pub fade_in: f64,
    pub fade_out: f64,
    /// Length of the video being faded
    pub total_duration: f64,
}

/// Video operations needed to turn scenes into a finished video.
///
/// Every method writes a new file at `output` and never modifies its inputs.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Render one scene into a clip of exactly `spec.duration` seconds.
    async fn render_scene(&self, spec: &SceneSpec, output: &Path) -> MediaResult<()>;

    /// Inspect a media file.
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;

    /// Join clips in the given order without re-encoding.
    async fn concat(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()>;

    /// Re-encode `input` with a fade-in and fade-out.
    async fn apply_fades(&self, input: &Path, output: &Path, fades: &FadeSpec) -> MediaResult<()>;

    /// Replace the audio of `video` with `audio`, cut to the video length.
    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()>;

    /// Copy the video stream of `input` into a new container without audio.
    async fn remux(&self, input: &Path, output: &Path) -> MediaResult<()>;
}

/// [`Transcoder`] backed by the ffmpeg and ffprobe binaries.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    profile: RenderProfile,
    runner: FfmpegRunner,
}

impl FfmpegTranscoder {
    pub fn new(profile: RenderProfile) -> Self {
        Self {
            profile,
            runner: FfmpegRunner::new(),
        }
    }

    /// Kill any single ffmpeg process running longer than `secs`.
    pub fn with_process_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    pub fn profile(&self) -> &RenderProfile {
        &self.profile
    }

    /// Run `cmd`, removing a partially written output on failure.
    async fn run_to(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let result = self.runner.run(cmd).await;
        if result.is_err() {
            remove_file_best_effort(cmd.output_path()).await;
        }
        result
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn render_scene(&self, spec: &SceneSpec, output: &Path) -> MediaResult<()> {
        let text_files = text_file_paths(output, spec.texts.len());
        for (text, file) in spec.texts.iter().zip(&text_files) {
            fs::write(file, &text.text).await?;
        }

        let result = match build_scene_command(spec, &text_files, output, &self.profile) {
            Ok(cmd) => self.run_to(&cmd).await,
            Err(e) => Err(e),
        };

        for file in &text_files {
            remove_file_best_effort(file).await;
        }

        debug!(scene_id = %spec.scene_id, ok = result.is_ok(), "Scene render finished");
        result
    }

    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        probe_video(path).await
    }

    async fn concat(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()> {
        if clips.is_empty() {
            return Err(MediaError::invalid_argument("nothing to concatenate"));
        }

        let mut absolute = Vec::with_capacity(clips.len());
        for clip in clips {
            absolute.push(fs::canonicalize(clip).await?);
        }

        let list_path = output.with_extension("concat.txt");
        fs::write(&list_path, concat_list_contents(&absolute)).await?;

        let cmd = FfmpegCommand::new(output)
            .input(FfmpegInput::concat_list(&list_path))
            .copy_streams()
            .faststart();

        let result = self.run_to(&cmd).await;
        remove_file_best_effort(&list_path).await;
        result
    }

    async fn apply_fades(&self, input: &Path, output: &Path, fades: &FadeSpec) -> MediaResult<()> {
        let filter = fade_filter(fades.fade_in, fades.fade_out, fades.total_duration)
            .ok_or_else(|| MediaError::invalid_argument("fade durations are zero"))?;

        let cmd = FfmpegCommand::new(output)
            .input(FfmpegInput::file(input))
            .video_filter(filter)
            .map("0:v:0")
            .map("0:a?")
            .output_args(self.profile.video_args())
            .audio_codec("copy")
            .faststart();

        self.run_to(&cmd).await
    }

    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
        if !audio.exists() {
            return Err(MediaError::FileNotFound(audio.to_path_buf()));
        }

        let cmd = FfmpegCommand::new(output)
            .input(FfmpegInput::file(video))
            .input(FfmpegInput::file(audio))
            .map("0:v:0")
            .map("1:a:0")
            .video_codec("copy")
            .output_args(self.profile.audio_args())
            .shortest()
            .faststart();

        self.run_to(&cmd).await
    }

    async fn remux(&self, input: &Path, output: &Path) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(output)
            .input(FfmpegInput::file(input))
            .map("0:v:0")
            .copy_streams()
            .no_audio()
            .faststart();

        self.run_to(&cmd).await
    }
}
