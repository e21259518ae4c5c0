//! Clip concatenation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use invite_media::fs_utils::remove_file_best_effort;
use invite_media::{MediaError, Transcoder, VideoInfo};

use crate::error::{WorkerError, WorkerResult};
use crate::renderer::RenderedClip;

pub struct Compositor {
    transcoder: Arc<dyn Transcoder>,
    concat_timeout: Duration,
}

impl Compositor {
    pub fn new(transcoder: Arc<dyn Transcoder>, concat_timeout: Duration) -> Self {
        Self {
            transcoder,
            concat_timeout,
        }
    }

    /// Join `clips` in scene order into `output`.
    ///
    /// Every clip must match the format of the first one. On success the
    /// clip files are deleted; on failure they are left to the caller and
    /// no output file remains.
    pub async fn concat(&self, clips: &[RenderedClip], output: &Path) -> WorkerResult<PathBuf> {
        if clips.is_empty() {
            return Err(WorkerError::Composition(MediaError::invalid_argument(
                "no clips to concatenate",
            )));
        }

        let mut ordered: Vec<&RenderedClip> = clips.iter().collect();
        ordered.sort_by_key(|c| c.index);

        self.check_formats(&ordered).await?;

        let paths: Vec<PathBuf> = ordered.iter().map(|c| c.path.clone()).collect();
        debug!(clips = paths.len(), output = %output.display(), "Concatenating clips");

        let result = match tokio::time::timeout(
            self.concat_timeout,
            self.transcoder.concat(&paths, output),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(MediaError::Timeout(self.concat_timeout.as_secs())),
        };

        if let Err(e) = result {
            remove_file_best_effort(output).await;
            return Err(WorkerError::Composition(e));
        }

        for path in &paths {
            remove_file_best_effort(path).await;
        }

        info!(clips = paths.len(), "Base video composed");
        Ok(output.to_path_buf())
    }

    async fn check_formats(&self, clips: &[&RenderedClip]) -> WorkerResult<()> {
        let mut reference: Option<VideoInfo> = None;

        for (position, clip) in clips.iter().enumerate() {
            let info = match tokio::time::timeout(
                self.concat_timeout,
                self.transcoder.probe(&clip.path),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(MediaError::Timeout(self.concat_timeout.as_secs())),
            }
            .map_err(WorkerError::Composition)?;

            match &reference {
                None => reference = Some(info),
                Some(expected) if !expected.is_concat_compatible(&info) => {
                    return Err(WorkerError::IncompatibleClipFormat {
                        index: position,
                        expected: expected.format_signature(),
                        found: info.format_signature(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use invite_media::{FadeSpec, MediaResult, SceneSpec};
    use tempfile::TempDir;
    use tokio::fs;

    /// Clips are text files holding their width.
    struct WidthTranscoder;

    #[async_trait]
    impl Transcoder for WidthTranscoder {
        async fn render_scene(&self, _spec: &SceneSpec, _output: &Path) -> MediaResult<()> {
            unimplemented!()
        }
        async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
            let width = fs::read_to_string(path).await?.trim().parse().unwrap_or(0);
            Ok(VideoInfo {
                duration: 1.0,
                width,
                height: 1080,
                fps: 30.0,
                codec: "h264".into(),
                has_audio: false,
                size: 4,
            })
        }
        async fn concat(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()> {
            let mut joined = String::new();
            for clip in clips {
                joined.push_str(clip.file_name().unwrap().to_str().unwrap());
                joined.push('\n');
            }
            fs::write(output, joined).await?;
            Ok(())
        }
        async fn apply_fades(&self, _i: &Path, _o: &Path, _f: &FadeSpec) -> MediaResult<()> {
            unimplemented!()
        }
        async fn mux_audio(&self, _v: &Path, _a: &Path, _o: &Path) -> MediaResult<()> {
            unimplemented!()
        }
        async fn remux(&self, _i: &Path, _o: &Path) -> MediaResult<()> {
            unimplemented!()
        }
    }

    /// ffprobe that never answers.
    struct StalledProbe;

    #[async_trait]
    impl Transcoder for StalledProbe {
        async fn render_scene(&self, _spec: &SceneSpec, _output: &Path) -> MediaResult<()> {
            unimplemented!()
        }
        async fn probe(&self, _path: &Path) -> MediaResult<VideoInfo> {
            std::future::pending().await
        }
        async fn concat(&self, _clips: &[PathBuf], _output: &Path) -> MediaResult<()> {
            unimplemented!()
        }
        async fn apply_fades(&self, _i: &Path, _o: &Path, _f: &FadeSpec) -> MediaResult<()> {
            unimplemented!()
        }
        async fn mux_audio(&self, _v: &Path, _a: &Path, _o: &Path) -> MediaResult<()> {
            unimplemented!()
        }
        async fn remux(&self, _i: &Path, _o: &Path) -> MediaResult<()> {
            unimplemented!()
        }
    }

    fn clip(dir: &Path, index: usize, width: u32) -> RenderedClip {
        let path = dir.join(format!("scene_{:03}.mp4", index));
        std::fs::write(&path, width.to_string()).unwrap();
        RenderedClip {
            index,
            scene_id: format!("s{index}"),
            path,
            duration: 1.0,
        }
    }

    fn compositor() -> Compositor {
        Compositor::new(Arc::new(WidthTranscoder), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_concat_restores_scene_order() {
        let dir = TempDir::new().unwrap();
        let clips = vec![clip(dir.path(), 2, 1920), clip(dir.path(), 0, 1920), clip(dir.path(), 1, 1920)];
        let output = dir.path().join("base.mp4");

        compositor().concat(&clips, &output).await.unwrap();

        let joined = std::fs::read_to_string(&output).unwrap();
        assert_eq!(joined, "scene_000.mp4\nscene_001.mp4\nscene_002.mp4\n");
        for clip in &clips {
            assert!(!clip.path.exists());
        }
    }

    #[tokio::test]
    async fn test_mismatched_resolution_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let clips = vec![clip(dir.path(), 0, 1920), clip(dir.path(), 1, 1280)];
        let output = dir.path().join("base.mp4");

        let err = compositor().concat(&clips, &output).await.unwrap_err();
        match err {
            WorkerError::IncompatibleClipFormat { index, expected, found } => {
                assert_eq!(index, 1);
                assert!(expected.starts_with("1920x1080"));
                assert!(found.starts_with("1280x1080"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!output.exists());
        assert!(clips[0].path.exists());
    }

    #[tokio::test]
    async fn test_stalled_probe_times_out() {
        let dir = TempDir::new().unwrap();
        let clips = vec![clip(dir.path(), 0, 1920), clip(dir.path(), 1, 1920)];
        let output = dir.path().join("base.mp4");
        let compositor = Compositor::new(Arc::new(StalledProbe), Duration::from_millis(100));

        let result = tokio::time::timeout(Duration::from_secs(5), compositor.concat(&clips, &output))
            .await
            .expect("concat should give up on its own");

        assert!(matches!(
            result,
            Err(WorkerError::Composition(MediaError::Timeout(_)))
        ));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_empty_clip_list() {
        let dir = TempDir::new().unwrap();
        let result = compositor().concat(&[], &dir.path().join("base.mp4")).await;
        assert!(matches!(result, Err(WorkerError::Composition(_))));
    }
}
