//! FFmpeg CLI wrapper for invitation video rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - A runner with timeouts and stderr capture
//! - Scene compositing filter graphs
//! - The [`Transcoder`] capability and its ffmpeg implementation

pub mod command;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;
pub mod scene;
pub mod transcoder;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegInput, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use scene::{
    build_scene_command, BackgroundSource, FontSource, MediaOverlay, OverlayKind, SceneSpec,
    TextDraw,
};
pub use transcoder::{FadeSpec, FfmpegTranscoder, Transcoder};
