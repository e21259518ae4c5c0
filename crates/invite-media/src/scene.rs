//! Scene compositing command.
//!
//! A [`SceneSpec`] is a fully resolved scene: placeholders substituted, media
//! slots mapped to files, themes and fonts located on disk. Turning it into an
//! ffmpeg invocation is pure, so the filter graph can be tested without
//! running ffmpeg.
//!
//! Graph layout: input 0 is the background, inputs 1..=n are media overlays.
//! Overlays are drawn in order, then text, then the optional entrance fade.

use std::path::{Path, PathBuf};

use invite_models::{RenderProfile, TextAlign};

use crate::command::{FfmpegCommand, FfmpegInput};
use crate::error::{MediaError, MediaResult};
use crate::filters::{color_source, cover_filter, escape_filter_path, ffmpeg_color, gradient_source};

/// Scene background after theme resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundSource {
    Color(String),
    Gradient(Vec<String>),
    Image(PathBuf),
    Video(PathBuf),
}

/// Whether an overlay file is a still or a moving picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Image,
    Video,
}

/// An uploaded file placed in a rectangle of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaOverlay {
    pub source: PathBuf,
    pub kind: OverlayKind,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Font selection for drawtext.
#[derive(Debug, Clone, PartialEq)]
pub enum FontSource {
    /// TTF/OTF file on disk
    File(PathBuf),
    /// Family name resolved by fontconfig
    Family(String),
}

/// One line of text, already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub font_size: u32,
    pub color: String,
    pub align: TextAlign,
    pub font: FontSource,
}

/// Everything needed to render one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSpec {
    pub scene_id: String,
    /// Clip length in seconds
    pub duration: f64,
    pub background: BackgroundSource,
    pub overlays: Vec<MediaOverlay>,
    pub texts: Vec<TextDraw>,
    /// Fade in from black over this many seconds
    pub fade_in: Option<f64>,
}

/// Side files holding the text of each [`TextDraw`], in order.
///
/// drawtext reads text from a file so user strings never need filter escaping.
pub fn text_file_paths(output: &Path, count: usize) -> Vec<PathBuf> {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "scene".to_string());
    let dir = output.parent().unwrap_or_else(|| Path::new("."));

    (0..count)
        .map(|i| dir.join(format!("{}.text{}.txt", stem, i)))
        .collect()
}

/// Build the ffmpeg command rendering `spec` into `output`.
///
/// `text_files` must hold one path per entry of `spec.texts`.
pub fn build_scene_command(
    spec: &SceneSpec,
    text_files: &[PathBuf],
    output: &Path,
    profile: &RenderProfile,
) -> MediaResult<FfmpegCommand> {
    if !spec.duration.is_finite() || spec.duration <= 0.0 {
        return Err(MediaError::invalid_argument(format!(
            "scene '{}' has non-positive duration {}",
            spec.scene_id, spec.duration
        )));
    }
    if text_files.len() != spec.texts.len() {
        return Err(MediaError::invalid_argument(format!(
            "scene '{}' has {} text elements but {} text files",
            spec.scene_id,
            spec.texts.len(),
            text_files.len()
        )));
    }

    let (w, h, fps) = (profile.width, profile.height, profile.fps);
    let mut cmd = FfmpegCommand::new(output).input(background_input(&spec.background, spec.duration, profile));

    let mut graph = vec![format!("[0:v]{},fps={}[bg]", cover_filter(w, h), fps)];
    let mut last = "bg".to_string();

    for (i, overlay) in spec.overlays.iter().enumerate() {
        let input = match overlay.kind {
            OverlayKind::Image => FfmpegInput::looped_image(&overlay.source, spec.duration, fps),
            OverlayKind::Video => FfmpegInput::looped_video(&overlay.source, spec.duration),
        };
        cmd = cmd.input(input);

        let media = format!("m{}", i);
        let next = format!("o{}", i);
        graph.push(format!(
            "[{}:v]{}[{}]",
            i + 1,
            cover_filter(overlay.width.max(2), overlay.height.max(2)),
            media
        ));
        graph.push(format!(
            "[{}][{}]overlay=x={}:y={}:eof_action=repeat[{}]",
            last, media, overlay.x, overlay.y, next
        ));
        last = next;
    }

    let mut tail: Vec<String> = spec
        .texts
        .iter()
        .zip(text_files)
        .map(|(text, file)| drawtext_filter(text, file))
        .collect();

    if let Some(fade) = spec.fade_in.filter(|d| *d > 0.0) {
        tail.push(format!("fade=t=in:st=0:d={:.3}", fade.min(spec.duration)));
    }

    if tail.is_empty() {
        graph.push(format!("[{}]null[vout]", last));
    } else {
        graph.push(format!("[{}]{}[vout]", last, tail.join(",")));
    }

    Ok(cmd
        .filter_complex(graph.join(";"))
        .map("[vout]")
        .duration(spec.duration)
        .output_args(profile.video_args())
        .no_audio())
}

fn background_input(background: &BackgroundSource, duration: f64, profile: &RenderProfile) -> FfmpegInput {
    let (w, h, fps) = (profile.width, profile.height, profile.fps);
    match background {
        BackgroundSource::Color(color) => FfmpegInput::lavfi(color_source(color, w, h, fps, duration)),
        BackgroundSource::Gradient(colors) => FfmpegInput::lavfi(gradient_source(colors, w, h, fps, duration)),
        BackgroundSource::Image(path) => FfmpegInput::looped_image(path, duration, fps),
        BackgroundSource::Video(path) => FfmpegInput::looped_video(path, duration),
    }
}

fn drawtext_filter(text: &TextDraw, file: &Path) -> String {
    let font = match &text.font {
        FontSource::File(path) => format!("fontfile='{}'", escape_filter_path(&path.to_string_lossy())),
        FontSource::Family(family) => format!("font='{}'", escape_filter_path(family)),
    };
    let x = match text.align {
        TextAlign::Left => text.x.to_string(),
        TextAlign::Center => format!("{}-text_w/2", text.x),
        TextAlign::Right => format!("{}-text_w", text.x),
    };

    format!(
        "drawtext=textfile='{}':expansion=none:{}:fontsize={}:fontcolor={}:x={}:y={}",
        escape_filter_path(&file.to_string_lossy()),
        font,
        text.font_size,
        ffmpeg_color(&text.color),
        x,
        text.y
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> SceneSpec {
        SceneSpec {
            scene_id: "couple".into(),
            duration: 4.0,
            background: BackgroundSource::Gradient(vec!["#74b9ff".into(), "#0984e3".into()]),
            overlays: vec![],
            texts: vec![TextDraw {
                text: "Ann & Ben".into(),
                x: 960,
                y: 400,
                font_size: 56,
                color: "#ffffff".into(),
                align: TextAlign::Center,
                font: FontSource::Family("Playfair Display".into()),
            }],
            fade_in: None,
        }
    }

    fn filter_of(cmd: &FfmpegCommand) -> String {
        let args = cmd.build_args();
        let i = args.iter().position(|a| a == "-filter_complex").unwrap();
        args[i + 1].clone()
    }

    #[test]
    fn test_text_only_scene() {
        let out = PathBuf::from("/work/scene_001.mp4");
        let files = text_file_paths(&out, 1);
        assert_eq!(files[0], PathBuf::from("/work/scene_001.text0.txt"));

        let cmd = build_scene_command(&spec(), &files, &out, &RenderProfile::default()).unwrap();
        let filter = filter_of(&cmd);

        assert!(filter.starts_with("[0:v]scale=1920:1080"));
        assert!(filter.contains("drawtext=textfile='/work/scene_001.text0.txt'"));
        assert!(filter.contains("font='Playfair Display'"));
        assert!(filter.contains("x=960-text_w/2:y=400"));
        assert!(filter.ends_with("[vout]"));
        // User text goes through the side file, never the graph
        assert!(!filter.contains("Ann & Ben"));

        let args = cmd.build_args();
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
        assert!(args.contains(&"-an".to_string()));
        assert!(args.contains(&"4.000".to_string()));
    }

    #[test]
    fn test_overlay_and_fade() {
        let mut spec = spec();
        spec.texts.clear();
        spec.overlays.push(MediaOverlay {
            source: PathBuf::from("/uploads/photo.jpg"),
            kind: OverlayKind::Image,
            x: 760,
            y: 200,
            width: 400,
            height: 400,
        });
        spec.fade_in = Some(1.0);

        let cmd = build_scene_command(&spec, &[], Path::new("out.mp4"), &RenderProfile::default()).unwrap();
        let filter = filter_of(&cmd);

        assert!(filter.contains("[1:v]scale=400:400:force_original_aspect_ratio=increase,crop=400:400"));
        assert!(filter.contains("[bg][m0]overlay=x=760:y=200"));
        assert!(filter.contains("[o0]fade=t=in:st=0:d=1.000[vout]"));
        assert_eq!(cmd.inputs()[1].source(), "/uploads/photo.jpg");
    }

    #[test]
    fn test_video_background_loops() {
        let mut spec = spec();
        spec.texts.clear();
        spec.background = BackgroundSource::Video(PathBuf::from("/assets/themes/montage.mp4"));

        let cmd = build_scene_command(&spec, &[], Path::new("out.mp4"), &RenderProfile::default()).unwrap();
        let args = cmd.build_args();
        assert!(args.contains(&"-stream_loop".to_string()));
        assert!(filter_of(&cmd).contains("[bg]null[vout]"));
    }

    #[test]
    fn test_rejects_mismatched_text_files() {
        let result = build_scene_command(&spec(), &[], Path::new("out.mp4"), &RenderProfile::default());
        assert!(matches!(result, Err(MediaError::InvalidArgument(_))));
    }
}
