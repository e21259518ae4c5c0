//! Scene renderer.
//!
//! Resolves a template scene against project data, uploaded media and the
//! asset directory into a [`SceneSpec`], then renders it through the
//! [`Transcoder`]. Scenes of one job render concurrently up to a limit; the
//! returned clips are always in template order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::fs;
use tracing::{debug, warn};

use invite_media::fs_utils::remove_file_best_effort;
use invite_media::{
    BackgroundSource, FontSource, MediaError, MediaOverlay, OverlayKind, SceneSpec, TextDraw,
    Transcoder,
};
use invite_models::{
    resolve_placeholders, wrap_text, Background, MediaKind, ProjectData, Scene, Template,
};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::media::SlotAssignment;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm"];

/// Animation tags that fade a scene in from black.
const FADE_IN_TAGS: &[&str] = &["fadeIn", "minimal-fade"];
const SCENE_FADE_SECONDS: f64 = 0.5;

/// Line spacing as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.2;

/// A rendered scene clip.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedClip {
    /// Position of the scene in the template
    pub index: usize,
    pub scene_id: String,
    pub path: PathBuf,
    pub duration: f64,
}

/// A scene resolved for rendering, plus anything skipped along the way.
#[derive(Debug, Clone)]
pub struct ResolvedScene {
    pub spec: SceneSpec,
    pub warnings: Vec<String>,
}

/// Output of [`SceneRenderer::render_template`].
#[derive(Debug, Clone, Default)]
pub struct RenderedScenes {
    pub clips: Vec<RenderedClip>,
    pub warnings: Vec<String>,
}

pub struct SceneRenderer {
    transcoder: Arc<dyn Transcoder>,
    assets_dir: PathBuf,
    render_timeout: Duration,
    max_parallel: usize,
}

impl SceneRenderer {
    pub fn new(transcoder: Arc<dyn Transcoder>, config: &WorkerConfig) -> Self {
        Self {
            transcoder,
            assets_dir: config.assets_dir.clone(),
            render_timeout: config.render_timeout,
            max_parallel: config.max_scene_parallel.max(1),
        }
    }

    /// Resolve text, media slots, background and fonts of one scene.
    pub async fn resolve(
        &self,
        scene: &Scene,
        project: &ProjectData,
        slots: &SlotAssignment,
    ) -> ResolvedScene {
        let mut warnings = Vec::new();

        let background = self.resolve_background(&scene.background).await;

        let mut overlays = Vec::with_capacity(scene.media_elements.len());
        for element in &scene.media_elements {
            let kind = match element.kind {
                MediaKind::Image => OverlayKind::Image,
                MediaKind::Video => OverlayKind::Video,
                MediaKind::Audio => continue,
            };
            match slots.get(element.kind, &element.placeholder) {
                Some(file) => overlays.push(MediaOverlay {
                    source: file.path.clone(),
                    kind,
                    x: element.x,
                    y: element.y,
                    width: element.width,
                    height: element.height,
                }),
                None => warnings.push(format!(
                    "Scene '{}': no {} supplied for slot '{}', skipped",
                    scene.id, element.kind, element.placeholder
                )),
            }
        }

        let mut texts = Vec::new();
        for element in &scene.text_elements {
            let resolved = resolve_placeholders(&element.content, project);
            let lines = match element.max_width {
                Some(max_width) => wrap_text(&resolved, max_width),
                None => resolved.lines().map(str::to_string).collect(),
            };
            let font = self.resolve_font(&element.font_family).await;
            let line_height = (element.font_size as f64 * LINE_HEIGHT).round() as i32;

            for (i, line) in lines.into_iter().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                texts.push(TextDraw {
                    text: line,
                    x: element.x,
                    y: element.y + line_height * i as i32,
                    font_size: element.font_size,
                    color: element.color.clone(),
                    align: element.align,
                    font: font.clone(),
                });
            }
        }

        let fade_in = scene
            .animations
            .iter()
            .any(|tag| FADE_IN_TAGS.contains(&tag.as_str()))
            .then(|| SCENE_FADE_SECONDS.min(scene.duration / 2.0));

        ResolvedScene {
            spec: SceneSpec {
                scene_id: scene.id.clone(),
                duration: scene.duration,
                background,
                overlays,
                texts,
                fade_in,
            },
            warnings,
        }
    }

    /// Render one scene into `output`.
    pub async fn render(
        &self,
        scene: &Scene,
        project: &ProjectData,
        slots: &SlotAssignment,
        output: &Path,
    ) -> WorkerResult<PathBuf> {
        let resolved = self.resolve(scene, project, slots).await;
        for warning in &resolved.warnings {
            warn!("{}", warning);
        }
        self.render_spec(&resolved.spec, output).await?;
        Ok(output.to_path_buf())
    }

    /// Render every scene of `template` into `work_dir`.
    ///
    /// Stops at the first failing scene; in-flight renders are dropped, which
    /// kills their ffmpeg processes.
    pub async fn render_template(
        &self,
        template: &Template,
        project: &ProjectData,
        slots: &SlotAssignment,
        work_dir: &Path,
    ) -> WorkerResult<RenderedScenes> {
        let mut specs = Vec::with_capacity(template.scenes.len());
        let mut warnings = Vec::new();
        for scene in &template.scenes {
            let resolved = self.resolve(scene, project, slots).await;
            warnings.extend(resolved.warnings);
            specs.push(resolved.spec);
        }

        let renders: Vec<_> = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| self.render_indexed(index, spec, work_dir))
            .collect();

        let clips: Vec<RenderedClip> = stream::iter(renders)
            .buffered(self.max_parallel)
            .try_collect()
            .await?;

        Ok(RenderedScenes { clips, warnings })
    }

    async fn render_indexed(
        &self,
        index: usize,
        spec: &SceneSpec,
        work_dir: &Path,
    ) -> WorkerResult<RenderedClip> {
        let output = work_dir.join(format!("scene_{:03}.mp4", index));
        self.render_spec(spec, &output).await?;
        Ok(RenderedClip {
            index,
            scene_id: spec.scene_id.clone(),
            path: output,
            duration: spec.duration,
        })
    }

    async fn render_spec(&self, spec: &SceneSpec, output: &Path) -> WorkerResult<()> {
        debug!(scene_id = %spec.scene_id, output = %output.display(), "Rendering scene");

        let result = match tokio::time::timeout(
            self.render_timeout,
            self.transcoder.render_scene(spec, output),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(MediaError::Timeout(self.render_timeout.as_secs())),
        };

        if let Err(e) = result {
            remove_file_best_effort(output).await;
            return Err(WorkerError::scene_render(&spec.scene_id, e));
        }
        Ok(())
    }

    async fn resolve_background(&self, background: &Background) -> BackgroundSource {
        match background {
            Background::Solid { color } => BackgroundSource::Color(color.clone()),
            Background::Gradient { colors } => BackgroundSource::Gradient(colors.clone()),
            Background::Image { theme } => {
                match self.find_asset("themes", theme, IMAGE_EXTENSIONS).await {
                    Some(path) => BackgroundSource::Image(path),
                    None => self.theme_fallback(theme),
                }
            }
            Background::Video { theme } => {
                match self.find_asset("themes", theme, VIDEO_EXTENSIONS).await {
                    Some(path) => BackgroundSource::Video(path),
                    None => self.theme_fallback(theme),
                }
            }
        }
    }

    fn theme_fallback(&self, theme: &str) -> BackgroundSource {
        warn!(theme = theme, "Theme asset not found, using built-in palette");
        BackgroundSource::Gradient(theme_palette(theme).iter().map(|c| c.to_string()).collect())
    }

    async fn resolve_font(&self, family: &str) -> FontSource {
        match self.find_asset("fonts", family, &["ttf", "otf"]).await {
            Some(path) => FontSource::File(path),
            None => FontSource::Family(family.to_string()),
        }
    }

    async fn find_asset(&self, subdir: &str, name: &str, extensions: &[&str]) -> Option<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        let dir = self.assets_dir.join(subdir);
        for ext in extensions {
            let candidate = dir.join(format!("{}.{}", name, ext));
            if fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Gradient stops for themes rendered without an asset file.
fn theme_palette(theme: &str) -> &'static [&'static str] {
    match theme {
        "ghibli-forest" => &["#a8e6cf", "#3d8b6e"],
        "romantic" => &["#ffd1dc", "#c06c84"],
        "cinematic-black" => &["#1a1a1a", "#000000"],
        "cinematic-montage" => &["#2c3e50", "#000000"],
        _ => &["#667eea", "#764ba2"],
    }
}
