//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use invite_models::{PlaceholderPolicy, RenderProfile};

/// What to do when the style adapter fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleFailurePolicy {
    /// Complete with the unstyled video and record a warning
    #[default]
    Fallback,
    /// Fail the job
    Fail,
}

impl std::str::FromStr for StyleFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(StyleFailurePolicy::Fallback),
            "fail" => Ok(StyleFailurePolicy::Fail),
            other => Err(format!("unknown style failure policy: {other}")),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root of session output directories
    pub output_root: PathBuf,
    /// URL prefix under which `output_root` is served
    pub public_url_prefix: String,
    /// Theme and font assets
    pub assets_dir: PathBuf,
    /// Optional JSON catalog replacing the built-in templates
    pub templates_path: Option<PathBuf>,
    /// Maximum concurrent pipeline runs
    pub max_concurrent_jobs: usize,
    /// Maximum scenes rendered in parallel within a single job
    pub max_scene_parallel: usize,
    /// Per-scene render timeout
    pub render_timeout: Duration,
    /// Concatenation timeout
    pub concat_timeout: Duration,
    /// Fade/mux timeout
    pub enhance_timeout: Duration,
    /// Style adapter timeout
    pub style_timeout: Duration,
    /// Fade-in and fade-out span in seconds
    pub fade_seconds: f64,
    pub placeholder_policy: PlaceholderPolicy,
    pub style_failure_policy: StyleFailurePolicy,
    /// Keep the work directory of failed jobs for diagnosis
    pub keep_failed_artifacts: bool,
    /// Encoding profile shared by every clip
    pub render_profile: RenderProfile,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("outputs"),
            public_url_prefix: "/outputs".to_string(),
            assets_dir: PathBuf::from("assets"),
            templates_path: None,
            max_concurrent_jobs: 2,
            max_scene_parallel: 4,
            render_timeout: Duration::from_secs(120),
            concat_timeout: Duration::from_secs(300),
            enhance_timeout: Duration::from_secs(300),
            style_timeout: Duration::from_secs(900),
            fade_seconds: 1.0,
            placeholder_policy: PlaceholderPolicy::Lenient,
            style_failure_policy: StyleFailurePolicy::Fallback,
            keep_failed_artifacts: false,
            render_profile: RenderProfile::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            output_root: std::env::var("INVITE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_root),
            public_url_prefix: std::env::var("INVITE_PUBLIC_PREFIX")
                .unwrap_or(defaults.public_url_prefix),
            assets_dir: std::env::var("INVITE_ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.assets_dir),
            templates_path: std::env::var("INVITE_TEMPLATES_PATH").ok().map(PathBuf::from),
            max_concurrent_jobs: env_parse("WORKER_MAX_JOBS").unwrap_or(defaults.max_concurrent_jobs),
            max_scene_parallel: env_parse("WORKER_MAX_SCENE_PARALLEL")
                .unwrap_or(defaults.max_scene_parallel),
            render_timeout: env_secs("WORKER_RENDER_TIMEOUT").unwrap_or(defaults.render_timeout),
            concat_timeout: env_secs("WORKER_CONCAT_TIMEOUT").unwrap_or(defaults.concat_timeout),
            enhance_timeout: env_secs("WORKER_ENHANCE_TIMEOUT").unwrap_or(defaults.enhance_timeout),
            style_timeout: env_secs("WORKER_STYLE_TIMEOUT").unwrap_or(defaults.style_timeout),
            fade_seconds: env_parse::<f64>("INVITE_FADE_SECONDS")
                .filter(|s| s.is_finite() && *s >= 0.0)
                .unwrap_or(defaults.fade_seconds),
            placeholder_policy: env_parse("INVITE_PLACEHOLDER_POLICY")
                .unwrap_or(defaults.placeholder_policy),
            style_failure_policy: env_parse("INVITE_STYLE_FAILURE")
                .unwrap_or(defaults.style_failure_policy),
            keep_failed_artifacts: env_parse("INVITE_KEEP_FAILED_ARTIFACTS")
                .unwrap_or(defaults.keep_failed_artifacts),
            render_profile: defaults.render_profile,
        }
        .normalized()
    }

    /// Clamp values that would stall the worker.
    pub fn normalized(mut self) -> Self {
        self.max_concurrent_jobs = self.max_concurrent_jobs.max(1);
        self.max_scene_parallel = self.max_scene_parallel.max(1);
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).filter(|s| *s > 0).map(Duration::from_secs)
}
