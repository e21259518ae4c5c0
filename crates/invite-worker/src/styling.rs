//! Optional style-transfer stage.
//!
//! A failed style call either fails the job or keeps the unstyled video,
//! depending on [`StyleFailurePolicy`]. A kept video is always reported as
//! [`StyleOutcome::Skipped`], never as styled.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs;
use tracing::{info, warn};

use invite_models::{StyleOutcome, StyleTag};
use invite_style::{StyleAdapter, StyleError, StyleRequest, StyleResult};

use crate::config::StyleFailurePolicy;
use crate::error::{WorkerError, WorkerResult};

/// Video produced by the styling stage and what happened to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledVideo {
    pub path: PathBuf,
    pub outcome: StyleOutcome,
}

pub struct StyleStage {
    adapter: Option<Arc<dyn StyleAdapter>>,
    timeout: Duration,
    policy: StyleFailurePolicy,
}

impl StyleStage {
    pub fn new(
        adapter: Option<Arc<dyn StyleAdapter>>,
        timeout: Duration,
        policy: StyleFailurePolicy,
    ) -> Self {
        Self {
            adapter,
            timeout,
            policy,
        }
    }

    pub fn has_adapter(&self) -> bool {
        self.adapter.is_some()
    }

    /// Restyle `video` with `style`. The default style passes `video` through.
    pub async fn apply(
        &self,
        video: &Path,
        style: StyleTag,
        user_prompt: Option<&str>,
        work_dir: &Path,
    ) -> WorkerResult<StyledVideo> {
        if style.is_default() {
            return Ok(StyledVideo {
                path: video.to_path_buf(),
                outcome: StyleOutcome::NotRequested,
            });
        }

        let request = StyleRequest {
            video_path: video.to_path_buf(),
            style,
            prompt: style.compose_prompt(user_prompt),
            output_dir: work_dir.to_path_buf(),
        };

        match self.call(&request).await {
            Ok(path) => {
                info!(style = %style, output = %path.display(), "Style applied");
                Ok(StyledVideo {
                    path,
                    outcome: StyleOutcome::Applied { style },
                })
            }
            Err(e) => match self.policy {
                StyleFailurePolicy::Fail => Err(WorkerError::Style(e)),
                StyleFailurePolicy::Fallback => {
                    warn!(style = %style, error = %e, "Style transfer failed, keeping unstyled video");
                    Ok(StyledVideo {
                        path: video.to_path_buf(),
                        outcome: StyleOutcome::Skipped {
                            style,
                            reason: e.to_string(),
                        },
                    })
                }
            },
        }
    }

    async fn call(&self, request: &StyleRequest) -> StyleResult<PathBuf> {
        let adapter = self
            .adapter
            .as_ref()
            .ok_or_else(|| StyleError::Unavailable("no style service configured".to_string()))?;

        let path = match tokio::time::timeout(self.timeout, adapter.apply_style(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(StyleError::Timeout(self.timeout.as_secs())),
        };

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StyleError::InvalidResponse(format!(
                "{} returned missing file {}",
                adapter.name(),
                path.display()
            )));
        }
        Ok(path)
    }
}
