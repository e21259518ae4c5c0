//! Style adapter boundary.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::StyleResult;
use crate::types::StyleRequest;

/// External style transfer: takes a finished video, returns a restyled copy.
///
/// Calls may take minutes and may fail; callers bound them with a timeout.
#[async_trait]
pub trait StyleAdapter: Send + Sync {
    /// Restyle `request.video_path`, returning the path of the new video.
    async fn apply_style(&self, request: &StyleRequest) -> StyleResult<PathBuf>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "style-adapter"
    }
}
