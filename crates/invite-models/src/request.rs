//! Generation request accepted by the job manager.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::media::MediaFile;
use crate::project::ProjectData;

/// Post-composition options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct Customization {
    /// Audio file muxed as the only audio track
    #[serde(default, alias = "backgroundMusic", skip_serializing_if = "Option::is_none")]
    pub background_music: Option<PathBuf>,

    /// Fade in/out; absent means enabled
    #[serde(default, alias = "fadeEffects", skip_serializing_if = "Option::is_none")]
    pub fade_effects: Option<bool>,

    /// Free-form prompt appended to the style's base prompt
    #[serde(default, alias = "stylePrompt", skip_serializing_if = "Option::is_none")]
    pub style_prompt: Option<String>,
}

impl Customization {
    pub fn fades_enabled(&self) -> bool {
        self.fade_effects.unwrap_or(true)
    }
}

/// A request to generate one invitation video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "snake_case")]
pub struct GenerationRequest {
    #[serde(alias = "templateId")]
    pub template_id: String,

    #[serde(default)]
    pub text: ProjectData,

    /// Style tag; empty or "default" means no styling
    #[serde(default)]
    pub style: String,

    #[serde(default, alias = "mediaFiles")]
    pub media_files: Vec<MediaFile>,

    #[serde(default)]
    pub customization: Customization,

    #[serde(default, alias = "sessionId")]
    #[validate(length(max = 128, message = "session_id is too long"))]
    pub session_id: String,
}

impl GenerationRequest {
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            text: ProjectData::default(),
            style: String::new(),
            media_files: Vec::new(),
            customization: Customization::default(),
            session_id: String::new(),
        }
    }

    pub fn with_text(mut self, text: ProjectData) -> Self {
        self.text = text;
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_media(mut self, media_files: Vec<MediaFile>) -> Self {
        self.media_files = media_files;
        self
    }

    pub fn with_customization(mut self, customization: Customization) -> Self {
        self.customization = customization;
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }
}
