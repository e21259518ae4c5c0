//! Template and scene definitions.
//!
//! A template is an ordered list of scenes; the order is playback order.
//! Field names follow the camelCase layout of the template catalog JSON.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::media::MediaKind;

/// Errors raised when a template definition is structurally invalid.
#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("Template '{0}' has no scenes")]
    NoScenes(String),

    #[error("Scene '{scene_id}' in template '{template_id}' has invalid duration {duration}")]
    InvalidDuration {
        template_id: String,
        scene_id: String,
        duration: f64,
    },

    #[error("Scene '{scene_id}' in template '{template_id}' has a gradient without colors")]
    EmptyGradient {
        template_id: String,
        scene_id: String,
    },

    #[error("Scene '{scene_id}' references media slot of kind audio, only image or video are allowed")]
    AudioMediaSlot { scene_id: String },
}

/// A video template: an ordered sequence of scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique template ID (e.g. "elegant-engagement")
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Category (wedding, engagement, save-the-date, ...)
    pub category: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Thumbnail URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Declared duration in seconds (advisory)
    #[serde(default)]
    pub duration: f64,

    /// Scenes in playback order
    pub scenes: Vec<Scene>,
}

impl Template {
    /// Sum of scene durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration).sum()
    }

    /// Check structural invariants required by the renderer.
    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.scenes.is_empty() {
            return Err(TemplateError::NoScenes(self.id.clone()));
        }

        for scene in &self.scenes {
            if !scene.duration.is_finite() || scene.duration <= 0.0 {
                return Err(TemplateError::InvalidDuration {
                    template_id: self.id.clone(),
                    scene_id: scene.id.clone(),
                    duration: scene.duration,
                });
            }

            if let Background::Gradient { colors } = &scene.background {
                if colors.is_empty() {
                    return Err(TemplateError::EmptyGradient {
                        template_id: self.id.clone(),
                        scene_id: scene.id.clone(),
                    });
                }
            }

            if scene.media_elements.iter().any(|m| m.kind == MediaKind::Audio) {
                return Err(TemplateError::AudioMediaSlot {
                    scene_id: scene.id.clone(),
                });
            }
        }

        Ok(())
    }

    /// Lightweight listing view.
    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            thumbnail: self.thumbnail.clone(),
            duration: if self.duration > 0.0 {
                self.duration
            } else {
                self.total_duration()
            },
        }
    }
}

/// Listing entry for a template (no scene data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub duration: f64,
}

/// One declarative unit of a template, rendered into exactly one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,

    /// Clip length in seconds (> 0)
    pub duration: f64,

    pub background: Background,

    #[serde(default)]
    pub text_elements: Vec<TextElement>,

    #[serde(default)]
    pub media_elements: Vec<MediaElement>,

    /// Animation tags, interpreted (or ignored) by the renderer
    #[serde(default)]
    pub animations: Vec<String>,

    /// Effect tags, interpreted (or ignored) by the renderer
    #[serde(default)]
    pub effects: Vec<String>,
}

/// Scene background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Background {
    /// Single flat color
    Solid { color: String },
    /// Color stops, first to last
    Gradient { colors: Vec<String> },
    /// Named still-image theme
    Image { theme: String },
    /// Named looping video theme
    Video { theme: String },
}

/// Horizontal anchoring of a text element around its `x` coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Text drawn on a scene. `content` may contain `{placeholder}` tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub content: String,
    pub x: i32,
    pub y: i32,
    pub font_size: u32,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_text_color")]
    pub color: String,
    #[serde(default)]
    pub align: TextAlign,
    /// Wrap width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
}

fn default_font_family() -> String {
    "Lato".to_string()
}

fn default_text_color() -> String {
    "#ffffff".to_string()
}

/// A rectangle on the scene filled by an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaElement {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Named slot (e.g. "couple-photo")
    pub placeholder: String,
    /// Optional style hint for the renderer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(id: &str, duration: f64) -> Scene {
        Scene {
            id: id.to_string(),
            duration,
            background: Background::Solid {
                color: "#000000".to_string(),
            },
            text_elements: vec![],
            media_elements: vec![],
            animations: vec![],
            effects: vec![],
        }
    }

    #[test]
    fn test_deserialize_catalog_layout() {
        let json = r##"{
            "id": "t1",
            "category": "wedding",
            "scenes": [{
                "id": "intro",
                "duration": 3,
                "background": { "type": "gradient", "colors": ["#ffeaa7", "#fab1a0"] },
                "textElements": [{
                    "content": "{bride} & {groom}",
                    "x": 960, "y": 300,
                    "fontSize": 72,
                    "fontFamily": "Playfair Display",
                    "color": "#2d3436",
                    "align": "center"
                }],
                "mediaElements": [{
                    "type": "image", "x": 760, "y": 200,
                    "width": 400, "height": 400,
                    "placeholder": "couple-photo"
                }],
                "animations": ["fadeIn"]
            }]
        }"##;

        let template: Template = serde_json::from_str(json).unwrap();
        let scene = &template.scenes[0];
        assert_eq!(scene.text_elements[0].font_size, 72);
        assert_eq!(scene.media_elements[0].kind, MediaKind::Image);
        assert_eq!(scene.media_elements[0].placeholder, "couple-photo");
        assert!(matches!(scene.background, Background::Gradient { ref colors } if colors.len() == 2));
        assert!(template.validate().is_ok());
    }

    #[test]
    fn test_total_duration_and_summary() {
        let template = Template {
            id: "t".into(),
            name: "T".into(),
            category: "wedding".into(),
            description: String::new(),
            thumbnail: None,
            duration: 0.0,
            scenes: vec![scene("a", 3.0), scene("b", 4.5)],
        };

        assert!((template.total_duration() - 7.5).abs() < 1e-9);
        assert!((template.summary().duration - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_bad_templates() {
        let mut template = Template {
            id: "t".into(),
            name: String::new(),
            category: "wedding".into(),
            description: String::new(),
            thumbnail: None,
            duration: 0.0,
            scenes: vec![],
        };
        assert_eq!(template.validate(), Err(TemplateError::NoScenes("t".into())));

        template.scenes.push(scene("zero", 0.0));
        assert!(matches!(
            template.validate(),
            Err(TemplateError::InvalidDuration { .. })
        ));

        template.scenes[0].duration = 2.0;
        template.scenes[0].background = Background::Gradient { colors: vec![] };
        assert!(matches!(
            template.validate(),
            Err(TemplateError::EmptyGradient { .. })
        ));
    }
}
