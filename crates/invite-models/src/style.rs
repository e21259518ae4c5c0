//! Visual style tags forwarded to the style-transfer service.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named visual treatment. `Default` means no styling is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum StyleTag {
    #[default]
    Default,
    Ghibli,
    Cinematic,
    Anime,
    Watercolor,
    Vintage,
    Modern,
    Elegant,
    Romantic,
}

impl StyleTag {
    /// All tags, including `Default`.
    pub const ALL: [StyleTag; 9] = [
        StyleTag::Default,
        StyleTag::Ghibli,
        StyleTag::Cinematic,
        StyleTag::Anime,
        StyleTag::Watercolor,
        StyleTag::Vintage,
        StyleTag::Modern,
        StyleTag::Elegant,
        StyleTag::Romantic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleTag::Default => "default",
            StyleTag::Ghibli => "ghibli",
            StyleTag::Cinematic => "cinematic",
            StyleTag::Anime => "anime",
            StyleTag::Watercolor => "watercolor",
            StyleTag::Vintage => "vintage",
            StyleTag::Modern => "modern",
            StyleTag::Elegant => "elegant",
            StyleTag::Romantic => "romantic",
        }
    }

    /// True when no style transfer should run.
    pub fn is_default(&self) -> bool {
        matches!(self, StyleTag::Default)
    }

    /// Provider prompt describing the look of this style.
    pub fn base_prompt(&self) -> &'static str {
        match self {
            StyleTag::Ghibli => {
                "Studio Ghibli anime style, beautiful hand-drawn animation, soft colors, dreamy atmosphere"
            }
            StyleTag::Cinematic => {
                "cinematic film style, dramatic lighting, professional cinematography, movie-like quality"
            }
            StyleTag::Anime => {
                "anime style illustration, vibrant colors, manga-inspired art, Japanese animation"
            }
            StyleTag::Watercolor => {
                "watercolor painting style, soft brush strokes, flowing colors, artistic medium"
            }
            StyleTag::Vintage => {
                "vintage retro style, aged film look, nostalgic atmosphere, classic aesthetic"
            }
            StyleTag::Modern => {
                "modern contemporary style, clean lines, minimalist design, sleek appearance"
            }
            StyleTag::Elegant => {
                "elegant sophisticated style, luxury aesthetic, refined details, classy design"
            }
            StyleTag::Romantic => {
                "romantic dreamy style, soft lighting, pastel colors, love-themed atmosphere"
            }
            StyleTag::Default => "artistic style transformation",
        }
    }

    /// Prompt used when the request carries no custom prompt.
    pub fn default_user_prompt(&self) -> String {
        format!("Create a {} style wedding invitation video", self.as_str())
    }

    /// Full prompt sent to the provider: `"<base>, <user prompt>"`.
    pub fn compose_prompt(&self, user_prompt: Option<&str>) -> String {
        let user = match user_prompt.map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => self.default_user_prompt(),
        };
        format!("{}, {}", self.base_prompt(), user)
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StyleTag {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "default" | "none" => Ok(StyleTag::Default),
            "ghibli" => Ok(StyleTag::Ghibli),
            "cinematic" => Ok(StyleTag::Cinematic),
            "anime" => Ok(StyleTag::Anime),
            "watercolor" => Ok(StyleTag::Watercolor),
            "vintage" => Ok(StyleTag::Vintage),
            "modern" => Ok(StyleTag::Modern),
            "elegant" => Ok(StyleTag::Elegant),
            "romantic" => Ok(StyleTag::Romantic),
            _ => Err(StyleParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("Unsupported style: {0}")]
pub struct StyleParseError(pub String);
