//! Project data and placeholder resolution.
//!
//! Text elements carry `{key}` tokens. Resolution is a pure substitution over
//! [`ProjectData`]: known keys become the field value (possibly empty), unknown
//! tokens are left untouched.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder keys understood by [`resolve_placeholders`].
pub const PLACEHOLDER_KEYS: [&str; 6] = ["bride", "groom", "date", "time", "venue", "message"];

/// Placeholder resolution context. Any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectData {
    #[serde(default)]
    pub bride: String,
    #[serde(default)]
    pub groom: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub message: String,
}

impl ProjectData {
    /// Value for a placeholder key, `None` if the key is unknown.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "bride" => Some(&self.bride),
            "groom" => Some(&self.groom),
            "date" => Some(&self.date),
            "time" => Some(&self.time),
            "venue" => Some(&self.venue),
            "message" => Some(&self.message),
            _ => None,
        }
    }

    /// Known keys referenced by `content` whose value is empty.
    pub fn empty_references(&self, content: &str) -> Vec<&'static str> {
        referenced_keys(content)
            .into_iter()
            .filter(|key| self.get(key).map(|v| v.trim().is_empty()).unwrap_or(false))
            .collect()
    }
}

/// Known placeholder keys appearing in `content`, in order, deduplicated.
pub fn referenced_keys(content: &str) -> Vec<&'static str> {
    let mut keys = Vec::new();
    for token in tokens(content) {
        if let Some(key) = PLACEHOLDER_KEYS.iter().find(|k| **k == token) {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
    }
    keys
}

/// Replace every known `{key}` token with its value from `data`.
pub fn resolve_placeholders(content: &str, data: &ProjectData) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find(['}', '{']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let key = &after[..close];
                match data.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                // Unterminated or nested brace, emit literally
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn tokens(content: &str) -> impl Iterator<Item = &str> {
    content.split('{').skip(1).filter_map(|part| {
        let close = part.find('}')?;
        Some(&part[..close])
    })
}

/// Word-wrap `text` for a pixel width, assuming ~10px per character.
///
/// Words longer than a line are kept whole on their own line.
pub fn wrap_text(text: &str, max_width: u32) -> Vec<String> {
    let max_chars = (max_width / 10).max(1) as usize;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// How a submit treats placeholders whose value is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderPolicy {
    /// Empty values render as empty strings
    #[default]
    Lenient,
    /// Submit fails if a referenced field is empty
    Strict,
}

impl PlaceholderPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderPolicy::Lenient => "lenient",
            PlaceholderPolicy::Strict => "strict",
        }
    }
}

impl fmt::Display for PlaceholderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlaceholderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(PlaceholderPolicy::Lenient),
            "strict" => Ok(PlaceholderPolicy::Strict),
            other => Err(format!("unknown placeholder policy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(bride: &str, groom: &str) -> ProjectData {
        ProjectData {
            bride: bride.to_string(),
            groom: groom.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_known_keys() {
        assert_eq!(
            resolve_placeholders("{bride} & {groom}", &data("Ann", "Ben")),
            "Ann & Ben"
        );
    }

    #[test]
    fn test_missing_key_resolves_empty() {
        assert_eq!(resolve_placeholders("{bride}", &ProjectData::default()), "");
    }

    #[test]
    fn test_unknown_token_left_as_is() {
        assert_eq!(
            resolve_placeholders("Hi {guest}, from {bride}", &data("Ann", "")),
            "Hi {guest}, from Ann"
        );
    }

    #[test]
    fn test_unterminated_brace() {
        assert_eq!(resolve_placeholders("{bride", &data("Ann", "")), "{bride");
        assert_eq!(resolve_placeholders("{{bride}", &data("Ann", "")), "{Ann");
    }

    #[test]
    fn test_empty_references() {
        let project = data("Ann", "");
        assert_eq!(project.empty_references("{bride} & {groom} {groom}"), vec!["groom"]);
        assert!(project.empty_references("{unknown}").is_empty());
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("We would love for you to join us", 100);
        assert_eq!(lines, vec!["We would", "love for", "you to", "join us"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert!(wrap_text("   ", 100).is_empty());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("STRICT".parse::<PlaceholderPolicy>(), Ok(PlaceholderPolicy::Strict));
        assert!("maybe".parse::<PlaceholderPolicy>().is_err());
    }
}
