//! Uploaded media classification and slot assignment.
//!
//! Uploaded files are owned by the upload subsystem; nothing here writes to
//! or deletes them.

use std::collections::HashMap;

use tokio::fs;

use invite_models::{MediaFile, MediaKind, Template};

/// Usable uploads grouped by kind, in request order.
#[derive(Debug, Clone, Default)]
pub struct MediaLibrary {
    images: Vec<MediaFile>,
    videos: Vec<MediaFile>,
    audio: Vec<MediaFile>,
}

/// Outcome of [`MediaLibrary::classify`].
#[derive(Debug, Clone, Default)]
pub struct ClassifiedMedia {
    pub library: MediaLibrary,
    /// Human-readable reasons for every skipped file
    pub skipped: Vec<String>,
}

impl MediaLibrary {
    /// Group files by MIME kind, skipping unknown types and unreadable paths.
    pub async fn classify(files: &[MediaFile]) -> ClassifiedMedia {
        let mut out = ClassifiedMedia::default();

        for file in files {
            let Some(kind) = file.kind() else {
                out.skipped.push(format!(
                    "Skipped {} ({}): unsupported media type",
                    file.original_name, file.mimetype
                ));
                continue;
            };

            match fs::metadata(&file.path).await {
                Ok(meta) if meta.is_file() => {}
                _ => {
                    out.skipped.push(format!(
                        "Skipped {}: file not readable at {}",
                        file.original_name,
                        file.path.display()
                    ));
                    continue;
                }
            }

            match kind {
                MediaKind::Image => out.library.images.push(file.clone()),
                MediaKind::Video => out.library.videos.push(file.clone()),
                MediaKind::Audio => out.library.audio.push(file.clone()),
            }
        }

        out
    }

    pub fn files(&self, kind: MediaKind) -> &[MediaFile] {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Video => &self.videos,
            MediaKind::Audio => &self.audio,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.videos.is_empty() && self.audio.is_empty()
    }

    /// Map each distinct `(kind, slot)` of `template`, in template order, to
    /// the next unused file of that kind.
    pub fn assign_slots(&self, template: &Template) -> SlotAssignment {
        let mut assignment = SlotAssignment::default();
        let mut next: HashMap<MediaKind, usize> = HashMap::new();

        for element in template.scenes.iter().flat_map(|s| &s.media_elements) {
            let key = (element.kind, element.placeholder.clone());
            if assignment.slots.contains_key(&key) {
                continue;
            }

            let index = next.entry(element.kind).or_insert(0);
            if let Some(file) = self.files(element.kind).get(*index) {
                assignment.slots.insert(key, file.clone());
                *index += 1;
            }
        }

        assignment
    }
}

/// Files chosen for named media slots.
#[derive(Debug, Clone, Default)]
pub struct SlotAssignment {
    slots: HashMap<(MediaKind, String), MediaFile>,
}

impl SlotAssignment {
    pub fn get(&self, kind: MediaKind, slot: &str) -> Option<&MediaFile> {
        self.slots.get(&(kind, slot.to_string()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
