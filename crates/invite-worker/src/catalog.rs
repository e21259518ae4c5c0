//! Template catalog.
//!
//! Lookups hand out `Arc<Template>` snapshots. Replacing a template through
//! [`InMemoryCatalog::register`] never affects a job that already holds the
//! previous snapshot.

use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::info;

use invite_models::{Template, TemplateSummary};

use crate::error::{WorkerError, WorkerResult};

/// Built-in templates shipped with the worker.
const BUILTIN_TEMPLATES: &str = include_str!("../assets/templates.json");

/// Read access to template definitions.
pub trait TemplateCatalog: Send + Sync {
    /// Snapshot of a template by ID.
    fn get(&self, template_id: &str) -> Option<Arc<Template>>;

    /// Summaries of every template, in catalog order.
    fn list(&self) -> Vec<TemplateSummary>;

    /// Summaries of templates in one category.
    fn by_category(&self, category: &str) -> Vec<TemplateSummary> {
        self.list()
            .into_iter()
            .filter(|t| t.category.eq_ignore_ascii_case(category))
            .collect()
    }
}

/// Catalog held in memory, guarded for concurrent readers.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    templates: RwLock<Vec<Arc<Template>>>,
}

impl InMemoryCatalog {
    /// Validate and load `templates`. Later duplicates replace earlier ones.
    pub fn from_templates(templates: Vec<Template>) -> WorkerResult<Self> {
        let catalog = Self::default();
        for template in templates {
            catalog.register(template)?;
        }
        Ok(catalog)
    }

    /// The templates bundled with the worker.
    pub fn builtin() -> WorkerResult<Self> {
        Self::from_json(BUILTIN_TEMPLATES)
    }

    /// Parse a JSON array of templates.
    pub fn from_json(json: &str) -> WorkerResult<Self> {
        let templates: Vec<Template> =
            serde_json::from_str(json).map_err(|e| WorkerError::CatalogLoad(e.to_string()))?;
        Self::from_templates(templates)
    }

    /// Load a JSON catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> WorkerResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| WorkerError::CatalogLoad(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json(&json)?;
        info!("Loaded {} templates from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Add a template or replace the one with the same ID.
    pub fn register(&self, template: Template) -> WorkerResult<()> {
        template.validate()?;
        let template = Arc::new(template);

        let mut templates = self.templates.write().unwrap_or_else(|e| e.into_inner());
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => templates.push(template),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TemplateCatalog for InMemoryCatalog {
    fn get(&self, template_id: &str) -> Option<Arc<Template>> {
        self.templates
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|t| t.id == template_id)
            .cloned()
    }

    fn list(&self) -> Vec<TemplateSummary> {
        self.templates
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|t| t.summary())
            .collect()
    }
}
