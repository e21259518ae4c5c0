//! Invitation video generation worker.
//!
//! This crate provides:
//! - Template catalog with built-in templates
//! - Scene rendering, composition, enhancement and optional styling
//! - A job manager running one pipeline task per request
//! - Thread-safe job status store for polling clients

pub mod catalog;
pub mod compositor;
pub mod config;
pub mod enhancer;
pub mod error;
pub mod logging;
pub mod manager;
pub mod media;
pub mod metrics;
pub mod pipeline;
pub mod renderer;
pub mod store;
pub mod styling;

pub use catalog::{InMemoryCatalog, TemplateCatalog};
pub use config::{StyleFailurePolicy, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use manager::JobManager;
pub use store::JobStore;
