//! Client boundary for the external AI style-transfer service.
//!
//! The pipeline only sees [`StyleAdapter`]. [`HttpStyleAdapter`] talks to a
//! JSON service over HTTP.

pub mod adapter;
pub mod client;
pub mod error;
pub mod types;

pub use adapter::StyleAdapter;
pub use client::{HttpStyleAdapter, StyleClientConfig};
pub use error::{StyleError, StyleResult};
pub use types::StyleRequest;
