//! Batch catalog ingestion: tokenizes delimited export lines, validates them
//! against a per-field rule table, resolves manufacturer and category
//! references, downloads media with retry and pacing, and persists entities
//! in resumable batches.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::use_cases::batch_import::{BatchImporter, RunOptions};
pub use application::use_cases::media_acquirer::{HttpFetcher, MediaAcquirer, MediaFetcher};
pub use domain::error::{AppError, Result};
pub use domain::summary::RunSummary;
pub use infrastructure::config::IngestConfig;
