//! # Facility Search
//!
//! Imports sports facility data into a document store and projects it into a
//! search index.
//!
//! ## Architecture
//!
//! The importer follows a Parse-Merge-Project pattern:
//!
//! 1. **Parser**: Turns CSV lines into typed records
//! 2. **Importer**: Merges records into one nested document per facility
//! 3. **Projector**: Copies the store into the search index
//! 4. **Pipeline**: Runs the stages in order
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`parser`]: Record parsing for each input table
//! - [`importer`]: Multi-pass merge and town import
//! - [`projector`]: Store to search index projection
//! - [`pipeline`]: Coordinates the import stages
//! - [`query`]: Read-side queries over the store and the index
//! - [`errors`]: Error types for the importer

pub mod config;
pub mod errors;
pub mod importer;
pub mod parser;
pub mod pipeline;
pub mod projector;
pub mod query;

pub use config::{Dependencies, Settings};
pub use errors::{ImportError, QueryError, RecordError, RecordKind, RowError};
pub use importer::{FacilityImporter, ImportManifest};
pub use pipeline::{Pipeline, PipelineReport};
pub use projector::{IndexProjector, ProjectionReport};
pub use query::QueryService;

use facility_search_repository::{SearchIndexError, StoreError};
use thiserror::Error;

/// Errors that can occur during pipeline initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Import error.
    #[error("Import error: {0}")]
    ImportError(#[from] ImportError),

    /// Document store error outside of an import pass.
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// Search index error outside of a bulk operation.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] SearchIndexError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
