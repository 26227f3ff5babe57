//! # Facility Search Repository
//!
//! This crate provides traits and implementations for the two storage backends
//! of the facility system: the document store holding the facility aggregates
//! (MongoDB, or in-memory for tests) and the search index derived from it
//! (OpenSearch).

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod mongodb;
pub mod opensearch;
pub mod service;
pub mod types;
pub mod utils;

pub use config::SearchIndexServiceConfig;
pub use errors::{SearchIndexError, StoreError};
pub use interfaces::{FacilityStore, FacilityStream, SearchIndexProvider};
pub use memory::InMemoryFacilityStore;
pub use mongodb::MongoFacilityStore;
pub use opensearch::OpenSearchProvider;
pub use service::SearchIndexService;
pub use types::{BatchOperationResult, BatchOperationSummary};
