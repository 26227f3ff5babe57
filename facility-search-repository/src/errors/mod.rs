//! Error types for the facility repository.
//!
//! This module provides one error type per backend family: `StoreError` for the
//! document store and `SearchIndexError` for the search index.

mod search_index_error;
mod store_error;

pub use search_index_error::SearchIndexError;
pub use store_error::StoreError;
