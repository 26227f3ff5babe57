//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::types::BatchOperationSummary;
use facility_search_shared::{
    FacilityHit, FacilitySearchDocument, GeoPoint, TownDocument, TownSuggestion,
};

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// This trait defines the interface for all search index backend implementations. Implementations
/// are injected into `SearchIndexService` to enable dependency injection and easy testing with
/// mock implementations.
///
/// All methods return `Result<T, SearchIndexError>` for consistent error handling across
/// different backend implementations. A query that matches nothing returns an empty
/// collection (or `None`), never an error.
///
/// # Index Initialization
///
/// Implementations create their indices on first use through `ensure_indices`. The call is
/// idempotent: an index that already exists is a success.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the facility and town indices exist, creating them if necessary.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the indices are ready for use
    /// * `Err(SearchIndexError)` - If initialization fails
    async fn ensure_indices(&self) -> Result<(), SearchIndexError>;

    /// Index facility documents in bulk, keyed by facility id.
    ///
    /// Indexing an id that already exists overwrites the previous document.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document results, including partial failures
    /// * `Err(SearchIndexError)` - If the bulk request could not be submitted at all
    async fn bulk_index_facilities(
        &self,
        documents: &[FacilitySearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Index town documents in bulk, keyed by lowercased town name.
    async fn bulk_index_towns(
        &self,
        towns: &[TownDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Rank facilities by relevance to a free-text query.
    ///
    /// The locality is weighted above the facility name.
    async fn full_text_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<FacilityHit>, SearchIndexError>;

    /// Facilities whose location lies within `radius_meters` of the point, nearest first.
    async fn geo_search(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: f64,
        limit: usize,
    ) -> Result<Vec<FacilityHit>, SearchIndexError>;

    /// Towns whose name starts with `prefix`, case-insensitively.
    async fn suggest_town_names(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<TownSuggestion>, SearchIndexError>;

    /// Location of the best matching town, or `None` when no town matches.
    async fn town_location(&self, name: &str) -> Result<Option<GeoPoint>, SearchIndexError>;
}
