//! Search index service implementation.
//!
//! This module provides the main service for interacting with the search index.
//! Application code uses this to bulk index facilities and towns and to run
//! full-text, geo and autocomplete queries.

use std::sync::Arc;

use crate::config::{SearchIndexServiceConfig, MAX_SUGGESTION_LIMIT};
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::{BatchOperationResult, BatchOperationSummary};
use crate::utils::{clamp_limit, normalize_search_text, valid_coordinates};
use facility_search_shared::{
    FacilityHit, FacilitySearchDocument, GeoPoint, TownDocument, TownSuggestion,
};

/// The main service for interacting with the search index.
///
/// This is the high-level API that application code should use. It provides input
/// validation, result size limits, and delegates to a `SearchIndexProvider` for
/// actual backend operations. All operations return `SearchIndexError` for consistent
/// error handling. Blank queries short-circuit to empty results without a backend call.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use facility_search_repository::SearchIndexService;
/// use facility_search_repository::opensearch::{IndexConfig, OpenSearchProvider};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = Arc::new(OpenSearchProvider::new("http://localhost:9200", IndexConfig::default()).await?);
/// let service = SearchIndexService::new(provider);
///
/// let towns = service.suggest_town_names("nan", None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SearchIndexService {
    provider: Arc<dyn SearchIndexProvider>,
    config: SearchIndexServiceConfig,
}

impl SearchIndexService {
    /// Create a new SearchIndexService with default configuration.
    ///
    /// The default configuration includes a batch size limit of 1000 documents.
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self {
            provider,
            config: SearchIndexServiceConfig::default(),
        }
    }

    /// Create a new SearchIndexService with custom configuration.
    pub fn with_config(
        provider: Arc<dyn SearchIndexProvider>,
        config: SearchIndexServiceConfig,
    ) -> Self {
        Self { provider, config }
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    /// Create the search indices if they are missing. Idempotent.
    pub async fn ensure_indices(&self) -> Result<(), SearchIndexError> {
        self.provider.ensure_indices().await
    }

    /// Index facility documents in bulk.
    ///
    /// Documents without an id cannot be addressed in the index; they are reported
    /// as failed items and the rest of the batch is still submitted.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document results, including partial failures
    /// * `Err(SearchIndexError::BatchSizeExceeded)` - If the batch size exceeds the configured maximum
    /// * `Err(SearchIndexError)` - If the bulk request could not be submitted at all
    pub async fn index_facilities(
        &self,
        documents: Vec<FacilitySearchDocument>,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        self.validate_batch_size(documents.len())?;

        let (valid, invalid): (Vec<_>, Vec<_>) = documents
            .into_iter()
            .partition(|d| !d.id.trim().is_empty());

        let mut results: Vec<BatchOperationResult> = invalid
            .iter()
            .map(|d| {
                BatchOperationResult::failed(
                    d.id.clone(),
                    SearchIndexError::validation(format!("facility '{}' has no id", d.name)),
                )
            })
            .collect();

        if !valid.is_empty() {
            let summary = self.provider.bulk_index_facilities(&valid).await?;
            results.extend(summary.results);
        }

        Ok(BatchOperationSummary::from_results(results))
    }

    /// Index town documents in bulk.
    pub async fn index_towns(
        &self,
        towns: Vec<TownDocument>,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if towns.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        self.validate_batch_size(towns.len())?;
        self.provider.bulk_index_towns(&towns).await
    }

    /// Full-text search over facilities, ranked by relevance.
    ///
    /// # Arguments
    ///
    /// * `query` - Free text; blank text yields an empty result
    /// * `limit` - Maximum number of hits, defaults to the configured default limit
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<FacilityHit>, SearchIndexError> {
        let Some(query) = normalize_search_text(query) else {
            return Ok(Vec::new());
        };
        let limit = clamp_limit(limit, self.config.default_limit, self.config.max_limit);
        self.provider.full_text_search(&query, limit).await
    }

    /// Facilities within `radius_meters` of a point, nearest first.
    ///
    /// # Returns
    ///
    /// * `Err(SearchIndexError::ValidationError)` - If the coordinates are out of range
    ///   or the radius is negative
    pub async fn search_nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: f64,
        limit: Option<usize>,
    ) -> Result<Vec<FacilityHit>, SearchIndexError> {
        if !valid_coordinates(lat, lng) {
            return Err(SearchIndexError::validation(format!(
                "invalid coordinates lat={}, lng={}",
                lat, lng
            )));
        }
        if !radius_meters.is_finite() || radius_meters < 0.0 {
            return Err(SearchIndexError::validation(format!(
                "invalid radius {}",
                radius_meters
            )));
        }

        let limit = clamp_limit(limit, self.config.default_limit, self.config.max_limit);
        self.provider
            .geo_search(lat, lng, radius_meters, limit)
            .await
    }

    /// Towns whose name starts with `prefix`, for autocomplete.
    ///
    /// The limit defaults to the configured suggestion limit and is capped at
    /// [`MAX_SUGGESTION_LIMIT`].
    pub async fn suggest_town_names(
        &self,
        prefix: &str,
        limit: Option<usize>,
    ) -> Result<Vec<TownSuggestion>, SearchIndexError> {
        let Some(prefix) = normalize_search_text(prefix) else {
            return Ok(Vec::new());
        };
        let limit = clamp_limit(limit, self.config.suggestion_limit, MAX_SUGGESTION_LIMIT);
        self.provider.suggest_town_names(&prefix, limit).await
    }

    /// Location of the best matching town, `None` when nothing matches.
    pub async fn town_location(&self, name: &str) -> Result<Option<GeoPoint>, SearchIndexError> {
        let Some(name) = normalize_search_text(name) else {
            return Ok(None);
        };
        self.provider.town_location(&name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use facility_search_shared::Facility;
    use tokio::sync::Mutex;

    /// Mock provider for testing
    #[derive(Default)]
    struct MockProvider {
        indexed: Mutex<Vec<String>>,
        queries: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl SearchIndexProvider for MockProvider {
        async fn ensure_indices(&self) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn bulk_index_facilities(
            &self,
            documents: &[FacilitySearchDocument],
        ) -> Result<BatchOperationSummary, SearchIndexError> {
            let mut indexed = self.indexed.lock().await;
            let results = documents
                .iter()
                .map(|d| {
                    indexed.push(d.id.clone());
                    BatchOperationResult::succeeded(d.id.clone())
                })
                .collect();
            Ok(BatchOperationSummary::from_results(results))
        }

        async fn bulk_index_towns(
            &self,
            towns: &[TownDocument],
        ) -> Result<BatchOperationSummary, SearchIndexError> {
            Ok(BatchOperationSummary::from_results(
                towns
                    .iter()
                    .map(|t| BatchOperationResult::succeeded(t.document_id()))
                    .collect(),
            ))
        }

        async fn full_text_search(
            &self,
            query: &str,
            limit: usize,
        ) -> Result<Vec<FacilityHit>, SearchIndexError> {
            self.queries.lock().await.push((query.to_string(), limit));
            Ok(Vec::new())
        }

        async fn geo_search(
            &self,
            _lat: f64,
            _lng: f64,
            _radius_meters: f64,
            limit: usize,
        ) -> Result<Vec<FacilityHit>, SearchIndexError> {
            self.queries.lock().await.push(("geo".to_string(), limit));
            Ok(Vec::new())
        }

        async fn suggest_town_names(
            &self,
            prefix: &str,
            limit: usize,
        ) -> Result<Vec<TownSuggestion>, SearchIndexError> {
            self.queries.lock().await.push((prefix.to_string(), limit));
            Ok(vec![TownSuggestion {
                name: "Nantes".to_string(),
                location: GeoPoint::new(-1.55, 47.21),
            }])
        }

        async fn town_location(&self, _name: &str) -> Result<Option<GeoPoint>, SearchIndexError> {
            Ok(None)
        }
    }

    fn document(id: &str) -> FacilitySearchDocument {
        FacilitySearchDocument::from(Facility::new(id, format!("Facility {}", id), GeoPoint::default()))
    }

    #[tokio::test]
    async fn test_index_facilities_empty_batch() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::new(provider.clone());

        let summary = service.index_facilities(vec![]).await.unwrap();

        assert_eq!(summary.total, 0);
        assert!(provider.indexed.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_index_facilities_batch_size_exceeded() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::with_config(
            provider,
            SearchIndexServiceConfig::with_max_batch_size(1),
        );

        let result = service
            .index_facilities(vec![document("1"), document("2")])
            .await;

        assert!(matches!(
            result,
            Err(SearchIndexError::BatchSizeExceeded { provided: 2, max: 1 })
        ));
    }

    #[tokio::test]
    async fn test_index_facilities_reports_missing_ids() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::new(provider.clone());

        let summary = service
            .index_facilities(vec![document("1"), document(" "), document("3")])
            .await
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(*provider.indexed.lock().await, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_blank_queries_skip_backend() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::new(provider.clone());

        assert!(service.search("   ", None).await.unwrap().is_empty());
        assert!(service.suggest_town_names("", None).await.unwrap().is_empty());
        assert!(service.town_location(" ").await.unwrap().is_none());
        assert!(provider.queries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_search_limits_are_clamped() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::new(provider.clone());

        service.search(" piscine ", None).await.unwrap();
        service.search("stade", Some(1_000)).await.unwrap();
        service.suggest_town_names("Nan", None).await.unwrap();
        service.suggest_town_names("Nan", Some(500)).await.unwrap();

        let queries = provider.queries.lock().await;
        assert_eq!(queries[0], ("piscine".to_string(), 20));
        assert_eq!(queries[1], ("stade".to_string(), 100));
        assert_eq!(queries[2], ("Nan".to_string(), 10));
        assert_eq!(queries[3], ("Nan".to_string(), 50));
    }

    #[tokio::test]
    async fn test_search_nearby_validation() {
        let provider = Arc::new(MockProvider::default());
        let service = SearchIndexService::new(provider);

        assert!(matches!(
            service.search_nearby(95.0, 0.0, 100.0, None).await,
            Err(SearchIndexError::ValidationError(_))
        ));
        assert!(matches!(
            service.search_nearby(47.2, -1.5, -1.0, None).await,
            Err(SearchIndexError::ValidationError(_))
        ));
        assert!(service.search_nearby(47.2, -1.5, 0.0, None).await.is_ok());
    }
}
