//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    http::response::Response,
    indices::{IndicesCreateParts, IndicesExistsParts},
    params::SearchType,
    BulkParts, OpenSearch, SearchParts,
};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::{self, IndexConfig};
use crate::opensearch::{queries, response};
use crate::types::BatchOperationSummary;
use facility_search_shared::{
    FacilityHit, FacilitySearchDocument, GeoPoint, TownDocument, TownSuggestion,
};

/// OpenSearch provider implementation.
///
/// Provides full-text, geo-distance and prefix search over facilities and towns.
/// Indices are created on first use; concurrent first callers share a single
/// creation attempt.
///
/// # Example
///
/// ```ignore
/// use facility_search_repository::opensearch::{IndexConfig, OpenSearchProvider};
///
/// let provider = OpenSearchProvider::new("http://localhost:9200", IndexConfig::default()).await?;
/// let hits = provider.full_text_search("piscine nantes", 20).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
    indices_ready: OnceCell<()>,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index configuration containing aliases and version
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            facilities_alias = %index_config.facilities_alias,
            towns_alias = %index_config.towns_alias,
            version = index_config.version,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
            indices_ready: OnceCell::new(),
        })
    }

    /// Create the versioned index behind `alias` unless the alias already resolves.
    async fn ensure_index(&self, alias: &str, settings: Value) -> Result<(), SearchIndexError> {
        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[alias]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(alias = %alias, "Index already exists");
            return Ok(());
        }

        let index_name = index_config::get_versioned_index_name(alias, self.index_config.version);
        let created = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&index_name))
            .body(settings)
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = created.status_code();
        if status.is_success() {
            info!(index = %index_name, alias = %alias, "Created search index");
            return Ok(());
        }

        let body = created.json::<Value>().await.unwrap_or_default();
        if response::is_already_exists_error(&body) {
            debug!(index = %index_name, "Index created concurrently");
            return Ok(());
        }

        error!(status = %status, body = %body, "Index creation failed");
        Err(SearchIndexError::index_creation(format!(
            "Creating {} failed with status {}: {}",
            index_name, status, body
        )))
    }

    /// Submit bulk lines to an alias and summarize per-item outcomes.
    async fn bulk(&self, alias: &str, lines: Vec<Value>) -> Result<BatchOperationSummary, SearchIndexError> {
        let body: Vec<JsonBody<Value>> = lines.into_iter().map(JsonBody::new).collect();

        let response = self
            .client
            .bulk(BulkParts::Index(alias))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_index(e.to_string()))?;

        let response_body = Self::read_success_body(response, "Bulk").await?;
        let summary = response::parse_bulk_response(&response_body)?;

        debug!(
            alias = %alias,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }

    /// Run a search request against an alias and return the raw response body.
    async fn search(&self, alias: &str, query: Value) -> Result<Value, SearchIndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[alias]))
            .search_type(SearchType::DfsQueryThenFetch)
            .body(query)
            .send()
            .await
            .map_err(|e| SearchIndexError::query(e.to_string()))?;

        Self::read_success_body(response, "Search").await
    }

    async fn read_success_body(response: Response, operation: &str) -> Result<Value, SearchIndexError> {
        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "{} request failed", operation);
            return Err(SearchIndexError::query(format!(
                "{} failed with status {}: {}",
                operation, status, error_body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn ensure_indices(&self) -> Result<(), SearchIndexError> {
        self.indices_ready
            .get_or_try_init(|| async {
                let facilities = &self.index_config.facilities_alias;
                let towns = &self.index_config.towns_alias;
                self.ensure_index(facilities, index_config::get_facility_index_settings(facilities))
                    .await?;
                self.ensure_index(towns, index_config::get_town_index_settings(towns))
                    .await
            })
            .await
            .map(|_| ())
    }

    async fn bulk_index_facilities(
        &self,
        documents: &[FacilitySearchDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::default());
        }
        self.ensure_indices().await?;

        let lines = queries::facility_bulk_lines(documents)?;
        self.bulk(&self.index_config.facilities_alias, lines).await
    }

    async fn bulk_index_towns(
        &self,
        towns: &[TownDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if towns.is_empty() {
            return Ok(BatchOperationSummary::default());
        }
        self.ensure_indices().await?;

        let lines = queries::town_bulk_lines(towns)?;
        self.bulk(&self.index_config.towns_alias, lines).await
    }

    async fn full_text_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<FacilityHit>, SearchIndexError> {
        self.ensure_indices().await?;
        let body = self
            .search(
                &self.index_config.facilities_alias,
                queries::full_text_query(query, limit),
            )
            .await?;
        response::parse_facility_hits(&body)
    }

    async fn geo_search(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: f64,
        limit: usize,
    ) -> Result<Vec<FacilityHit>, SearchIndexError> {
        self.ensure_indices().await?;
        let body = self
            .search(
                &self.index_config.facilities_alias,
                queries::geo_distance_query(lat, lng, radius_meters, limit),
            )
            .await?;
        response::parse_facility_hits(&body)
    }

    async fn suggest_town_names(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<TownSuggestion>, SearchIndexError> {
        self.ensure_indices().await?;
        let body = self
            .search(
                &self.index_config.towns_alias,
                queries::town_prefix_query(prefix, limit),
            )
            .await?;
        response::parse_town_suggestions(&body)
    }

    async fn town_location(&self, name: &str) -> Result<Option<GeoPoint>, SearchIndexError> {
        self.ensure_indices().await?;
        let body = self
            .search(&self.index_config.towns_alias, queries::town_match_query(name))
            .await?;
        response::parse_town_location(&body)
    }
}
