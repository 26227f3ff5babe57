//! Projector copying the document store into the search index.
//!
//! Streams every facility, converts it to a search document and indexes
//! documents in bulk batches. Documents are keyed by facility id, so a re-run
//! overwrites instead of duplicating.

use std::sync::Arc;

use futures::TryStreamExt;
use tracing::{debug, error, info, instrument, warn};

use facility_search_repository::{
    BatchOperationSummary, FacilityStore, SearchIndexService, StoreError,
};
use facility_search_shared::FacilitySearchDocument;

/// Configuration for the projector.
#[derive(Debug, Clone)]
pub struct ProjectorConfig {
    /// Number of documents to batch before flushing.
    pub batch_size: usize,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self { batch_size: 500 }
    }
}

/// A facility the search index did not accept.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionFailure {
    pub id: String,
    pub error: String,
}

/// Outcome of a projection run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionReport {
    /// Documents read from the store.
    pub total: usize,
    /// Documents the search index accepted.
    pub indexed: usize,
    pub failures: Vec<ProjectionFailure>,
}

impl ProjectionReport {
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.id.as_str()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Projector that indexes every stored facility into the search engine.
pub struct IndexProjector {
    store: Arc<dyn FacilityStore>,
    search: SearchIndexService,
    config: ProjectorConfig,
}

impl IndexProjector {
    /// Create a new projector with default configuration.
    pub fn new(store: Arc<dyn FacilityStore>, search: SearchIndexService) -> Self {
        Self::with_config(store, search, ProjectorConfig::default())
    }

    /// Create a new projector with custom configuration.
    pub fn with_config(
        store: Arc<dyn FacilityStore>,
        search: SearchIndexService,
        config: ProjectorConfig,
    ) -> Self {
        let config = ProjectorConfig {
            batch_size: config.batch_size.max(1),
        };
        Self {
            store,
            search,
            config,
        }
    }

    /// Project the whole store.
    ///
    /// Search index failures are collected in the report and never abort the run.
    /// Only a failure reading the store returns an error.
    #[instrument(skip(self), fields(batch_size = self.config.batch_size))]
    pub async fn run(&self) -> Result<ProjectionReport, StoreError> {
        let mut report = ProjectionReport::default();
        let mut pending: Vec<FacilitySearchDocument> = Vec::with_capacity(self.config.batch_size);

        let mut cursor = self.store.stream_all().await?;
        while let Some(facility) = cursor.try_next().await? {
            report.total += 1;
            pending.push(FacilitySearchDocument::from(facility));

            if pending.len() >= self.config.batch_size {
                self.flush(&mut pending, &mut report).await;
            }
        }
        self.flush(&mut pending, &mut report).await;

        if report.is_success() {
            info!(indexed = report.indexed, "Projection completed");
        } else {
            warn!(
                indexed = report.indexed,
                failed = report.failures.len(),
                "Projection completed with failures"
            );
        }
        Ok(report)
    }

    /// Flush pending documents to the search index.
    async fn flush(&self, pending: &mut Vec<FacilitySearchDocument>, report: &mut ProjectionReport) {
        if pending.is_empty() {
            return;
        }

        let documents: Vec<FacilitySearchDocument> = pending.drain(..).collect();
        let count = documents.len();
        let ids: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();

        debug!(count = count, "Flushing documents to search index");

        let summary = match self.search.index_facilities(documents).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, count = count, "Failed to bulk index facilities");
                BatchOperationSummary::all_failed(ids.iter().map(String::as_str), e)
            }
        };

        if summary.failed > 0 {
            warn!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Bulk index completed with some failures"
            );
        }
        report.indexed += summary.succeeded;
        for result in summary.failures() {
            let error = result
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            error!(facility_id = %result.document_id, error = %error, "Failed to index facility");
            report.failures.push(ProjectionFailure {
                id: result.document_id.clone(),
                error,
            });
        }
    }
}
