//! Request and response types for search index operations.

use crate::errors::SearchIndexError;

/// Result of a batch operation for a single item.
///
/// This struct represents the outcome of a single operation within a batch (e.g.,
/// indexing one document). It indicates whether the operation succeeded and
/// includes error details if it failed.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The search document id.
    pub document_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

impl BatchOperationResult {
    pub fn succeeded(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(document_id: impl Into<String>, error: SearchIndexError) -> Self {
        Self {
            document_id: document_id.into(),
            success: false,
            error: Some(error),
        }
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This struct provides a complete overview of a bulk operation, including the total
/// number of items processed, how many succeeded and failed, and detailed results for
/// each individual item. This allows callers to retry just the failed subset.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-item results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Mark every id of a batch as failed with the same error.
    ///
    /// Used when the whole bulk request could not be submitted.
    pub fn all_failed<'a>(ids: impl IntoIterator<Item = &'a str>, error: SearchIndexError) -> Self {
        Self::from_results(
            ids.into_iter()
                .map(|id| BatchOperationResult::failed(id, error.clone()))
                .collect(),
        )
    }

    /// Iterate over the failed results.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Ids of the documents that failed.
    pub fn failed_ids(&self) -> Vec<String> {
        self.failures().map(|r| r.document_id.clone()).collect()
    }
}
