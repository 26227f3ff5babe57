//! Configuration types for the SearchIndexService.

/// Hard upper bound on town suggestions, whatever the caller asks for.
pub const MAX_SUGGESTION_LIMIT: usize = 50;

/// Configuration for the SearchIndexService.
///
/// Controls batch limits for bulk writes and result sizes for queries, so that
/// overly large batches or result pages are never sent to the search backend.
#[derive(Debug, Clone)]
pub struct SearchIndexServiceConfig {
    /// Maximum number of documents allowed in a single batch operation.
    ///
    /// `None` disables the limit. Defaults to 1000.
    pub max_batch_size: Option<usize>,

    /// Number of hits returned by searches when the caller does not ask for a limit.
    pub default_limit: usize,

    /// Upper bound on the number of hits a caller may request.
    pub max_limit: usize,

    /// Number of town suggestions returned for autocomplete.
    pub suggestion_limit: usize,
}

impl Default for SearchIndexServiceConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
            default_limit: 20,
            max_limit: 100,
            suggestion_limit: 10,
        }
    }
}

impl SearchIndexServiceConfig {
    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
            ..Self::default()
        }
    }
}
