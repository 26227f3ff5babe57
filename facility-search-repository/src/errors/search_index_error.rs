//! Search index error types.

use thiserror::Error;

/// Errors from search index operations.
///
/// Returned directly by single queries. Within bulk requests, a per-document
/// rejection is carried as a `DocumentRejected` error inside the batch summary
/// while the rest of the batch goes through.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Caller input was rejected before reaching the backend
    /// (out of range coordinates, negative radius).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The backend could not be reached.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The backend refused a single document of a bulk request.
    #[error("Document rejected: {0}")]
    DocumentRejected(String),

    /// A bulk request failed as a whole.
    #[error("Bulk request failed: {0}")]
    BulkRequestFailed(String),

    /// A facility or town index could not be created.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// A search request was rejected or failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// The backend answered with a body we could not read.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A document could not be encoded as JSON.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// More documents than a single bulk request may carry.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },
}

impl SearchIndexError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Rejection of one document, usually carrying the backend's error reason.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::DocumentRejected(msg.into())
    }

    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkRequestFailed(msg.into())
    }

    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }
}

impl From<opensearch::Error> for SearchIndexError {
    fn from(err: opensearch::Error) -> Self {
        Self::ConnectionError(err.to_string())
    }
}

impl From<serde_json::Error> for SearchIndexError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
