//! Document store error types.

use mongodb::error::ErrorKind;
use thiserror::Error;

/// Errors from document store operations.
///
/// A lookup miss is never a `StoreError`; it is reported as `None` or an empty result.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A read or aggregation failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// An insert or update failed.
    #[error("Write error: {0}")]
    WriteError(String),

    /// A document could not be converted to or from the store representation.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An index could not be created.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::WriteError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }
}

impl StoreError {
    /// Classify a failed write. Connectivity and serialization keep their kind.
    pub fn from_write(err: mongodb::error::Error) -> Self {
        match Self::from(err) {
            Self::QueryError(msg) => Self::WriteError(msg),
            other => other,
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        match *err.kind {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
                Self::ConnectionError(err.to_string())
            }
            ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
                Self::SerializationError(err.to_string())
            }
            _ => Self::QueryError(err.to_string()),
        }
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for StoreError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
