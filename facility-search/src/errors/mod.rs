//! Error types for the facility importer.

use std::fmt;

use facility_search_repository::{SearchIndexError, StoreError};
use thiserror::Error;

/// The source table a record was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Facility,
    Equipment,
    Activity,
    Town,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facility => "facility",
            Self::Equipment => "equipment",
            Self::Activity => "activity",
            Self::Town => "town",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line could not be turned into a record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// A merge-key field is missing or empty.
    #[error("malformed {kind} record: field '{field}' {reason}")]
    Malformed {
        kind: RecordKind,
        field: &'static str,
        reason: String,
    },

    /// The line has fewer columns than the table requires.
    #[error("malformed {kind} record: expected at least {expected} columns, found {found}")]
    MissingColumns {
        kind: RecordKind,
        expected: usize,
        found: usize,
    },
}

impl RecordError {
    /// Create a malformed field error.
    pub fn malformed(kind: RecordKind, field: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Malformed { kind, .. } | Self::MissingColumns { kind, .. } => *kind,
        }
    }
}

/// Why a single row was rejected. Row errors are recorded and the pass continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error(transparent)]
    Malformed(#[from] RecordError),

    /// The row refers to a facility or equipment that is not in the store.
    #[error("unresolved {kind} reference '{key}'")]
    UnresolvedReference { kind: RecordKind, key: String },

    /// The store refused the write for this row while staying reachable.
    #[error("store rejected row: {0}")]
    Store(String),
}

impl RowError {
    /// Create an unresolved reference error.
    pub fn unresolved(kind: RecordKind, key: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            kind,
            key: key.into(),
        }
    }
}

/// Errors that abort an import pass.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Document store failure.
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// Search index failure while importing towns.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] SearchIndexError),

    /// Failure reading an input stream.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failure reading a CSV input.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Errors returned by the query service.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Invalid caller input.
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Search index error: {0}")]
    SearchIndexError(#[from] SearchIndexError),
}

impl QueryError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}
