//! Per-pass import reports.

use crate::errors::{RecordKind, RowError};

/// A rejected row and the reason it was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    /// 1-based line number in the source stream (the header is line 1).
    pub line: usize,
    pub error: RowError,
}

/// Counters for a single import pass.
///
/// `processed` counts every non-blank data row. Each processed row ends up in
/// exactly one of `applied`, `skipped` or `failures`.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub kind: RecordKind,
    pub processed: usize,
    pub applied: usize,
    pub skipped: usize,
    pub failures: Vec<RowFailure>,
}

impl PassReport {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            processed: 0,
            applied: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub(crate) fn record_failure(&mut self, line: usize, error: RowError) {
        self.failures.push(RowFailure { line, error });
    }
}

/// Outcome of a full three-pass import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportManifest {
    /// Whether the collection was dropped before the facility pass.
    pub reset: bool,
    pub facilities: PassReport,
    pub equipment: PassReport,
    pub activities: PassReport,
}

impl ImportManifest {
    /// The pass reports in execution order.
    pub fn passes(&self) -> [&PassReport; 3] {
        [&self.facilities, &self.equipment, &self.activities]
    }

    pub fn total_failures(&self) -> usize {
        self.passes().iter().map(|p| p.failed()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_failures() == 0
    }
}

/// Outcome of a towns import.
#[derive(Debug, Clone, PartialEq)]
pub struct TownImportReport {
    pub rows: PassReport,
    /// Ids of town documents the search index rejected.
    pub failed_ids: Vec<String>,
}
