//! Town import into the search index, used for autocomplete and location lookup.

use std::io::Read;

use csv::ReaderBuilder;
use tracing::{error, info, instrument, warn};

use super::manifest::{PassReport, TownImportReport};
use crate::errors::{ImportError, RecordError, RecordKind, RowError};
use crate::parser::{parse_fields, Record};
use facility_search_repository::{BatchOperationSummary, SearchIndexService};
use facility_search_shared::TownDocument;

/// Default number of towns per bulk request.
const DEFAULT_BATCH_SIZE: usize = 500;

/// Reads the towns CSV and bulk indexes it.
pub struct TownImporter {
    search: SearchIndexService,
    batch_size: usize,
}

impl TownImporter {
    pub fn new(search: SearchIndexService) -> Self {
        Self {
            search,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(search: SearchIndexService, batch_size: usize) -> Self {
        Self {
            search,
            batch_size: batch_size.max(1),
        }
    }

    /// Import every town row of a CSV stream with a header row.
    ///
    /// Rows with a missing name or unreadable coordinates are reported and skipped.
    /// A failed bulk request marks every town of the batch as failed and the
    /// import goes on with the next batch.
    #[instrument(skip_all)]
    pub async fn import<R: Read>(&self, reader: R) -> Result<TownImportReport, ImportError> {
        let mut rows = PassReport::new(RecordKind::Town);
        let mut failed_ids = Vec::new();
        let mut batch: Vec<TownDocument> = Vec::with_capacity(self.batch_size);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        for (index, result) in reader.records().enumerate() {
            // Header is line 1
            let fallback_line = index + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    let line = e
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(fallback_line);
                    warn!(line = line, error = %e, "Unreadable town row");
                    rows.processed += 1;
                    rows.record_failure(
                        line,
                        RecordError::malformed(RecordKind::Town, "row", e.to_string()).into(),
                    );
                    continue;
                }
            };

            rows.processed += 1;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(fallback_line);
            let fields: Vec<&str> = record.iter().collect();

            match parse_fields(&fields, RecordKind::Town) {
                Ok(Some(Record::Town(town))) => {
                    batch.push(town.into_document());
                    rows.applied += 1;
                }
                Ok(_) => rows.skipped += 1,
                Err(e) => rows.record_failure(line, RowError::from(e)),
            }

            if batch.len() >= self.batch_size {
                failed_ids.extend(self.flush(&mut batch).await);
            }
        }
        failed_ids.extend(self.flush(&mut batch).await);

        info!(
            processed = rows.processed,
            indexed = rows.applied.saturating_sub(failed_ids.len()),
            rejected_rows = rows.failed(),
            failed_documents = failed_ids.len(),
            "Town import completed"
        );

        Ok(TownImportReport { rows, failed_ids })
    }

    /// Send the pending batch and return the ids that failed.
    async fn flush(&self, batch: &mut Vec<TownDocument>) -> Vec<String> {
        if batch.is_empty() {
            return Vec::new();
        }
        let towns: Vec<TownDocument> = batch.drain(..).collect();
        let ids: Vec<String> = towns.iter().map(|t| t.document_id().to_string()).collect();

        let summary = match self.search.index_towns(towns).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, count = ids.len(), "Failed to bulk index towns");
                BatchOperationSummary::all_failed(ids.iter().map(String::as_str), e)
            }
        };

        for failure in summary.failures() {
            if let Some(ref err) = failure.error {
                warn!(town = %failure.document_id, error = %err, "Failed to index town");
            }
        }
        summary.failed_ids()
    }
}
