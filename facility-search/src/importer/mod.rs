//! Multi-pass importer merging the facility, equipment and activity tables
//! into one nested document per facility.
//!
//! Passes run strictly in order: facilities first, so equipment rows can find
//! their facility, then equipment, so activity rows can find their equipment.
//! Row-level problems are recorded in the manifest and never stop a pass. A
//! store write or serialization failure on one row is a row problem too; only
//! losing the store connection or an input stream aborts.
//!
//! Input readers are `std::io::BufRead` and are read synchronously between
//! store calls, on the caller's task. Run the importer on a runtime that can
//! afford to block a worker (the binary's multi-threaded runtime does), or
//! hand it in-memory readers.

mod lines;
mod manifest;
mod towns;

pub use manifest::{ImportManifest, PassReport, RowFailure, TownImportReport};
pub use towns::TownImporter;

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::errors::{ImportError, RecordKind, RowError};
use crate::parser::{parse, Record};
use facility_search_repository::{FacilityStore, StoreError};
use facility_search_shared::Equipment;
use lines::data_lines;

/// Configuration for the importer.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Drop the collection before the facility pass.
    pub reset_collection: bool,
    /// Log progress every this many rows.
    pub progress_interval: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            reset_collection: true,
            progress_interval: 1000,
        }
    }
}

/// What happened to one data row.
enum RowOutcome {
    Applied,
    Skipped,
    Failed(RowError),
}

/// Importer that applies parsed rows to the document store.
pub struct FacilityImporter {
    store: Arc<dyn FacilityStore>,
    config: ImportConfig,
}

impl FacilityImporter {
    /// Create a new importer with default configuration.
    pub fn new(store: Arc<dyn FacilityStore>) -> Self {
        Self {
            store,
            config: ImportConfig::default(),
        }
    }

    /// Create a new importer with custom configuration.
    pub fn with_config(store: Arc<dyn FacilityStore>, config: ImportConfig) -> Self {
        Self { store, config }
    }

    /// Run the three passes in order: facilities, equipment, activities.
    ///
    /// # Returns
    ///
    /// * `Ok(ImportManifest)` - Counts and row failures for every pass
    /// * `Err(ImportError)` - If the store became unreachable or an input stream failed
    #[instrument(skip_all, fields(reset = self.config.reset_collection))]
    pub async fn import<F, E, A>(
        &self,
        facilities: F,
        equipment: E,
        activities: A,
    ) -> Result<ImportManifest, ImportError>
    where
        F: BufRead,
        E: BufRead,
        A: BufRead,
    {
        if self.config.reset_collection {
            self.store.reset().await?;
            info!("Facility collection reset");
        }

        let facilities = self.import_facilities(facilities).await?;
        let equipment = self.import_equipment(equipment).await?;
        let activities = self.import_activities(activities).await?;

        Ok(ImportManifest {
            reset: self.config.reset_collection,
            facilities,
            equipment,
            activities,
        })
    }

    /// Facility pass: upsert one facility per row.
    #[instrument(skip_all)]
    pub async fn import_facilities<R: BufRead>(&self, reader: R) -> Result<PassReport, ImportError> {
        let mut report = PassReport::new(RecordKind::Facility);

        for (line_number, line) in data_lines(reader) {
            let line = line?;
            let outcome = match parse(&line, RecordKind::Facility) {
                Ok(Some(Record::Facility(record))) => {
                    match self.store.upsert_facility(&record.into_facility()).await {
                        Ok(()) => RowOutcome::Applied,
                        Err(e) => store_failure(e)?,
                    }
                }
                Ok(_) => RowOutcome::Skipped,
                Err(e) => RowOutcome::Failed(e.into()),
            };
            self.tally(&mut report, line_number, outcome);
        }

        self.finish(&report);
        Ok(report)
    }

    /// Equipment pass: append each equipment to the facility it references.
    ///
    /// Facility lookups go through a cache that lives only for this pass.
    #[instrument(skip_all)]
    pub async fn import_equipment<R: BufRead>(&self, reader: R) -> Result<PassReport, ImportError> {
        let mut report = PassReport::new(RecordKind::Equipment);
        let mut known_facilities: HashMap<String, bool> = HashMap::new();

        for (line_number, line) in data_lines(reader) {
            let line = line?;
            let outcome = match parse(&line, RecordKind::Equipment) {
                Ok(Some(Record::Equipment(record))) => match self
                    .apply_equipment(record.facility_id, &record.equipment, &mut known_facilities)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => store_failure(e)?,
                },
                Ok(_) => RowOutcome::Skipped,
                Err(e) => RowOutcome::Failed(e.into()),
            };
            self.tally(&mut report, line_number, outcome);
        }

        debug!(cached_facilities = known_facilities.len(), "Dropping equipment pass cache");
        self.finish(&report);
        Ok(report)
    }

    async fn apply_equipment(
        &self,
        facility_id: String,
        equipment: &Equipment,
        known_facilities: &mut HashMap<String, bool>,
    ) -> Result<RowOutcome, StoreError> {
        let present = match known_facilities.get(&facility_id) {
            Some(present) => *present,
            None => {
                let present = self.store.facility_exists(&facility_id).await?;
                known_facilities.insert(facility_id.clone(), present);
                present
            }
        };
        if !present {
            return Ok(RowOutcome::Failed(RowError::unresolved(
                RecordKind::Facility,
                facility_id,
            )));
        }

        if self
            .store
            .push_equipment(&facility_id, equipment, Utc::now())
            .await?
        {
            Ok(RowOutcome::Applied)
        } else {
            known_facilities.insert(facility_id.clone(), false);
            Ok(RowOutcome::Failed(RowError::unresolved(
                RecordKind::Facility,
                facility_id,
            )))
        }
    }

    /// Activity pass: append each activity to the equipment it references.
    #[instrument(skip_all)]
    pub async fn import_activities<R: BufRead>(&self, reader: R) -> Result<PassReport, ImportError> {
        let mut report = PassReport::new(RecordKind::Activity);

        for (line_number, line) in data_lines(reader) {
            let line = line?;
            let outcome = match parse(&line, RecordKind::Activity) {
                Ok(Some(Record::Activity(record))) => match self
                    .store
                    .push_activity(&record.equipment_number, &record.activity)
                    .await
                {
                    Ok(true) => RowOutcome::Applied,
                    Ok(false) => RowOutcome::Failed(RowError::unresolved(
                        RecordKind::Equipment,
                        record.equipment_number,
                    )),
                    Err(e) => store_failure(e)?,
                },
                Ok(_) => RowOutcome::Skipped,
                Err(e) => RowOutcome::Failed(e.into()),
            };
            self.tally(&mut report, line_number, outcome);
        }

        self.finish(&report);
        Ok(report)
    }

    fn tally(&self, report: &mut PassReport, line_number: usize, outcome: RowOutcome) {
        report.processed += 1;
        match outcome {
            RowOutcome::Applied => report.applied += 1,
            RowOutcome::Skipped => report.skipped += 1,
            RowOutcome::Failed(error) => {
                debug!(pass = %report.kind, line = line_number, error = %error, "Row rejected");
                report.record_failure(line_number, error);
            }
        }

        if self.config.progress_interval > 0 && report.processed % self.config.progress_interval == 0
        {
            info!(
                pass = %report.kind,
                processed = report.processed,
                failed = report.failed(),
                "Import progress"
            );
        }
    }

    fn finish(&self, report: &PassReport) {
        if report.failed() > 0 {
            warn!(
                pass = %report.kind,
                processed = report.processed,
                applied = report.applied,
                skipped = report.skipped,
                failed = report.failed(),
                "Import pass completed with rejected rows"
            );
        } else {
            info!(
                pass = %report.kind,
                processed = report.processed,
                applied = report.applied,
                skipped = report.skipped,
                "Import pass completed"
            );
        }
    }
}

/// A store error on one row fails that row, unless the store is unreachable.
fn store_failure(error: StoreError) -> Result<RowOutcome, StoreError> {
    match error {
        StoreError::ConnectionError(_) => Err(error),
        other => Ok(RowOutcome::Failed(RowError::Store(other.to_string()))),
    }
}
