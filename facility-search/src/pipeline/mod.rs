//! Pipeline running a full import: CSV merge, index creation, projection and towns.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use crate::config::ImportSources;
use crate::importer::{
    FacilityImporter, ImportConfig, ImportManifest, TownImportReport, TownImporter,
};
use crate::projector::{IndexProjector, ProjectionReport, ProjectorConfig};
use crate::IndexingError;
use facility_search_repository::{FacilityStore, SearchIndexService};

/// Configuration for the pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub import: ImportConfig,
    pub projector: ProjectorConfig,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub manifest: ImportManifest,
    pub projection: ProjectionReport,
    /// Present when a towns file was imported.
    pub towns: Option<TownImportReport>,
}

/// Pipeline that coordinates the import stages.
///
/// Stages run in order: reset and the three merge passes, store indexes,
/// search indices, projection, then towns.
pub struct Pipeline {
    store: Arc<dyn FacilityStore>,
    search: SearchIndexService,
    importer: FacilityImporter,
    projector: IndexProjector,
    towns: TownImporter,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn FacilityStore>,
        search: SearchIndexService,
        config: PipelineConfig,
    ) -> Self {
        let batch_size = config.projector.batch_size;
        Self {
            importer: FacilityImporter::with_config(store.clone(), config.import),
            projector: IndexProjector::with_config(store.clone(), search.clone(), config.projector),
            towns: TownImporter::with_batch_size(search.clone(), batch_size),
            store,
            search,
        }
    }

    /// Run the pipeline over the configured files.
    pub async fn run(&self, sources: &ImportSources) -> Result<PipelineReport, IndexingError> {
        let towns = match &sources.towns {
            Some(path) => Some(open(path)?),
            None => None,
        };
        self.run_streams(
            open(&sources.facilities)?,
            open(&sources.equipment)?,
            open(&sources.activities)?,
            towns,
        )
        .await
    }

    /// Run the pipeline over already opened streams.
    #[instrument(skip_all)]
    pub async fn run_streams<F, E, A, T>(
        &self,
        facilities: F,
        equipment: E,
        activities: A,
        towns: Option<T>,
    ) -> Result<PipelineReport, IndexingError>
    where
        F: BufRead,
        E: BufRead,
        A: BufRead,
        T: Read,
    {
        let started = Instant::now();

        let manifest = self.importer.import(facilities, equipment, activities).await?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            failed_rows = manifest.total_failures(),
            "CSV import finished"
        );

        self.store.ensure_indexes().await?;
        self.search.ensure_indices().await?;

        let projected_at = Instant::now();
        let projection = self.projector.run().await?;
        info!(
            elapsed_ms = projected_at.elapsed().as_millis() as u64,
            indexed = projection.indexed,
            "Projection finished"
        );

        let towns = match towns {
            Some(reader) => Some(self.towns.import(reader).await?),
            None => None,
        };

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline completed"
        );

        Ok(PipelineReport {
            manifest,
            projection,
            towns,
        })
    }
}

fn open(path: &Path) -> Result<BufReader<File>, IndexingError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| IndexingError::config(format!("Failed to open {}: {}", path.display(), e)))
}
