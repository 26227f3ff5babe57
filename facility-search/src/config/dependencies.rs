//! Dependency initialization and wiring for the facility importer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use super::settings::{ConnectionMode, Settings};
use crate::importer::ImportConfig;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::projector::ProjectorConfig;
use crate::query::QueryService;
use crate::IndexingError;
use facility_search_repository::opensearch::IndexConfig;
use facility_search_repository::{
    FacilityStore, MongoFacilityStore, OpenSearchProvider, SearchIndexService,
    SearchIndexServiceConfig,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub settings: Settings,
    /// The configured pipeline ready to run.
    pub pipeline: Pipeline,
    pub queries: QueryService,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`Settings::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails (only in fail-fast mode)
    pub async fn new() -> Result<Self, IndexingError> {
        Self::from_settings(Settings::from_env()).await
    }

    pub async fn from_settings(settings: Settings) -> Result<Self, IndexingError> {
        info!(
            mongodb_url = %settings.mongodb_url,
            mongodb_database = %settings.mongodb_database,
            mongodb_collection = %settings.mongodb_collection,
            opensearch_url = %settings.opensearch_url,
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            "Initializing dependencies"
        );

        let store = connect_with_retry(
            "MongoDB",
            settings.connection_mode,
            settings.retry_interval,
            || {
                MongoFacilityStore::connect(
                    &settings.mongodb_url,
                    &settings.mongodb_database,
                    &settings.mongodb_collection,
                )
            },
        )
        .await?;
        info!("MongoDB connection established");

        let index_config = IndexConfig::new(
            settings.facilities_index.clone(),
            settings.towns_index.clone(),
            0,
        );
        let provider = connect_with_retry(
            "OpenSearch",
            settings.connection_mode,
            settings.retry_interval,
            || OpenSearchProvider::new(&settings.opensearch_url, index_config.clone()),
        )
        .await?;
        info!("OpenSearch connection established");

        let store: Arc<dyn FacilityStore> = Arc::new(store);
        let service_config = SearchIndexServiceConfig {
            max_batch_size: Some(settings.projection_batch_size.max(1000)),
            ..SearchIndexServiceConfig::default()
        };
        let search = SearchIndexService::with_config(Arc::new(provider), service_config);

        let pipeline = Pipeline::new(
            store.clone(),
            search.clone(),
            PipelineConfig {
                import: ImportConfig {
                    reset_collection: settings.reset_collection,
                    ..ImportConfig::default()
                },
                projector: ProjectorConfig {
                    batch_size: settings.projection_batch_size,
                },
            },
        );
        let queries = QueryService::new(store, search);

        Ok(Self {
            settings,
            pipeline,
            queries,
        })
    }
}

/// Connect to a backend with retry logic based on connection mode.
async fn connect_with_retry<T, E, F, Fut>(
    backend: &str,
    mode: ConnectionMode,
    retry_interval: Duration,
    connect: F,
) -> Result<T, IndexingError>
where
    E: std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    loop {
        match connect().await {
            Ok(client) => return Ok(client),
            Err(e) => match mode {
                ConnectionMode::FailFast => {
                    return Err(IndexingError::config(format!(
                        "Failed to connect to {}: {}",
                        backend, e
                    )));
                }
                ConnectionMode::Retry => {
                    warn!(
                        backend = backend,
                        error = %e,
                        retry_interval_secs = retry_interval.as_secs(),
                        "Failed to connect, retrying..."
                    );
                    sleep(retry_interval).await;
                }
            },
        }
    }
}
