//! Runtime settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

const DEFAULT_MONGODB_URL: &str = "mongodb://localhost:27017";
const DEFAULT_MONGODB_DATABASE: &str = "nosql-workshop";
const DEFAULT_MONGODB_COLLECTION: &str = "installations";
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";
const DEFAULT_FACILITIES_INDEX: &str = "installations";
const DEFAULT_TOWNS_INDEX: &str = "towns";
const DEFAULT_FACILITIES_CSV: &str = "data/installations.csv";
const DEFAULT_EQUIPMENT_CSV: &str = "data/equipements.csv";
const DEFAULT_ACTIVITIES_CSV: &str = "data/activites.csv";
const DEFAULT_PROJECTION_BATCH_SIZE: usize = 500;
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for the backing services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection at a fixed interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("retry").to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Paths of the input files.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSources {
    pub facilities: PathBuf,
    pub equipment: PathBuf,
    pub activities: PathBuf,
    /// Towns are only imported when a file is configured.
    pub towns: Option<PathBuf>,
}

/// All settings of the import pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mongodb_url: String,
    pub mongodb_database: String,
    pub mongodb_collection: String,
    pub opensearch_url: String,
    pub facilities_index: String,
    pub towns_index: String,
    pub sources: ImportSources,
    pub projection_batch_size: usize,
    pub reset_collection: bool,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MONGODB_URL`: MongoDB connection string (default: mongodb://localhost:27017)
    /// - `MONGODB_DATABASE`: Database name (default: nosql-workshop)
    /// - `MONGODB_COLLECTION`: Facility collection (default: installations)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `FACILITIES_INDEX`: Facility index alias (default: installations)
    /// - `TOWNS_INDEX`: Town index alias (default: towns)
    /// - `FACILITIES_CSV`, `EQUIPMENT_CSV`, `ACTIVITIES_CSV`: Input files (default: under data/)
    /// - `TOWNS_CSV`: Towns file, optional
    /// - `PROJECTION_BATCH_SIZE`: Documents per bulk request (default: 500)
    /// - `RESET_COLLECTION`: Drop the collection before importing (default: true)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let projection_batch_size = lookup("PROJECTION_BATCH_SIZE")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_PROJECTION_BATCH_SIZE);
        let reset_collection = lookup("RESET_COLLECTION")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);
        let retry_interval = lookup("OPENSEARCH_RETRY_INTERVAL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);

        Self {
            mongodb_url: get("MONGODB_URL", DEFAULT_MONGODB_URL),
            mongodb_database: get("MONGODB_DATABASE", DEFAULT_MONGODB_DATABASE),
            mongodb_collection: get("MONGODB_COLLECTION", DEFAULT_MONGODB_COLLECTION),
            opensearch_url: get("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL),
            facilities_index: get("FACILITIES_INDEX", DEFAULT_FACILITIES_INDEX),
            towns_index: get("TOWNS_INDEX", DEFAULT_TOWNS_INDEX),
            sources: ImportSources {
                facilities: PathBuf::from(get("FACILITIES_CSV", DEFAULT_FACILITIES_CSV)),
                equipment: PathBuf::from(get("EQUIPMENT_CSV", DEFAULT_EQUIPMENT_CSV)),
                activities: PathBuf::from(get("ACTIVITIES_CSV", DEFAULT_ACTIVITIES_CSV)),
                towns: lookup("TOWNS_CSV")
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from),
            },
            projection_batch_size,
            reset_collection,
            connection_mode: ConnectionMode::parse(lookup("OPENSEARCH_CONNECTION_MODE").as_deref()),
            retry_interval: Duration::from_secs(retry_interval),
        }
    }
}
