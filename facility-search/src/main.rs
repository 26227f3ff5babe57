//! Facility Import Entry Point
//!
//! Imports the facility, equipment and activity files into MongoDB, then
//! projects the result into OpenSearch along with the towns file.

use dotenv::dotenv;
use facility_search::{Dependencies, IndexingError, PipelineReport, QueryService};
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("facility_search=info,facility_search_repository=info")
    });

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();

        info!(
            service_name = "facility-import",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();

        info!(
            service_name = "facility-import",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }
}

/// Log the manifest and projection outcome, one line per failure.
fn report(outcome: &PipelineReport) {
    for pass in outcome.manifest.passes() {
        info!(
            pass = %pass.kind,
            processed = pass.processed,
            applied = pass.applied,
            skipped = pass.skipped,
            failed = pass.failed(),
            "Import pass summary"
        );
        for failure in &pass.failures {
            warn!(pass = %pass.kind, line = failure.line, error = %failure.error, "Rejected row");
        }
    }

    for failure in &outcome.projection.failures {
        warn!(facility_id = %failure.id, error = %failure.error, "Facility not indexed");
    }

    if let Some(towns) = &outcome.towns {
        info!(
            processed = towns.rows.processed,
            rejected_rows = towns.rows.failed(),
            failed_documents = towns.failed_ids.len(),
            "Town import summary"
        );
    }
}

/// Log a few statistics computed against the freshly imported store.
async fn log_statistics(queries: &QueryService) {
    let stats = async {
        let count = queries.count().await?;
        let average = queries.average_equipment_per_facility().await?;
        let top_activities = queries.count_by_activity().await?;
        let busiest = queries.facility_with_most_equipment().await?;
        Ok::<_, facility_search::QueryError>((count, average, top_activities, busiest))
    };

    match stats.await {
        Ok((count, average, top_activities, busiest)) => {
            info!(
                facilities = count,
                average_equipment = average.unwrap_or(0.0),
                busiest_facility = busiest.as_ref().map(|f| f.name.as_str()).unwrap_or("-"),
                "Store statistics"
            );
            for entry in top_activities.iter().take(5) {
                info!(activity = %entry.activity, total = entry.total, "Top activity");
            }
        }
        Err(e) => warn!(error = %e, "Failed to compute store statistics"),
    }
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting facility import");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.pipeline.run(&deps.settings.sources).await {
        Ok(outcome) => {
            report(&outcome);
            log_statistics(&deps.queries).await;
            info!("Facility import completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Facility import failed");
            Err(e)
        }
    }
}
