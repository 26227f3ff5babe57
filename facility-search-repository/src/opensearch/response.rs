//! Parsing of OpenSearch response bodies.

use serde_json::Value;
use tracing::warn;

use crate::errors::SearchIndexError;
use crate::types::{BatchOperationResult, BatchOperationSummary};
use facility_search_shared::{
    FacilityHit, FacilitySearchDocument, GeoPoint, TownDocument, TownSuggestion,
};

/// Error type OpenSearch reports when creating an index that already exists.
const ALREADY_EXISTS_ERROR: &str = "resource_already_exists_exception";

/// Whether an error body means the index is already there.
pub fn is_already_exists_error(body: &Value) -> bool {
    body["error"]["type"].as_str() == Some(ALREADY_EXISTS_ERROR)
}

/// Build a per-item summary from a `_bulk` response body.
///
/// Every item is inspected, so partial failures are reported even when the
/// request as a whole returned a success status.
pub fn parse_bulk_response(body: &Value) -> Result<BatchOperationSummary, SearchIndexError> {
    let items = body["items"]
        .as_array()
        .ok_or_else(|| SearchIndexError::parse("bulk response without items"))?;

    let results = items
        .iter()
        .map(|item| {
            // Each item is keyed by its action name ("index", "create", ...)
            let outcome = item
                .as_object()
                .and_then(|o| o.values().next())
                .cloned()
                .unwrap_or(Value::Null);

            let document_id = outcome["_id"].as_str().unwrap_or_default().to_string();
            let status = outcome["status"].as_u64().unwrap_or(0);

            match outcome.get("error") {
                Some(error) if !error.is_null() => {
                    let reason = error["reason"]
                        .as_str()
                        .or_else(|| error["type"].as_str())
                        .unwrap_or("unknown bulk item error");
                    BatchOperationResult::failed(
                        document_id,
                        SearchIndexError::index(format!("status {}: {}", status, reason)),
                    )
                }
                _ if !(200..300).contains(&status) => BatchOperationResult::failed(
                    document_id,
                    SearchIndexError::index(format!("status {}", status)),
                ),
                _ => BatchOperationResult::succeeded(document_id),
            }
        })
        .collect();

    Ok(BatchOperationSummary::from_results(results))
}

fn hits(body: &Value) -> Result<&Vec<Value>, SearchIndexError> {
    body["hits"]["hits"]
        .as_array()
        .ok_or_else(|| SearchIndexError::parse("search response without hits"))
}

/// Facility hits in ranking order. Hits whose source cannot be read are skipped.
pub fn parse_facility_hits(body: &Value) -> Result<Vec<FacilityHit>, SearchIndexError> {
    let mut results = Vec::new();
    for hit in hits(body)? {
        match serde_json::from_value::<FacilitySearchDocument>(hit["_source"].clone()) {
            Ok(facility) => results.push(FacilityHit {
                facility,
                relevance_score: hit["_score"].as_f64().unwrap_or(0.0),
            }),
            Err(e) => {
                warn!(id = %hit["_id"], error = %e, "Skipping unreadable facility hit");
            }
        }
    }
    Ok(results)
}

fn parse_towns(body: &Value) -> Result<Vec<TownDocument>, SearchIndexError> {
    let mut towns = Vec::new();
    for hit in hits(body)? {
        match serde_json::from_value::<TownDocument>(hit["_source"].clone()) {
            Ok(town) => towns.push(town),
            Err(e) => {
                warn!(id = %hit["_id"], error = %e, "Skipping unreadable town hit");
            }
        }
    }
    Ok(towns)
}

pub fn parse_town_suggestions(body: &Value) -> Result<Vec<TownSuggestion>, SearchIndexError> {
    Ok(parse_towns(body)?
        .into_iter()
        .map(|town| TownSuggestion {
            location: town.point(),
            name: town.name,
        })
        .collect())
}

/// Location of the first town hit, `None` when there is no hit.
pub fn parse_town_location(body: &Value) -> Result<Option<GeoPoint>, SearchIndexError> {
    Ok(parse_towns(body)?.first().map(TownDocument::point))
}
