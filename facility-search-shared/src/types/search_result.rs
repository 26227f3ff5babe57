//! Search result types.
//!
//! This module defines the response structures returned from search index queries.

use serde::{Deserialize, Serialize};

use crate::types::geo::GeoPoint;
use crate::types::search_document::FacilitySearchDocument;

/// A single facility search hit.
///
/// Contains the indexed facility along with its relevance score from the search engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacilityHit {
    /// The indexed facility document.
    pub facility: FacilitySearchDocument,

    /// Relevance score from the search engine.
    /// Higher scores indicate better matches. Geo queries sorted by
    /// distance carry no score and report `0.0`.
    pub relevance_score: f64,
}

/// A town proposed for autocomplete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TownSuggestion {
    pub name: String,
    pub location: GeoPoint,
}
