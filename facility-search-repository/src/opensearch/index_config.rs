//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the facility and
//! town indices.

use serde_json::{json, Value};

/// Default alias of the facility index.
pub const FACILITIES_INDEX_NAME: &str = "installations";

/// Default alias of the town index.
pub const TOWNS_INDEX_NAME: &str = "towns";

/// Configuration for the search indices.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The alias used for all facility operations.
    pub facilities_alias: String,
    /// The alias used for all town operations.
    pub towns_alias: String,
    /// The version number of the physical indices (e.g., 0 for "installations_v0").
    pub version: u32,
}

impl IndexConfig {
    /// Create a new index configuration.
    ///
    /// # Arguments
    ///
    /// * `facilities_alias` - The facility index alias
    /// * `towns_alias` - The town index alias
    /// * `version` - The version number
    pub fn new(
        facilities_alias: impl Into<String>,
        towns_alias: impl Into<String>,
        version: u32,
    ) -> Self {
        Self {
            facilities_alias: facilities_alias.into(),
            towns_alias: towns_alias.into(),
            version,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(FACILITIES_INDEX_NAME, TOWNS_INDEX_NAME, 0)
    }
}

/// Get the versioned index name behind an alias.
///
/// # Returns
///
/// The versioned index name (e.g., "installations_v0")
pub fn get_versioned_index_name(alias: &str, version: u32) -> String {
    format!("{}_v{}", alias, version)
}

/// Get the index settings and mappings for the facility index.
///
/// The configuration includes:
/// - **text fields** with a French analyzer for name, locality, street, equipment and activities
/// - **geo_point** on `location` (`[lng, lat]`) for distance queries
/// - **keyword fields** for exact lookups and sorting
///
/// The alias is attached at creation time so all operations go through it.
pub fn get_facility_index_settings(alias: &str) -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "aliases": {
            alias: {}
        },
        "mappings": {
            "properties": {
                "id": { "type": "keyword" },
                "name": {
                    "type": "text",
                    "analyzer": "french",
                    "fields": { "raw": { "type": "keyword" } }
                },
                "locality": {
                    "type": "text",
                    "analyzer": "french",
                    "fields": { "raw": { "type": "keyword" } }
                },
                "address": {
                    "properties": {
                        "streetNumber": { "type": "keyword" },
                        "street": { "type": "text", "analyzer": "french" },
                        "locality": { "type": "text", "analyzer": "french" },
                        "postalCode": { "type": "keyword" },
                        "lieuDit": { "type": "text", "analyzer": "french" }
                    }
                },
                "location": { "type": "geo_point" },
                "multiTown": { "type": "boolean" },
                "parkingSpaces": { "type": "integer" },
                "accessibleParkingSpaces": { "type": "integer" },
                "activities": {
                    "type": "text",
                    "analyzer": "french",
                    "fields": { "raw": { "type": "keyword" } }
                },
                "equipment": {
                    "properties": {
                        "number": { "type": "keyword" },
                        "name": { "type": "text", "analyzer": "french" },
                        "type": { "type": "keyword" },
                        "family": { "type": "keyword" },
                        "activities": { "type": "text", "analyzer": "french" }
                    }
                }
            }
        }
    })
}

/// Get the index settings and mappings for the town index.
///
/// `name.prefix` is a keyword subfield lowercased by a normalizer, which makes
/// prefix suggestions case-insensitive.
pub fn get_town_index_settings(alias: &str) -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1,
            "analysis": {
                "normalizer": {
                    "lowercase_normalizer": {
                        "type": "custom",
                        "filter": ["lowercase", "asciifolding"]
                    }
                }
            }
        },
        "aliases": {
            alias: {}
        },
        "mappings": {
            "properties": {
                "code": { "type": "keyword" },
                "name": {
                    "type": "text",
                    "fields": {
                        "prefix": {
                            "type": "keyword",
                            "normalizer": "lowercase_normalizer"
                        }
                    }
                },
                "location": { "type": "geo_point" }
            }
        }
    })
}
