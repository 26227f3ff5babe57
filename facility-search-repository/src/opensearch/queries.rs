//! Query bodies sent to OpenSearch.
//!
//! Full-text ranking weights the locality above the facility name, which in
//! turn weighs above street, equipment and activity names.

use serde_json::{json, Value};

use facility_search_shared::{FacilitySearchDocument, TownDocument};

/// Fields searched by `full_text_query`, with their boosts.
pub const FULL_TEXT_FIELDS: [&str; 5] = [
    "locality^3",
    "name^2",
    "address.street",
    "equipment.name",
    "activities",
];

/// Relevance-ranked query over all indexed text fields.
pub fn full_text_query(query: &str, limit: usize) -> Value {
    json!({
        "size": limit,
        "query": {
            "multi_match": {
                "query": query,
                "fields": FULL_TEXT_FIELDS,
                "type": "best_fields"
            }
        }
    })
}

/// Facilities within `radius_meters` of the point, nearest first.
pub fn geo_distance_query(lat: f64, lng: f64, radius_meters: f64, limit: usize) -> Value {
    json!({
        "size": limit,
        "query": {
            "bool": {
                "filter": {
                    "geo_distance": {
                        "distance": format!("{}m", radius_meters),
                        "location": { "lat": lat, "lon": lng }
                    }
                }
            }
        },
        "sort": [
            {
                "_geo_distance": {
                    "location": { "lat": lat, "lon": lng },
                    "order": "asc",
                    "unit": "m"
                }
            }
        ]
    })
}

/// Case-insensitive prefix match on the normalized town name.
pub fn town_prefix_query(prefix: &str, limit: usize) -> Value {
    json!({
        "size": limit,
        "query": {
            "prefix": {
                "name.prefix": { "value": prefix.to_lowercase() }
            }
        },
        "sort": [
            { "name.prefix": "asc" }
        ]
    })
}

/// Best single match for a town name.
pub fn town_match_query(name: &str) -> Value {
    json!({
        "size": 1,
        "query": {
            "match": {
                "name": name
            }
        }
    })
}

/// Newline-delimited bulk body lines for facility documents.
///
/// Each document is indexed under its facility id so re-indexing overwrites.
pub fn facility_bulk_lines(documents: &[FacilitySearchDocument]) -> Result<Vec<Value>, serde_json::Error> {
    let mut lines = Vec::with_capacity(documents.len() * 2);
    for document in documents {
        lines.push(json!({ "index": { "_id": document.document_id() } }));
        lines.push(serde_json::to_value(document)?);
    }
    Ok(lines)
}

/// Newline-delimited bulk body lines for town documents.
pub fn town_bulk_lines(towns: &[TownDocument]) -> Result<Vec<Value>, serde_json::Error> {
    let mut lines = Vec::with_capacity(towns.len() * 2);
    for town in towns {
        lines.push(json!({ "index": { "_id": town.document_id() } }));
        lines.push(serde_json::to_value(town)?);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facility_search_shared::{Facility, GeoPoint};

    #[test]
    fn test_full_text_weights_locality_above_name() {
        let query = full_text_query("nantes piscine", 20);

        let fields = query["query"]["multi_match"]["fields"].as_array().unwrap();
        assert_eq!(fields[0], "locality^3");
        assert_eq!(fields[1], "name^2");
        assert_eq!(query["size"], 20);
        assert_eq!(query["query"]["multi_match"]["query"], "nantes piscine");
    }

    #[test]
    fn test_geo_distance_query() {
        let query = geo_distance_query(47.2, -1.5, 0.0, 10);

        let filter = &query["query"]["bool"]["filter"]["geo_distance"];
        assert_eq!(filter["distance"], "0m");
        assert_eq!(filter["location"]["lat"], 47.2);
        assert_eq!(filter["location"]["lon"], -1.5);
        assert_eq!(query["sort"][0]["_geo_distance"]["order"], "asc");
    }

    #[test]
    fn test_town_prefix_query_lowercases() {
        let query = town_prefix_query("NaN", 10);
        assert_eq!(query["query"]["prefix"]["name.prefix"]["value"], "nan");
        assert_eq!(query["size"], 10);
    }

    #[test]
    fn test_town_match_query() {
        let query = town_match_query("Angers");
        assert_eq!(query["size"], 1);
        assert_eq!(query["query"]["match"]["name"], "Angers");
    }

    #[test]
    fn test_facility_bulk_lines_use_facility_id() {
        let documents = vec![
            FacilitySearchDocument::from(Facility::new("101", "Stade X", GeoPoint::new(-1.5, 47.2))),
            FacilitySearchDocument::from(Facility::new("102", "Piscine", GeoPoint::new(-1.6, 47.1))),
        ];

        let lines = facility_bulk_lines(&documents).unwrap();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["index"]["_id"], "101");
        assert_eq!(lines[1]["name"], "Stade X");
        assert_eq!(lines[2]["index"]["_id"], "102");
        assert!(lines[1].get("lastUpdated").is_none());
    }

    #[test]
    fn test_town_bulk_lines() {
        let towns = vec![TownDocument::new("44109", "Nantes", GeoPoint::new(-1.55, 47.21))];
        let lines = town_bulk_lines(&towns).unwrap();

        assert_eq!(lines[0]["index"]["_id"], "44109");
        assert_eq!(lines[1]["code"], "44109");
        assert_eq!(lines[1]["location"], json!([-1.55, 47.21]));
    }
}
