//! Document types for the search index.
//!
//! These are the projections of document store data that get indexed in the
//! search engine. Volatile fields (`lastUpdated`) are pruned and a few fields
//! are denormalized to the top level so they can be weighted in ranking.

use serde::{Deserialize, Serialize};

use crate::types::facility::{Address, Equipment, Facility};
use crate::types::geo::GeoPoint;

/// Search index representation of a facility.
///
/// # Fields
///
/// - `id`: Facility identifier, also used as the search document id
/// - `name`: Facility name
/// - `locality`: Copy of `address.locality`, weighted above `name` in full-text ranking
/// - `address`: Full postal address
/// - `location`: `[longitude, latitude]`, mapped as a `geo_point`
/// - `activities`: Distinct activity names across all equipment
/// - `equipment`: The nested equipment list, kept so hits render a full facility
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FacilitySearchDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub locality: String,
    #[serde(default)]
    pub address: Address,
    pub location: [f64; 2],
    #[serde(default)]
    pub multi_town: bool,
    #[serde(default)]
    pub parking_spaces: u32,
    #[serde(default)]
    pub accessible_parking_spaces: u32,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
}

impl FacilitySearchDocument {
    /// The document id used in the search index.
    pub fn document_id(&self) -> &str {
        &self.id
    }

    /// The facility location as a point.
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.location[0], self.location[1])
    }
}

impl From<Facility> for FacilitySearchDocument {
    fn from(facility: Facility) -> Self {
        let mut activities: Vec<String> = Vec::new();
        for activity in facility.equipment.iter().flat_map(|e| e.activities.iter()) {
            if !activities.contains(activity) {
                activities.push(activity.clone());
            }
        }

        Self {
            id: facility.id,
            name: facility.name,
            locality: facility.address.locality.clone(),
            address: facility.address,
            location: facility.location.coordinates,
            multi_town: facility.multi_town,
            parking_spaces: facility.parking_spaces,
            accessible_parking_spaces: facility.accessible_parking_spaces,
            activities,
            equipment: facility.equipment,
        }
    }
}

/// Search index representation of a town, used for autocomplete and location lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TownDocument {
    /// INSEE municipality code, unique per town.
    #[serde(default)]
    pub code: String,
    pub name: String,
    /// `[longitude, latitude]`
    pub location: [f64; 2],
}

impl TownDocument {
    pub fn new(code: impl Into<String>, name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            location: location.coordinates,
        }
    }

    /// Towns are keyed by their code. Names repeat across departments.
    pub fn document_id(&self) -> &str {
        &self.code
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.location[0], self.location[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_facility() -> Facility {
        let mut facility = Facility::new("101", "Stade X", GeoPoint::new(-1.5, 47.2));
        facility.address.locality = "Nantes".to_string();
        let mut court_a = Equipment::new("E1", "Court A", "Court", "Tennis");
        court_a.activities = vec!["Tennis".to_string()];
        let mut court_b = Equipment::new("E2", "Court B", "Court", "Tennis");
        court_b.activities = vec!["Tennis".to_string(), "Padel".to_string()];
        facility.equipment = vec![court_a, court_b];
        facility
    }

    #[test]
    fn test_projection_prunes_last_updated() {
        let doc = FacilitySearchDocument::from(sample_facility());
        let json = serde_json::to_value(&doc).unwrap();

        assert!(json.get("lastUpdated").is_none());
        assert!(json.get("_id").is_none());
        assert_eq!(json["id"], "101");
        assert_eq!(json["location"], serde_json::json!([-1.5, 47.2]));
    }

    #[test]
    fn test_projection_denormalizes_locality_and_activities() {
        let doc = FacilitySearchDocument::from(sample_facility());

        assert_eq!(doc.locality, "Nantes");
        assert_eq!(doc.activities, vec!["Tennis".to_string(), "Padel".to_string()]);
        assert_eq!(doc.equipment.len(), 2);
        assert_eq!(doc.document_id(), "101");
    }

    #[test]
    fn test_town_document_id_is_code() {
        let town = TownDocument::new("44162", "Saint-Herblain", GeoPoint::new(-1.65, 47.21));
        assert_eq!(town.document_id(), "44162");
        assert_eq!(town.point().latitude(), 47.21);
    }

    #[test]
    fn test_homonymous_towns_have_distinct_ids() {
        let loire = TownDocument::new("44150", "Saint-Aubin-des-Châteaux", GeoPoint::new(-1.49, 47.72));
        let maine = TownDocument::new("49269", "Saint-Aubin-des-Châteaux", GeoPoint::new(-0.57, 47.35));
        assert_ne!(loire.document_id(), maine.document_id());
    }

    #[test]
    fn test_town_without_code_deserializes() {
        let town: TownDocument =
            serde_json::from_value(serde_json::json!({ "name": "Nantes", "location": [-1.55, 47.21] }))
                .unwrap();
        assert_eq!(town.code, "");
        assert_eq!(town.name, "Nantes");
    }
}
