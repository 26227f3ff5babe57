//! Facility aggregate stored in the document store.
//!
//! A facility owns its equipment, and each equipment owns the names of the
//! activities it hosts. The whole tree is one document keyed by the facility id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::geo::GeoPoint;

/// Postal address of a facility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street_number: String,
    #[serde(default)]
    pub street: String,
    /// Locality (town) name.
    #[serde(default)]
    pub locality: String,
    #[serde(default)]
    pub postal_code: String,
    /// Named place ("lieu-dit") when the facility has no street address.
    #[serde(default)]
    pub lieu_dit: String,
}

/// A piece of sports equipment embedded in a facility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    /// Equipment identifier, used as the merge key for activity rows.
    pub number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub family: String,
    /// Activity names, append-only.
    #[serde(default)]
    pub activities: Vec<String>,
}

impl Equipment {
    /// Create an equipment with no activities yet.
    pub fn new(
        number: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
        family: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            kind: kind.into(),
            family: family.into(),
            activities: Vec::new(),
        }
    }
}

/// A physical sports installation, the aggregate root of the document store.
///
/// The `id` is serialized as `_id` so it becomes the store's primary key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Address,
    pub location: GeoPoint,
    #[serde(default)]
    pub multi_town: bool,
    #[serde(default)]
    pub parking_spaces: u32,
    #[serde(default)]
    pub accessible_parking_spaces: u32,
    /// Stored as a native BSON date so the store can sort and filter on it.
    #[serde(with = "bson_datetime")]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
}

impl Facility {
    /// Create a facility with default scalar fields and no equipment.
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: Address::default(),
            location,
            multi_town: false,
            parking_spaces: 0,
            accessible_parking_spaces: 0,
            last_updated: Utc::now(),
            equipment: Vec::new(),
        }
    }

    /// Find the equipment with the given number.
    pub fn equipment_by_number(&self, number: &str) -> Option<&Equipment> {
        self.equipment.iter().find(|e| e.number == number)
    }

    /// Number of activity entries across all equipment (one per equipment/activity pair).
    pub fn activity_count(&self) -> usize {
        self.equipment.iter().map(|e| e.activities.len()).sum()
    }
}

/// Writes a BSON date. Reads a BSON date or an RFC 3339 string.
mod bson_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Date(bson::DateTime),
        Text(DateTime<Utc>),
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bson::DateTime::from_chrono(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Stored::deserialize(deserializer)? {
            Stored::Date(date) => date.to_chrono(),
            Stored::Text(text) => text,
        })
    }
}
