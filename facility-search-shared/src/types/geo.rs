//! Geographic point type.
//!
//! Locations are stored as GeoJSON points (`{"type": "Point", "coordinates": [lng, lat]}`)
//! so the document store can build a `2dsphere` index on them directly.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, as used by spherical geo queries.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// GeoJSON geometry type. Only points are used by this system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GeoJsonType {
    #[default]
    Point,
}

/// A geographic point in GeoJSON representation.
///
/// Coordinates are ordered `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: GeoJsonType,
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    /// Create a point from a longitude and a latitude.
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: GeoJsonType::Point,
            coordinates: [longitude, latitude],
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    /// Great-circle distance to another point in meters (haversine).
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude().to_radians(), other.latitude().to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.longitude() - self.longitude()).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }
}
