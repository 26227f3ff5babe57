//! This module defines the core data structures used across the facility system.
//! It re-exports the aggregate types like `Facility` and the search projections.

pub mod facility;
pub mod geo;
pub mod search_document;
pub mod search_result;
pub mod stats;

pub use facility::{Address, Equipment, Facility};
pub use geo::GeoPoint;
pub use search_document::{FacilitySearchDocument, TownDocument};
