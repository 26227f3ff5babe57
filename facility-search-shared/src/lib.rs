//! # Facility Search Shared
//!
//! This crate defines the data structures shared across the facility import,
//! projection and query crates: the nested facility aggregate stored in the
//! document store, its search index projection, and query result types.

pub mod types;

pub use types::facility::{Address, Equipment, Facility};
pub use types::geo::{GeoJsonType, GeoPoint};
pub use types::search_document::{FacilitySearchDocument, TownDocument};
pub use types::search_result::{FacilityHit, TownSuggestion};
pub use types::stats::{ActivityCount, FacilityEquipmentCount};
