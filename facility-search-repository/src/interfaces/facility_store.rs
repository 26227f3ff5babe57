//! Document store trait definition.
//!
//! The document store is the system of record for facility aggregates. This trait
//! covers the write operations used by the import passes and the read surface
//! consumed by the query service and the index projector.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::errors::StoreError;
use facility_search_shared::{
    ActivityCount, Equipment, Facility, FacilityEquipmentCount,
};

/// A stream of facilities read one document at a time.
pub type FacilityStream<'a> = BoxStream<'a, Result<Facility, StoreError>>;

/// Abstracts the document store holding facility aggregates (MongoDB, in-memory).
///
/// Lookup misses are `None` or empty vectors. Aggregations on an empty store
/// return empty results and never fail because the store is empty.
#[async_trait]
pub trait FacilityStore: Send + Sync {
    /// Drop every facility. Used before a fresh import.
    async fn reset(&self) -> Result<(), StoreError>;

    /// Create the geo (`2dsphere` on `location`) and weighted text indexes if absent.
    ///
    /// Safe to call repeatedly and concurrently; an existing index is a success.
    async fn ensure_indexes(&self) -> Result<(), StoreError>;

    /// Insert a facility, or overwrite the scalar fields of an existing one with the same id.
    ///
    /// The equipment array of an existing facility is preserved.
    async fn upsert_facility(&self, facility: &Facility) -> Result<(), StoreError>;

    /// Whether a facility with this id exists.
    async fn facility_exists(&self, id: &str) -> Result<bool, StoreError>;

    /// Append an equipment to a facility and refresh its `lastUpdated`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The facility was found and updated
    /// * `Ok(false)` - No facility has this id
    async fn push_equipment(
        &self,
        facility_id: &str,
        equipment: &Equipment,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Append an activity name to the first equipment whose number matches.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - An equipment with this number was found and updated
    /// * `Ok(false)` - No equipment has this number
    async fn push_activity(&self, equipment_number: &str, activity: &str)
        -> Result<bool, StoreError>;

    /// Point lookup by facility id.
    async fn get(&self, id: &str) -> Result<Option<Facility>, StoreError>;

    /// One page of facilities in insertion order. Pages are 1-based.
    async fn list(&self, page: u64, page_size: u64) -> Result<Vec<Facility>, StoreError>;

    /// A facility picked uniformly at random, or `None` on an empty store.
    async fn random(&self) -> Result<Option<Facility>, StoreError>;

    /// Number of facilities.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Count equipment/activity pairs per activity name, most frequent first.
    async fn count_by_activity(&self) -> Result<Vec<ActivityCount>, StoreError>;

    /// The facility with the longest equipment array.
    async fn facility_with_most_equipment(
        &self,
    ) -> Result<Option<FacilityEquipmentCount>, StoreError>;

    /// Total equipment rows divided by facility count, `None` on an empty store.
    async fn average_equipment_per_facility(&self) -> Result<Option<f64>, StoreError>;

    /// Facilities whose name is exactly `name`.
    async fn text_search(&self, name: &str) -> Result<Vec<Facility>, StoreError>;

    /// Facilities within `radius_meters` of the point, nearest first.
    async fn geo_search(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: f64,
    ) -> Result<Vec<Facility>, StoreError>;

    /// Cursor over every facility, one document at a time.
    async fn stream_all(&self) -> Result<FacilityStream<'_>, StoreError>;
}
