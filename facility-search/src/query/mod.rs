//! Read-side query service over the document store and the search index.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::errors::QueryError;
use facility_search_repository::utils::valid_coordinates;
use facility_search_repository::{FacilityStore, SearchIndexService};
use facility_search_shared::{ActivityCount, Facility, FacilityHit, GeoPoint, TownSuggestion};

/// Query service composing the document store and the search index.
///
/// Aggregations and exact lookups go to the store, ranked text, geo and
/// autocomplete queries go to the search index. Misses are `None` or empty.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn FacilityStore>,
    search: SearchIndexService,
}

impl QueryService {
    pub fn new(store: Arc<dyn FacilityStore>, search: SearchIndexService) -> Self {
        Self { store, search }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Facility>, QueryError> {
        Ok(self.store.get(id).await?)
    }

    /// One page of facilities in insertion order. Pages are 1-based.
    pub async fn list(&self, page: u64, page_size: u64) -> Result<Vec<Facility>, QueryError> {
        Ok(self.store.list(page, page_size).await?)
    }

    pub async fn random(&self) -> Result<Option<Facility>, QueryError> {
        Ok(self.store.random().await?)
    }

    pub async fn count(&self) -> Result<u64, QueryError> {
        Ok(self.store.count().await?)
    }

    pub async fn count_by_activity(&self) -> Result<Vec<ActivityCount>, QueryError> {
        Ok(self.store.count_by_activity().await?)
    }

    /// The facility with the longest equipment list, loaded in full.
    pub async fn facility_with_most_equipment(&self) -> Result<Option<Facility>, QueryError> {
        let Some(top) = self.store.facility_with_most_equipment().await? else {
            return Ok(None);
        };
        debug!(
            facility_id = %top.facility_id,
            equipment_count = top.equipment_count,
            "Resolving facility with most equipment"
        );
        Ok(self.store.get(&top.facility_id).await?)
    }

    /// `None` on an empty store.
    pub async fn average_equipment_per_facility(&self) -> Result<Option<f64>, QueryError> {
        Ok(self.store.average_equipment_per_facility().await?)
    }

    /// Facilities whose name is exactly `name`.
    pub async fn text_search(&self, name: &str) -> Result<Vec<Facility>, QueryError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.text_search(name).await?)
    }

    /// Stored facilities within `radius_meters` of a point, nearest first.
    pub async fn geo_search(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: f64,
    ) -> Result<Vec<Facility>, QueryError> {
        validate_area(lat, lng, radius_meters)?;
        Ok(self.store.geo_search(lat, lng, radius_meters).await?)
    }

    /// Ranked full-text search over the search index.
    pub async fn full_text_search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<FacilityHit>, QueryError> {
        Ok(self.search.search(query, limit).await?)
    }

    /// Geo-distance search over the search index.
    pub async fn search_nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: f64,
        limit: Option<usize>,
    ) -> Result<Vec<FacilityHit>, QueryError> {
        validate_area(lat, lng, radius_meters)?;
        Ok(self
            .search
            .search_nearby(lat, lng, radius_meters, limit)
            .await?)
    }

    pub async fn suggest_town_names(
        &self,
        prefix: &str,
        limit: Option<usize>,
    ) -> Result<Vec<TownSuggestion>, QueryError> {
        Ok(self.search.suggest_town_names(prefix, limit).await?)
    }

    pub async fn town_location(&self, name: &str) -> Result<Option<GeoPoint>, QueryError> {
        Ok(self.search.town_location(name).await?)
    }

    /// Stored facilities around a town, empty when the town is unknown.
    #[instrument(skip(self))]
    pub async fn search_near_town(
        &self,
        town: &str,
        radius_meters: f64,
    ) -> Result<Vec<Facility>, QueryError> {
        let Some(point) = self.town_location(town).await? else {
            debug!("Town not found");
            return Ok(Vec::new());
        };
        self.geo_search(point.latitude(), point.longitude(), radius_meters)
            .await
    }
}

fn validate_area(lat: f64, lng: f64, radius_meters: f64) -> Result<(), QueryError> {
    if !valid_coordinates(lat, lng) {
        return Err(QueryError::validation(format!(
            "invalid coordinates lat={}, lng={}",
            lat, lng
        )));
    }
    if !radius_meters.is_finite() || radius_meters < 0.0 {
        return Err(QueryError::validation(format!(
            "invalid radius {}",
            radius_meters
        )));
    }
    Ok(())
}
