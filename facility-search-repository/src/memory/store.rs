//! In-memory facility store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rand::Rng;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::StoreError;
use crate::interfaces::{FacilityStore, FacilityStream};
use facility_search_shared::{
    ActivityCount, Equipment, Facility, FacilityEquipmentCount, GeoPoint,
};

/// Facility store backed by a vector kept in insertion order.
#[derive(Default)]
pub struct InMemoryFacilityStore {
    facilities: RwLock<Vec<Facility>>,
    indexes_ready: AtomicBool,
}

impl InMemoryFacilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `ensure_indexes` has run, either explicitly or lazily from a geo search.
    pub fn indexes_ready(&self) -> bool {
        self.indexes_ready.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FacilityStore for InMemoryFacilityStore {
    async fn reset(&self) -> Result<(), StoreError> {
        self.facilities.write().await.clear();
        Ok(())
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        if !self.indexes_ready.swap(true, Ordering::SeqCst) {
            debug!("In-memory indexes marked as created");
        }
        Ok(())
    }

    async fn upsert_facility(&self, facility: &Facility) -> Result<(), StoreError> {
        let mut facilities = self.facilities.write().await;
        match facilities.iter_mut().find(|f| f.id == facility.id) {
            Some(existing) => {
                let equipment = std::mem::take(&mut existing.equipment);
                *existing = facility.clone();
                existing.equipment = equipment;
            }
            None => facilities.push(facility.clone()),
        }
        Ok(())
    }

    async fn facility_exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.facilities.read().await.iter().any(|f| f.id == id))
    }

    async fn push_equipment(
        &self,
        facility_id: &str,
        equipment: &Equipment,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut facilities = self.facilities.write().await;
        match facilities.iter_mut().find(|f| f.id == facility_id) {
            Some(facility) => {
                facility.equipment.push(equipment.clone());
                facility.last_updated = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn push_activity(
        &self,
        equipment_number: &str,
        activity: &str,
    ) -> Result<bool, StoreError> {
        let mut facilities = self.facilities.write().await;
        let target = facilities
            .iter_mut()
            .flat_map(|f| f.equipment.iter_mut())
            .find(|e| e.number == equipment_number);

        match target {
            Some(equipment) => {
                equipment.activities.push(activity.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Facility>, StoreError> {
        Ok(self
            .facilities
            .read()
            .await
            .iter()
            .find(|f| f.id == id)
            .cloned())
    }

    async fn list(&self, page: u64, page_size: u64) -> Result<Vec<Facility>, StoreError> {
        let skip = page.max(1).saturating_sub(1).saturating_mul(page_size);
        Ok(self
            .facilities
            .read()
            .await
            .iter()
            .skip(skip as usize)
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    async fn random(&self) -> Result<Option<Facility>, StoreError> {
        let facilities = self.facilities.read().await;
        if facilities.is_empty() {
            return Ok(None);
        }
        let index = rand::thread_rng().gen_range(0..facilities.len());
        Ok(facilities.get(index).cloned())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.facilities.read().await.len() as u64)
    }

    async fn count_by_activity(&self) -> Result<Vec<ActivityCount>, StoreError> {
        let facilities = self.facilities.read().await;

        let mut totals: HashMap<&str, u64> = HashMap::new();
        for activity in facilities
            .iter()
            .flat_map(|f| f.equipment.iter())
            .flat_map(|e| e.activities.iter())
        {
            *totals.entry(activity.as_str()).or_default() += 1;
        }

        let mut counts: Vec<ActivityCount> = totals
            .into_iter()
            .map(|(activity, total)| ActivityCount {
                activity: activity.to_string(),
                total,
            })
            .collect();
        counts.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.activity.cmp(&b.activity)));
        Ok(counts)
    }

    async fn facility_with_most_equipment(
        &self,
    ) -> Result<Option<FacilityEquipmentCount>, StoreError> {
        let facilities = self.facilities.read().await;

        let mut best: Option<&Facility> = None;
        for facility in facilities.iter() {
            match best {
                Some(current) if current.equipment.len() >= facility.equipment.len() => {}
                _ => best = Some(facility),
            }
        }

        Ok(best.map(|f| FacilityEquipmentCount {
            facility_id: f.id.clone(),
            equipment_count: f.equipment.len() as u64,
        }))
    }

    async fn average_equipment_per_facility(&self) -> Result<Option<f64>, StoreError> {
        let facilities = self.facilities.read().await;
        if facilities.is_empty() {
            return Ok(None);
        }
        let equipment: usize = facilities.iter().map(|f| f.equipment.len()).sum();
        Ok(Some(equipment as f64 / facilities.len() as f64))
    }

    async fn text_search(&self, name: &str) -> Result<Vec<Facility>, StoreError> {
        Ok(self
            .facilities
            .read()
            .await
            .iter()
            .filter(|f| f.name == name)
            .cloned()
            .collect())
    }

    async fn geo_search(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: f64,
    ) -> Result<Vec<Facility>, StoreError> {
        self.ensure_indexes().await?;

        let origin = GeoPoint::new(lng, lat);
        let facilities = self.facilities.read().await;

        let mut matches: Vec<(f64, &Facility)> = facilities
            .iter()
            .map(|f| (origin.distance_meters(&f.location), f))
            .filter(|(distance, _)| *distance <= radius_meters)
            .collect();
        matches.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(matches.into_iter().map(|(_, f)| f.clone()).collect())
    }

    async fn stream_all(&self) -> Result<FacilityStream<'_>, StoreError> {
        let snapshot = self.facilities.read().await.clone();
        Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed())
    }
}
