//! MongoDB facility store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use mongodb::bson::{doc, Document};
use mongodb::error::ErrorKind;
use mongodb::{Client, Collection, IndexModel};
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::errors::StoreError;
use crate::interfaces::{FacilityStore, FacilityStream};
use crate::mongodb::pipelines;
use facility_search_shared::{ActivityCount, Equipment, Facility, FacilityEquipmentCount};

/// Server error codes meaning an equivalent or same-named index is already there.
const INDEX_EXISTS_CODES: [i32; 3] = [68, 85, 86];

/// MongoDB store provider implementation.
///
/// Holds one collection of facility documents keyed by `_id`. Index creation is
/// guarded by a mutex so concurrent first callers create indexes only once.
///
/// # Example
///
/// ```ignore
/// let store = MongoFacilityStore::connect("mongodb://localhost:27017", "nosql-workshop", "installations").await?;
/// let facility = store.get("440010001").await?;
/// ```
pub struct MongoFacilityStore {
    collection: Collection<Facility>,
    indexes_ready: Mutex<bool>,
}

impl MongoFacilityStore {
    /// Connect to MongoDB and check the server answers.
    ///
    /// # Arguments
    ///
    /// * `url` - The MongoDB connection string (e.g., "mongodb://localhost:27017")
    /// * `database` - Database name
    /// * `collection` - Collection holding the facility documents
    pub async fn connect(url: &str, database: &str, collection: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(url)
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let db = client.database(database);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        info!(
            url = %url,
            database = %database,
            collection = %collection,
            "Connected to MongoDB"
        );

        Ok(Self::from_collection(db.collection::<Facility>(collection)))
    }

    /// Wrap an existing collection handle.
    pub fn from_collection(collection: Collection<Facility>) -> Self {
        Self {
            collection,
            indexes_ready: Mutex::new(false),
        }
    }

    async fn create_index(&self, model: IndexModel) -> Result<(), StoreError> {
        match self.collection.create_index(model).await {
            Ok(result) => {
                debug!(index = %result.index_name, "Index ready");
                Ok(())
            }
            Err(e) if is_index_exists_error(&e) => {
                debug!(error = %e, "Index already exists");
                Ok(())
            }
            Err(e) => Err(StoreError::index_creation(e.to_string())),
        }
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        let cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;
        Ok(cursor.try_collect().await?)
    }
}

fn is_index_exists_error(err: &mongodb::error::Error) -> bool {
    match *err.kind {
        ErrorKind::Command(ref command_error) => INDEX_EXISTS_CODES.contains(&command_error.code),
        _ => false,
    }
}

#[async_trait]
impl FacilityStore for MongoFacilityStore {
    #[instrument(skip(self))]
    async fn reset(&self) -> Result<(), StoreError> {
        let mut ready = self.indexes_ready.lock().await;
        self.collection
            .drop()
            .await
            .map_err(StoreError::from_write)?;
        *ready = false;
        info!("Facility collection dropped");
        Ok(())
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let mut ready = self.indexes_ready.lock().await;
        if *ready {
            return Ok(());
        }

        self.create_index(pipelines::geo_index()).await?;
        self.create_index(pipelines::text_index()).await?;
        *ready = true;

        info!("Facility indexes ensured");
        Ok(())
    }

    async fn upsert_facility(&self, facility: &Facility) -> Result<(), StoreError> {
        let update = pipelines::upsert_update(facility)?;

        self.collection
            .update_one(doc! { "_id": facility.id.as_str() }, update)
            .upsert(true)
            .await
            .map_err(StoreError::from_write)?;
        Ok(())
    }

    async fn facility_exists(&self, id: &str) -> Result<bool, StoreError> {
        let count = self
            .collection
            .count_documents(doc! { "_id": id })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    async fn push_equipment(
        &self,
        facility_id: &str,
        equipment: &Equipment,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let update = pipelines::push_equipment_update(equipment, updated_at)?;

        let result = self
            .collection
            .update_one(doc! { "_id": facility_id }, update)
            .await
            .map_err(StoreError::from_write)?;
        Ok(result.matched_count > 0)
    }

    async fn push_activity(
        &self,
        equipment_number: &str,
        activity: &str,
    ) -> Result<bool, StoreError> {
        // The positional operator targets the first equipment matched by the filter.
        let result = self
            .collection
            .update_one(
                doc! { "equipment.number": equipment_number },
                doc! { "$push": { "equipment.$.activities": activity } },
            )
            .await
            .map_err(StoreError::from_write)?;
        Ok(result.matched_count > 0)
    }

    async fn get(&self, id: &str) -> Result<Option<Facility>, StoreError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn list(&self, page: u64, page_size: u64) -> Result<Vec<Facility>, StoreError> {
        if page_size == 0 {
            return Ok(Vec::new());
        }
        let skip = page.max(1).saturating_sub(1).saturating_mul(page_size);

        let cursor = self
            .collection
            .find(doc! {})
            .skip(skip)
            .limit(page_size as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn random(&self) -> Result<Option<Facility>, StoreError> {
        let count = self.count().await?;
        if count == 0 {
            return Ok(None);
        }
        let offset = rand::thread_rng().gen_range(0..count);

        let mut cursor = self.collection.find(doc! {}).skip(offset).limit(1).await?;
        Ok(cursor.try_next().await?)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn count_by_activity(&self) -> Result<Vec<ActivityCount>, StoreError> {
        self.aggregate(pipelines::count_by_activity_pipeline())
            .await?
            .iter()
            .map(pipelines::parse_activity_count)
            .collect()
    }

    async fn facility_with_most_equipment(
        &self,
    ) -> Result<Option<FacilityEquipmentCount>, StoreError> {
        self.aggregate(pipelines::most_equipment_pipeline())
            .await?
            .first()
            .map(pipelines::parse_equipment_count)
            .transpose()
    }

    async fn average_equipment_per_facility(&self) -> Result<Option<f64>, StoreError> {
        Ok(self
            .aggregate(pipelines::equipment_totals_pipeline())
            .await?
            .first()
            .and_then(pipelines::parse_average))
    }

    async fn text_search(&self, name: &str) -> Result<Vec<Facility>, StoreError> {
        let cursor = self.collection.find(doc! { "name": name }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn geo_search(
        &self,
        lat: f64,
        lng: f64,
        radius_meters: f64,
    ) -> Result<Vec<Facility>, StoreError> {
        self.ensure_indexes().await?;

        let cursor = self
            .collection
            .find(pipelines::near_filter(lat, lng, radius_meters))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn stream_all(&self) -> Result<FacilityStream<'_>, StoreError> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.map_err(StoreError::from).boxed())
    }
}
