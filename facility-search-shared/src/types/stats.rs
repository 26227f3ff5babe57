//! Aggregation result types computed against the document store.

use serde::{Deserialize, Serialize};

/// Number of equipment/activity pairs carrying a given activity name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityCount {
    pub activity: String,
    pub total: u64,
}

/// A facility id together with the length of its equipment array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacilityEquipmentCount {
    pub facility_id: String,
    pub equipment_count: u64,
}
