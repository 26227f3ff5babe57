//! Aggregation pipelines, filters and index models used by the MongoDB store.
//!
//! Kept as pure functions so their shape can be checked without a server.

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, to_bson, Bson, Document};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;

use crate::errors::StoreError;
use facility_search_shared::{ActivityCount, Equipment, Facility, FacilityEquipmentCount};

/// Name of the `2dsphere` index on `location`.
pub const GEO_INDEX_NAME: &str = "location_2dsphere";

/// Name of the weighted text index on name and locality.
pub const TEXT_INDEX_NAME: &str = "name_locality_text";

/// Update for an upsert: overwrite scalars, create the equipment array only on insert.
pub fn upsert_update(facility: &Facility) -> Result<Document, StoreError> {
    Ok(doc! {
        "$set": {
            "name": facility.name.as_str(),
            "address": to_bson(&facility.address)?,
            "location": to_bson(&facility.location)?,
            "multiTown": facility.multi_town,
            "parkingSpaces": i64::from(facility.parking_spaces),
            "accessibleParkingSpaces": i64::from(facility.accessible_parking_spaces),
            "lastUpdated": bson_date(facility.last_updated),
        },
        "$setOnInsert": {
            "equipment": to_bson(&facility.equipment)?,
        },
    })
}

/// Update appending one equipment and refreshing `lastUpdated`.
pub fn push_equipment_update(
    equipment: &Equipment,
    updated_at: DateTime<Utc>,
) -> Result<Document, StoreError> {
    Ok(doc! {
        "$push": { "equipment": to_bson(equipment)? },
        "$set": { "lastUpdated": bson_date(updated_at) },
    })
}

fn bson_date(value: DateTime<Utc>) -> Bson {
    Bson::DateTime(mongodb::bson::DateTime::from_millis(value.timestamp_millis()))
}

/// Unwind equipment then activities and count rows per activity name.
///
/// A facility with the same activity on two equipment units contributes two rows.
pub fn count_by_activity_pipeline() -> Vec<Document> {
    vec![
        doc! { "$unwind": "$equipment" },
        doc! { "$unwind": "$equipment.activities" },
        doc! { "$group": { "_id": "$equipment.activities", "total": { "$sum": 1 } } },
        doc! { "$sort": { "total": -1, "_id": 1 } },
    ]
}

/// Project the equipment array length and keep the largest.
pub fn most_equipment_pipeline() -> Vec<Document> {
    vec![
        doc! { "$project": { "equipmentCount": { "$size": { "$ifNull": ["$equipment", []] } } } },
        doc! { "$sort": { "equipmentCount": -1 } },
        doc! { "$limit": 1 },
    ]
}

/// Sum facilities and equipment rows in a single group.
///
/// An empty collection produces no output document.
pub fn equipment_totals_pipeline() -> Vec<Document> {
    vec![doc! {
        "$group": {
            "_id": Bson::Null,
            "facilities": { "$sum": 1 },
            "equipment": { "$sum": { "$size": { "$ifNull": ["$equipment", []] } } },
        }
    }]
}

/// `$near` filter around a point, `radius_meters` inclusive.
pub fn near_filter(lat: f64, lng: f64, radius_meters: f64) -> Document {
    doc! {
        "location": {
            "$near": {
                "$geometry": { "type": "Point", "coordinates": [lng, lat] },
                "$maxDistance": radius_meters,
            }
        }
    }
}

pub fn geo_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "location": "2dsphere" })
        .options(
            IndexOptions::builder()
                .name(GEO_INDEX_NAME.to_string())
                .build(),
        )
        .build()
}

/// Text index where the locality weighs more than the facility name.
pub fn text_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "name": "text", "address.locality": "text" })
        .options(
            IndexOptions::builder()
                .name(TEXT_INDEX_NAME.to_string())
                .weights(doc! { "address.locality": 10, "name": 3 })
                .default_language("french".to_string())
                .build(),
        )
        .build()
}

/// Read a non-negative integer produced by `$sum`/`$size`, whatever its BSON width.
pub fn bson_as_u64(value: &Bson) -> Option<u64> {
    match value {
        Bson::Int32(v) if *v >= 0 => Some(*v as u64),
        Bson::Int64(v) if *v >= 0 => Some(*v as u64),
        Bson::Double(v) if *v >= 0.0 => Some(*v as u64),
        _ => None,
    }
}

fn bson_as_id(value: &Bson) -> Option<String> {
    match value {
        Bson::String(s) => Some(s.clone()),
        Bson::Int32(v) => Some(v.to_string()),
        Bson::Int64(v) => Some(v.to_string()),
        _ => None,
    }
}

pub fn parse_activity_count(document: &Document) -> Result<ActivityCount, StoreError> {
    let activity = document
        .get("_id")
        .and_then(bson_as_id)
        .ok_or_else(|| StoreError::serialization("activity group without a name"))?;
    let total = document
        .get("total")
        .and_then(bson_as_u64)
        .ok_or_else(|| StoreError::serialization("activity group without a total"))?;
    Ok(ActivityCount { activity, total })
}

pub fn parse_equipment_count(document: &Document) -> Result<FacilityEquipmentCount, StoreError> {
    let facility_id = document
        .get("_id")
        .and_then(bson_as_id)
        .ok_or_else(|| StoreError::serialization("facility projection without an id"))?;
    let equipment_count = document
        .get("equipmentCount")
        .and_then(bson_as_u64)
        .unwrap_or(0);
    Ok(FacilityEquipmentCount {
        facility_id,
        equipment_count,
    })
}

/// Average from the totals group; `None` when there are no facilities.
pub fn parse_average(document: &Document) -> Option<f64> {
    let facilities = document.get("facilities").and_then(bson_as_u64)?;
    if facilities == 0 {
        return None;
    }
    let equipment = document.get("equipment").and_then(bson_as_u64).unwrap_or(0);
    Some(equipment as f64 / facilities as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use facility_search_shared::GeoPoint;

    #[test]
    fn test_upsert_writes_last_updated_as_date() {
        let mut facility = Facility::new("101", "Stade X", GeoPoint::new(-1.5, 47.2));
        facility.last_updated = Utc.with_ymd_and_hms(2015, 2, 12, 8, 30, 0).unwrap();

        let update = upsert_update(&facility).unwrap();
        let set = update.get_document("$set").unwrap();

        assert_eq!(
            set.get_datetime("lastUpdated").unwrap().timestamp_millis(),
            facility.last_updated.timestamp_millis()
        );
        assert!(update
            .get_document("$setOnInsert")
            .unwrap()
            .get_array("equipment")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_push_equipment_refreshes_last_updated_as_date() {
        let equipment = Equipment::new("E1", "Terrain A", "Sol dur", "Extérieur");
        let now = Utc::now();

        let update = push_equipment_update(&equipment, now).unwrap();

        assert_eq!(
            update
                .get_document("$set")
                .unwrap()
                .get_datetime("lastUpdated")
                .unwrap()
                .timestamp_millis(),
            now.timestamp_millis()
        );
        let pushed = update
            .get_document("$push")
            .unwrap()
            .get_document("equipment")
            .unwrap();
        assert_eq!(pushed.get_str("number").unwrap(), "E1");
    }

    #[test]
    fn test_count_by_activity_unwinds_both_levels() {
        let pipeline = count_by_activity_pipeline();

        assert_eq!(pipeline.len(), 4);
        assert_eq!(pipeline[0].get_str("$unwind").unwrap(), "$equipment");
        assert_eq!(pipeline[1].get_str("$unwind").unwrap(), "$equipment.activities");
        let sort = pipeline[3].get_document("$sort").unwrap();
        assert_eq!(sort.get_i32("total").unwrap(), -1);
    }

    #[test]
    fn test_near_filter_uses_lng_lat_order() {
        let filter = near_filter(47.2, -1.5, 0.0);
        let near = filter
            .get_document("location")
            .unwrap()
            .get_document("$near")
            .unwrap();
        let coordinates = near
            .get_document("$geometry")
            .unwrap()
            .get_array("coordinates")
            .unwrap();

        assert_eq!(coordinates[0], Bson::Double(-1.5));
        assert_eq!(coordinates[1], Bson::Double(47.2));
        assert_eq!(near.get_f64("$maxDistance").unwrap(), 0.0);
    }

    #[test]
    fn test_text_index_weights_locality_above_name() {
        let model = text_index();
        let weights = model
            .options
            .as_ref()
            .and_then(|o| o.weights.as_ref())
            .unwrap();

        assert!(weights.get_i32("address.locality").unwrap() > weights.get_i32("name").unwrap());
    }

    #[test]
    fn test_bson_as_u64() {
        assert_eq!(bson_as_u64(&Bson::Int32(3)), Some(3));
        assert_eq!(bson_as_u64(&Bson::Int64(4)), Some(4));
        assert_eq!(bson_as_u64(&Bson::Double(2.0)), Some(2));
        assert_eq!(bson_as_u64(&Bson::Int32(-1)), None);
        assert_eq!(bson_as_u64(&Bson::String("1".into())), None);
    }

    #[test]
    fn test_parse_activity_count() {
        let count = parse_activity_count(&doc! { "_id": "Tennis", "total": 2 }).unwrap();
        assert_eq!(count.activity, "Tennis");
        assert_eq!(count.total, 2);

        assert!(parse_activity_count(&doc! { "total": 2 }).is_err());
    }

    #[test]
    fn test_parse_equipment_count() {
        let count = parse_equipment_count(&doc! { "_id": "101", "equipmentCount": 7_i64 }).unwrap();
        assert_eq!(count.facility_id, "101");
        assert_eq!(count.equipment_count, 7);
    }

    #[test]
    fn test_parse_average() {
        assert_eq!(parse_average(&doc! { "facilities": 4, "equipment": 10 }), Some(2.5));
        assert_eq!(parse_average(&doc! { "facilities": 0, "equipment": 0 }), None);
    }
}
