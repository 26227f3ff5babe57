//! Typed records for each import table.

use chrono::{DateTime, Utc};
use facility_search_shared::{Address, Equipment, Facility, GeoPoint, TownDocument};

use super::fields::{
    field, parse_count, parse_date, parse_flag, parse_latitude, parse_longitude, required,
    split_quoted, split_raw,
};
use crate::errors::{RecordError, RecordKind};

const FACILITY_MIN_COLUMNS: usize = 2;
const EQUIPMENT_MIN_COLUMNS: usize = 5;
const ACTIVITY_MIN_COLUMNS: usize = 6;
const TOWN_MIN_COLUMNS: usize = 8;

/// A row of the facility table.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityRecord {
    pub id: String,
    pub name: String,
    pub address: Address,
    pub location: GeoPoint,
    pub multi_town: bool,
    pub parking_spaces: u32,
    pub accessible_parking_spaces: u32,
    pub last_updated: DateTime<Utc>,
}

impl FacilityRecord {
    /// Build the facility aggregate with an empty equipment list.
    pub fn into_facility(self) -> Facility {
        let mut facility = Facility::new(self.id, self.name, self.location);
        facility.address = self.address;
        facility.multi_town = self.multi_town;
        facility.parking_spaces = self.parking_spaces;
        facility.accessible_parking_spaces = self.accessible_parking_spaces;
        facility.last_updated = self.last_updated;
        facility
    }

    fn from_fields(fields: &[&str]) -> Result<Self, RecordError> {
        let kind = RecordKind::Facility;
        let id = required(kind, fields, 1, "id")?;

        Ok(Self {
            id,
            name: field(fields, 0).to_string(),
            address: Address {
                street_number: field(fields, 6).to_string(),
                street: field(fields, 7).to_string(),
                locality: field(fields, 2).to_string(),
                postal_code: field(fields, 4).to_string(),
                lieu_dit: field(fields, 5).to_string(),
            },
            location: GeoPoint::new(
                parse_longitude(field(fields, 9)),
                parse_latitude(field(fields, 10)),
            ),
            multi_town: parse_flag(field(fields, 16)),
            parking_spaces: parse_count(field(fields, 17)),
            accessible_parking_spaces: parse_count(field(fields, 18)),
            last_updated: parse_date(field(fields, 27)),
        })
    }
}

/// A row of the equipment table, keyed by the owning facility id.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentRecord {
    pub facility_id: String,
    pub equipment: Equipment,
}

impl EquipmentRecord {
    fn from_fields(fields: &[&str]) -> Result<Self, RecordError> {
        let kind = RecordKind::Equipment;
        let facility_id = required(kind, fields, 2, "facility_id")?;
        let number = required(kind, fields, 4, "number")?;
        let name = match field(fields, 5) {
            "" => number.clone(),
            name => name.to_string(),
        };

        Ok(Self {
            facility_id,
            equipment: Equipment::new(number, name, field(fields, 7), field(fields, 8)),
        })
    }
}

/// A row of the activity table, keyed by equipment number.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub equipment_number: String,
    pub activity: String,
}

impl ActivityRecord {
    /// Incomplete rows (short, or without an activity name) yield `None`.
    fn from_fields(fields: &[&str]) -> Result<Option<Self>, RecordError> {
        if fields.len() < ACTIVITY_MIN_COLUMNS {
            return Ok(None);
        }
        let equipment_number = required(RecordKind::Activity, fields, 2, "equipment_number")?;
        let activity = field(fields, 5);
        if activity.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            equipment_number,
            activity: activity.to_string(),
        }))
    }
}

/// A row of the towns table.
#[derive(Debug, Clone, PartialEq)]
pub struct TownRecord {
    pub code: String,
    pub name: String,
    pub location: GeoPoint,
}

impl TownRecord {
    pub fn into_document(self) -> TownDocument {
        TownDocument::new(self.code, self.name, self.location)
    }

    fn from_fields(fields: &[&str]) -> Result<Self, RecordError> {
        let kind = RecordKind::Town;
        let code = required(kind, fields, 0, "code")?;
        let name = required(kind, fields, 1, "name")?;
        let longitude = strict_coordinate(kind, fields, 6, "longitude", 180.0)?;
        let latitude = strict_coordinate(kind, fields, 7, "latitude", 90.0)?;

        Ok(Self {
            code,
            name,
            location: GeoPoint::new(longitude, latitude),
        })
    }
}

fn strict_coordinate(
    kind: RecordKind,
    fields: &[&str],
    index: usize,
    name: &'static str,
    bound: f64,
) -> Result<f64, RecordError> {
    let raw = required(kind, fields, index, name)?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| (-bound..=bound).contains(v))
        .ok_or_else(|| {
            RecordError::malformed(kind, name, format!("'{}' is not a valid coordinate", raw))
        })
}

/// A parsed line of any table.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Facility(FacilityRecord),
    Equipment(EquipmentRecord),
    Activity(ActivityRecord),
    Town(TownRecord),
}

/// Split a line into fields with the rule of its table.
pub fn split_line(line: &str, kind: RecordKind) -> Vec<String> {
    match kind {
        RecordKind::Facility => split_quoted(line).into_iter().map(String::from).collect(),
        RecordKind::Equipment | RecordKind::Activity => {
            split_raw(line).into_iter().map(String::from).collect()
        }
        RecordKind::Town => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(line.as_bytes());
            match reader.records().next() {
                Some(Ok(record)) => record.iter().map(String::from).collect(),
                _ => split_raw(line).into_iter().map(String::from).collect(),
            }
        }
    }
}

/// Parse already split fields into a record of the given table.
///
/// # Returns
///
/// * `Ok(Some(record))` - A usable record
/// * `Ok(None)` - An incomplete activity row, to be skipped
/// * `Err(RecordError)` - A merge key is missing or the row is too short
pub fn parse_fields(fields: &[&str], kind: RecordKind) -> Result<Option<Record>, RecordError> {
    let record = match kind {
        RecordKind::Facility => {
            check_columns(kind, fields, FACILITY_MIN_COLUMNS)?;
            Record::Facility(FacilityRecord::from_fields(fields)?)
        }
        RecordKind::Equipment => {
            check_columns(kind, fields, EQUIPMENT_MIN_COLUMNS)?;
            Record::Equipment(EquipmentRecord::from_fields(fields)?)
        }
        RecordKind::Town => {
            check_columns(kind, fields, TOWN_MIN_COLUMNS)?;
            Record::Town(TownRecord::from_fields(fields)?)
        }
        RecordKind::Activity => {
            return Ok(ActivityRecord::from_fields(fields)?.map(Record::Activity));
        }
    };
    Ok(Some(record))
}

fn check_columns(kind: RecordKind, fields: &[&str], expected: usize) -> Result<(), RecordError> {
    if fields.len() < expected {
        return Err(RecordError::MissingColumns {
            kind,
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

/// Parse one line of the given table.
pub fn parse(line: &str, kind: RecordKind) -> Result<Option<Record>, RecordError> {
    let fields = split_line(line, kind);
    let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
    parse_fields(&fields, kind)
}
