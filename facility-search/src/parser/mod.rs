//! Record parser for the facility import files.
//!
//! Each table has its own splitting rule and column layout. Parsing only fails
//! when a merge key is missing; every other field falls back to a default.

mod fields;
mod records;

pub use records::{
    parse, parse_fields, split_line, ActivityRecord, EquipmentRecord, FacilityRecord, Record,
    TownRecord,
};
