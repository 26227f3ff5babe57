//! Splitting rules and lenient field conversions.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::errors::{RecordError, RecordKind};

const FACILITY_SEPARATOR: &str = "\",\"";

/// Split a facility line: strip the outer quote pair, then split on `","` only.
pub(crate) fn split_quoted(line: &str) -> Vec<&str> {
    let line = line.trim();
    let line = line.strip_prefix('"').unwrap_or(line);
    let line = line.strip_suffix('"').unwrap_or(line);
    line.split(FACILITY_SEPARATOR).collect()
}

/// Split an equipment or activity line on every comma, unwrapping quoted fields.
pub(crate) fn split_raw(line: &str) -> Vec<&str> {
    line.trim_end_matches(['\r', '\n'])
        .split(',')
        .map(unquote)
        .collect()
}

fn unquote(field: &str) -> &str {
    let trimmed = field.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(trimmed)
}

/// The trimmed field at `index`, or an empty string when the column is absent.
pub(crate) fn field<'a>(fields: &[&'a str], index: usize) -> &'a str {
    fields.get(index).map(|f| f.trim()).unwrap_or("")
}

/// A merge-key field: must be present and non-empty.
pub(crate) fn required(
    kind: RecordKind,
    fields: &[&str],
    index: usize,
    name: &'static str,
) -> Result<String, RecordError> {
    match fields.get(index).map(|f| f.trim()) {
        None => Err(RecordError::malformed(kind, name, format!("missing (column {})", index))),
        Some("") => Err(RecordError::malformed(kind, name, "is empty")),
        Some(value) => Ok(value.to_string()),
    }
}

pub(crate) fn parse_count(value: &str) -> u32 {
    let value = value.trim();
    value
        .parse::<u32>()
        .ok()
        .or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0 && *v <= u32::MAX as f64)
                .map(|v| v as u32)
        })
        .unwrap_or(0)
}

pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "oui")
}

/// Decimal coordinate, accepting a comma as decimal separator.
pub(crate) fn parse_coordinate(value: &str) -> f64 {
    value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Longitude in `[-180, 180]`, otherwise `0.0`.
pub(crate) fn parse_longitude(value: &str) -> f64 {
    in_range(parse_coordinate(value), 180.0)
}

/// Latitude in `[-90, 90]`, otherwise `0.0`.
pub(crate) fn parse_latitude(value: &str) -> f64 {
    in_range(parse_coordinate(value), 90.0)
}

fn in_range(value: f64, bound: f64) -> f64 {
    if (-bound..=bound).contains(&value) {
        value
    } else {
        0.0
    }
}

pub(crate) fn parse_date(value: &str) -> DateTime<Utc> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc()).unwrap_or_else(Utc::now);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return datetime.and_utc();
    }
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
