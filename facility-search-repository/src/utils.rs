//! Utility functions shared by the store and search index layers.

/// Normalize free text coming from a caller.
///
/// Trims surrounding whitespace and returns `None` when nothing is left, so
/// callers can short-circuit to an empty result without hitting a backend.
pub fn normalize_search_text(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Resolve a requested result size against a default and an upper bound.
///
/// `None` or `Some(0)` falls back to `default`.
pub fn clamp_limit(requested: Option<usize>, default: usize, max: usize) -> usize {
    match requested {
        Some(0) | None => default.min(max),
        Some(n) => n.min(max),
    }
}

/// Validate a latitude/longitude pair.
pub fn valid_coordinates(lat: f64, lng: f64) -> bool {
    lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}
