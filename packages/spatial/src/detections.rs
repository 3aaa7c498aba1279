//! Fire detection fixtures read from `GeoJSON`.
//!
//! Each feature must be a `Point` with an observation timestamp property
//! (`utcobstime` by default). Timestamps are RFC 3339, or naive
//! `YYYY-MM-DD[T ]HH:MM:SS` values taken as UTC.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use geojson::{Feature, GeoJson, Value};

use crate::SpatialError;

/// Property holding the observation time in VIIRS active fire exports.
pub const DEFAULT_OBSERVED_AT_PROPERTY: &str = "utcobstime";

/// A single satellite fire detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Observation time.
    pub observed_at: DateTime<Utc>,
}

/// Reads detections from a `GeoJSON` file.
///
/// # Errors
///
/// Returns [`SpatialError`] if the file cannot be read or any feature is
/// not a timestamped point.
pub fn load(path: &Path, observed_at_property: &str) -> Result<Vec<Detection>, SpatialError> {
    let text = std::fs::read_to_string(path).map_err(|source| SpatialError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let detections = from_geojson_str(&text, observed_at_property)?;
    log::info!(
        "Loaded {} fire detections from {}",
        detections.len(),
        path.display()
    );
    Ok(detections)
}

/// Parses detections from `GeoJSON` text.
///
/// # Errors
///
/// See [`load`].
pub fn from_geojson_str(
    text: &str,
    observed_at_property: &str,
) -> Result<Vec<Detection>, SpatialError> {
    let GeoJson::FeatureCollection(collection) = text.parse::<GeoJson>()? else {
        return Err(SpatialError::NotCollection);
    };

    collection
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            parse_detection(feature, observed_at_property)
                .map_err(|message| SpatialError::InvalidDetection { index, message })
        })
        .collect()
}

fn parse_detection(feature: &Feature, observed_at_property: &str) -> Result<Detection, String> {
    let Some(Value::Point(coords)) = feature.geometry.as_ref().map(|g| &g.value) else {
        return Err("geometry is not a Point".to_string());
    };
    let [longitude, latitude, ..] = coords.as_slice() else {
        return Err("point has fewer than two coordinates".to_string());
    };

    let raw = feature
        .property(observed_at_property)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| format!("missing '{observed_at_property}' property"))?;
    let observed_at =
        parse_timestamp(raw).ok_or_else(|| format!("unparseable timestamp '{raw}'"))?;

    Ok(Detection {
        longitude: *longitude,
        latitude: *latitude,
        observed_at,
    })
}

/// Parses an RFC 3339 or naive UTC timestamp.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
