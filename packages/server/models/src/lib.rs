#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! API request and response types for the fire map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the store row types to allow independent evolution of the API
//! contract.

use chrono::NaiveDate;
use fire_map_database_models::{BoroughCountRow, BoundingBox, DateRange};
use geojson::FeatureCollection;
use serde::{Deserialize, Deserializer, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,
}

/// Query parameters for the stateless count and point endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQueryParams {
    /// Start date (`YYYY-MM-DD`, inclusive).
    pub start: Option<String>,
    /// End date (`YYYY-MM-DD`, inclusive).
    pub end: Option<String>,
}

/// A date picker change.
///
/// An omitted field leaves that bound unchanged; an explicit `null` clears
/// it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RangeUpdate {
    /// New start date.
    #[serde(default, deserialize_with = "present")]
    pub start: Option<Option<NaiveDate>>,
    /// New end date.
    #[serde(default, deserialize_with = "present")]
    pub end: Option<Option<NaiveDate>>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A row of the borough summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBoroughCount {
    /// Borough name.
    pub borough: String,
    /// Number of fire points in range.
    pub fire_points: u64,
}

impl From<BoroughCountRow> for ApiBoroughCount {
    fn from(row: BoroughCountRow) -> Self {
        Self {
            borough: row.borough,
            fire_points: row.count,
        }
    }
}

/// Response from the stateless counts endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCounts {
    /// The range that was queried.
    pub range: DateRange,
    /// One row per borough with at least one fire point.
    pub rows: Vec<ApiBoroughCount>,
}

/// Popup shown for a clicked fire point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupContent {
    /// Observation date (`YYYY-MM-DD`).
    pub date: String,
    /// Observation time (`HH:MM:SS UTC`).
    pub time: String,
    /// `longitude, latitude` rounded for display.
    pub coordinates: String,
}

/// Tooltip shown for a hovered borough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipContent {
    /// Borough display name.
    pub text: String,
}

/// Map bounds to fit after a borough click.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBounds {
    /// The bounding box.
    pub bbox: BoundingBox,
    /// `[[south, west], [north, east]]`.
    pub corners: [[f64; 2]; 2],
}

impl From<BoundingBox> for ApiBounds {
    fn from(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            corners: bbox.corners(),
        }
    }
}

/// The dashboard state after a range change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDashboardView {
    /// Sequence number of the range change that produced the displayed
    /// data.
    pub sequence: u64,
    /// Latest sequence number issued by the controller.
    pub latest_sequence: u64,
    /// Human-readable description of the selected dates.
    pub label: String,
    /// Selected start date, if any.
    pub start: Option<NaiveDate>,
    /// Selected end date, if any.
    pub end: Option<NaiveDate>,
    /// Borough summary table.
    pub table: Vec<ApiBoroughCount>,
    /// Fire point overlay.
    pub points: FeatureCollection,
    /// Error from the latest range change, if it failed.
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_update_distinguishes_absent_from_null() {
        let update: RangeUpdate = serde_json::from_str(r#"{"start": null}"#).unwrap();
        assert_eq!(update.start, Some(None));
        assert_eq!(update.end, None);

        let update: RangeUpdate = serde_json::from_str(r#"{"end": "2022-04-25"}"#).unwrap();
        assert_eq!(update.start, None);
        assert_eq!(
            update.end,
            Some(Some(NaiveDate::from_ymd_opt(2022, 4, 25).unwrap()))
        );
    }

    #[test]
    fn borough_count_serializes_camel_case() {
        let row = ApiBoroughCount::from(BoroughCountRow {
            borough: "Fairbanks".to_string(),
            count: 3,
        });
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["borough"], "Fairbanks");
        assert_eq!(json["firePoints"], 3);
    }

    #[test]
    fn bounds_include_leaflet_corners() {
        let bounds = ApiBounds::from(BoundingBox::new(-148.0, 64.0, -146.0, 65.5));
        assert_eq!(bounds.corners, [[64.0, -148.0], [65.5, -146.0]]);
    }
}
