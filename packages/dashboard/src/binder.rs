//! Binds store results to the table and map layers, and answers map
//! interactions.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use fire_map_database_models::{BoroughCountRow, BoundingBox, FirePointRow};
use fire_map_geography::boundary::{bounding_box, feature_name};
use fire_map_server_models::{ApiBoroughCount, PopupContent, TooltipContent};
use geo::BoundingRect as _;
use geojson::{Feature, FeatureCollection, Geometry, Value};

/// Point feature property holding the RFC 3339 observation time.
pub const OBSERVED_AT_PROPERTY: &str = "observedAt";

/// Point feature property holding the containing borough.
pub const BOROUGH_PROPERTY: &str = "borough";

/// Table rows in store order.
#[must_use]
pub fn bind_counts(counts: &[BoroughCountRow]) -> Vec<ApiBoroughCount> {
    counts.iter().cloned().map(ApiBoroughCount::from).collect()
}

/// Point overlay for the map.
#[must_use]
pub fn bind_points(points: &[FirePointRow]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: points.iter().map(point_feature).collect(),
        foreign_members: None,
    }
}

fn point_feature(row: &FirePointRow) -> Feature {
    let mut properties = serde_json::Map::new();
    properties.insert(
        OBSERVED_AT_PROPERTY.to_string(),
        serde_json::Value::String(row.observed_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    properties.insert(
        BOROUGH_PROPERTY.to_string(),
        serde_json::Value::String(row.borough.clone()),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![row.longitude, row.latitude]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// A fire point feature read back from the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickedPoint {
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Observation time.
    pub observed_at: DateTime<Utc>,
}

impl ClickedPoint {
    /// Reads a point feature, `None` if any required member is missing.
    #[must_use]
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        let Value::Point(coords) = &feature.geometry.as_ref()?.value else {
            return None;
        };
        let [longitude, latitude, ..] = coords.as_slice() else {
            return None;
        };
        let raw = feature
            .property(OBSERVED_AT_PROPERTY)
            .and_then(serde_json::Value::as_str)?;
        let observed_at = DateTime::parse_from_rfc3339(raw).ok()?.with_timezone(&Utc);

        Some(Self {
            longitude: *longitude,
            latitude: *latitude,
            observed_at,
        })
    }

    /// Popup text for this point.
    #[must_use]
    pub fn popup(&self) -> PopupContent {
        PopupContent {
            date: self.observed_at.format("%Y-%m-%d").to_string(),
            time: self.observed_at.format("%H:%M:%S UTC").to_string(),
            coordinates: format!("{:.3}, {:.3}", self.longitude, self.latitude),
        }
    }
}

/// Popup for a clicked fire point. Nothing is shown for a missing or
/// malformed feature.
#[must_use]
pub fn on_feature_click(feature: Option<&Feature>) -> Option<PopupContent> {
    feature
        .and_then(ClickedPoint::from_feature)
        .map(|point| point.popup())
}

/// Tooltip for a hovered borough.
#[must_use]
pub fn on_borough_hover(feature: Option<&Feature>, name_property: &str) -> Option<TooltipContent> {
    let text = feature_name(feature?, name_property)?;
    Some(TooltipContent { text })
}

/// Bounds to fit for a clicked borough.
///
/// Uses the feature's `bbox` member when present, otherwise computes it
/// from the geometry.
#[must_use]
pub fn on_bounds_click(feature: Option<&Feature>) -> Option<BoundingBox> {
    let feature = feature?;

    if let Some([west, south, east, north]) = feature.bbox.as_deref() {
        return Some(BoundingBox::new(*west, *south, *east, *north));
    }

    let geometry: geo::Geometry<f64> = feature.geometry.as_ref()?.value.clone().try_into().ok()?;
    match geometry {
        geo::Geometry::MultiPolygon(mp) => bounding_box(&mp),
        other => other
            .bounding_rect()
            .map(|rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)),
    }
}

/// A borough whose table count disagrees with its overlay points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinMismatch {
    /// Borough name.
    pub borough: String,
    /// Count reported by the summary query.
    pub counted: u64,
    /// Points returned by the point query.
    pub points: u64,
}

/// Checks that each borough's count equals its number of points.
///
/// # Errors
///
/// Returns every borough where the two disagree.
pub fn check_join_consistency(
    counts: &[BoroughCountRow],
    points: &[FirePointRow],
) -> Result<(), Vec<JoinMismatch>> {
    let mut per_borough: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for row in counts {
        per_borough.entry(&row.borough).or_default().0 += row.count;
    }
    for point in points {
        per_borough.entry(&point.borough).or_default().1 += 1;
    }

    let mismatches: Vec<JoinMismatch> = per_borough
        .into_iter()
        .filter(|(_, (counted, points))| counted != points)
        .map(|(borough, (counted, points))| JoinMismatch {
            borough: borough.to_string(),
            counted,
            points,
        })
        .collect();

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(mismatches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn point(borough: &str, lng: f64, lat: f64) -> FirePointRow {
        FirePointRow {
            longitude: lng,
            latitude: lat,
            observed_at: Utc.with_ymd_and_hms(2022, 4, 21, 10, 0, 0).unwrap(),
            borough: borough.to_string(),
        }
    }

    fn count(borough: &str, count: u64) -> BoroughCountRow {
        BoroughCountRow {
            borough: borough.to_string(),
            count,
        }
    }

    fn borough_feature(json: &str) -> Feature {
        match json.parse::<geojson::GeoJson>().unwrap() {
            geojson::GeoJson::Feature(feature) => feature,
            other => panic!("expected a Feature, got {other}"),
        }
    }

    #[test]
    fn counts_keep_store_order() {
        let rows = bind_counts(&[count("Denali Borough", 2), count("Fairbanks", 1)]);
        assert_eq!(rows[0].borough, "Denali Borough");
        assert_eq!(rows[0].fire_points, 2);
        assert_eq!(rows[1].borough, "Fairbanks");
    }

    #[test]
    fn points_become_point_features() {
        let collection = bind_points(&[point("Fairbanks", -147.7, 64.8)]);
        assert_eq!(collection.features.len(), 1);

        let feature = &collection.features[0];
        assert_eq!(
            feature.geometry.as_ref().map(|g| &g.value),
            Some(&Value::Point(vec![-147.7, 64.8]))
        );
        assert_eq!(
            feature.property(OBSERVED_AT_PROPERTY),
            Some(&serde_json::json!("2022-04-21T10:00:00Z"))
        );
        assert_eq!(
            feature.property(BOROUGH_PROPERTY),
            Some(&serde_json::json!("Fairbanks"))
        );
    }

    #[test]
    fn click_on_bound_point_shows_popup() {
        let collection = bind_points(&[point("Fairbanks", -147.71234, 64.8)]);
        let popup = on_feature_click(collection.features.first()).unwrap();

        assert_eq!(
            popup,
            PopupContent {
                date: "2022-04-21".to_string(),
                time: "10:00:00 UTC".to_string(),
                coordinates: "-147.712, 64.800".to_string(),
            }
        );
    }

    #[test]
    fn click_without_feature_is_noop() {
        assert_eq!(on_feature_click(None), None);
    }

    #[test]
    fn click_on_feature_without_timestamp_is_noop() {
        let mut feature = bind_points(&[point("Fairbanks", -147.7, 64.8)])
            .features
            .remove(0);
        feature
            .properties
            .as_mut()
            .unwrap()
            .remove(OBSERVED_AT_PROPERTY);
        assert_eq!(on_feature_click(Some(&feature)), None);
    }

    #[test]
    fn hover_shows_borough_name() {
        let feature = borough_feature(
            r#"{"type": "Feature", "properties": {"CommunityN": "Denali Borough"},
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}}"#,
        );
        assert_eq!(
            on_borough_hover(Some(&feature), "CommunityN"),
            Some(TooltipContent {
                text: "Denali Borough".to_string()
            })
        );
        assert_eq!(on_borough_hover(Some(&feature), "name"), None);
        assert_eq!(on_borough_hover(None, "CommunityN"), None);
    }

    #[test]
    fn bounds_prefer_bbox_member() {
        let feature = borough_feature(
            r#"{"type": "Feature", "bbox": [-148.0, 64.0, -146.0, 65.5], "properties": {},
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}}"#,
        );
        assert_eq!(
            on_bounds_click(Some(&feature)),
            Some(BoundingBox::new(-148.0, 64.0, -146.0, 65.5))
        );
    }

    #[test]
    fn bounds_fall_back_to_geometry() {
        let feature = borough_feature(
            r#"{"type": "Feature", "properties": {},
                "geometry": {"type": "MultiPolygon", "coordinates": [[[[-151.0, 62.5], [-148.5, 62.5], [-148.5, 64.0], [-151.0, 62.5]]]]}}"#,
        );
        assert_eq!(
            on_bounds_click(Some(&feature)),
            Some(BoundingBox::new(-151.0, 62.5, -148.5, 64.0))
        );
        assert_eq!(on_bounds_click(None), None);
    }

    #[test]
    fn consistent_results_pass() {
        let counts = [count("Denali", 1), count("Fairbanks", 2)];
        let points = [
            point("Fairbanks", -147.7, 64.8),
            point("Denali", -149.9, 63.1),
            point("Fairbanks", -147.1, 65.0),
        ];
        assert_eq!(check_join_consistency(&counts, &points), Ok(()));
    }

    #[test]
    fn inconsistent_results_are_reported() {
        let counts = [count("Fairbanks", 2)];
        let points = [point("Fairbanks", -147.7, 64.8), point("Denali", -149.9, 63.1)];

        let mismatches = check_join_consistency(&counts, &points).unwrap_err();
        assert_eq!(
            mismatches,
            vec![
                JoinMismatch {
                    borough: "Denali".to_string(),
                    counted: 0,
                    points: 1,
                },
                JoinMismatch {
                    borough: "Fairbanks".to_string(),
                    counted: 2,
                    points: 1,
                },
            ]
        );
    }
}
