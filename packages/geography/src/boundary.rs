//! The immutable borough boundary store.

use std::collections::BTreeSet;
use std::path::Path;

use fire_map_database_models::BoundingBox;
use geo::{BoundingRect, MultiPolygon};
use geojson::{Feature, FeatureCollection, GeoJson};

use crate::{BoundaryError, encode};

/// Feature property holding the borough name in the Alaska borough and
/// census area boundary file.
pub const DEFAULT_NAME_PROPERTY: &str = "CommunityN";

/// A borough polygon with its display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Borough {
    /// Unique display name.
    pub name: String,
    /// Boundary geometry (WGS84).
    pub boundary: MultiPolygon<f64>,
    /// Bounding box of `boundary`.
    pub bounds: BoundingBox,
}

/// Borough boundaries loaded once at startup.
///
/// There is no mutation API: the store is built by [`BoundaryStore::load`]
/// and only handed out by shared reference afterwards.
#[derive(Debug, Clone)]
pub struct BoundaryStore {
    boroughs: Vec<Borough>,
    collection: FeatureCollection,
    name_property: String,
}

impl BoundaryStore {
    /// Reads and validates the boundary `GeoJSON` file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if the file is missing or unreadable, is
    /// not a `FeatureCollection`, or holds a feature without a unique name
    /// or polygonal geometry.
    pub fn load(path: &Path, name_property: &str) -> Result<Self, BoundaryError> {
        let text = std::fs::read_to_string(path).map_err(|source| BoundaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_geojson_str(&text, name_property)?;
        log::info!(
            "Loaded {} borough boundaries from {}",
            store.boroughs.len(),
            path.display()
        );
        Ok(store)
    }

    /// Parses boundaries from `GeoJSON` text.
    ///
    /// # Errors
    ///
    /// See [`BoundaryStore::load`].
    pub fn from_geojson_str(text: &str, name_property: &str) -> Result<Self, BoundaryError> {
        let GeoJson::FeatureCollection(collection) = text.parse::<GeoJson>()? else {
            return Err(BoundaryError::NotCollection);
        };
        Self::from_collection(collection, name_property)
    }

    /// Builds the store from an already parsed collection.
    ///
    /// Each feature's `bbox` member is filled in so clients can zoom to a
    /// clicked borough without computing bounds themselves.
    ///
    /// # Errors
    ///
    /// See [`BoundaryStore::load`].
    pub fn from_collection(
        mut collection: FeatureCollection,
        name_property: &str,
    ) -> Result<Self, BoundaryError> {
        if collection.features.is_empty() {
            return Err(BoundaryError::Empty);
        }

        let mut seen = BTreeSet::new();
        let mut boroughs = Vec::with_capacity(collection.features.len());

        for (index, feature) in collection.features.iter_mut().enumerate() {
            let name =
                feature_name(feature, name_property).ok_or_else(|| BoundaryError::MissingName {
                    index,
                    property: name_property.to_string(),
                })?;

            if !seen.insert(name.clone()) {
                return Err(BoundaryError::DuplicateName { name });
            }

            let boundary = feature_multipolygon(feature, &name)?;
            let Some(bounds) = bounding_box(&boundary) else {
                return Err(BoundaryError::UnsupportedGeometry {
                    name,
                    kind: "empty polygon".to_string(),
                });
            };

            feature.bbox = Some(vec![bounds.west, bounds.south, bounds.east, bounds.north]);
            boroughs.push(Borough {
                name,
                boundary,
                bounds,
            });
        }

        Ok(Self {
            boroughs,
            collection,
            name_property: name_property.to_string(),
        })
    }

    /// All boroughs in file order.
    #[must_use]
    pub fn boroughs(&self) -> &[Borough] {
        &self.boroughs
    }

    /// Looks up a borough by name.
    #[must_use]
    pub fn borough(&self, name: &str) -> Option<&Borough> {
        self.boroughs.iter().find(|b| b.name == name)
    }

    /// The boundary collection as loaded, with per-feature `bbox` members.
    #[must_use]
    pub const fn feature_collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// Property the borough names were read from.
    #[must_use]
    pub fn name_property(&self) -> &str {
        &self.name_property
    }

    /// Compact binary encoding of all boroughs for the map client.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, BoundaryError> {
        encode::encode(&self.boroughs)
    }
}

/// Reads a non-empty string (or numeric) name property from a feature.
#[must_use]
pub fn feature_name(feature: &Feature, property: &str) -> Option<String> {
    match feature.property(property)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Bounding box of a multipolygon, `None` if it has no coordinates.
#[must_use]
pub fn bounding_box(boundary: &MultiPolygon<f64>) -> Option<BoundingBox> {
    boundary
        .bounding_rect()
        .map(|rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
}

fn feature_multipolygon(feature: &Feature, name: &str) -> Result<MultiPolygon<f64>, BoundaryError> {
    let Some(geometry) = feature.geometry.as_ref() else {
        return Err(BoundaryError::UnsupportedGeometry {
            name: name.to_string(),
            kind: "no geometry".to_string(),
        });
    };

    let geometry: geo::Geometry<f64> = geometry.value.clone().try_into()?;

    match geometry {
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p])),
        other => Err(BoundaryError::UnsupportedGeometry {
            name: name.to_string(),
            kind: geometry_kind(&other).to_string(),
        }),
    }
}

const fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::Line(_) | geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        _ => "non-polygonal geometry",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const TWO_BOROUGHS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "CommunityN": "Fairbanks North Star Borough" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-148.0, 64.0], [-146.0, 64.0], [-146.0, 65.5], [-148.0, 65.5], [-148.0, 64.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "CommunityN": "Denali Borough" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[-151.0, 62.5], [-148.5, 62.5], [-148.5, 64.0], [-151.0, 64.0], [-151.0, 62.5]]]]
                }
            }
        ]
    }"#;

    fn collection_with(feature: &str) -> String {
        format!(r#"{{"type": "FeatureCollection", "features": [{feature}]}}"#)
    }

    #[test]
    fn loads_polygons_and_multipolygons() {
        let store = BoundaryStore::from_geojson_str(TWO_BOROUGHS, DEFAULT_NAME_PROPERTY).unwrap();
        assert_eq!(store.boroughs().len(), 2);

        let fairbanks = store.borough("Fairbanks North Star Borough").unwrap();
        assert_eq!(
            fairbanks.bounds,
            BoundingBox::new(-148.0, 64.0, -146.0, 65.5)
        );
        assert!(store.borough("Denali Borough").is_some());
        assert!(store.borough("Nome Census Area").is_none());
    }

    #[test]
    fn fills_feature_bbox() {
        let store = BoundaryStore::from_geojson_str(TWO_BOROUGHS, DEFAULT_NAME_PROPERTY).unwrap();
        let bbox = store.feature_collection().features[1].bbox.clone().unwrap();
        assert_eq!(bbox, vec![-151.0, 62.5, -148.5, 64.0]);
    }

    #[test]
    fn load_reads_file() {
        let path = std::env::temp_dir().join("fire_map_boundary_load_test.geojson");
        std::fs::write(&path, TWO_BOROUGHS).unwrap();

        let store = BoundaryStore::load(&path, DEFAULT_NAME_PROPERTY).unwrap();
        assert_eq!(store.boroughs().len(), 2);
        assert_eq!(store.name_property(), DEFAULT_NAME_PROPERTY);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("fire_map_boundary_does_not_exist.geojson");
        let err = BoundaryStore::load(&path, DEFAULT_NAME_PROPERTY).unwrap_err();
        assert!(matches!(err, BoundaryError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = BoundaryStore::from_geojson_str("{ not json", DEFAULT_NAME_PROPERTY).unwrap_err();
        assert!(matches!(err, BoundaryError::GeoJson(_)));
    }

    #[test]
    fn bare_geometry_is_not_a_collection() {
        let err = BoundaryStore::from_geojson_str(
            r#"{"type": "Point", "coordinates": [-147.7, 64.8]}"#,
            DEFAULT_NAME_PROPERTY,
        )
        .unwrap_err();
        assert!(matches!(err, BoundaryError::NotCollection));
    }

    #[test]
    fn empty_collection_is_rejected() {
        let err = BoundaryStore::from_geojson_str(
            r#"{"type": "FeatureCollection", "features": []}"#,
            DEFAULT_NAME_PROPERTY,
        )
        .unwrap_err();
        assert!(matches!(err, BoundaryError::Empty));
    }

    #[test]
    fn feature_without_name_is_rejected() {
        let text = collection_with(
            r#"{"type": "Feature", "properties": {"Other": "x"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}"#,
        );
        let err = BoundaryStore::from_geojson_str(&text, DEFAULT_NAME_PROPERTY).unwrap_err();
        assert!(matches!(err, BoundaryError::MissingName { index: 0, .. }));
    }

    #[test]
    fn point_geometry_is_rejected() {
        let text = collection_with(
            r#"{"type": "Feature", "properties": {"CommunityN": "Somewhere"},
                "geometry": {"type": "Point", "coordinates": [-147.7, 64.8]}}"#,
        );
        let err = BoundaryStore::from_geojson_str(&text, DEFAULT_NAME_PROPERTY).unwrap_err();
        assert!(
            matches!(err, BoundaryError::UnsupportedGeometry { ref kind, .. } if kind == "Point")
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let feature = r#"{"type": "Feature", "properties": {"CommunityN": "Twice"},
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}"#;
        let text = collection_with(&format!("{feature}, {feature}"));
        let err = BoundaryStore::from_geojson_str(&text, DEFAULT_NAME_PROPERTY).unwrap_err();
        assert!(matches!(err, BoundaryError::DuplicateName { name } if name == "Twice"));
    }
}
