#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial index for borough attribution.
//!
//! Builds an R-tree over the borough polygons from the boundary store and
//! answers point-in-polygon lookups. [`memory::MemoryFireStore`] uses it to
//! run the same containment join as the `PostGIS` queries over detections
//! loaded from a `GeoJSON` file, for offline use and tests.

pub mod detections;
pub mod memory;

use std::path::PathBuf;

use fire_map_geography::Borough;
use geo::{Contains, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};

pub use detections::{DEFAULT_OBSERVED_AT_PROPERTY, Detection};
pub use memory::MemoryFireStore;

/// Errors that can occur while loading detection fixtures.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// The detections file could not be read.
    #[error("Failed to read detections file {path:?}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The document is not a `FeatureCollection`.
    #[error("Detections GeoJSON must be a FeatureCollection")]
    NotCollection,

    /// A feature is not a usable detection.
    #[error("Invalid detection at feature {index}: {message}")]
    InvalidDetection {
        /// Position of the feature in the collection.
        index: usize,
        /// Description of what went wrong.
        message: String,
    },
}

/// A borough polygon stored in the R-tree with its name.
struct BoundaryEntry {
    name: String,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over borough polygons.
pub struct BoroughIndex {
    boroughs: RTree<BoundaryEntry>,
}

impl BoroughIndex {
    /// Bulk loads the R-tree from the boundary store's boroughs.
    #[must_use]
    pub fn build(boroughs: &[Borough]) -> Self {
        let entries = boroughs
            .iter()
            .map(|b| BoundaryEntry {
                name: b.name.clone(),
                envelope: AABB::from_corners(
                    [b.bounds.west, b.bounds.south],
                    [b.bounds.east, b.bounds.north],
                ),
                polygon: b.boundary.clone(),
            })
            .collect();

        let boroughs = RTree::bulk_load(entries);
        log::info!("Loaded {} boroughs into spatial index", boroughs.size());
        Self { boroughs }
    }

    /// Number of indexed boroughs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boroughs.size()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boroughs.size() == 0
    }

    /// Names of every borough whose interior contains the point, sorted.
    ///
    /// Points exactly on a boundary are not contained, matching
    /// `ST_Contains`. Overlapping polygons each report the point.
    #[must_use]
    pub fn containing(&self, lng: f64, lat: f64) -> Vec<&str> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        let mut names: Vec<&str> = self
            .boroughs
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.contains(&point))
            .map(|entry| entry.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Look up the borough containing a point.
    ///
    /// Boroughs tile Alaska without overlap, so the first match wins.
    #[must_use]
    pub fn lookup(&self, lng: f64, lat: f64) -> Option<&str> {
        self.containing(lng, lat).into_iter().next()
    }
}
