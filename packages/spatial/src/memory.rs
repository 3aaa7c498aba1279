//! [`FireStore`] over in-memory detections.

use std::collections::BTreeMap;
use std::path::Path;

use fire_map_database::StoreError;
use fire_map_database::store::FireStore;
use fire_map_database_models::{BoroughCountRow, DateRange, FirePointRow};
use fire_map_geography::Borough;

use crate::{BoroughIndex, Detection, SpatialError, detections};

/// Runs the borough containment join against a fixed detection list.
///
/// Results follow the `PostGIS` queries: counts ordered by borough name,
/// points ordered by observation time then borough, detections outside
/// every borough dropped.
pub struct MemoryFireStore {
    index: BoroughIndex,
    detections: Vec<Detection>,
}

impl MemoryFireStore {
    /// Creates a store over `detections` attributed to `boroughs`.
    #[must_use]
    pub fn new(boroughs: &[Borough], detections: Vec<Detection>) -> Self {
        Self {
            index: BoroughIndex::build(boroughs),
            detections,
        }
    }

    /// Creates a store from a detections `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the file cannot be loaded.
    pub fn from_file(
        boroughs: &[Borough],
        path: &Path,
        observed_at_property: &str,
    ) -> Result<Self, SpatialError> {
        Ok(Self::new(
            boroughs,
            detections::load(path, observed_at_property)?,
        ))
    }

    fn joined(&self, range: &DateRange) -> Vec<FirePointRow> {
        let mut rows: Vec<FirePointRow> = self
            .detections
            .iter()
            .filter(|d| range.contains(d.observed_at))
            .flat_map(|d| {
                self.index
                    .containing(d.longitude, d.latitude)
                    .into_iter()
                    .map(move |name| FirePointRow {
                        longitude: d.longitude,
                        latitude: d.latitude,
                        observed_at: d.observed_at,
                        borough: name.to_string(),
                    })
            })
            .collect();

        rows.sort_by(|a, b| {
            a.observed_at
                .cmp(&b.observed_at)
                .then_with(|| a.borough.cmp(&b.borough))
        });
        rows
    }
}

#[async_trait::async_trait]
impl FireStore for MemoryFireStore {
    async fn counts_by_borough(&self, range: &DateRange) -> Result<Vec<BoroughCountRow>, StoreError> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for row in self.joined(range) {
            *counts.entry(row.borough).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(borough, count)| BoroughCountRow { borough, count })
            .collect())
    }

    async fn points_in_range(&self, range: &DateRange) -> Result<Vec<FirePointRow>, StoreError> {
        Ok(self.joined(range))
    }
}
