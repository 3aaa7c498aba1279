//! Spatial containment queries for fire detections.
//!
//! Both queries join detections to the borough polygon containing them
//! (`ST_Contains`) and filter on the observation timestamp. Bounds are
//! bound positionally as `$1` (inclusive, start of the first day) and `$2`
//! (exclusive, start of the day after the last day).

use fire_map_database_models::{BoroughCountRow, DateRange, FirePointRow};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::StoreError;
use crate::schema::StoreSchema;

/// Builds the grouped per-borough count query.
#[must_use]
pub fn counts_sql(schema: &StoreSchema) -> String {
    format!(
        "SELECT b.{name} AS borough, COUNT(f.{point}) AS fire_points
         FROM {boroughs} AS b
         JOIN {detections} AS f ON ST_Contains(b.{polygon}, f.{point})
         WHERE f.{observed} >= $1 AND f.{observed} < $2
         GROUP BY b.{name}
         ORDER BY b.{name}",
        name = schema.borough_name_column,
        point = schema.detection_geometry_column,
        polygon = schema.borough_geometry_column,
        boroughs = schema.boroughs_table,
        detections = schema.detections_table,
        observed = schema.observed_at_column,
    )
}

/// Builds the ungrouped point query.
#[must_use]
pub fn points_sql(schema: &StoreSchema) -> String {
    format!(
        "SELECT ST_X(f.{point}::geometry) AS longitude,
                ST_Y(f.{point}::geometry) AS latitude,
                f.{observed} AS observed_at,
                b.{name} AS borough
         FROM {boroughs} AS b
         JOIN {detections} AS f ON ST_Contains(b.{polygon}, f.{point})
         WHERE f.{observed} >= $1 AND f.{observed} < $2
         ORDER BY f.{observed}, b.{name}",
        name = schema.borough_name_column,
        point = schema.detection_geometry_column,
        polygon = schema.borough_geometry_column,
        boroughs = schema.boroughs_table,
        detections = schema.detections_table,
        observed = schema.observed_at_column,
    )
}

fn range_params(range: &DateRange) -> [DatabaseValue; 2] {
    [
        DatabaseValue::DateTime(range.lower_bound()),
        DatabaseValue::DateTime(range.upper_bound_exclusive()),
    ]
}

/// Counts fire detections per borough within `range`.
///
/// Only boroughs with at least one detection are returned, ordered by
/// name.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails or a row cannot be decoded.
pub async fn counts_by_borough(
    db: &dyn Database,
    schema: &StoreSchema,
    range: &DateRange,
) -> Result<Vec<BoroughCountRow>, StoreError> {
    log::debug!(
        "counts_by_borough: {} ..= {}",
        range.start(),
        range.end()
    );

    let rows = db
        .query_raw_params(&counts_sql(schema), &range_params(range))
        .await?;

    rows.iter()
        .map(|row| {
            let borough: String = row.to_value("borough").map_err(|e| StoreError::Conversion {
                message: format!("Failed to parse borough name: {e}"),
            })?;
            let count: i64 = row
                .to_value("fire_points")
                .map_err(|e| StoreError::Conversion {
                    message: format!("Failed to parse count for {borough}: {e}"),
                })?;
            let count = u64::try_from(count).map_err(|_| StoreError::Conversion {
                message: format!("Negative count {count} for {borough}"),
            })?;
            Ok(BoroughCountRow { borough, count })
        })
        .collect()
}

/// Returns every fire detection within `range` with its containing
/// borough.
///
/// An empty result is a valid answer, not an error.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails or a row cannot be decoded.
pub async fn points_in_range(
    db: &dyn Database,
    schema: &StoreSchema,
    range: &DateRange,
) -> Result<Vec<FirePointRow>, StoreError> {
    log::debug!("points_in_range: {} ..= {}", range.start(), range.end());

    let rows = db
        .query_raw_params(&points_sql(schema), &range_params(range))
        .await?;

    let mut points = Vec::with_capacity(rows.len());

    for row in &rows {
        let conversion = |field: &str, e: &dyn std::fmt::Display| StoreError::Conversion {
            message: format!("Failed to parse {field}: {e}"),
        };

        let observed_at: chrono::NaiveDateTime = row
            .to_value("observed_at")
            .map_err(|e| conversion("observed_at", &e))?;

        points.push(FirePointRow {
            longitude: row
                .to_value("longitude")
                .map_err(|e| conversion("longitude", &e))?,
            latitude: row
                .to_value("latitude")
                .map_err(|e| conversion("latitude", &e))?,
            observed_at: observed_at.and_utc(),
            borough: row
                .to_value("borough")
                .map_err(|e| conversion("borough", &e))?,
        });
    }

    Ok(points)
}
