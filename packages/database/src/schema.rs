//! Table and column names of the two source tables.
//!
//! Identifiers cannot be bound as query parameters, so they are spliced
//! into the SQL text. [`StoreSchema::validate`] restricts them to plain
//! (optionally schema-qualified) identifiers first.

use serde::Deserialize;

use crate::StoreError;

/// Names of the borough boundary and fire detection tables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreSchema {
    /// Borough polygon table.
    pub boroughs_table: String,
    /// Borough display name column.
    pub borough_name_column: String,
    /// Borough polygon geometry column.
    pub borough_geometry_column: String,
    /// Fire detection table.
    pub detections_table: String,
    /// Detection point geometry column.
    pub detection_geometry_column: String,
    /// Detection UTC observation timestamp column.
    pub observed_at_column: String,
}

impl Default for StoreSchema {
    fn default() -> Self {
        Self {
            boroughs_table: "alaska_borough_and_census_area_boundaries".to_string(),
            borough_name_column: "communityn".to_string(),
            borough_geometry_column: "shape".to_string(),
            detections_table: "viirs_active_fire_detections".to_string(),
            detection_geometry_column: "shape".to_string(),
            observed_at_column: "utcobstime".to_string(),
        }
    }
}

impl StoreSchema {
    /// Checks every configured name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Identifier`] for the first name that is not a
    /// plain identifier.
    pub fn validate(&self) -> Result<(), StoreError> {
        for name in [
            &self.boroughs_table,
            &self.borough_name_column,
            &self.borough_geometry_column,
            &self.detections_table,
            &self.detection_geometry_column,
            &self.observed_at_column,
        ] {
            if !is_identifier(name) {
                return Err(StoreError::Identifier { name: name.clone() });
            }
        }
        Ok(())
    }
}

/// `name` or `schema.name`, each part starting with a letter or underscore.
fn is_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_is_valid() {
        assert!(StoreSchema::default().validate().is_ok());
    }

    #[test]
    fn accepts_schema_qualified_table() {
        let schema = StoreSchema {
            detections_table: "viirs.active_fire_detections".to_string(),
            ..StoreSchema::default()
        };
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn rejects_injection_attempt() {
        let schema = StoreSchema {
            observed_at_column: "utcobstime; DROP TABLE x".to_string(),
            ..StoreSchema::default()
        };
        let err = schema.validate().unwrap_err();
        assert!(matches!(err, StoreError::Identifier { name } if name.starts_with("utcobstime")));
    }

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("_private"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1table"));
        assert!(!is_identifier("a.b.c"));
        assert!(!is_identifier("a."));
        assert!(!is_identifier("\"quoted\""));
    }
}
