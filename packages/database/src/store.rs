//! The fire detection store abstraction and its `PostGIS` backend.

use std::sync::Arc;

use fire_map_database_models::{BoroughCountRow, DateRange, FirePointRow};
use switchy_database::Database;

use crate::StoreError;
use crate::db::{self, StoreConfig};
use crate::queries;
use crate::schema::StoreSchema;

/// Read-only access to borough-attributed fire detections.
#[async_trait::async_trait]
pub trait FireStore: Send + Sync {
    /// Per-borough detection counts within `range`, ordered by borough name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot answer.
    async fn counts_by_borough(&self, range: &DateRange) -> Result<Vec<BoroughCountRow>, StoreError>;

    /// All detections within `range` with their containing borough.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot answer.
    async fn points_in_range(&self, range: &DateRange) -> Result<Vec<FirePointRow>, StoreError>;
}

/// [`FireStore`] backed by a single `PostGIS` connection.
pub struct PostgisFireStore {
    db: Arc<dyn Database>,
    schema: StoreSchema,
}

impl PostgisFireStore {
    /// Opens the connection described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connect`] if the connection fails, or
    /// [`StoreError::Identifier`] if the schema names are invalid.
    pub async fn connect(config: &StoreConfig, schema: StoreSchema) -> Result<Self, StoreError> {
        schema.validate()?;
        let db = db::connect(config).await?;
        Ok(Self {
            db: Arc::from(db),
            schema,
        })
    }

    /// Distinguishes a dead connection from a failing query.
    ///
    /// A query error is reported as [`StoreError::Unavailable`] when a
    /// trivial `SELECT 1` on the same connection fails too.
    async fn classify(&self, err: StoreError) -> StoreError {
        let StoreError::Query(query_err) = err else {
            return err;
        };

        match self.db.query_raw_params("SELECT 1 AS ok", &[]).await {
            Ok(_) => StoreError::Query(query_err),
            Err(ping_err) => {
                log::error!("Store ping failed after query error: {ping_err}");
                StoreError::Unavailable {
                    message: query_err.to_string(),
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl FireStore for PostgisFireStore {
    async fn counts_by_borough(&self, range: &DateRange) -> Result<Vec<BoroughCountRow>, StoreError> {
        match queries::counts_by_borough(self.db.as_ref(), &self.schema, range).await {
            Ok(rows) => Ok(rows),
            Err(e) => Err(self.classify(e).await),
        }
    }

    async fn points_in_range(&self, range: &DateRange) -> Result<Vec<FirePointRow>, StoreError> {
        match queries::points_in_range(self.db.as_ref(), &self.schema, range).await {
            Ok(rows) => Ok(rows),
            Err(e) => Err(self.classify(e).await),
        }
    }
}
