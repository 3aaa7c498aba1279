#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `PostGIS` connection and spatial queries for fire detections.
//!
//! Uses `switchy_database` for the connection and raw parameterized SQL via
//! `query_raw_params()` for the containment joins. The [`store::FireStore`]
//! trait is the seam the dashboard and server depend on, so the `PostGIS`
//! backend can be swapped for an in-memory one.

pub mod db;
pub mod queries;
pub mod schema;
pub mod store;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The initial connection could not be established.
    #[error("Failed to connect to store {target}: {message}")]
    Connect {
        /// Connection target without credentials (`user@host:port/db`).
        target: String,
        /// Underlying failure.
        message: String,
    },

    /// The store stopped answering.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Underlying failure.
        message: String,
    },

    /// Database query error.
    #[error("Query failed: {0}")]
    Query(#[from] switchy_database::DatabaseError),

    /// A configured table or column name is not a plain SQL identifier.
    #[error("Invalid SQL identifier '{name}'")]
    Identifier {
        /// The rejected identifier.
        name: String,
    },

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
