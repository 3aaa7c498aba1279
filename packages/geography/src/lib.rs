#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Borough boundary data for the fire map.
//!
//! Loads the borough polygon `GeoJSON` once at startup into an immutable
//! [`BoundaryStore`] and converts it into a compact binary encoding
//! (quantized, delta-encoded rings serialized as `MessagePack`) for the
//! map client's static boundary overlay.

pub mod boundary;
pub mod encode;

use std::path::PathBuf;

pub use boundary::{Borough, BoundaryStore, DEFAULT_NAME_PROPERTY};

/// Errors that can occur while loading or encoding boundaries.
#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    /// The boundary file could not be read.
    #[error("Failed to read boundary file {path:?}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The document is valid `GeoJSON` but not a `FeatureCollection`.
    #[error("Boundary GeoJSON must be a FeatureCollection")]
    NotCollection,

    /// The collection holds no boroughs.
    #[error("Boundary GeoJSON contains no features")]
    Empty,

    /// A feature has no usable name property.
    #[error("Feature {index} has no '{property}' name property")]
    MissingName {
        /// Position of the feature in the collection.
        index: usize,
        /// Name property that was looked up.
        property: String,
    },

    /// Two features share a name.
    #[error("Duplicate borough name '{name}'")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },

    /// A feature has no polygonal geometry.
    #[error("Borough '{name}' has unsupported geometry: {kind}")]
    UnsupportedGeometry {
        /// Borough name.
        name: String,
        /// What was found instead.
        kind: String,
    },

    /// `MessagePack` encoding failed.
    #[error("Encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// `MessagePack` decoding failed.
    #[error("Decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// A ring's accumulated deltas overflow the quantized coordinate range.
    #[error("Borough '{name}' has a ring whose coordinates overflow")]
    CoordinateOverflow {
        /// Borough name.
        name: String,
    },
}
