//! Compact binary transport encoding for borough boundaries.
//!
//! Coordinates are quantized to [`PRECISION`] (1e-6 degrees, roughly 10 cm)
//! and every ring is stored as a flat `[x0, y0, dx1, dy1, ...]` array of
//! deltas from the previous vertex. Small deltas serialize to one- or
//! two-byte `MessagePack` integers, which is where the size win over
//! `GeoJSON` text comes from.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::{BoundaryError, boundary::Borough};

/// Format version written into every payload.
pub const VERSION: u8 = 1;

/// Quantization factor (units per degree).
pub const PRECISION: f64 = 1e6;

/// Top-level encoded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedBoundaries {
    /// Format version.
    pub version: u8,
    /// Quantization factor exponent (`PRECISION == 10^precision`).
    pub precision: u8,
    /// One entry per borough, in store order.
    pub boroughs: Vec<EncodedBorough>,
}

/// A single encoded borough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedBorough {
    /// Display name.
    pub name: String,
    /// Quantized `[west, south, east, north]`.
    pub bbox: [i64; 4],
    /// Polygons, each a list of rings (exterior first), each ring delta
    /// encoded.
    pub polygons: Vec<Vec<Vec<i64>>>,
}

#[allow(clippy::cast_possible_truncation)]
fn quantize(value: f64) -> i64 {
    (value * PRECISION).round() as i64
}

#[allow(clippy::cast_precision_loss)]
fn dequantize(value: i64) -> f64 {
    value as f64 / PRECISION
}

fn encode_ring(ring: &LineString<f64>) -> Vec<i64> {
    let mut out = Vec::with_capacity(ring.0.len() * 2);
    let (mut last_x, mut last_y) = (0i64, 0i64);
    for coord in &ring.0 {
        let (x, y) = (quantize(coord.x), quantize(coord.y));
        out.push(x - last_x);
        out.push(y - last_y);
        last_x = x;
        last_y = y;
    }
    out
}

/// Returns `None` if a running coordinate overflows.
fn decode_ring(deltas: &[i64]) -> Option<LineString<f64>> {
    let mut coords = Vec::with_capacity(deltas.len() / 2);
    let (mut x, mut y) = (0i64, 0i64);
    for pair in deltas.chunks_exact(2) {
        x = x.checked_add(pair[0])?;
        y = y.checked_add(pair[1])?;
        coords.push(Coord {
            x: dequantize(x),
            y: dequantize(y),
        });
    }
    Some(LineString::new(coords))
}

fn decode_polygon(exterior: &[i64], interiors: &[Vec<i64>]) -> Option<Polygon<f64>> {
    let interiors = interiors
        .iter()
        .map(|r| decode_ring(r))
        .collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(decode_ring(exterior)?, interiors))
}

fn encode_polygon(polygon: &Polygon<f64>) -> Vec<Vec<i64>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(encode_ring)
        .collect()
}

/// Builds the structured payload for `boroughs`.
#[must_use]
pub fn to_encoded(boroughs: &[Borough]) -> EncodedBoundaries {
    EncodedBoundaries {
        version: VERSION,
        precision: 6,
        boroughs: boroughs
            .iter()
            .map(|b| EncodedBorough {
                name: b.name.clone(),
                bbox: [
                    quantize(b.bounds.west),
                    quantize(b.bounds.south),
                    quantize(b.bounds.east),
                    quantize(b.bounds.north),
                ],
                polygons: b.boundary.0.iter().map(encode_polygon).collect(),
            })
            .collect(),
    }
}

/// Encodes `boroughs` to `MessagePack` bytes.
///
/// The output depends only on the input, so repeated calls produce
/// identical bytes.
///
/// # Errors
///
/// Returns [`BoundaryError::Encode`] if serialization fails.
pub fn encode(boroughs: &[Borough]) -> Result<Vec<u8>, BoundaryError> {
    Ok(rmp_serde::to_vec_named(&to_encoded(boroughs))?)
}

/// Decodes bytes produced by [`encode`] into `(name, geometry)` pairs.
///
/// # Errors
///
/// Returns [`BoundaryError::Decode`] if the bytes are not a valid payload,
/// or [`BoundaryError::CoordinateOverflow`] if a ring's deltas overflow.
pub fn decode(bytes: &[u8]) -> Result<Vec<(String, MultiPolygon<f64>)>, BoundaryError> {
    let payload: EncodedBoundaries = rmp_serde::from_slice(bytes)?;
    payload
        .boroughs
        .into_iter()
        .map(|b| {
            let mut polygons = Vec::with_capacity(b.polygons.len());
            for rings in &b.polygons {
                let Some((exterior, interiors)) = rings.split_first() else {
                    continue;
                };
                let Some(polygon) = decode_polygon(exterior, interiors) else {
                    return Err(BoundaryError::CoordinateOverflow { name: b.name });
                };
                polygons.push(polygon);
            }
            Ok((b.name, MultiPolygon::new(polygons)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundaryStore, DEFAULT_NAME_PROPERTY, tests::TWO_BOROUGHS};

    fn store() -> BoundaryStore {
        BoundaryStore::from_geojson_str(TWO_BOROUGHS, DEFAULT_NAME_PROPERTY).unwrap()
    }

    #[test]
    fn ring_deltas_start_from_origin() {
        let ring = LineString::from(vec![(-148.0, 64.0), (-146.0, 64.0), (-146.0, 65.5)]);
        assert_eq!(
            encode_ring(&ring),
            vec![-148_000_000, 64_000_000, 2_000_000, 0, 0, 1_500_000]
        );
    }

    #[test]
    fn decode_restores_geometry_within_precision() {
        let store = store();
        let decoded = decode(&store.encode().unwrap()).unwrap();

        assert_eq!(decoded.len(), store.boroughs().len());
        for ((name, geometry), borough) in decoded.iter().zip(store.boroughs()) {
            assert_eq!(name, &borough.name);
            let original: Vec<Coord<f64>> = borough.boundary.0[0].exterior().0.clone();
            let restored: Vec<Coord<f64>> = geometry.0[0].exterior().0.clone();
            assert_eq!(original.len(), restored.len());
            for (a, b) in original.iter().zip(&restored) {
                assert!((a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let store = store();
        assert_eq!(store.encode().unwrap(), store.encode().unwrap());
    }

    #[test]
    fn encoding_is_smaller_than_geojson() {
        let store = store();
        let encoded = store.encode().unwrap();
        let geojson = serde_json::to_vec(store.feature_collection()).unwrap();
        assert!(encoded.len() < geojson.len());
    }

    #[test]
    fn overflowing_deltas_fail_to_decode() {
        let payload = EncodedBoundaries {
            version: VERSION,
            precision: 6,
            boroughs: vec![EncodedBorough {
                name: "Overflow Borough".to_string(),
                bbox: [0, 0, 0, 0],
                polygons: vec![vec![vec![i64::MAX, 0, 1, 0, 0, 0]]],
            }],
        };
        let bytes = rmp_serde::to_vec_named(&payload).unwrap();

        assert!(matches!(
            decode(&bytes),
            Err(BoundaryError::CoordinateOverflow { name }) if name == "Overflow Borough"
        ));
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            decode(&[0xc1, 0x00, 0x01]),
            Err(BoundaryError::Decode(_))
        ));
    }
}
