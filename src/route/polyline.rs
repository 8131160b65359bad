//! Encoded polyline decoding
//!
//! Thin layer over the `polyline` crate. Its `LineString` carries longitude
//! in `x` and latitude in `y`; everything past this module uses
//! [`Coordinate`]. Strava summary polylines use precision 5.

use crate::error::DecodeError;

/// Precision used by Strava's `summary_polyline`.
pub const DEFAULT_PRECISION: u32 = 5;

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Decode an encoded polyline. An empty string yields no points.
pub fn decode(encoded: &str, precision: u32) -> Result<Vec<Coordinate>, DecodeError> {
    let line = ::polyline::decode_polyline(encoded, precision)
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    Ok(line
        .0
        .into_iter()
        .map(|c| Coordinate::new(c.y, c.x))
        .collect())
}

/// Encode coordinates; the inverse of [`decode`] at the same precision.
#[cfg(test)]
pub fn encode(points: &[Coordinate], precision: u32) -> String {
    let coords = points.iter().map(|p| geo_types::Coord { x: p.lng, y: p.lat });
    ::polyline::encode_coordinates(coords, precision).unwrap()
}
