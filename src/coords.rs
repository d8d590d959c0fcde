use std::fmt;

use geo::{Distance, Geodesic, Point};
use thiserror::Error;

/// Malformed "lat,lon" geopoint text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("geopoint {text:?} has {found} comma-separated fields, expected 2")]
    FieldCount { text: String, found: usize },

    #[error("geopoint {text:?} has a non-numeric field {token:?}")]
    NotNumeric { text: String, token: String },
}

/// A WGS84 position in degrees, stored in (lat, lon) order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self { Self { lat, lon } }

    /// geo points are (x, y) = (lon, lat).
    #[inline]
    pub fn to_point(self) -> Point<f64> { Point::new(self.lon, self.lat) }

    /// Ellipsoidal (WGS84, Karney) distance to `other`, in kilometers.
    #[inline]
    pub fn geodesic_km(&self, other: &Coordinate) -> f64 {
        Geodesic.distance(self.to_point(), other.to_point()) / 1000.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_geopoint(self.lat, self.lon))
    }
}

/// Parse a "lat,lon" geopoint. Whitespace around either token is ignored.
pub fn parse_geopoint(text: &str) -> Result<Coordinate, FormatError> {
    let tokens = text.split(',').collect::<Vec<_>>();
    if tokens.len() != 2 {
        return Err(FormatError::FieldCount { text: text.to_string(), found: tokens.len() });
    }

    let parse = |token: &str| {
        token.trim().parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| FormatError::NotNumeric { text: text.to_string(), token: token.to_string() })
    };

    Ok(Coordinate::new(parse(tokens[0])?, parse(tokens[1])?))
}

/// Inverse of [`parse_geopoint`]. Uses the shortest text that reads back to the same `f64`.
pub fn format_geopoint(lat: f64, lon: f64) -> String {
    format!("{lat},{lon}")
}
