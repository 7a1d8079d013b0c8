//! Geographic points, truncation and the persistence codec.

use std::fmt;

use crate::error::DomainError;

/// Number of fractional digits kept for coordinates.
pub const POINT_PRECISION: i32 = 8;

/// Mean Earth radius in meters (IUGG), used for great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Coordinates of a geographic position.
///
/// Range checks (longitude in [-180, 180], latitude in [-90, 90]) are
/// enforced by storage, not here.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub longitude: f64,
    pub latitude: f64,
}

impl Point {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Truncates both coordinates to [`POINT_PRECISION`] digits.
    pub fn trunc(self) -> Self {
        Self {
            longitude: trunc(self.longitude, POINT_PRECISION),
            latitude: trunc(self.latitude, POINT_PRECISION),
        }
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &Point) -> f64 {
        haversine_distance(self, other)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.longitude, self.latitude)
    }
}

/// Truncates (towards zero) `number` to `precision` fractional digits.
///
/// A negative precision leaves the number untouched. The result never
/// exceeds `number` in magnitude, and truncating an already truncated number
/// returns it unchanged.
pub fn trunc(number: f64, precision: i32) -> f64 {
    if precision < 0 || !number.is_finite() {
        return number;
    }

    let pow = 10f64.powi(precision);
    let step = number.signum();
    let mut digits = (number * pow).trunc();

    // Scaling rounds, so the digit count can be one off in either direction.
    if ((digits + step) / pow).abs() <= number.abs() {
        digits += step;
    } else if (digits / pow).abs() > number.abs() {
        digits -= step;
    }

    digits / pow
}

/// Encodes a point as `"(lon,lat)"`.
pub fn encode_point(point: &Point) -> String {
    point.to_string()
}

/// Decodes the `"(lon,lat)"` encoding.
///
/// A value that does not match is a corrupt stored value and maps to
/// `Internal`.
pub fn decode_point(raw: &str) -> Result<Point, DomainError> {
    let corrupt = || DomainError::internal(format!("corrupt point value: {raw:?}"));

    let (lon, lat) = raw
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .and_then(|s| s.split_once(','))
        .ok_or_else(corrupt)?;

    let longitude: f64 = lon.parse().map_err(|_| corrupt())?;
    let latitude: f64 = lat.parse().map_err(|_| corrupt())?;

    if !longitude.is_finite() || !latitude.is_finite() {
        return Err(corrupt());
    }

    Ok(Point::new(longitude, latitude))
}

/// Haversine great-circle distance in meters on a sphere of
/// [`EARTH_RADIUS_METERS`].
pub fn haversine_distance(a: &Point, b: &Point) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}
