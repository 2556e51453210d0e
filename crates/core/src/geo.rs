//! Geographic primitives for spatial candidate search and location scoring.
//!
//! Pure math only. The bounding-box helper exists so the database layer can
//! prefilter with a cheap lat/lon range scan before the exact great-circle
//! distance is computed here.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Meters per degree of latitude (and of longitude at the equator).
const METERS_PER_DEGREE: f64 = 111_320.0;

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether the pair is usable for distance math: finite and within
    /// the valid WGS84 ranges. NaN and infinite values are rejected here so
    /// they can never propagate into a similarity score.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Haversine great-circle distance between two points in meters.
pub fn haversine_meters(a: LatLon, b: LatLon) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_METERS * c
}

/// A lat/lon range used as a cheap spatial prefilter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Build a box that fully contains a circle of `radius_meters` around
    /// `center`. The longitude delta widens with latitude; near the poles it
    /// degrades to the full longitude range rather than dividing by zero.
    pub fn around(center: LatLon, radius_meters: f64) -> Self {
        let lat_delta = radius_meters / METERS_PER_DEGREE;
        let lat_cos = center.lat.to_radians().cos();
        let lon_delta = if lat_cos > 1e-6 {
            radius_meters / (METERS_PER_DEGREE * lat_cos)
        } else {
            180.0
        };

        Self {
            min_lat: (center.lat - lat_delta).max(-90.0),
            max_lat: (center.lat + lat_delta).min(90.0),
            min_lon: (center.lon - lon_delta).max(-180.0),
            max_lon: (center.lon + lon_delta).min(180.0),
        }
    }

    pub fn contains(&self, point: LatLon) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
