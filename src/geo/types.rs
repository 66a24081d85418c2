//! Core geographic types shared across the crate.

use std::fmt;

/// Minimum latitude a Web Mercator tile grid can address.
pub const MIN_LATITUDE: f64 = -85.05112878;

/// Maximum latitude a Web Mercator tile grid can address.
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Minimum longitude in degrees.
pub const MIN_LONGITUDE: f64 = -180.0;

/// Maximum longitude in degrees.
pub const MAX_LONGITUDE: f64 = 180.0;

/// Maximum tile zoom level supported by the tile servers we speak to.
pub const MAX_ZOOM: u8 = 18;

/// Mean Earth radius in meters, as used by the distance formulas.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    /// Creates a new position from latitude and longitude in degrees.
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Creates a position from a GeoJSON `[longitude, latitude]` pair.
    #[inline]
    pub fn from_lon_lat(coordinates: [f64; 2]) -> Self {
        Self {
            latitude: coordinates[1],
            longitude: coordinates[0],
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// A geographic rectangle in degrees.
///
/// Longitudes grow eastward and latitudes grow northward, so `min_lon` is
/// the western edge and `max_lat` is the northern edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Returns true when the position falls inside the box, edges included.
    pub fn contains(&self, position: &Position) -> bool {
        position.longitude >= self.min_lon
            && position.longitude <= self.max_lon
            && position.latitude >= self.min_lat
            && position.latitude <= self.max_lat
    }
}

/// A slippy-map tile address.
///
/// `x` counts columns from the antimeridian eastward and `y` counts rows
/// from the north pole southward, per the usual Web Mercator layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[inline]
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Returns the canonical `z/x/y` cache key for this tile.
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A listener-relative offset on the horizontal audio plane.
///
/// `x` grows to the listener's right and `y` grows straight ahead.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Units a distance in meters can be reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnits {
    Meters,
    Feet,
    Miles,
}

impl DistanceUnits {
    /// Converts a distance in meters into these units.
    #[inline]
    pub fn from_meters(&self, meters: f64) -> f64 {
        match self {
            DistanceUnits::Meters => meters,
            DistanceUnits::Feet => meters * 3.28084,
            DistanceUnits::Miles => meters / 1_609.344,
        }
    }
}

/// Errors produced when validating geographic input.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    /// Latitude outside the Web Mercator range.
    InvalidLatitude(f64),
    /// Longitude outside the valid range.
    InvalidLongitude(f64),
    /// Zoom level beyond what tile servers provide.
    InvalidZoom(u8),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::InvalidLatitude(latitude) => write!(
                f,
                "latitude {} outside valid range [{}, {}]",
                latitude, MIN_LATITUDE, MAX_LATITUDE
            ),
            GeoError::InvalidLongitude(longitude) => write!(
                f,
                "longitude {} outside valid range [{}, {}]",
                longitude, MIN_LONGITUDE, MAX_LONGITUDE
            ),
            GeoError::InvalidZoom(zoom) => {
                write!(f, "zoom level {} exceeds maximum {}", zoom, MAX_ZOOM)
            }
        }
    }
}

impl std::error::Error for GeoError {}
