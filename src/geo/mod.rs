//! Geographic math for tile addressing and audio spatialization.
//!
//! Everything here is pure: coordinate validation, Web Mercator tile
//! math, great-circle distances, and the listener-relative offsets the
//! audio layer feeds into its panner. Latitude and longitude are decimal
//! degrees throughout; distances are meters unless a [`DistanceUnits`]
//! says otherwise.

use std::f64::consts::PI;

mod types;

pub use types::{
    BoundingBox, DistanceUnits, GeoError, Offset, Position, TileCoord, EARTH_RADIUS_METERS,
    MAX_LATITUDE, MAX_LONGITUDE, MAX_ZOOM, MIN_LATITUDE, MIN_LONGITUDE,
};

/// Scale factor applied when projecting geographic offsets onto the
/// audio plane. Keeps distant features audible without pinning them to
/// the edge of the stereo field.
pub const AUDIO_PLANE_SCALE: f64 = 0.05;

/// Converts a geographic position to slippy-map tile coordinates.
///
/// Uses the standard Web Mercator projection. The fractional tile
/// position is truncated, so the result addresses the tile containing
/// the position.
///
/// # Arguments
///
/// * `latitude` - Latitude in degrees, within the Mercator range
/// * `longitude` - Longitude in degrees
/// * `zoom` - Tile zoom level, at most [`MAX_ZOOM`]
pub fn tile_coords(latitude: f64, longitude: f64, zoom: u8) -> Result<TileCoord, GeoError> {
    if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
        return Err(GeoError::InvalidLatitude(latitude));
    }
    if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
        return Err(GeoError::InvalidLongitude(longitude));
    }
    if zoom > MAX_ZOOM {
        return Err(GeoError::InvalidZoom(zoom));
    }

    let scale = (1u32 << zoom) as f64;
    let lat_rad = latitude.to_radians();
    let x = ((longitude + 180.0) / 360.0 * scale) as u32;
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * scale) as u32;

    Ok(TileCoord::new(x, y, zoom))
}

/// Computes the bounding box of a circle around a center position.
///
/// The box is exact in the north-south direction and widens the
/// east-west span by the secant of the latitude, so the full circle is
/// always covered.
pub fn bounding_box(latitude: f64, longitude: f64, radius_meters: f64) -> BoundingBox {
    let lat_delta = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
    let lon_delta = lat_delta / latitude.to_radians().cos();

    BoundingBox {
        min_lon: longitude - lon_delta,
        min_lat: latitude - lat_delta,
        max_lon: longitude + lon_delta,
        max_lat: latitude + lat_delta,
    }
}

/// Enumerates every tile that intersects a bounding box.
///
/// Tiles are listed column by column, west to east, with each column
/// running north to south. The box is clamped to the Mercator latitude
/// range before conversion, so a box spilling past the poles still
/// enumerates.
pub fn tiles_in_bounding_box(bbox: &BoundingBox, zoom: u8) -> Result<Vec<TileCoord>, GeoError> {
    let north = bbox.max_lat.clamp(MIN_LATITUDE, MAX_LATITUDE);
    let south = bbox.min_lat.clamp(MIN_LATITUDE, MAX_LATITUDE);
    let west = bbox.min_lon.clamp(MIN_LONGITUDE, MAX_LONGITUDE);
    let east = bbox.max_lon.clamp(MIN_LONGITUDE, MAX_LONGITUDE);

    let top_left = tile_coords(north, west, zoom)?;
    let bottom_right = tile_coords(south, east, zoom)?;

    let mut tiles =
        Vec::with_capacity(((bottom_right.x - top_left.x + 1) * (bottom_right.y - top_left.y + 1)) as usize);
    for x in top_left.x..=bottom_right.x {
        for y in top_left.y..=bottom_right.y {
            tiles.push(TileCoord::new(x, y, zoom));
        }
    }

    Ok(tiles)
}

/// Returns the great-circle distance between two positions in meters.
pub fn haversine_distance(origin: &Position, target: &Position) -> f64 {
    let phi1 = origin.latitude.to_radians();
    let phi2 = target.latitude.to_radians();
    let delta_phi = (target.latitude - origin.latitude).to_radians();
    let delta_lambda = (target.longitude - origin.longitude).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Returns the distance between two positions in the requested units.
#[inline]
pub fn distance_between(origin: &Position, target: &Position, units: DistanceUnits) -> f64 {
    units.from_meters(haversine_distance(origin, target))
}

/// Returns the initial great-circle bearing from origin to target, in
/// degrees clockwise from true north, normalized to `[0, 360)`.
pub fn initial_bearing(origin: &Position, target: &Position) -> f64 {
    let phi1 = origin.latitude.to_radians();
    let phi2 = target.latitude.to_radians();
    let delta_lambda = (target.longitude - origin.longitude).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Projects a target onto the listener's audio plane.
///
/// The angle to the target is taken from the flat-earth degree deltas
/// and rotated by the listener's heading, then scaled by the haversine
/// distance and [`AUDIO_PLANE_SCALE`]. Positive `x` is to the
/// listener's right, positive `y` is straight ahead.
///
/// # Arguments
///
/// * `origin` - The listener's position
/// * `heading_degrees` - The listener's heading, clockwise from north
/// * `target` - The position being spatialized
pub fn relative_offset(origin: &Position, heading_degrees: f64, target: &Position) -> Offset {
    let distance = haversine_distance(origin, target);
    let angle = (target.longitude - origin.longitude).atan2(target.latitude - origin.latitude)
        - heading_degrees.to_radians();

    Offset::new(
        distance * angle.sin() * AUDIO_PLANE_SCALE,
        distance * angle.cos() * AUDIO_PLANE_SCALE,
    )
}

/// Like [`relative_offset`], but projected onto the unit circle so only
/// the direction survives. A target at the listener's own position
/// comes out dead ahead.
pub fn normalized_offset(origin: &Position, heading_degrees: f64, target: &Position) -> Offset {
    let offset = relative_offset(origin, heading_degrees, target);
    let angle = offset.x.atan2(offset.y);

    Offset::new(angle.sin(), angle.cos())
}
