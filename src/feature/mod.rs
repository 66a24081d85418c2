//! Map features and the geometry math that anchors them in space.
//!
//! Features arrive inside GeoJSON tile payloads and keep their wire
//! shape in the cache. The one piece of derived data everything else
//! needs is a single reference point per feature: the point distances
//! and audio offsets are measured against.

mod types;

pub use types::{Feature, Geometry, TilePayload};

use crate::geo::Position;

impl Feature {
    /// Returns the point this feature is measured from.
    ///
    /// Linear features snap to the closest point on the line, so a long
    /// road is as far away as its nearest stretch. Everything else uses
    /// the vertex centroid. Returns `None` when the geometry is empty.
    pub fn reference_point(&self, origin: &Position) -> Option<Position> {
        match &self.geometry {
            Geometry::LineString(coordinates) => nearest_point_on_line(coordinates, origin),
            geometry => geometry.centroid(),
        }
    }
}

/// Finds the point on a polyline closest to an origin.
///
/// Segments are projected into a local equirectangular frame around the
/// origin, which keeps the math linear and is accurate at the scale of
/// a street grid. A single-vertex line returns that vertex.
pub fn nearest_point_on_line(line: &[[f64; 2]], origin: &Position) -> Option<Position> {
    if line.len() < 2 {
        return line.first().map(|coordinate| Position::from_lon_lat(*coordinate));
    }

    let cos_lat = origin.latitude.to_radians().cos();
    let project = |coordinate: &[f64; 2]| {
        (
            (coordinate[0] - origin.longitude) * cos_lat,
            coordinate[1] - origin.latitude,
        )
    };

    let mut best: Option<(f64, Position)> = None;
    for segment in line.windows(2) {
        let (ax, ay) = project(&segment[0]);
        let (bx, by) = project(&segment[1]);
        let (dx, dy) = (bx - ax, by - ay);
        let length_sq = dx * dx + dy * dy;
        let t = if length_sq == 0.0 {
            0.0
        } else {
            (-(ax * dx + ay * dy) / length_sq).clamp(0.0, 1.0)
        };
        let (px, py) = (ax + t * dx, ay + t * dy);
        let dist_sq = px * px + py * py;
        if best.as_ref().map_or(true, |(current, _)| dist_sq < *current) {
            let candidate = Position::new(origin.latitude + py, origin.longitude + px / cos_lat);
            best = Some((dist_sq, candidate));
        }
    }

    best.map(|(_, position)| position)
}
