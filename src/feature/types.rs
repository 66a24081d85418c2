//! Wire and storage types for map features.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geo::Position;

/// GeoJSON geometry, restricted to the shapes feature tiles carry.
///
/// Coordinates follow GeoJSON order: `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
}

impl Geometry {
    /// Returns the mean of the geometry's vertices.
    ///
    /// Polygon rings drop their closing vertex before averaging so a
    /// square is not biased toward its first corner. Returns `None`
    /// for geometry with no vertices.
    pub fn centroid(&self) -> Option<Position> {
        match self {
            Geometry::Point(coordinates) => Some(Position::from_lon_lat(*coordinates)),
            Geometry::LineString(coordinates) => mean_position(coordinates.iter()),
            Geometry::Polygon(rings) => mean_position(rings.iter().flat_map(|ring| {
                let closed = ring.len() > 1 && ring.first() == ring.last();
                let take = if closed { ring.len() - 1 } else { ring.len() };
                ring.iter().take(take)
            })),
        }
    }
}

fn mean_position<'a>(coordinates: impl Iterator<Item = &'a [f64; 2]>) -> Option<Position> {
    let mut count = 0usize;
    let mut lon_sum = 0.0;
    let mut lat_sum = 0.0;
    for coordinate in coordinates {
        lon_sum += coordinate[0];
        lat_sum += coordinate[1];
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(Position::new(lat_sum / count as f64, lon_sum / count as f64))
}

/// A single map feature from a feature tile.
///
/// `tile_key` and `storage_id` are assigned by the feature store when
/// the feature is cached; they are never present on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// OpenStreetMap entity ids backing this feature. Merged features,
    /// such as intersections, carry one id per constituent entity.
    pub osm_ids: Vec<i64>,
    /// Coarse feature category, for example `highway` or `amenity`.
    pub feature_type: String,
    /// Refinement of the category, for example `residential` or `cafe`.
    pub feature_value: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(skip)]
    pub tile_key: Option<String>,
    #[serde(skip)]
    pub storage_id: Option<u64>,
}

impl Feature {
    /// The display name, when the feature carries one. An empty name
    /// property reads as no name at all.
    pub fn name(&self) -> Option<&str> {
        self.properties
            .get("name")
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// The decoded body of a feature tile.
///
/// `features` stays `None` when the payload has no `features` member at
/// all, which the loader treats differently from an empty array.
#[derive(Debug, Deserialize)]
pub struct TilePayload {
    #[serde(default)]
    pub features: Option<Vec<serde_json::Value>>,
}
