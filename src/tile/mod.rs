//! Tile addressing for the feature tile server.
//!
//! Feature data is served as GeoJSON tiles on the usual `z/x/y` slippy
//! grid, always at [`ZOOM_LEVEL`]. A [`Tile`] pairs the grid coordinate
//! with the cache key and request URL derived from it, so the loader
//! and store never re-derive either.

use crate::geo::{self, GeoError, TileCoord};

/// The fixed zoom level feature tiles are served at.
pub const ZOOM_LEVEL: u8 = 16;

/// A single addressable feature tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tile {
    coords: TileCoord,
    key: String,
    url: String,
}

impl Tile {
    /// Creates a tile from grid coordinates and a tile server base URL.
    pub fn new(coords: TileCoord, base_url: &str) -> Self {
        let key = coords.key();
        let url = format!("{}/{}.json", base_url, key);
        Self { coords, key, url }
    }

    /// Creates the tile containing a geographic position.
    pub fn containing(latitude: f64, longitude: f64, base_url: &str) -> Result<Self, GeoError> {
        let coords = geo::tile_coords(latitude, longitude, ZOOM_LEVEL)?;
        Ok(Self::new(coords, base_url))
    }

    /// The grid coordinates of this tile.
    #[inline]
    pub fn coords(&self) -> TileCoord {
        self.coords
    }

    /// The `z/x/y` cache key of this tile.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The URL this tile is fetched from.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Returns every tile within `radius_meters` of a position.
///
/// The circle is covered by its bounding box, so tiles near the corners
/// may fall slightly outside the radius. Order is deterministic: column
/// by column, west to east, north to south within each column.
pub fn tiles_around(
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
    base_url: &str,
) -> Result<Vec<Tile>, GeoError> {
    let bbox = geo::bounding_box(latitude, longitude, radius_meters);
    let coords = geo::tiles_in_bounding_box(&bbox, ZOOM_LEVEL)?;

    Ok(coords
        .into_iter()
        .map(|coord| Tile::new(coord, base_url))
        .collect())
}
