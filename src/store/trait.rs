//! The storage trait the rest of the crate works against.

use std::time::SystemTime;

use crate::feature::Feature;
use crate::store::StoreError;

/// Storage for cached map features and tile fetch bookkeeping.
///
/// Implementations must be safe to share across threads; the loader
/// writes while the resolver reads. All methods are synchronous so the
/// resolver can answer from whatever is cached without waiting on I/O.
pub trait FeatureStore: Send + Sync {
    /// Returns every feature cached for a tile key. A tile that has
    /// never been loaded yields an empty list, not an error.
    fn features(&self, tile_key: &str) -> Result<Vec<Feature>, StoreError>;

    /// Adds a feature under a tile key and returns the storage id
    /// assigned to it.
    fn add_feature(&self, feature: Feature, tile_key: &str) -> Result<u64, StoreError>;

    /// Removes every feature cached for a tile key, returning how many
    /// were removed.
    fn delete_features(&self, tile_key: &str) -> Result<usize, StoreError>;

    /// Looks up the feature backed by exactly this one OSM entity.
    ///
    /// Merged features, such as intersections, reference several OSM
    /// ids; those never match here. This is how an intersection's
    /// constituent roads are resolved to their own records.
    fn feature_by_osm_id(&self, osm_id: i64) -> Result<Option<Feature>, StoreError>;

    /// Returns when a tile URL was last fetched, if ever.
    fn last_fetch_time(&self, url: &str) -> Result<Option<SystemTime>, StoreError>;

    /// Records that a tile URL was fetched just now.
    fn record_fetch(&self, url: &str) -> Result<(), StoreError>;

    /// Total number of cached features, across all tiles.
    fn feature_count(&self) -> Result<usize, StoreError>;

    /// Drops every cached feature and fetch record.
    fn clear(&self) -> Result<(), StoreError>;
}
