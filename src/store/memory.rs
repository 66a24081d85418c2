//! In-memory feature store.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use crate::feature::Feature;
use crate::store::{FeatureStore, StoreError};

#[derive(Debug, Default)]
struct StoreInner {
    /// Storage id to feature. The id is assigned at insert and stamped
    /// onto the feature itself.
    rows: HashMap<u64, Feature>,
    /// Tile key to the storage ids cached under it.
    tiles: HashMap<String, Vec<u64>>,
    /// OSM id to every row referencing it, merged features included.
    osm_index: HashMap<i64, Vec<u64>>,
    /// Tile URL to the time it was last fetched.
    fetches: HashMap<String, SystemTime>,
    next_id: u64,
}

/// A [`FeatureStore`] backed by process memory.
///
/// Suitable for a single session: contents vanish on drop, but fetch
/// times are tracked the same way a durable store would so the loader's
/// staleness logic behaves identically.
#[derive(Debug, Default)]
pub struct MemoryFeatureStore {
    inner: RwLock<StoreInner>,
}

impl MemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fetch at an explicit instant rather than now. Lets
    /// callers backfill fetch history, and tests age a tile without
    /// waiting for one.
    pub fn record_fetch_at(&self, url: &str, fetched_at: SystemTime) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.fetches.insert(url.to_string(), fetched_at);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreInner>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Lock)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreInner>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Lock)
    }
}

impl FeatureStore for MemoryFeatureStore {
    fn features(&self, tile_key: &str) -> Result<Vec<Feature>, StoreError> {
        let inner = self.read()?;
        let ids = match inner.tiles.get(tile_key) {
            Some(ids) => ids,
            None => return Ok(Vec::new()),
        };
        Ok(ids
            .iter()
            .filter_map(|id| inner.rows.get(id).cloned())
            .collect())
    }

    fn add_feature(&self, mut feature: Feature, tile_key: &str) -> Result<u64, StoreError> {
        let mut inner = self.write()?;
        let id = inner.next_id;
        inner.next_id += 1;

        feature.tile_key = Some(tile_key.to_string());
        feature.storage_id = Some(id);
        for osm_id in feature.osm_ids.clone() {
            inner.osm_index.entry(osm_id).or_default().push(id);
        }
        inner.tiles.entry(tile_key.to_string()).or_default().push(id);
        inner.rows.insert(id, feature);

        Ok(id)
    }

    fn delete_features(&self, tile_key: &str) -> Result<usize, StoreError> {
        let mut inner = self.write()?;
        let ids = match inner.tiles.remove(tile_key) {
            Some(ids) => ids,
            None => return Ok(0),
        };

        let mut removed = 0;
        for id in ids {
            let Some(feature) = inner.rows.remove(&id) else {
                continue;
            };
            removed += 1;
            for osm_id in feature.osm_ids {
                let now_empty = match inner.osm_index.get_mut(&osm_id) {
                    Some(rows) => {
                        rows.retain(|row| *row != id);
                        rows.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    inner.osm_index.remove(&osm_id);
                }
            }
        }

        Ok(removed)
    }

    fn feature_by_osm_id(&self, osm_id: i64) -> Result<Option<Feature>, StoreError> {
        let inner = self.read()?;
        let Some(ids) = inner.osm_index.get(&osm_id) else {
            return Ok(None);
        };
        Ok(ids
            .iter()
            .filter_map(|id| inner.rows.get(id))
            .find(|feature| feature.osm_ids.len() == 1)
            .cloned())
    }

    fn last_fetch_time(&self, url: &str) -> Result<Option<SystemTime>, StoreError> {
        Ok(self.read()?.fetches.get(url).copied())
    }

    fn record_fetch(&self, url: &str) -> Result<(), StoreError> {
        self.record_fetch_at(url, SystemTime::now())
    }

    fn feature_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.rows.len())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        *inner = StoreInner::default();
        Ok(())
    }
}
