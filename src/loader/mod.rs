//! Tile loading: fetch, parse, and cache feature tiles.
//!
//! The loader enforces the session protocol that keeps tile traffic
//! bounded: each tile is requested at most once per session, a cached
//! tile within its freshness window is never refetched, and a stale
//! tile is purged from the store before its replacement lands. Failed
//! loads forget the session mark so the next query retries.

mod client;
mod error;

pub use client::{HttpTileClient, TileClient, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use error::LoadError;

#[cfg(test)]
pub use client::tests::MockTileClient;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::DashSet;
use tracing::{debug, trace, warn};

use crate::feature::{Feature, TilePayload};
use crate::store::FeatureStore;
use crate::tile::Tile;

/// How a [`TileLoader::load`] call was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A load this session already covered the tile; nothing to do.
    AlreadyRequested,
    /// The cached copy is within the freshness window.
    Fresh,
    /// The tile was fetched and this many features were cached.
    Loaded { features: usize },
}

/// Fetches feature tiles and settles them into the store.
pub struct TileLoader<C: TileClient> {
    client: C,
    store: Arc<dyn FeatureStore>,
    /// Tile keys requested this session, hit or miss.
    requested: DashSet<String>,
    max_age: Duration,
}

impl<C: TileClient> TileLoader<C> {
    /// Creates a loader over a transport and a store.
    ///
    /// `max_age` is how long a cached tile stays fresh; past that, the
    /// next request for the tile purges and refetches it.
    pub fn new(client: C, store: Arc<dyn FeatureStore>, max_age: Duration) -> Self {
        Self {
            client,
            store,
            requested: DashSet::new(),
            max_age,
        }
    }

    /// Loads a tile unless this session already has.
    ///
    /// The session mark is set before any I/O, so concurrent calls for
    /// the same tile collapse into one fetch. On failure the mark is
    /// dropped and the error returned; the next call retries.
    pub async fn load(&self, tile: &Tile) -> Result<LoadOutcome, LoadError> {
        if !self.requested.insert(tile.key().to_string()) {
            trace!(tile = %tile.key(), "tile already requested this session");
            return Ok(LoadOutcome::AlreadyRequested);
        }

        match self.refresh(tile).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                self.requested.remove(tile.key());
                warn!(tile = %tile.key(), %error, "tile load failed");
                Err(error)
            }
        }
    }

    async fn refresh(&self, tile: &Tile) -> Result<LoadOutcome, LoadError> {
        if self.is_fresh(tile.url())? {
            debug!(tile = %tile.key(), "cached tile still fresh");
            return Ok(LoadOutcome::Fresh);
        }

        let purged = self.store.delete_features(tile.key())?;
        if purged > 0 {
            debug!(tile = %tile.key(), purged, "purged stale tile contents");
        }

        let body = self.client.fetch_tile(tile.url()).await?;
        let payload: TilePayload =
            serde_json::from_slice(&body).map_err(|error| LoadError::Parse(error.to_string()))?;

        // A payload without a features member is not recorded as a
        // fetch, so the tile stays eligible for a refetch next session.
        let Some(features) = payload.features else {
            warn!(tile = %tile.key(), "tile payload has no features member");
            return Ok(LoadOutcome::Loaded { features: 0 });
        };

        let mut stored = 0;
        for value in features {
            match serde_json::from_value::<Feature>(value) {
                Ok(feature) => {
                    self.store.add_feature(feature, tile.key())?;
                    stored += 1;
                }
                Err(error) => {
                    warn!(tile = %tile.key(), %error, "skipping unparseable feature");
                }
            }
        }
        self.store.record_fetch(tile.url())?;

        debug!(tile = %tile.key(), features = stored, "tile loaded");
        Ok(LoadOutcome::Loaded { features: stored })
    }

    fn is_fresh(&self, url: &str) -> Result<bool, LoadError> {
        let Some(fetched_at) = self.store.last_fetch_time(url)? else {
            return Ok(false);
        };
        // A fetch time in the future reads as age zero.
        let age = SystemTime::now()
            .duration_since(fetched_at)
            .unwrap_or_default();
        Ok(age <= self.max_age)
    }
}
