//! Earshot - location-aware audio wayfinding
//!
//! This library is the client core for an audio wayfinding app: it
//! caches map features by tile, works out what is worth announcing
//! around the listener, and renders those announcements as spatialized
//! sound and speech relative to where they are standing and facing.
//!
//! # Wiring
//!
//! Hosts supply the platform pieces (a location feed, an
//! [`audio::AudioBackend`], optionally a [`beacon::BeaconAudioBackend`])
//! and wire the rest together:
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use earshot::announce::Announcer;
//! use earshot::audio::AudioQueue;
//! use earshot::config::WayfindConfig;
//! use earshot::loader::{HttpTileClient, TileLoader};
//! use earshot::location::SharedLocation;
//! use earshot::resolver::NearbyResolver;
//! use earshot::store::{FeatureStore, MemoryFeatureStore};
//!
//! let config = WayfindConfig::default();
//! let store: Arc<dyn FeatureStore> = Arc::new(MemoryFeatureStore::new());
//! let loader = Arc::new(TileLoader::new(
//!     HttpTileClient::new()?,
//!     Arc::clone(&store),
//!     config.tile_max_age,
//! ));
//! let resolver = Arc::new(NearbyResolver::new(loader, Arc::clone(&store), &config));
//!
//! let location = SharedLocation::new();
//! let queue = AudioQueue::new(platform_audio, location.clone());
//! let announcer = Announcer::new(resolver, queue.clone(), location.clone(), &config);
//!
//! // Feed GPS fixes in as they arrive.
//! location.set_location(38.8976, -77.006156);
//!
//! // "What's around me?"
//! announcer.callout_all_features_or_none_found(38.8976, -77.006156).await?;
//!
//! // Or announce new places automatically as the listener walks.
//! announcer.start_watching();
//! ```

pub mod announce;
pub mod audio;
pub mod beacon;
pub mod config;
pub mod feature;
pub mod geo;
pub mod loader;
pub mod location;
pub mod logging;
pub mod resolver;
pub mod store;
pub mod tile;

/// Version of the earshot library.
///
/// Defined in `Cargo.toml` and injected at compile time; the HTTP tile
/// client reports it in its user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
