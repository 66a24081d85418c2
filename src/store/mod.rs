//! Persistent storage for cached map features.
//!
//! The store keeps every feature from every tile the loader has pulled,
//! indexed three ways: by tile key for cache refresh, by OSM id for
//! road name lookups, and by fetch URL for staleness checks. The
//! in-memory implementation is the default; the [`FeatureStore`] trait
//! is the seam a durable backend slots into.

mod memory;
mod r#trait;
mod types;

pub use memory::MemoryFeatureStore;
pub use r#trait::FeatureStore;
pub use types::StoreError;
