//! Error types for tile loading.

use thiserror::Error;

use crate::store::StoreError;

/// Errors produced while fetching and caching a tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The tile request failed in transit or came back non-2xx.
    #[error("tile request failed: {0}")]
    Http(String),

    /// The tile body was not valid JSON.
    #[error("tile payload malformed: {0}")]
    Parse(String),

    /// The feature store rejected a read or write.
    #[error(transparent)]
    Store(#[from] StoreError),
}
