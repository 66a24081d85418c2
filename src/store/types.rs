//! Error types for the feature store.

use thiserror::Error;

/// Errors a feature store operation can produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A store lock was poisoned by a panicking writer.
    #[error("feature store lock poisoned")]
    Lock,

    /// The backing storage could not be reached.
    #[error("feature store unavailable: {0}")]
    Unavailable(String),
}
