//! HTTP transport for tile requests.

use std::future::Future;
use std::time::Duration;

use tracing::{trace, warn};

use crate::loader::LoadError;

/// User agent for outbound tile requests.
pub const DEFAULT_USER_AGENT: &str = concat!("earshot/", env!("CARGO_PKG_VERSION"));

/// Request timeout applied to every tile fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport abstraction for fetching tile bodies.
///
/// The loader owns everything above the wire: parsing, caching, and
/// retry bookkeeping. Implementations only move bytes.
pub trait TileClient: Send + Sync + 'static {
    /// Fetches the raw body of a tile URL.
    fn fetch_tile(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send;
}

/// A [`TileClient`] backed by a shared reqwest client.
///
/// Connection pooling is left on so a burst of tile fetches around a
/// moving listener reuses sockets to the tile server.
#[derive(Debug, Clone)]
pub struct HttpTileClient {
    client: reqwest::Client,
}

impl HttpTileClient {
    /// Creates a client with the default timeout and user agent.
    pub fn new() -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .map_err(|error| LoadError::Http(error.to_string()))?;

        Ok(Self { client })
    }
}

impl TileClient for HttpTileClient {
    fn fetch_tile(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send {
        async move {
            trace!(url = %url, "fetching tile");

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.bytes().await {
                            Ok(bytes) => {
                                trace!(url = %url, bytes = bytes.len(), "tile fetched");
                                Ok(bytes.to_vec())
                            }
                            Err(error) => {
                                warn!(url = %url, %error, "failed reading tile body");
                                Err(LoadError::Http(error.to_string()))
                            }
                        }
                    } else {
                        warn!(url = %url, %status, "tile server returned error status");
                        Err(LoadError::Http(format!("HTTP {}", status)))
                    }
                }
                Err(error) => {
                    warn!(url = %url, %error, "tile request failed");
                    Err(LoadError::Http(error.to_string()))
                }
            }
        }
    }
}
