//! Remote tile source abstraction.
//!
//! A [`TileSource`] turns a [`TileId`] into an HTTP GET against
//! `<base-url>/<zoom>/<x>/<y>.png` and returns the raw image bytes. The
//! HTTP transport sits behind the [`HttpClient`] trait so the pipeline can
//! be driven by a mock in tests.

mod http;

pub use http::{HttpClient, ReqwestClient};

#[cfg(test)]
pub use http::tests::MockHttpClient;

use std::sync::Arc;

use thiserror::Error;

use crate::coord::TileId;

/// Errors from the remote tile source.
///
/// Any of these counts as a fetch failure; the pipeline downgrades the tile
/// to its placeholder and never retries within the session.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Transport-level failure: network, DNS, timeout.
    #[error("HTTP transport error: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

/// A slippy-map tile server reachable over HTTP.
pub struct TileSource {
    client: Arc<dyn HttpClient>,
    base_url: String,
}

impl TileSource {
    /// Creates a source rooted at `base_url` (no trailing slash needed).
    pub fn new(client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// Full URL of a tile: `{base}/{zoom}/{x}/{y}.png`.
    pub fn tile_url(&self, id: TileId) -> String {
        format!("{}/{}", self.base_url, id.rel_path())
    }

    /// Downloads one tile, returning the raw PNG bytes.
    pub fn fetch_tile(&self, id: TileId) -> Result<Vec<u8>, ProviderError> {
        self.client.get(&self.tile_url(id))
    }
}
