//! Asynchronous fetch-then-decode pipeline.
//!
//! Per tile the pipeline runs `Unloaded → Fetching → Decoding → Ready`,
//! with `Failed` absorbing any error:
//!
//! - **schedule** (render thread): claims the tile via CAS, probes the local
//!   cache. A non-empty file skips straight to `Decoding`; a zero-length
//!   leftover from an interrupted download is deleted and re-fetched; a
//!   missing file enqueues a [`DownloadTask`] on the worker pool.
//! - **fetch** (worker thread): HTTP GET from the remote source, streamed to
//!   a `.part` file and renamed into place, parent directories created
//!   lazily. Failure downgrades the tile to its placeholder.
//! - **decode** ([`TileLoader::ensure_loaded`], render thread): decodes the
//!   local bytes and uploads them through the [`TextureUploader`] seam.
//!
//! Failures never propagate to the render loop and never crash the process;
//! the visual symptom is a tile that stays empty for the session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::coord::TileId;
use crate::pool::{WorkerPool, DEFAULT_WORKERS};
use crate::provider::{HttpClient, ProviderError, TileSource};
use crate::texture::{DecodeError, TextureUploader, TileSurface};
use crate::tile::{LoadState, Tile};

/// Errors inside the fetch/decode pipeline.
///
/// All variants are recovered locally: logged, tile downgraded to the
/// placeholder. None reach the render loop.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Download failed: network, DNS, non-2xx.
    #[error("transport error: {0}")]
    Transport(#[from] ProviderError),

    /// Cannot create directories or write the tile file.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Bytes are present but not a valid, supported image.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Configuration for [`TileLoader`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Root of the on-disk tile cache; tiles live at `<root>/<z>/<x>/<y>.png`.
    pub cache_dir: PathBuf,
    /// Base URL of the remote tile source.
    pub remote_base_url: String,
    /// Number of background download workers.
    pub workers: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("slippymap")
                .join("tiles"),
            remote_base_url: "http://localhost/osm_tiles".to_string(),
            workers: DEFAULT_WORKERS,
        }
    }
}

/// One unit of work on the download queue.
///
/// Consumed exactly once by exactly one worker. The worker addresses the
/// tile through the shared `Arc`, so it never outlives or dangles behind
/// the registry.
pub struct DownloadTask {
    tile: Arc<Tile>,
    dest: PathBuf,
}

/// Worker-side fetch logic, shared between the pool handler and the loader.
struct TileFetcher {
    source: TileSource,
    cache_dir: PathBuf,
}

impl TileFetcher {
    fn cache_path(&self, id: TileId) -> PathBuf {
        self.cache_dir.join(id.rel_path())
    }

    fn fetch(&self, task: DownloadTask) {
        let id = task.tile.id();
        match self.download(id, &task.dest) {
            Ok(()) => {
                debug!(tile = %id, "tile downloaded");
                task.tile.set_state(LoadState::Decoding);
            }
            Err(err) => {
                warn!(tile = %id, error = %err, "tile fetch failed");
                task.tile.fail();
            }
        }
    }

    fn download(&self, id: TileId, dest: &Path) -> Result<(), LoadError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = self.source.fetch_tile(id)?;
        // Write through a temp name so an interrupted download never leaves
        // a plausible-looking partial file at the canonical path.
        let tmp = dest.with_extension("part");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, dest)?;
        Ok(())
    }
}

/// Drives tiles through fetch and decode.
///
/// Owns the worker pool; dropped after the registry at shutdown so in-flight
/// downloads drain before the process exits.
pub struct TileLoader {
    fetcher: Arc<TileFetcher>,
    pool: WorkerPool<DownloadTask>,
}

impl TileLoader {
    /// Creates a loader and starts its worker pool.
    pub fn new(config: LoaderConfig, client: Arc<dyn HttpClient>) -> Self {
        let fetcher = Arc::new(TileFetcher {
            source: TileSource::new(client, config.remote_base_url),
            cache_dir: config.cache_dir,
        });
        let worker_fetcher = fetcher.clone();
        let pool = WorkerPool::new(config.workers.max(1), move |task| {
            worker_fetcher.fetch(task)
        });
        Self { fetcher, pool }
    }

    /// Canonical on-disk location for a tile.
    pub fn cache_path(&self, id: TileId) -> PathBuf {
        self.fetcher.cache_path(id)
    }

    /// Schedules the initial load for a tile.
    ///
    /// Only the caller that wins the `Unloaded → Fetching` transition does
    /// any work, so racing schedulers enqueue at most one download per tile.
    pub fn schedule(&self, tile: &Arc<Tile>) {
        if !tile.transition(LoadState::Unloaded, LoadState::Fetching) {
            return;
        }
        let id = tile.id();
        let dest = self.fetcher.cache_path(id);
        match fs::metadata(&dest) {
            Ok(meta) if meta.len() > 0 => {
                debug!(tile = %id, "tile cached on disk");
                tile.set_state(LoadState::Decoding);
            }
            Ok(_) => {
                // Zero-length file from a previously interrupted download.
                if let Err(err) = fs::remove_file(&dest) {
                    warn!(tile = %id, error = %err, "cannot remove truncated tile file");
                    tile.fail();
                    return;
                }
                debug!(tile = %id, "re-fetching truncated tile");
                self.pool.submit(DownloadTask {
                    tile: tile.clone(),
                    dest,
                });
            }
            Err(_) => {
                self.pool.submit(DownloadTask {
                    tile: tile.clone(),
                    dest,
                });
            }
        }
    }

    /// Per-frame decode trigger, called from the render thread.
    ///
    /// O(1) when the tile is `Ready`, `Fetching` or `Failed`. When the tile
    /// reached `Decoding`, decodes the cached file on the calling thread and
    /// uploads it; decode failure downgrades to the placeholder.
    pub fn ensure_loaded(&self, tile: &Arc<Tile>, uploader: &mut dyn TextureUploader) {
        match tile.state() {
            LoadState::Ready | LoadState::Fetching | LoadState::Failed => {}
            LoadState::Unloaded => self.schedule(tile),
            LoadState::Decoding => {
                let path = self.fetcher.cache_path(tile.id());
                match TileSurface::from_path(&path) {
                    Ok(surface) => {
                        let handle = uploader.upload(&surface);
                        tile.set_texture(handle);
                        tile.set_state(LoadState::Ready);
                        debug!(tile = %tile.id(), ?handle, "tile ready");
                    }
                    Err(err) => {
                        warn!(tile = %tile.id(), error = %err, "tile decode failed");
                        tile.fail();
                    }
                }
            }
        }
    }

    /// Download tasks still waiting for a worker.
    pub fn pending_downloads(&self) -> usize {
        self.pool.queue_len()
    }

    /// Stops accepting work and waits out queued and in-flight downloads.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}
