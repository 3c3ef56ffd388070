//! slippymap - tile cache and loading core for a pseudo-3D map viewer
//!
//! This library provides the non-rendering half of a slippy-map viewer:
//! Web Mercator tile math, an identity-keyed tile registry, and a
//! fetch-then-decode pipeline that pulls missing tiles from a remote HTTP
//! source on background workers without blocking the render loop.
//!
//! # Architecture
//!
//! ```text
//! render loop ──► TileRegistry ──► Tile (id, handle, state)
//!                      │
//!                      ▼
//!                 TileLoader ──► WorkerPool ──► TileSource (HTTP)
//!                      │
//!                      ▼
//!                 TileSurface ──► TextureUploader (external)
//! ```
//!
//! Every frame the render loop asks the registry for the tile under the
//! player, walks its neighbors to draw the surrounding grid, and calls
//! [`pipeline::TileLoader::ensure_loaded`] for any tile still showing the
//! placeholder. Tiles that have not arrived yet simply render empty; no
//! frame ever blocks on the network.

pub mod coord;
pub mod pipeline;
pub mod pool;
pub mod provider;
pub mod registry;
pub mod texture;
pub mod tile;
pub mod viewport;

pub use coord::{CoordError, TileId, MAX_ZOOM, MIN_ZOOM};
pub use pipeline::{LoadError, LoaderConfig, TileLoader};
pub use pool::{WorkerPool, DEFAULT_WORKERS};
pub use provider::{HttpClient, ProviderError, ReqwestClient, TileSource};
pub use registry::TileRegistry;
pub use texture::{NullUploader, TextureHandle, TextureUploader, TileSurface};
pub use tile::{LoadState, Tile};
pub use viewport::{PlayerState, ViewportState};
