//! Tile identity and coordinate error types.

use std::fmt;

use thiserror::Error;

/// Minimum zoom level the viewer supports.
pub const MIN_ZOOM: u8 = 1;

/// Maximum zoom level the viewer supports.
pub const MAX_ZOOM: u8 = 18;

/// Northern/southern limit of the Web Mercator projection, in degrees.
pub const MAX_MERCATOR_LAT: f64 = 85.05112878;

/// Errors for out-of-range geographic input.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside the Web Mercator valid band.
    #[error("latitude {0} outside Mercator range ±{MAX_MERCATOR_LAT}")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180].
    #[error("longitude {0} outside [-180, 180]")]
    InvalidLongitude(f64),

    /// Zoom level outside the supported range.
    #[error("zoom {0} outside supported range [{MIN_ZOOM}, {MAX_ZOOM}]")]
    InvalidZoom(u8),
}

/// Identity of one tile in the slippy-map quad-tree.
///
/// At zoom `z` the grid is `2^z × 2^z`; `x` grows eastward, `y` grows
/// southward. `TileId` is the cache key: the registry guarantees a single
/// `Tile` instance per distinct id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Zoom level.
    pub zoom: u8,
    /// Column, increasing eastward.
    pub x: i32,
    /// Row, increasing southward.
    pub y: i32,
}

impl TileId {
    /// Creates a tile id from its raw parts.
    pub fn new(zoom: u8, x: i32, y: i32) -> Self {
        Self { zoom, x, y }
    }

    /// The id offset by `(dx, dy)` at the same zoom level.
    ///
    /// Offsets outside `[0, 2^zoom)` on either axis are a caller error;
    /// the renderer stays within a bounded neighborhood of the center tile.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            zoom: self.zoom,
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Canonical `"{zoom}/{x}/{y}"` encoding, shared by the in-memory
    /// registry and the on-disk cache layout.
    pub fn cache_key(&self) -> String {
        format!("{}/{}/{}", self.zoom, self.x, self.y)
    }

    /// Relative file path of the tile image: `"{zoom}/{x}/{y}.png"`.
    ///
    /// Appended both to the local cache root and to the remote base URL.
    pub fn rel_path(&self) -> String {
        format!("{}/{}/{}.png", self.zoom, self.x, self.y)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}
