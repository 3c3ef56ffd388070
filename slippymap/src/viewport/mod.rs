//! Viewport and player state consumed by the render loop.
//!
//! The core reads these as inputs to the coordinate math and the per-frame
//! screen-offset calculation; the windowing shell owns the actual mouse and
//! keyboard handling. Pan deltas arrive in screen pixels and are rotated
//! through the current viewing angle before being applied in degrees, so
//! dragging "up" moves the map away from the camera regardless of rotation.

use crate::coord::{
    self, lat_extent_per_tile, lon_extent_per_tile, MAX_ZOOM, MIN_ZOOM,
};

/// Maximum camera tilt, in degrees.
pub const MAX_TILT: f64 = 65.0;

/// Southern pan limit, in degrees latitude.
pub const MIN_PAN_LAT: f64 = -66.0;

/// Northern pan limit, in degrees latitude.
pub const MAX_PAN_LAT: f64 = 80.0;

/// On-screen edge length of one rendered tile, in pixels.
pub const DEFAULT_TILE_PX: u32 = 256;

/// Geographic position the view is centered on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    /// Degrees, clamped to `[MIN_PAN_LAT, MAX_PAN_LAT]`.
    pub latitude: f64,
    /// Degrees, free-running; wraps implicitly through the projection.
    pub longitude: f64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            latitude: 50.356718,
            longitude: 7.599485,
        }
    }
}

impl PlayerState {
    /// Applies a mouse-drag pan of `(dx_px, dy_px)` screen pixels.
    ///
    /// The delta is rotated through `rotation_deg` (the map's current
    /// z-rotation) and scaled by the angular size of one tile at this zoom
    /// and latitude, divided over `tile_px` rendered pixels per tile.
    pub fn pan(&mut self, dx_px: f64, dy_px: f64, rotation_deg: f64, zoom: u8, tile_px: u32) {
        let rad = rotation_deg.to_radians();
        let (sin, cos) = rad.sin_cos();

        let lat_per_px = lat_extent_per_tile(self.latitude, zoom) / tile_px as f64;
        let lon_per_px = lon_extent_per_tile(zoom) / tile_px as f64;

        self.latitude += lat_per_px * (dy_px * cos + dx_px * sin);
        self.longitude -= lon_per_px * (dx_px * cos - dy_px * sin);
        self.latitude = self.latitude.clamp(MIN_PAN_LAT, MAX_PAN_LAT);
    }
}

/// Camera angles owned by the input collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportState {
    /// Rotation around the vertical axis, degrees, unbounded.
    pub rotation: f64,
    tilt: f64,
}

impl ViewportState {
    /// Current tilt in degrees, within `[0, MAX_TILT]`.
    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    /// Sets the tilt, clamped to `[0, MAX_TILT]`.
    pub fn set_tilt(&mut self, tilt: f64) {
        self.tilt = tilt.clamp(0.0, MAX_TILT);
    }
}

/// Clamps an arbitrary zoom request to the supported range.
pub fn clamp_zoom(zoom: i32) -> u8 {
    zoom.clamp(MIN_ZOOM as i32, MAX_ZOOM as i32) as u8
}

/// Sub-tile pixel offset of the player within the center tile.
///
/// Returns `(dx_px, dy_px)` with the sign convention the renderer's
/// translation expects: `dx` measures from the player eastward to the tile's
/// western edge, `dy` from the tile's northern edge southward to the player.
pub fn screen_offset(player: &PlayerState, zoom: u8, tile_px: u32) -> (f64, f64) {
    let x = coord::lon_to_tile_x(player.longitude, zoom);
    let y = coord::lat_to_tile_y(player.latitude, zoom);
    let tile_lon = coord::tile_x_to_lon(x, zoom);
    let tile_lat = coord::tile_y_to_lat(y, zoom);

    let dx = (tile_lon - player.longitude) * tile_px as f64 / lon_extent_per_tile(zoom);
    let dy = (player.latitude - tile_lat) * tile_px as f64
        / lat_extent_per_tile(player.latitude, zoom);
    (dx, dy)
}
