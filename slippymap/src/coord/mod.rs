//! Web Mercator coordinate conversion.
//!
//! Pure functions converting between geographic coordinates
//! (latitude/longitude) and slippy-map tile coordinates, plus the angular
//! footprint of a tile used for screen-space offset math.
//!
//! The raw conversion functions are unchecked: behavior outside the Mercator
//! band (±85.05°) is undefined and callers clamp first, as the viewport state
//! does. Use [`to_tile_id`] for a validated entry point.

mod types;

pub use types::{CoordError, TileId, MAX_MERCATOR_LAT, MAX_ZOOM, MIN_ZOOM};

use std::f64::consts::PI;

/// Converts a longitude to its tile column at the given zoom.
///
/// Standard OSM slippy formula: `floor((lon + 180) / 360 * 2^zoom)`.
#[inline]
pub fn lon_to_tile_x(lon: f64, zoom: u8) -> i32 {
    let n = 2.0_f64.powi(zoom as i32);
    ((lon + 180.0) / 360.0 * n).floor() as i32
}

/// Converts a latitude to its tile row at the given zoom.
///
/// Web Mercator forward projection:
/// `floor((1 - asinh(tan(lat)) / π) / 2 * 2^zoom)`.
#[inline]
pub fn lat_to_tile_y(lat: f64, zoom: u8) -> i32 {
    let n = 2.0_f64.powi(zoom as i32);
    let lat_rad = lat * PI / 180.0;
    ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor() as i32
}

/// Longitude of the western edge of tile column `x` at the given zoom.
#[inline]
pub fn tile_x_to_lon(x: i32, zoom: u8) -> f64 {
    let n = 2.0_f64.powi(zoom as i32);
    x as f64 / n * 360.0 - 180.0
}

/// Latitude of the northern edge of tile row `y` at the given zoom.
///
/// Inverse Mercator: `n = π - 2π·y/2^zoom; lat = atan(sinh(n))`.
#[inline]
pub fn tile_y_to_lat(y: i32, zoom: u8) -> f64 {
    let n = PI - 2.0 * PI * y as f64 / 2.0_f64.powi(zoom as i32);
    n.sinh().atan() * 180.0 / PI
}

/// Angular width of one tile, in degrees of longitude.
///
/// Mercator columns are uniform, so this depends on zoom only.
#[inline]
pub fn lon_extent_per_tile(zoom: u8) -> f64 {
    360.0 / 2.0_f64.powi(zoom as i32)
}

/// Angular height of the tile containing `lat`, in degrees of latitude.
///
/// Mercator is not equal-area, so the extent shrinks toward the poles;
/// the renderer uses this to convert a sub-tile geographic offset into a
/// screen-pixel offset at the current latitude band.
#[inline]
pub fn lat_extent_per_tile(lat: f64, zoom: u8) -> f64 {
    let y = lat_to_tile_y(lat, zoom);
    tile_y_to_lat(y, zoom) - tile_y_to_lat(y + 1, zoom)
}

/// Validated conversion from geographic coordinates to a tile id.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees, within ±85.05112878
/// * `lon` - Longitude in degrees, within [-180, 180]
/// * `zoom` - Zoom level within the supported range
pub fn to_tile_id(lat: f64, lon: f64, zoom: u8) -> Result<TileId, CoordError> {
    if !(-MAX_MERCATOR_LAT..=MAX_MERCATOR_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
        return Err(CoordError::InvalidZoom(zoom));
    }
    Ok(TileId::new(
        zoom,
        lon_to_tile_x(lon, zoom),
        lat_to_tile_y(lat, zoom),
    ))
}
