//! Slippy-map raster tile addressing.

use std::f64::consts::PI;

use bloodbuddy_core::Coordinate;

/// Web Mercator cannot represent the poles; latitudes are clamped to this.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileIndex {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

/// Tile containing `coordinate` at `zoom`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn tile_for(coordinate: Coordinate, zoom: u8) -> TileIndex {
    let n = f64::from(1u32 << zoom.min(31));
    let lat = coordinate
        .latitude
        .clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
        .to_radians();
    let x = (coordinate.longitude + 180.0) / 360.0 * n;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n;

    let max = n - 1.0;
    TileIndex {
        zoom,
        x: x.floor().clamp(0.0, max) as u32,
        y: y.floor().clamp(0.0, max) as u32,
    }
}

/// Fills a `{z}/{x}/{y}` template. `{s}` (subdomain) becomes `a`.
#[must_use]
pub fn tile_url(template: &str, tile: TileIndex) -> String {
    template
        .replace("{s}", "a")
        .replace("{z}", &tile.zoom.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
}
