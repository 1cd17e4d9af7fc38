//! Geographic tiling scheme
//!
//! Maps geographic coordinates (longitude/latitude in degrees) onto the
//! equirectangular tile grid used by quantized-mesh terrain services.
//! Level 0 is two tiles wide and one tile tall; every level doubles both axes.

mod types;

pub use types::{
    CoordError, GeographicRectangle, TileIndex, MAX_LAT, MAX_LEVEL, MAX_LON, MIN_LAT, MIN_LON,
};

/// Fixed geographic tiling scheme.
///
/// Holds only the reference rectangle and the shape of the level-0 grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeographicTilingScheme {
    rectangle: GeographicRectangle,
    level_zero_tiles_x: u32,
    level_zero_tiles_y: u32,
}

impl Default for GeographicTilingScheme {
    fn default() -> Self {
        Self {
            rectangle: GeographicRectangle::GLOBAL,
            level_zero_tiles_x: 2,
            level_zero_tiles_y: 1,
        }
    }
}

impl GeographicTilingScheme {
    /// Creates the standard global scheme (2×1 tiles at level 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference rectangle covered by the grid.
    pub fn rectangle(&self) -> &GeographicRectangle {
        &self.rectangle
    }

    /// Number of tile columns at `level`.
    #[inline]
    pub fn tile_count_x(&self, level: u32) -> u32 {
        self.level_zero_tiles_x << level
    }

    /// Number of tile rows at `level`.
    #[inline]
    pub fn tile_count_y(&self, level: u32) -> u32 {
        self.level_zero_tiles_y << level
    }

    /// Projects a `(longitude, latitude)` position onto tile indices at `level`.
    ///
    /// The returned row is `tile_count_y - raw_row`, counted from the bottom of
    /// the grid. Positions on the southern boundary therefore map to row 1 and
    /// positions on the northern boundary map to `tile_count_y`, one past the
    /// last valid row. Callers are expected to clamp into range afterwards.
    ///
    /// Indices are truncated toward zero; values west of the reference
    /// rectangle are not clamped and may be negative.
    pub fn project(&self, level: u32, position: (f64, f64)) -> (i64, i64) {
        let rectangle = &self.rectangle;

        let x_tiles = i64::from(self.tile_count_x(level));
        let y_tiles = i64::from(self.tile_count_y(level));

        let tile_width = rectangle.width() / x_tiles as f64;
        let tile_height = rectangle.height() / y_tiles as f64;

        let (mut longitude, latitude) = position;
        if rectangle.east < rectangle.west {
            longitude += 360.0;
        }

        let mut x = ((longitude - rectangle.west) / tile_width) as i64;
        if x >= x_tiles {
            x = x_tiles - 1;
        }

        let mut y = ((rectangle.north - latitude) / tile_height) as i64;
        if y >= y_tiles {
            y = y_tiles - 1;
        }

        (x, y_tiles - y)
    }
}
