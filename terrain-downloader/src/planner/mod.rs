//! Per-level tile plan for a geographic selection.
//!
//! The planner turns a selection rectangle, a zoom range and (optionally)
//! the service's availability table into the exact list of tile ranges to
//! fetch. The same function drives both storage estimation and the real
//! download, so the two always agree.
//!
//! # Algorithm
//!
//! ```text
//! for level in min_zoom..=max_zoom
//!     corners  = level < 4 ? whole globe : selection
//!     range    = min/max of project(level, corners)
//!     range    = expand by 1 on every side, clamp to the grid
//!     ranges   = availability ? clip(range) : [range]
//! ```

mod bounds;

pub use bounds::{AvailabilityTable, TileBoundsRange};

use crate::coord::{GeographicRectangle, GeographicTilingScheme, MAX_LEVEL};

/// Default lowest level when the service does not say otherwise.
pub const DEFAULT_MIN_ZOOM: u32 = 0;

/// Default highest level when the service does not say otherwise.
pub const DEFAULT_MAX_ZOOM: u32 = 15;

/// Levels below this are always fetched for the whole globe.
pub const FULL_GLOBE_BELOW_LEVEL: u32 = 4;

/// Smallest expected average tile size, used for storage estimates.
pub const MIN_TILE_FILE_SIZE: u64 = 20 * 1024;

/// Largest expected average tile size, used for storage estimates.
pub const MAX_TILE_FILE_SIZE: u64 = 90 * 1024;

/// Inclusive range of zoom levels to plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    pub min: u32,
    pub max: u32,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_ZOOM,
            max: DEFAULT_MAX_ZOOM,
        }
    }
}

impl ZoomRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Lowers the upper bound to `cap` when given.
    pub fn capped(self, cap: Option<u32>) -> Self {
        match cap {
            Some(cap) => Self {
                min: self.min,
                max: self.max.min(cap),
            },
            None => self,
        }
    }
}

/// Tile ranges to fetch at one level.
///
/// A level may end up with no ranges when none of the service's
/// availability rectangles overlap the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelPlan {
    pub level: u32,
    pub ranges: Vec<TileBoundsRange>,
}

impl LevelPlan {
    /// Tiles covered by every range of this level.
    pub fn tile_count(&self) -> u64 {
        self.ranges.iter().map(TileBoundsRange::tile_count).sum()
    }
}

/// Sum of tiles across a whole plan.
pub fn total_tiles(plan: &[LevelPlan]) -> u64 {
    plan.iter().map(LevelPlan::tile_count).sum()
}

/// Expected on-disk size of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageEstimate {
    pub tiles: u64,
    pub min_bytes: u64,
    pub max_bytes: u64,
}

/// Applies the per-tile size heuristics to a plan.
pub fn estimate_storage(plan: &[LevelPlan]) -> StorageEstimate {
    let tiles = total_tiles(plan);
    StorageEstimate {
        tiles,
        min_bytes: tiles * MIN_TILE_FILE_SIZE,
        max_bytes: tiles * MAX_TILE_FILE_SIZE,
    }
}

/// Computes tile plans on a fixed tiling scheme.
#[derive(Debug, Clone, Default)]
pub struct BoundsPlanner {
    scheme: GeographicTilingScheme,
}

impl BoundsPlanner {
    pub fn new(scheme: GeographicTilingScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &GeographicTilingScheme {
        &self.scheme
    }

    /// Plans every level in `zoom` for `selection`.
    ///
    /// Levels deeper than [`MAX_LEVEL`] are never planned. With an
    /// availability table, levels at or past the table's level count are
    /// dropped and each level's range is clipped against the declared ranges.
    ///
    /// Table entry `i` is matched to level `i`, not to the `i`-th planned
    /// level; the two only differ when `zoom.min` is above zero.
    pub fn plan(
        &self,
        selection: &GeographicRectangle,
        zoom: ZoomRange,
        availability: Option<&AvailabilityTable>,
    ) -> Vec<LevelPlan> {
        let mut plan: Vec<LevelPlan> = (zoom.min..=zoom.max.min(MAX_LEVEL))
            .filter_map(|level| {
                self.level_range(selection, level).map(|range| LevelPlan {
                    level,
                    ranges: vec![range],
                })
            })
            .collect();

        if let Some(table) = availability {
            let declared = table.level_count() as u32;
            plan.retain(|lp| lp.level < declared);
            for lp in &mut plan {
                lp.ranges = lp
                    .ranges
                    .iter()
                    .flat_map(|range| table.clip(lp.level, range))
                    .collect();
            }
        }

        plan
    }

    /// The expanded and clamped range for `selection` at a single level.
    pub fn level_range(
        &self,
        selection: &GeographicRectangle,
        level: u32,
    ) -> Option<TileBoundsRange> {
        let corners = if level < FULL_GLOBE_BELOW_LEVEL {
            GeographicRectangle::GLOBAL
        } else {
            *selection
        };

        let (x1, y1) = self.scheme.project(level, corners.south_west());
        let (x2, y2) = self.scheme.project(level, corners.north_east());

        let max_x = i64::from(self.scheme.tile_count_x(level)) - 1;
        let max_y = i64::from(self.scheme.tile_count_y(level)) - 1;

        // Grow by one tile so tiles straddling the selection edge are included.
        let clamp = |v: i64, hi: i64| v.clamp(0, hi) as u32;
        TileBoundsRange::new(
            clamp(x1.min(x2) - 1, max_x),
            clamp(y1.min(y2) - 1, max_y),
            clamp(x1.max(x2) + 1, max_x),
            clamp(y1.max(y2) + 1, max_y),
        )
    }
}
