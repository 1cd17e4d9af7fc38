//! Tile index rectangles and the service availability table.

use crate::coord::TileIndex;

/// Inclusive rectangle of tile indices at one level.
///
/// Always non-empty: `min_x <= max_x` and `min_y <= max_y`. Constructors
/// return `None` instead of producing an empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileBoundsRange {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl TileBoundsRange {
    /// Creates a range, or `None` if it would be empty.
    pub fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Option<Self> {
        if min_x <= max_x && min_y <= max_y {
            Some(Self {
                min_x,
                min_y,
                max_x,
                max_y,
            })
        } else {
            None
        }
    }

    /// Number of columns covered.
    pub fn width(&self) -> u64 {
        u64::from(self.max_x - self.min_x) + 1
    }

    /// Number of rows covered.
    pub fn height(&self) -> u64 {
        u64::from(self.max_y - self.min_y) + 1
    }

    /// Number of tiles covered.
    pub fn tile_count(&self) -> u64 {
        self.width() * self.height()
    }

    /// Overlap with another range: per-axis max of mins and min of maxes.
    pub fn intersect(&self, other: &TileBoundsRange) -> Option<TileBoundsRange> {
        Self::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        )
    }

    /// Whether the range contains the given column and row.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Iterates every tile of the range at `level` in row-major order.
    pub fn tiles(&self, level: u32) -> impl Iterator<Item = TileIndex> {
        let (min_x, max_x) = (self.min_x, self.max_x);
        (self.min_y..=self.max_y)
            .flat_map(move |y| (min_x..=max_x).map(move |x| TileIndex::new(level, x, y)))
    }
}

/// Per-level tile ranges that the remote service declares as available.
///
/// Entry `i` holds the ranges for level `i`. Levels past the end of the
/// table are treated as unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityTable {
    levels: Vec<Vec<TileBoundsRange>>,
}

impl AvailabilityTable {
    pub fn new(levels: Vec<Vec<TileBoundsRange>>) -> Self {
        Self { levels }
    }

    /// Number of levels the service declares.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Declared ranges at `level`, empty if the level is not declared.
    pub fn ranges(&self, level: u32) -> &[TileBoundsRange] {
        self.levels
            .get(level as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Clips `range` against every declared range at `level`.
    ///
    /// Returns one result per overlapping availability rectangle, in table
    /// order. Disjoint rectangles contribute nothing.
    pub fn clip(&self, level: u32, range: &TileBoundsRange) -> Vec<TileBoundsRange> {
        self.ranges(level)
            .iter()
            .filter_map(|available| available.intersect(range))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> TileBoundsRange {
        TileBoundsRange::new(min_x, min_y, max_x, max_y).unwrap()
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(TileBoundsRange::new(2, 0, 1, 0).is_none());
        assert!(TileBoundsRange::new(0, 3, 0, 2).is_none());
        assert!(TileBoundsRange::new(1, 1, 1, 1).is_some());
    }

    #[test]
    fn test_tile_count_is_inclusive() {
        assert_eq!(range(0, 0, 1, 0).tile_count(), 2);
        assert_eq!(range(0, 0, 3, 1).tile_count(), 8);
        assert_eq!(range(5, 5, 5, 5).tile_count(), 1);
    }

    #[test]
    fn test_intersect_overlapping() {
        let a = range(0, 0, 10, 10);
        let b = range(5, 3, 20, 8);
        assert_eq!(a.intersect(&b), Some(range(5, 3, 10, 8)));
        assert_eq!(b.intersect(&a), a.intersect(&b));
    }

    #[test]
    fn test_intersect_disjoint() {
        let a = range(0, 0, 3, 3);
        let b = range(4, 0, 8, 3);
        assert_eq!(a.intersect(&b), None);
        assert_eq!(b.intersect(&a), None);
    }

    #[test]
    fn test_intersect_touching_edge() {
        let a = range(0, 0, 4, 4);
        let b = range(4, 4, 9, 9);
        assert_eq!(a.intersect(&b), Some(range(4, 4, 4, 4)));
    }

    #[test]
    fn test_tiles_row_major() {
        let tiles: Vec<(u32, u32)> = range(1, 5, 2, 6).tiles(3).map(|t| (t.x, t.y)).collect();
        assert_eq!(tiles, vec![(1, 5), (2, 5), (1, 6), (2, 6)]);
    }

    #[test]
    fn test_tiles_count_matches() {
        let r = range(3, 2, 9, 4);
        assert_eq!(r.tiles(7).count() as u64, r.tile_count());
        assert!(r.tiles(7).all(|t| t.level == 7 && r.contains(t.x, t.y)));
    }

    #[test]
    fn test_clip_splits_into_several_ranges() {
        let table = AvailabilityTable::new(vec![
            vec![range(0, 0, 1, 0)],
            vec![range(0, 0, 1, 1), range(2, 0, 3, 1), range(10, 10, 12, 12)],
        ]);
        let clipped = table.clip(1, &range(1, 0, 2, 1));
        assert_eq!(clipped, vec![range(1, 0, 1, 1), range(2, 0, 2, 1)]);
    }

    #[test]
    fn test_clip_undeclared_level_is_empty() {
        let table = AvailabilityTable::new(vec![vec![range(0, 0, 1, 0)]]);
        assert!(table.clip(4, &range(0, 0, 1, 0)).is_empty());
        assert_eq!(table.level_count(), 1);
    }
}
