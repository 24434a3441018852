//! Coordinate accumulation maps
//!
//! Maps from 1-indexed `(row, col)` positions to values, filled by the
//! engine and read-only for conversions. [`CoordinateSource`] is the common
//! view used when materializing either map into a matrix block.

use alloc::boxed::Box;
use hashbrown::HashMap;

/// 1-indexed cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellIndex {
    pub row: usize,
    pub col: usize,
}

impl CellIndex {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Point-update map: each write replaces the previous value of its cell
pub type CellMap = HashMap<CellIndex, f64>;

/// Read-only view of an unordered coordinate map
pub trait CoordinateSource {
    /// Number of entries, an upper bound on the materialized non-zeros
    fn entry_count(&self) -> usize;

    /// Largest 1-indexed row and column present, (0, 0) when empty
    fn max_extent(&self) -> (usize, usize);

    /// Iterate entries in unspecified order
    fn entries(&self) -> Box<dyn Iterator<Item = (CellIndex, f64)> + '_>;
}

impl CoordinateSource for CellMap {
    fn entry_count(&self) -> usize {
        self.len()
    }

    fn max_extent(&self) -> (usize, usize) {
        self.keys().fold((0, 0), |(rows, cols), ix| {
            (rows.max(ix.row), cols.max(ix.col))
        })
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (CellIndex, f64)> + '_> {
        Box::new(self.iter().map(|(&ix, &v)| (ix, v)))
    }
}

/// Cross-tabulation map: weights accumulate per cell and the largest row
/// and column seen are tracked as entries arrive
#[derive(Debug, Clone, Default)]
pub struct CrossTabMap {
    cells: CellMap,
    max_row: usize,
    max_col: usize,
}

impl CrossTabMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to the cell at (`row`, `col`)
    pub fn aggregate(&mut self, row: usize, col: usize, weight: f64) {
        *self.cells.entry(CellIndex::new(row, col)).or_insert(0.0) += weight;
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
    }

    /// Current value of a cell, zero if never aggregated
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells
            .get(&CellIndex::new(row, col))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn max_row(&self) -> usize {
        self.max_row
    }

    pub fn max_col(&self) -> usize {
        self.max_col
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl CoordinateSource for CrossTabMap {
    fn entry_count(&self) -> usize {
        self.cells.len()
    }

    fn max_extent(&self) -> (usize, usize) {
        (self.max_row, self.max_col)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (CellIndex, f64)> + '_> {
        self.cells.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_map_extent() {
        let mut map = CellMap::new();
        assert_eq!(map.max_extent(), (0, 0));

        map.insert(CellIndex::new(3, 1), 1.0);
        map.insert(CellIndex::new(1, 5), 2.0);
        map.insert(CellIndex::new(3, 1), 4.0);
        assert_eq!(map.entry_count(), 2);
        assert_eq!(map.max_extent(), (3, 5));
        assert_eq!(map.entries().map(|(_, v)| v).sum::<f64>(), 6.0);
    }

    #[test]
    fn test_cross_tab_aggregate() {
        let mut map = CrossTabMap::new();
        map.aggregate(2, 3, 1.0);
        map.aggregate(2, 3, 2.5);
        map.aggregate(4, 1, 1.0);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(2, 3), 3.5);
        assert_eq!(map.get(1, 1), 0.0);
        assert_eq!(map.max_extent(), (4, 3));
    }
}
