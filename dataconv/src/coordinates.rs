//! Coordinate-map materialization
//!
//! Turns an unordered 1-indexed coordinate map into a [`MatrixBlock`].
//! Sparse targets are filled with unsorted per-row appends and finalized by a
//! single sort pass per row.

use dataconv_core::{eval_sparse_format, CoordinateSource, MatrixBlock};
use tracing::debug;

use crate::error::{ConvertError, Result};

/// Materialize a coordinate map into a `rows x cols` matrix
///
/// Entries with a zero value, a row or column of 0, or a position beyond the
/// declared dimensions are skipped without error.
pub fn materialize<S>(source: &S, rows: usize, cols: usize) -> Result<MatrixBlock>
where
    S: CoordinateSource + ?Sized,
{
    let estimated_nnz = source.entry_count();
    let sparse = eval_sparse_format(rows, cols, estimated_nnz);
    debug!(rows, cols, estimated_nnz, sparse, "materializing coordinate map");

    let mut matrix = MatrixBlock::with_capacity(rows, cols, sparse, estimated_nnz);
    let mut skipped = 0usize;

    for (ix, value) in source.entries() {
        let in_bounds = (1..=rows).contains(&ix.row) && (1..=cols).contains(&ix.col);
        if value == 0.0 || !in_bounds {
            skipped += 1;
            continue;
        }
        matrix
            .append_value(ix.row - 1, ix.col - 1, value)
            .map_err(ConvertError::container("coordinate map to matrix"))?;
    }

    if sparse {
        matrix.sort_sparse_rows();
    }
    if skipped > 0 {
        debug!(skipped, "dropped zero or out-of-bounds coordinate entries");
    }

    Ok(matrix)
}

/// Materialize a coordinate map, taking the dimensions from the largest row
/// and column it contains
pub fn materialize_inferred<S>(source: &S) -> Result<MatrixBlock>
where
    S: CoordinateSource + ?Sized,
{
    let (rows, cols) = source.max_extent();
    materialize(source, rows, cols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataconv_core::{CellIndex, CellMap, CrossTabMap, StorageMode};

    fn cell_map(entries: &[(usize, usize, f64)]) -> CellMap {
        entries
            .iter()
            .map(|&(r, c, v)| (CellIndex::new(r, c), v))
            .collect()
    }

    #[test]
    fn test_materialize_sparse_sorted() {
        let map = cell_map(&[(1, 90, 3.0), (1, 2, 1.0), (1, 50, 2.0), (70, 1, 4.0)]);
        let m = materialize(&map, 100, 100).unwrap();

        assert_eq!(m.storage_mode(), StorageMode::Sparse);
        assert_eq!(m.nnz(), 4);
        let row = m.sparse_row(0).unwrap();
        assert!(row.is_sorted());
        assert_eq!(row.indexes(), &[1, 49, 89]);
        assert_eq!(m.get(69, 0), 4.0);
    }

    #[test]
    fn test_materialize_dense() {
        let mut map = CellMap::new();
        for r in 1..=3 {
            for c in 1..=3 {
                map.insert(CellIndex::new(r, c), (r * 10 + c) as f64);
            }
        }
        let m = materialize(&map, 3, 3).unwrap();
        assert_eq!(m.storage_mode(), StorageMode::Dense);
        assert_eq!(m.nnz(), 9);
        assert_eq!(m.get(2, 1), 32.0);
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let map = cell_map(&[
            (1, 1, 1.0),
            (3, 1, 5.0),
            (1, 3, 5.0),
            (2, 2, 0.0),
            (0, 1, 9.0),
            (1, 0, 9.0),
        ]);
        let m = materialize(&map, 2, 2).unwrap();
        assert_eq!(m.nnz(), 1);
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(1, 1), 0.0);
    }

    #[test]
    fn test_materialize_inferred() {
        let mut tab = CrossTabMap::new();
        tab.aggregate(2, 3, 1.0);
        tab.aggregate(2, 3, 1.5);
        tab.aggregate(4, 1, 1.0);

        let m = materialize_inferred(&tab).unwrap();
        assert_eq!(m.dimensions(), (4, 3));
        assert_eq!(m.get(1, 2), 2.5);
        assert_eq!(m.nnz(), 2);
    }

    #[test]
    fn test_materialize_empty_map() {
        let map = CellMap::new();
        let m = materialize_inferred(&map).unwrap();
        assert_eq!(m.dimensions(), (0, 0));
        assert!(m.is_empty());
    }
}
