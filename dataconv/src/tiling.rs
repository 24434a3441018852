//! Cache-blocked copy between column-major and row-major layouts
//!
//! Both directions walk the grid in square tiles of `tile` cells per edge so
//! the source and destination working sets stay small.

/// Default tile edge for the blocked copy
pub const DEFAULT_TILE_SIZE: usize = 16;

/// Copy columns into a row-major buffer of `rows x columns.len()`
///
/// # Panics
///
/// Panics if a column is shorter than `rows` or `out` is shorter than
/// `rows * columns.len()`.
pub fn columns_to_row_major(columns: &[&[f64]], rows: usize, out: &mut [f64], tile: usize) {
    let cols = columns.len();
    let tile = tile.max(1);

    for bi in (0..rows).step_by(tile) {
        let bimax = (bi + tile).min(rows);
        for bj in (0..cols).step_by(tile) {
            let bjmax = (bj + tile).min(cols);
            for i in bi..bimax {
                let dst = &mut out[i * cols..i * cols + cols];
                for j in bj..bjmax {
                    dst[j] = columns[j][i];
                }
            }
        }
    }
}

/// Split a row-major `rows x cols` buffer into `cols` columns
///
/// # Panics
///
/// Panics if `data` is shorter than `rows * cols`.
pub fn row_major_to_columns(data: &[f64], rows: usize, cols: usize, tile: usize) -> Vec<Vec<f64>> {
    let tile = tile.max(1);
    let mut columns = vec![vec![0.0; rows]; cols];

    for bi in (0..rows).step_by(tile) {
        let bimax = (bi + tile).min(rows);
        for bj in (0..cols).step_by(tile) {
            let bjmax = (bj + tile).min(cols);
            for i in bi..bimax {
                let src = &data[i * cols..i * cols + cols];
                for j in bj..bjmax {
                    columns[j][i] = src[j];
                }
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_row_major(columns: &[Vec<f64>], rows: usize) -> Vec<f64> {
        let mut out = Vec::with_capacity(rows * columns.len());
        for i in 0..rows {
            for col in columns {
                out.push(col[i]);
            }
        }
        out
    }

    #[test]
    fn test_tiled_matches_naive_copy() {
        // Sizes not divisible by the tile edge exercise partial tiles
        let (rows, cols) = (37, 21);
        let columns: Vec<Vec<f64>> = (0..cols)
            .map(|j| (0..rows).map(|i| (i * 100 + j) as f64).collect())
            .collect();
        let refs: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();

        for tile in [1, 4, DEFAULT_TILE_SIZE, 64] {
            let mut out = vec![0.0; rows * cols];
            columns_to_row_major(&refs, rows, &mut out, tile);
            assert_eq!(out, naive_row_major(&columns, rows));
            assert_eq!(row_major_to_columns(&out, rows, cols, tile), columns);
        }
    }

    #[test]
    fn test_zero_tile_is_clamped() {
        let columns = [vec![1.0, 2.0], vec![3.0, 4.0]];
        let refs: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();
        let mut out = vec![0.0; 4];
        columns_to_row_major(&refs, 2, &mut out, 0);
        assert_eq!(out, vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_empty_grid() {
        let mut out: Vec<f64> = Vec::new();
        columns_to_row_major(&[], 5, &mut out, DEFAULT_TILE_SIZE);
        assert!(row_major_to_columns(&[], 0, 3, DEFAULT_TILE_SIZE)
            .iter()
            .all(Vec::is_empty));
    }
}
