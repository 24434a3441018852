//! Storage-mode selection for matrix blocks
//!
//! Every place that picks between dense and sparse storage goes through
//! [`eval_sparse_format`], so materialized coordinate maps, converted
//! arrays and frames, and blocks read from storage all agree.

/// Sparsity below which sparse storage is considered
pub const SPARSITY_TURN_POINT: f64 = 0.1;

/// Matrices with at most this many columns always stay dense
pub const SKINNY_MATRIX_TURN_POINT: usize = 4;

/// Estimated bytes per row of sparse storage (index and value vectors)
pub const SPARSE_ROW_OVERHEAD: u64 = 48;

/// Estimated bytes per stored non-zero (column index plus value)
pub const SPARSE_CELL_SIZE: u64 = 16;

/// Bytes per dense cell
pub const DENSE_CELL_SIZE: u64 = 8;

/// Fraction of non-zero cells, 0 for empty dimensions
pub fn sparsity(rows: usize, cols: usize, nnz: usize) -> f64 {
    if rows == 0 || cols == 0 {
        return 0.0;
    }
    (nnz as f64 / rows as f64) / cols as f64
}

/// Estimated in-memory size of a dense block
pub fn estimate_dense_size(rows: usize, cols: usize) -> u64 {
    (rows as u64)
        .saturating_mul(cols as u64)
        .saturating_mul(DENSE_CELL_SIZE)
}

/// Estimated in-memory size of a sparse block
pub fn estimate_sparse_size(rows: usize, nnz: usize) -> u64 {
    (rows as u64)
        .saturating_mul(SPARSE_ROW_OVERHEAD)
        .saturating_add((nnz as u64).saturating_mul(SPARSE_CELL_SIZE))
}

/// Decide whether a `rows x cols` block holding `nnz` non-zeros should be sparse
///
/// Sparse iff the block is below [`SPARSITY_TURN_POINT`], wider than
/// [`SKINNY_MATRIX_TURN_POINT`] and the sparse estimate is smaller than the
/// dense one. Empty dimensions are always dense.
pub fn eval_sparse_format(rows: usize, cols: usize, nnz: usize) -> bool {
    if rows == 0 || cols == 0 {
        return false;
    }

    let sp = sparsity(rows, cols, nnz);
    sp < SPARSITY_TURN_POINT
        && cols > SKINNY_MATRIX_TURN_POINT
        && estimate_sparse_size(rows, nnz) < estimate_dense_size(rows, cols)
}
