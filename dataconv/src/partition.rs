//! Split a matrix into single-row or single-column blocks

use dataconv_core::density::sparsity;
use dataconv_core::MatrixBlock;
use tracing::debug;

use crate::error::{ConvertError, Result};

/// Direction of a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionAxis {
    /// One `1 x cols` block per row
    Rows,
    /// One `rows x 1` block per column
    Columns,
}

/// Split `matrix` into one block per row or per column
pub fn partition(matrix: &MatrixBlock, axis: PartitionAxis) -> Result<Vec<MatrixBlock>> {
    debug!(
        rows = matrix.rows(),
        cols = matrix.cols(),
        sparse = matrix.is_sparse(),
        ?axis,
        "partitioning matrix"
    );
    match axis {
        PartitionAxis::Columns => partition_columns(matrix),
        PartitionAxis::Rows => partition_rows(matrix),
    }
}

fn partition_columns(matrix: &MatrixBlock) -> Result<Vec<MatrixBlock>> {
    let (rows, cols) = matrix.dimensions();
    let mut out: Vec<MatrixBlock> = (0..cols).map(|_| MatrixBlock::new(rows, 1, false)).collect();

    // Dense iteration skips zeros as well, so both modes share one pass
    for (i, j, v) in matrix.iter_nonzeros() {
        out[j]
            .append_value(i, 0, v)
            .map_err(ConvertError::container("column partition"))?;
    }
    Ok(out)
}

fn partition_rows(matrix: &MatrixBlock) -> Result<Vec<MatrixBlock>> {
    let (rows, cols) = matrix.dimensions();
    let sparse = matrix.is_sparse();
    let estimated_nnz = (cols as f64 * sparsity(rows, cols, matrix.nnz())) as usize;

    (0..rows)
        .map(|i| {
            let mut block = MatrixBlock::with_capacity(1, cols, sparse, estimated_nnz);
            matrix
                .slice_into(i..i + 1, 0..cols, &mut block)
                .map_err(ConvertError::container("row partition"))?;
            Ok(block)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataconv_core::StorageMode;

    fn values(m: &MatrixBlock) -> Vec<f64> {
        let (rows, cols) = m.dimensions();
        (0..rows)
            .flat_map(|i| (0..cols).map(move |j| (i, j)))
            .map(|(i, j)| m.get(i, j))
            .collect()
    }

    fn matrix_3x2() -> MatrixBlock {
        MatrixBlock::from_dense(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn test_column_partition() {
        let parts = partition(&matrix_3x2(), PartitionAxis::Columns).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].dimensions(), (3, 1));
        assert_eq!(values(&parts[0]), vec![1.0, 3.0, 5.0]);
        assert_eq!(values(&parts[1]), vec![2.0, 4.0, 6.0]);
        assert_eq!(parts[1].storage_mode(), StorageMode::Dense);
    }

    #[test]
    fn test_row_partition() {
        let parts = partition(&matrix_3x2(), PartitionAxis::Rows).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].dimensions(), (1, 2));
        assert_eq!(values(&parts[0]), vec![1.0, 2.0]);
        assert_eq!(values(&parts[1]), vec![3.0, 4.0]);
        assert_eq!(values(&parts[2]), vec![5.0, 6.0]);
    }

    #[test]
    fn test_sparse_source() {
        let mut m = MatrixBlock::new(4, 10, true);
        m.append_value(0, 9, 1.0).unwrap();
        m.append_value(0, 3, 2.0).unwrap();
        m.append_value(3, 0, 3.0).unwrap();
        m.sort_sparse_rows();

        let rows = partition(&m, PartitionAxis::Rows).unwrap();
        assert!(rows.iter().all(MatrixBlock::is_sparse));
        assert_eq!(rows[0].nnz(), 2);
        assert_eq!(rows[0].get(0, 3), 2.0);
        assert!(rows[1].is_empty());
        assert_eq!(rows[3].get(0, 0), 3.0);

        let cols = partition(&m, PartitionAxis::Columns).unwrap();
        assert_eq!(cols.len(), 10);
        assert_eq!(cols[9].get(0, 0), 1.0);
        assert_eq!(cols[0].get(3, 0), 3.0);
        let total: usize = cols.iter().map(MatrixBlock::nnz).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_empty_dimensions() {
        let m = MatrixBlock::new(0, 3, false);
        assert!(partition(&m, PartitionAxis::Rows).unwrap().is_empty());
        assert_eq!(partition(&m, PartitionAxis::Columns).unwrap().len(), 3);
    }
}
