//! Matrix <-> flat array conversions
//!
//! Sparse inputs are scattered into zero-initialized outputs, touching only
//! stored non-zeros. Dense inputs are copied cell by cell.

use dataconv_core::MatrixBlock;

use crate::error::{ConvertError, Result};

/// Shape of a matrix built from a 1-D array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorOrientation {
    /// `1 x n`
    Row,
    /// `n x 1`
    Column,
}

/// Copy a matrix into a `rows x cols` nested array
pub fn to_double_matrix(matrix: &MatrixBlock) -> Vec<Vec<f64>> {
    let (rows, cols) = matrix.dimensions();
    let mut out = vec![vec![0.0; cols]; rows];
    if matrix.is_empty() {
        return out;
    }

    match matrix.dense_values() {
        Some(values) if cols > 0 => {
            for (dst, src) in out.iter_mut().zip(values.chunks_exact(cols)) {
                dst.copy_from_slice(src);
            }
        }
        Some(_) => {}
        None => {
            for (i, j, v) in matrix.iter_nonzeros() {
                out[i][j] = v;
            }
        }
    }
    out
}

/// Row-major boolean vector, `true` for every non-zero cell
pub fn to_boolean_vector(matrix: &MatrixBlock) -> Vec<bool> {
    scatter_row_major(matrix, false, |v| v != 0.0)
}

/// Row-major integer vector, values truncated toward zero
pub fn to_int_vector(matrix: &MatrixBlock) -> Vec<i32> {
    scatter_row_major(matrix, 0, |v| v as i32)
}

/// Row-major double vector of length `rows * cols`
pub fn to_double_vector(matrix: &MatrixBlock) -> Vec<f64> {
    if let Some(values) = matrix.dense_values() {
        return values.to_vec();
    }
    scatter_row_major(matrix, 0.0, |v| v)
}

/// Ordered value sequence of a matrix
///
/// Dense input yields every cell in row-major order. Sparse input yields its
/// stored non-zeros in iteration order followed by `rows * cols - nnz`
/// zeros, so positions are not row-major when zeros and non-zeros
/// interleave. Callers that need positions should use [`to_double_vector`].
pub fn to_double_list(matrix: &MatrixBlock) -> Vec<f64> {
    let total = matrix.cell_count();
    let mut out = Vec::with_capacity(total);

    match matrix.dense_values() {
        Some(values) => out.extend_from_slice(values),
        None => {
            out.extend(matrix.iter_nonzeros().map(|(_, _, v)| v));
            out.resize(total, 0.0);
        }
    }
    out
}

/// Write a matrix row-major into `dest` starting at `offset`
///
/// Cells of `dest` that correspond to zeros are left untouched for sparse
/// input, matching a scatter into a pre-zeroed buffer. Empty matrices are a
/// no-op.
pub fn copy_to_double_vector(matrix: &MatrixBlock, dest: &mut [f64], offset: usize) -> Result<()> {
    if matrix.is_empty() {
        return Ok(());
    }

    let required = offset.saturating_add(matrix.cell_count());
    if required > dest.len() {
        return Err(ConvertError::DestinationTooSmall {
            operation: "copy to double vector",
            required,
            available: dest.len(),
        });
    }

    let cols = matrix.cols();
    match matrix.dense_values() {
        Some(values) => dest[offset..required].copy_from_slice(values),
        None => {
            for (i, j, v) in matrix.iter_nonzeros() {
                dest[offset + i * cols + j] = v;
            }
        }
    }
    Ok(())
}

/// Build a matrix from a nested array, then pick its storage mode
///
/// All rows must have the length of the first row.
pub fn from_double_matrix(data: &[Vec<f64>]) -> Result<MatrixBlock> {
    let rows = data.len();
    let cols = data.first().map_or(0, Vec::len);

    let mut values = Vec::with_capacity(rows.saturating_mul(cols));
    for row in data {
        if row.len() != cols {
            return Err(ConvertError::Container {
                operation: "array to matrix",
                source: dataconv_core::ContainerError::DimensionMismatch,
            });
        }
        values.extend_from_slice(row);
    }

    let mut matrix = MatrixBlock::from_dense(rows, cols, values)
        .map_err(ConvertError::container("array to matrix"))?;
    matrix.examine_sparsity();
    Ok(matrix)
}

/// Build a row or column vector matrix, then pick its storage mode
pub fn from_double_vector(data: &[f64], orientation: VectorOrientation) -> Result<MatrixBlock> {
    let (rows, cols) = match orientation {
        VectorOrientation::Row => (1, data.len()),
        VectorOrientation::Column => (data.len(), 1),
    };

    let mut matrix = MatrixBlock::from_dense(rows, cols, data.to_vec())
        .map_err(ConvertError::container("vector to matrix"))?;
    matrix.examine_sparsity();
    Ok(matrix)
}

fn scatter_row_major<T: Copy>(matrix: &MatrixBlock, zero: T, map: impl Fn(f64) -> T) -> Vec<T> {
    let cols = matrix.cols();
    let mut out = vec![zero; matrix.cell_count()];
    if matrix.is_empty() {
        return out;
    }

    match matrix.dense_values() {
        Some(values) => {
            for (dst, &v) in out.iter_mut().zip(values) {
                *dst = map(v);
            }
        }
        None => {
            for (i, j, v) in matrix.iter_nonzeros() {
                out[i * cols + j] = map(v);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse_block() -> MatrixBlock {
        // 2 x 6 with non-zeros interleaved with zeros
        let mut m = MatrixBlock::new(2, 6, true);
        m.append_value(0, 4, 2.0).unwrap();
        m.append_value(0, 1, 1.0).unwrap();
        m.append_value(1, 5, -3.5).unwrap();
        m.sort_sparse_rows();
        m
    }

    #[test]
    fn test_to_double_matrix() {
        let dense = MatrixBlock::from_dense(2, 2, vec![1.0, 0.0, 0.0, 4.0]).unwrap();
        assert_eq!(to_double_matrix(&dense), vec![vec![1.0, 0.0], vec![0.0, 4.0]]);

        let sparse = sparse_block();
        let out = to_double_matrix(&sparse);
        assert_eq!(out[0], vec![0.0, 1.0, 0.0, 0.0, 2.0, 0.0]);
        assert_eq!(out[1][5], -3.5);
    }

    #[test]
    fn test_typed_vectors() {
        let m = sparse_block();
        assert_eq!(
            to_boolean_vector(&m),
            vec![false, true, false, false, true, false, false, false, false, false, false, true]
        );
        assert_eq!(to_int_vector(&m)[11], -3);
        assert_eq!(to_double_vector(&m)[4], 2.0);

        let dense = MatrixBlock::from_dense(1, 3, vec![0.9, -1.9, 0.0]).unwrap();
        assert_eq!(to_int_vector(&dense), vec![0, -1, 0]);
        assert_eq!(to_boolean_vector(&dense), vec![true, true, false]);
    }

    #[test]
    fn test_to_double_list_dense_is_row_major() {
        let m = MatrixBlock::from_dense(2, 2, vec![0.0, 5.0, 6.0, 0.0]).unwrap();
        assert_eq!(to_double_list(&m), vec![0.0, 5.0, 6.0, 0.0]);
    }

    #[test]
    fn test_to_double_list_sparse_appends_zeros() {
        // Non-zeros come first, then the remaining zeros, regardless of position
        let m = sparse_block();
        assert_eq!(
            to_double_list(&m),
            vec![1.0, 2.0, -3.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_ne!(to_double_list(&m), to_double_vector(&m));
    }

    #[test]
    fn test_copy_to_double_vector() {
        let m = sparse_block();
        let mut dest = vec![9.0; 14];
        copy_to_double_vector(&m, &mut dest, 2).unwrap();
        assert_eq!(dest[0], 9.0);
        assert_eq!(dest[3], 1.0);
        assert_eq!(dest[13], -3.5);
        // zeros of sparse input are not written
        assert_eq!(dest[2], 9.0);

        let mut short = vec![0.0; 5];
        assert!(matches!(
            copy_to_double_vector(&m, &mut short, 0),
            Err(ConvertError::DestinationTooSmall { required: 12, available: 5, .. })
        ));

        let empty = MatrixBlock::new(3, 3, false);
        copy_to_double_vector(&empty, &mut short, 0).unwrap();
    }

    #[test]
    fn test_from_double_matrix() {
        let m = from_double_matrix(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.dimensions(), (2, 2));
        assert_eq!(m.get(1, 0), 3.0);
        assert!(!m.is_sparse());

        let ragged = from_double_matrix(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(ragged, Err(ConvertError::Container { .. })));

        let empty = from_double_matrix(&[]).unwrap();
        assert_eq!(empty.dimensions(), (0, 0));
    }

    #[test]
    fn test_from_double_matrix_picks_sparse() {
        let mut data = vec![vec![0.0; 200]; 200];
        data[10][20] = 1.0;
        data[150][3] = 2.0;
        let m = from_double_matrix(&data).unwrap();
        assert!(m.is_sparse());
        assert_eq!(m.nnz(), 2);
        assert_eq!(to_double_matrix(&m), data);
    }

    #[test]
    fn test_from_double_vector() {
        let row = from_double_vector(&[1.0, 2.0, 3.0], VectorOrientation::Row).unwrap();
        assert_eq!(row.dimensions(), (1, 3));
        let col = from_double_vector(&[1.0, 2.0, 3.0], VectorOrientation::Column).unwrap();
        assert_eq!(col.dimensions(), (3, 1));
        assert_eq!(col.get(2, 0), 3.0);
    }
}
