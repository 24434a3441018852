//! Hand-off to `ndarray` for external linear algebra

use dataconv_core::{ContainerError, MatrixBlock};
use ndarray::Array2;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::flatten::to_double_vector;
use crate::lease::{lease, MatrixHandle};

/// Copy a managed matrix into a dense `Array2`
///
/// The handle is leased for the duration of the copy only.
pub fn to_real_matrix<H: MatrixHandle + ?Sized>(handle: &H) -> Result<Array2<f64>> {
    let block = lease(handle)?;
    let array = to_array2(&block);
    drop(block);
    array
}

/// Copy a matrix block into a dense `Array2`
pub fn to_array2(matrix: &MatrixBlock) -> Result<Array2<f64>> {
    debug!(rows = matrix.rows(), cols = matrix.cols(), "copying matrix into ndarray");
    Array2::from_shape_vec(matrix.dimensions(), to_double_vector(matrix)).map_err(|_| {
        ConvertError::Container {
            operation: "matrix to ndarray",
            source: ContainerError::DimensionMismatch,
        }
    })
}
