//! Dense/sparse matrix block
//!
//! A [`MatrixBlock`] is a `rows x cols` grid of doubles stored either as one
//! row-major buffer or as one [`SparseRow`] per row. `nnz` is kept equal to
//! the number of stored non-zero values by every mutating operation.

mod sparse_row;

pub use sparse_row::SparseRow;

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use crate::density::eval_sparse_format;
use crate::{ContainerError, Result};

/// Physical layout of a matrix block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageMode {
    /// Flat row-major buffer of `rows * cols` doubles
    Dense,
    /// Per-row column-sorted non-zero lists
    Sparse,
}

impl core::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StorageMode::Dense => write!(f, "dense"),
            StorageMode::Sparse => write!(f, "sparse"),
        }
    }
}

#[derive(Debug, Clone)]
enum BlockData {
    Dense(Vec<f64>),
    Sparse(Vec<SparseRow>),
}

/// Rectangular numeric grid with dense or sparse storage
#[derive(Debug, Clone)]
pub struct MatrixBlock {
    rows: usize,
    cols: usize,
    nnz: usize,
    data: BlockData,
}

impl MatrixBlock {
    /// Create an all-zero block in the requested storage mode
    pub fn new(rows: usize, cols: usize, sparse: bool) -> Self {
        Self::with_capacity(rows, cols, sparse, 0)
    }

    /// Create an all-zero block, pre-sizing sparse rows for `estimated_nnz` entries
    pub fn with_capacity(rows: usize, cols: usize, sparse: bool, estimated_nnz: usize) -> Self {
        let data = if sparse {
            let per_row = if rows == 0 {
                0
            } else {
                estimated_nnz.div_ceil(rows).min(cols)
            };
            BlockData::Sparse((0..rows).map(|_| SparseRow::with_capacity(per_row)).collect())
        } else {
            BlockData::Dense(vec![0.0; rows.saturating_mul(cols)])
        };

        Self {
            rows,
            cols,
            nnz: 0,
            data,
        }
    }

    /// Create a dense block that takes ownership of a row-major buffer
    pub fn from_dense(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        let len = rows
            .checked_mul(cols)
            .ok_or(ContainerError::CapacityOverflow)?;
        if values.len() != len {
            return Err(ContainerError::DimensionMismatch);
        }

        let nnz = values.iter().filter(|&&v| v != 0.0).count();
        Ok(Self {
            rows,
            cols,
            nnz,
            data: BlockData::Dense(values),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Matrix dimensions as (rows, cols)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of stored non-zero values
    pub fn nnz(&self) -> usize {
        self.nnz
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    pub fn storage_mode(&self) -> StorageMode {
        match self.data {
            BlockData::Dense(_) => StorageMode::Dense,
            BlockData::Sparse(_) => StorageMode::Sparse,
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self.data, BlockData::Sparse(_))
    }

    /// True if the block holds no non-zero values
    pub fn is_empty(&self) -> bool {
        self.nnz == 0
    }

    /// Row-major dense buffer, `None` in sparse mode
    pub fn dense_values(&self) -> Option<&[f64]> {
        match &self.data {
            BlockData::Dense(values) => Some(values),
            BlockData::Sparse(_) => None,
        }
    }

    /// Sparse row storage, `None` in dense mode
    pub fn sparse_row(&self, row: usize) -> Option<&SparseRow> {
        match &self.data {
            BlockData::Dense(_) => None,
            BlockData::Sparse(rows) => rows.get(row),
        }
    }

    /// Value at (`row`, `col`)
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the block.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "cell out of bounds");
        match &self.data {
            BlockData::Dense(values) => values[row * self.cols + col],
            BlockData::Sparse(rows) => rows[row].get(col),
        }
    }

    /// Overwrite a single cell, keeping sparse rows sorted and `nnz` exact
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.check_bounds(row, col)?;

        let old = match &mut self.data {
            BlockData::Dense(values) => {
                let slot = &mut values[row * self.cols + col];
                let old = *slot;
                *slot = value;
                old
            }
            BlockData::Sparse(rows) => rows[row].set(col, value),
        };

        match (old != 0.0, value != 0.0) {
            (false, true) => self.nnz += 1,
            (true, false) => self.nnz -= 1,
            _ => {}
        }
        Ok(())
    }

    /// Append a value without keeping sparse rows sorted
    ///
    /// Zero values are ignored. In sparse mode the row stays unsorted until
    /// [`MatrixBlock::sort_sparse_rows`] is called. Appending a column twice
    /// before sorting keeps the last value. In dense mode this is a plain write.
    pub fn append_value(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if value == 0.0 {
            return Ok(());
        }
        self.check_bounds(row, col)?;

        if let BlockData::Sparse(rows) = &mut self.data {
            rows[row].append(col, value);
            self.nnz += 1;
            return Ok(());
        }
        self.set(row, col, value)
    }

    /// Finalize deferred appends by sorting every sparse row by column
    pub fn sort_sparse_rows(&mut self) {
        if let BlockData::Sparse(rows) = &mut self.data {
            let removed: usize = rows.iter_mut().map(SparseRow::sort).sum();
            self.nnz -= removed;
        }
    }

    /// Switch storage mode if the density rule asks for the other one
    ///
    /// Values and `nnz` are preserved. Calling this on an already normalized
    /// block is a no-op. Sparse rows must be sorted.
    pub fn examine_sparsity(&mut self) {
        let target_sparse = eval_sparse_format(self.rows, self.cols, self.nnz);
        if target_sparse == self.is_sparse() {
            return;
        }

        if target_sparse {
            self.dense_to_sparse();
        } else {
            self.sparse_to_dense();
        }
    }

    /// Recount stored non-zeros, returning the new count
    pub fn recompute_nnz(&mut self) -> usize {
        self.nnz = match &self.data {
            BlockData::Dense(values) => values.iter().filter(|&&v| v != 0.0).count(),
            BlockData::Sparse(rows) => rows
                .iter()
                .map(|r| r.values().iter().filter(|&&v| v != 0.0).count())
                .sum(),
        };
        self.nnz
    }

    /// Iterate stored non-zero cells as `(row, col, value)` in row order
    pub fn iter_nonzeros(&self) -> Box<dyn Iterator<Item = (usize, usize, f64)> + '_> {
        match &self.data {
            BlockData::Dense(values) => {
                let cols = self.cols;
                Box::new(
                    values
                        .iter()
                        .enumerate()
                        .filter(|(_, &v)| v != 0.0)
                        .map(move |(ix, &v)| (ix / cols, ix % cols, v)),
                )
            }
            BlockData::Sparse(rows) => Box::new(
                rows.iter()
                    .enumerate()
                    .flat_map(|(i, row)| row.iter().map(move |(j, v)| (i, j, v))),
            ),
        }
    }

    /// Reset to an all-zero `rows x cols` block in the given mode
    pub fn reset(&mut self, rows: usize, cols: usize, sparse: bool) {
        let keep_capacity = match &mut self.data {
            BlockData::Sparse(existing) if sparse && existing.len() == rows => {
                existing.iter_mut().for_each(SparseRow::clear);
                true
            }
            _ => false,
        };

        if !keep_capacity {
            *self = Self::new(rows, cols, sparse);
            return;
        }

        self.cols = cols;
        self.nnz = 0;
    }

    /// Copy the sub-range `rows x cols` into `target`
    ///
    /// The target is reset to the slice dimensions and keeps its storage mode
    /// and any pre-sized sparse row capacity.
    pub fn slice_into(
        &self,
        rows: Range<usize>,
        cols: Range<usize>,
        target: &mut MatrixBlock,
    ) -> Result<()> {
        if rows.start > rows.end || cols.start > cols.end {
            return Err(ContainerError::IndexOutOfBounds);
        }
        if rows.end > self.rows || cols.end > self.cols {
            return Err(ContainerError::IndexOutOfBounds);
        }

        let out_cols = cols.len();
        target.reset(rows.len(), out_cols, target.is_sparse());

        match &self.data {
            BlockData::Sparse(src_rows) => {
                for (ti, src) in src_rows[rows].iter().enumerate() {
                    for (j, v) in src.iter() {
                        if cols.contains(&j) {
                            target.append_value(ti, j - cols.start, v)?;
                        }
                    }
                }
            }
            BlockData::Dense(values) => {
                for (ti, i) in rows.enumerate() {
                    let src = &values[i * self.cols + cols.start..i * self.cols + cols.end];
                    match &mut target.data {
                        BlockData::Dense(dst) => {
                            dst[ti * out_cols..(ti + 1) * out_cols].copy_from_slice(src);
                        }
                        BlockData::Sparse(dst) => {
                            for (tj, &v) in src.iter().enumerate() {
                                if v != 0.0 {
                                    dst[ti].append(tj, v);
                                }
                            }
                        }
                    }
                }
                target.recompute_nnz();
            }
        }

        Ok(())
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(ContainerError::IndexOutOfBounds);
        }
        Ok(())
    }

    fn dense_to_sparse(&mut self) {
        if let BlockData::Dense(values) = &self.data {
            let sparse_rows = if self.cols == 0 {
                (0..self.rows).map(|_| SparseRow::new()).collect()
            } else {
                values
                    .chunks(self.cols)
                    .map(|chunk| {
                        let mut row = SparseRow::new();
                        for (j, &v) in chunk.iter().enumerate() {
                            if v != 0.0 {
                                row.append(j, v);
                            }
                        }
                        row
                    })
                    .collect()
            };
            self.data = BlockData::Sparse(sparse_rows);
        }
    }

    fn sparse_to_dense(&mut self) {
        if let BlockData::Sparse(rows) = &self.data {
            let mut values = vec![0.0; self.rows.saturating_mul(self.cols)];
            for (i, row) in rows.iter().enumerate() {
                let base = i * self.cols;
                for (j, v) in row.iter() {
                    values[base + j] = v;
                }
            }
            self.data = BlockData::Dense(values);
        }
    }
}
