//! Frame <-> matrix bridge
//!
//! Homogeneous double frames and dense matrices converted to an all-double
//! schema go through the tiled copy in [`crate::tiling`]. Every other
//! combination decodes or encodes cell by cell, dispatching on the column's
//! declared [`ValueKind`].

use dataconv_core::value::{double_to_text, round_to_i64};
use dataconv_core::{CellValue, FrameBlock, FrameColumn, MatrixBlock, ValueKind};
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::tiling::{columns_to_row_major, row_major_to_columns, DEFAULT_TILE_SIZE};

/// Tuning for the blocked copy paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BridgeConfig {
    /// Tile edge in cells, at least 1
    pub tile_size: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tile edge; zero is clamped to 1
    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }
}

/// Convert a frame into a matrix using the default tile size
pub fn frame_to_matrix(frame: &FrameBlock) -> Result<MatrixBlock> {
    frame_to_matrix_with(frame, &BridgeConfig::default())
}

/// Convert a frame into a matrix
///
/// Every cell is coerced to a double. The result is built dense and then
/// re-evaluated against the density rule.
pub fn frame_to_matrix_with(frame: &FrameBlock, config: &BridgeConfig) -> Result<MatrixBlock> {
    let (rows, cols) = (frame.rows(), frame.cols());
    let mut values = vec![0.0; rows * cols];

    if frame.is_homogeneous_double() {
        debug!(rows, cols, tile = config.tile_size, "frame to matrix: tiled copy");
        let columns: Vec<&[f64]> = (0..cols).filter_map(|j| frame.double_column(j)).collect();
        columns_to_row_major(&columns, rows, &mut values, config.tile_size);
    } else {
        debug!(rows, cols, "frame to matrix: per-cell coercion");
        for j in 0..cols {
            let Some(column) = frame.column(j) else {
                continue;
            };
            for i in 0..rows {
                values[i * cols + j] = cell_to_double(column.get(i), i, j, column.kind())?;
            }
        }
    }

    let mut matrix = MatrixBlock::from_dense(rows, cols, values)
        .map_err(ConvertError::container("frame to matrix"))?;
    matrix.examine_sparsity();
    Ok(matrix)
}

/// Convert a matrix into an all-double frame
pub fn matrix_to_frame(matrix: &MatrixBlock) -> Result<FrameBlock> {
    matrix_to_frame_as(matrix, ValueKind::Double)
}

/// Convert a matrix into a frame whose columns all share one kind
pub fn matrix_to_frame_as(matrix: &MatrixBlock, kind: ValueKind) -> Result<FrameBlock> {
    let schema = vec![kind; matrix.cols()];
    matrix_to_frame_with_schema(matrix, &schema)
}

/// Convert a matrix into a frame with a per-column schema
pub fn matrix_to_frame_with_schema(
    matrix: &MatrixBlock,
    schema: &[ValueKind],
) -> Result<FrameBlock> {
    matrix_to_frame_with(matrix, schema, &BridgeConfig::default())
}

/// Convert a matrix into a frame with a per-column schema and explicit tuning
///
/// Missing cells of a sparse input become null in string columns and the
/// kind's zero elsewhere.
pub fn matrix_to_frame_with(
    matrix: &MatrixBlock,
    schema: &[ValueKind],
    config: &BridgeConfig,
) -> Result<FrameBlock> {
    let (rows, cols) = matrix.dimensions();
    if schema.len() != cols {
        return Err(ConvertError::Container {
            operation: "matrix to frame",
            source: dataconv_core::ContainerError::SchemaMismatch,
        });
    }

    if matrix.is_sparse() {
        debug!(rows, cols, nnz = matrix.nnz(), "matrix to frame: sparse rows");
        let mut frame = FrameBlock::new(schema);
        let mut row = vec![None; cols];
        for i in 0..rows {
            row.iter_mut().for_each(|cell| *cell = None);
            if let Some(sparse) = matrix.sparse_row(i) {
                for (j, v) in sparse.iter() {
                    row[j] = Some(double_to_cell(v, schema[j]));
                }
            }
            frame
                .append_row(&row)
                .map_err(ConvertError::container("matrix to frame"))?;
        }
        return Ok(frame);
    }

    let values = matrix.dense_values().unwrap_or_default();

    if schema.iter().all(ValueKind::is_double) {
        debug!(rows, cols, tile = config.tile_size, "matrix to frame: tiled copy");
        let columns = row_major_to_columns(values, rows, cols, config.tile_size)
            .into_iter()
            .map(FrameColumn::Double)
            .collect();
        return build_frame(columns, rows);
    }

    debug!(rows, cols, "matrix to frame: per-cell encoding");
    let columns = schema
        .iter()
        .enumerate()
        .map(|(j, &kind)| -> dataconv_core::Result<FrameColumn> {
            let mut column = FrameColumn::with_capacity(kind, rows);
            for i in 0..rows {
                column.push(Some(double_to_cell(values[i * cols + j], kind)))?;
            }
            Ok(column)
        })
        .collect::<dataconv_core::Result<Vec<_>>>()
        .map_err(ConvertError::container("matrix to frame"))?;
    build_frame(columns, rows)
}

/// Textual form of every frame cell, row by row; nulls stay `None`
pub fn frame_to_string_rows(frame: &FrameBlock) -> Vec<Vec<Option<String>>> {
    frame.string_rows()
}

/// Build an all-string frame from textual rows
///
/// Empty input yields an empty frame. The column count is taken from the
/// first row.
pub fn string_rows_to_frame<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<FrameBlock> {
    let cols = rows.first().map_or(0, Vec::len);
    let schema = vec![ValueKind::String; cols];
    string_rows_to_frame_with_schema(rows, &schema)
}

/// Build a frame from textual rows, parsing each field into its column kind
pub fn string_rows_to_frame_with_schema<S: AsRef<str>>(
    rows: &[Vec<S>],
    schema: &[ValueKind],
) -> Result<FrameBlock> {
    if rows.is_empty() {
        return Ok(FrameBlock::default());
    }
    FrameBlock::from_string_rows(schema, None, rows)
        .map_err(ConvertError::container("string rows to frame"))
}

/// Build a frame from textual rows with explicit column names
pub fn string_rows_to_frame_with_names<S: AsRef<str>>(
    rows: &[Vec<S>],
    schema: &[ValueKind],
    names: Vec<String>,
) -> Result<FrameBlock> {
    if rows.is_empty() {
        return Ok(FrameBlock::default());
    }
    FrameBlock::from_string_rows(schema, Some(names), rows)
        .map_err(ConvertError::container("string rows to frame"))
}

/// Interpret one frame cell as a double
///
/// Nulls and empty strings read as zero, booleans as 1/0.
pub fn cell_to_double(
    value: Option<CellValue>,
    row: usize,
    col: usize,
    kind: ValueKind,
) -> Result<f64> {
    match value {
        None => Ok(0.0),
        Some(CellValue::Double(v)) => Ok(v),
        Some(CellValue::Int64(v)) => Ok(v as f64),
        Some(CellValue::Boolean(v)) => Ok(if v { 1.0 } else { 0.0 }),
        Some(CellValue::String(s)) => {
            let text = s.trim();
            if text.is_empty() {
                return Ok(0.0);
            }
            match text.parse::<f64>() {
                Ok(v) => Ok(v),
                Err(_) => Err(ConvertError::TypeCoercion {
                    row,
                    col,
                    kind,
                    value: s,
                }),
            }
        }
    }
}

/// Encode a raw double as a cell of the given kind
pub fn double_to_cell(value: f64, kind: ValueKind) -> CellValue {
    match kind {
        ValueKind::Double => CellValue::Double(value),
        ValueKind::Int64 => CellValue::Int64(round_to_i64(value)),
        ValueKind::Boolean => CellValue::Boolean(value != 0.0),
        ValueKind::String => CellValue::String(double_to_text(value)),
    }
}

fn build_frame(columns: Vec<FrameColumn>, rows: usize) -> Result<FrameBlock> {
    if columns.is_empty() {
        return Ok(FrameBlock::without_columns(rows));
    }
    FrameBlock::from_columns(columns).map_err(ConvertError::container("matrix to frame"))
}
