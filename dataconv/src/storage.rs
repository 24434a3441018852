//! Storage boundary
//!
//! Matrices are persisted through a [`MatrixWriter`] and loaded through a
//! [`MatrixReader`], both picked by [`StorageFormat`]. The public entry points
//! [`write_matrix`] and [`read_matrix`] wrap every storage failure into
//! [`ConvertError::Io`]. Every write also leaves a JSON sidecar next to the
//! data file so the matrix can be read back without restating its shape.

mod binary_block;
mod binary_cell;
mod matrix_market;
mod metadata;
mod text_cell;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use dataconv_core::density::{estimate_dense_size, estimate_sparse_size};
use dataconv_core::{eval_sparse_format, ContainerError, MatrixBlock};
use tracing::debug;

use crate::error::{ConvertError, Result};

pub use binary_block::{BinaryBlockReader, BinaryBlockWriter, BlockHeader};
pub use binary_cell::{BinaryCellReader, BinaryCellWriter, CellRecord};
pub use matrix_market::{MatrixMarketReader, MatrixMarketWriter};
pub use metadata::{metadata_path, read_metadata, write_metadata, MatrixMetadata};
pub use text_cell::{TextCellReader, TextCellWriter};

/// Default block edge used when none is declared
pub const DEFAULT_BLOCK_SIZE: usize = 1000;

/// Default expected sparsity used to pre-size readers
pub const DEFAULT_EXPECTED_SPARSITY: f64 = 0.1;

/// Errors raised by readers and writers
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("cell ({row}, {col}) lies outside the {rows} x {cols} matrix")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("invalid header: {0}")]
    BadHeader(String),

    #[error("a {rows} x {cols} matrix does not fit in addressable memory")]
    Unaddressable { rows: usize, cols: usize },

    #[error("declared dimensions {expected:?} do not match stored dimensions {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("block size {block_rows} x {block_cols} is not valid")]
    InvalidBlockSize { block_rows: usize, block_cols: usize },

    #[error("unknown storage format {0:?}")]
    UnknownFormat(String),

    #[error("container error: {0}")]
    Container(#[from] ContainerError),
}

/// Result type for readers and writers
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// On-disk layout of a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StorageFormat {
    /// `row col value` lines, 1-indexed
    #[serde(rename = "text")]
    TextCell,
    /// Matrix Market coordinate text
    #[serde(rename = "mm")]
    MatrixMarket,
    /// Little-endian `(row, col, value)` records, 0-indexed
    #[serde(rename = "binarycell")]
    BinaryCell,
    /// Header followed by dense row-major blocks
    #[serde(rename = "binaryblock")]
    BinaryBlock,
}

impl StorageFormat {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StorageFormat::TextCell => "text",
            StorageFormat::MatrixMarket => "mm",
            StorageFormat::BinaryCell => "binarycell",
            StorageFormat::BinaryBlock => "binaryblock",
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageFormat {
    type Err = StorageError;

    fn from_str(s: &str) -> StorageResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "textcell" => Ok(StorageFormat::TextCell),
            "mm" | "matrixmarket" => Ok(StorageFormat::MatrixMarket),
            "binarycell" => Ok(StorageFormat::BinaryCell),
            "binaryblock" | "binary" => Ok(StorageFormat::BinaryBlock),
            _ => Err(StorageError::UnknownFormat(s.to_string())),
        }
    }
}

/// Logical and block dimensions of a stored matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatrixCharacteristics {
    pub rows: usize,
    pub cols: usize,
    pub block_rows: usize,
    pub block_cols: usize,
    pub nnz: usize,
}

impl MatrixCharacteristics {
    pub fn new(rows: usize, cols: usize, block_rows: usize, block_cols: usize, nnz: usize) -> Self {
        Self {
            rows,
            cols,
            block_rows,
            block_cols,
            nnz,
        }
    }

    /// Characteristics of an in-memory matrix with default blocking
    pub fn of(matrix: &MatrixBlock) -> Self {
        Self::new(
            matrix.rows(),
            matrix.cols(),
            DEFAULT_BLOCK_SIZE,
            DEFAULT_BLOCK_SIZE,
            matrix.nnz(),
        )
    }

    /// Override the block dimensions
    pub fn with_block_size(mut self, block_rows: usize, block_cols: usize) -> Self {
        self.block_rows = block_rows;
        self.block_cols = block_cols;
        self
    }
}

/// What a reader needs to know about a stored matrix
#[derive(Debug, Clone, PartialEq)]
pub struct ReadProperties {
    pub path: PathBuf,
    pub format: StorageFormat,
    pub rows: usize,
    pub cols: usize,
    pub block_rows: usize,
    pub block_cols: usize,
    /// Sizing hint only, never affects the values read
    pub expected_sparsity: f64,
}

impl ReadProperties {
    pub fn new(path: impl Into<PathBuf>, format: StorageFormat, rows: usize, cols: usize) -> Self {
        Self {
            path: path.into(),
            format,
            rows,
            cols,
            block_rows: DEFAULT_BLOCK_SIZE,
            block_cols: DEFAULT_BLOCK_SIZE,
            expected_sparsity: DEFAULT_EXPECTED_SPARSITY,
        }
    }

    pub fn with_block_size(mut self, block_rows: usize, block_cols: usize) -> Self {
        self.block_rows = block_rows;
        self.block_cols = block_cols;
        self
    }

    pub fn with_expected_sparsity(mut self, expected_sparsity: f64) -> Self {
        self.expected_sparsity = expected_sparsity;
        self
    }

    /// Expected non-zero count derived from the sparsity hint
    pub fn estimated_nnz(&self) -> usize {
        let cells = self.rows as f64 * self.cols as f64;
        (self.expected_sparsity.clamp(0.0, 1.0) * cells) as usize
    }
}

/// Loads a matrix from storage
pub trait MatrixReader {
    fn read(&self, props: &ReadProperties) -> StorageResult<MatrixBlock>;
}

/// Persists a matrix to storage
pub trait MatrixWriter {
    fn write(
        &self,
        matrix: &MatrixBlock,
        path: &Path,
        characteristics: &MatrixCharacteristics,
    ) -> StorageResult<()>;
}

/// Reader for a storage format
pub fn create_reader(format: StorageFormat) -> Box<dyn MatrixReader> {
    match format {
        StorageFormat::TextCell => Box::new(TextCellReader),
        StorageFormat::MatrixMarket => Box::new(MatrixMarketReader),
        StorageFormat::BinaryCell => Box::new(BinaryCellReader),
        StorageFormat::BinaryBlock => Box::new(BinaryBlockReader),
    }
}

/// Writer for a storage format
pub fn create_writer(format: StorageFormat) -> Box<dyn MatrixWriter> {
    match format {
        StorageFormat::TextCell => Box::new(TextCellWriter),
        StorageFormat::MatrixMarket => Box::new(MatrixMarketWriter),
        StorageFormat::BinaryCell => Box::new(BinaryCellWriter),
        StorageFormat::BinaryBlock => Box::new(BinaryBlockWriter),
    }
}

/// Write a matrix and its metadata sidecar
pub fn write_matrix(
    matrix: &MatrixBlock,
    path: impl AsRef<Path>,
    format: StorageFormat,
    characteristics: &MatrixCharacteristics,
) -> Result<()> {
    let path = path.as_ref();
    let write = || -> StorageResult<()> {
        check_dimensions(
            (characteristics.rows, characteristics.cols),
            matrix.dimensions(),
        )?;
        create_writer(format).write(matrix, path, characteristics)?;
        write_metadata(path, &MatrixMetadata::new(format, *characteristics))
    };
    write().map_err(ConvertError::io("write matrix"))?;

    debug!(
        path = %path.display(),
        %format,
        rows = matrix.rows(),
        cols = matrix.cols(),
        nnz = matrix.nnz(),
        "wrote matrix"
    );
    Ok(())
}

/// Read a matrix with explicitly declared properties
pub fn read_matrix(props: &ReadProperties) -> Result<MatrixBlock> {
    let matrix = create_reader(props.format)
        .read(props)
        .map_err(ConvertError::io("read matrix"))?;

    debug!(
        path = %props.path.display(),
        format = %props.format,
        rows = matrix.rows(),
        cols = matrix.cols(),
        nnz = matrix.nnz(),
        mode = %matrix.storage_mode(),
        "read matrix"
    );
    Ok(matrix)
}

/// Read a matrix whose shape and format come from its metadata sidecar
pub fn read_matrix_with_metadata(path: impl AsRef<Path>) -> Result<MatrixBlock> {
    let path = path.as_ref();
    let metadata = read_metadata(path).map_err(ConvertError::io("read matrix metadata"))?;
    read_matrix(&metadata.read_properties(path))
}

/// Builds a matrix from cells arriving in arbitrary order
///
/// Sparse targets take unsorted appends and are sorted once in
/// [`CellAssembler::finish`]. An inferred assembler buffers the cells and
/// sizes the matrix from the largest indices seen.
pub(crate) enum CellAssembler {
    Sized(MatrixBlock),
    Inferred(Vec<(usize, usize, f64)>),
}

impl CellAssembler {
    /// Assembler for a matrix of known shape
    pub(crate) fn sized(rows: usize, cols: usize, estimated_nnz: usize) -> StorageResult<Self> {
        let estimated_nnz = estimated_nnz.min(rows.saturating_mul(cols));
        let sparse = eval_sparse_format(rows, cols, estimated_nnz);
        check_addressable(rows, cols, estimated_nnz, sparse)?;
        Ok(Self::Sized(MatrixBlock::with_capacity(
            rows,
            cols,
            sparse,
            estimated_nnz,
        )))
    }

    /// Assembler for the declared shape, inferred from the cells when 0 x 0
    pub(crate) fn for_props(props: &ReadProperties) -> StorageResult<Self> {
        if (props.rows, props.cols) == (0, 0) {
            return Ok(Self::Inferred(Vec::new()));
        }
        Self::sized(props.rows, props.cols, props.estimated_nnz())
    }

    /// Add a 0-indexed cell; positions outside a sized matrix are an error
    pub(crate) fn push(&mut self, row: usize, col: usize, value: f64) -> StorageResult<()> {
        let matrix = match self {
            Self::Sized(matrix) => matrix,
            Self::Inferred(cells) => {
                cells.push((row, col, value));
                return Ok(());
            }
        };

        let (rows, cols) = matrix.dimensions();
        if row >= rows || col >= cols {
            return Err(StorageError::OutOfBounds {
                row: row.saturating_add(1),
                col: col.saturating_add(1),
                rows,
                cols,
            });
        }
        matrix.append_value(row, col, value)?;
        Ok(())
    }

    pub(crate) fn finish(self) -> StorageResult<MatrixBlock> {
        let mut matrix = match self {
            Self::Sized(matrix) => matrix,
            Self::Inferred(cells) => {
                let extent = |index: usize| {
                    index.checked_add(1).ok_or(StorageError::Unaddressable {
                        rows: usize::MAX,
                        cols: usize::MAX,
                    })
                };
                let (mut rows, mut cols) = (0, 0);
                for &(i, j, _) in &cells {
                    rows = rows.max(extent(i)?);
                    cols = cols.max(extent(j)?);
                }
                debug!(rows, cols, cells = cells.len(), "inferred dimensions from cells");

                let mut sized = Self::sized(rows, cols, cells.len())?;
                for (i, j, v) in cells {
                    sized.push(i, j, v)?;
                }
                return sized.finish();
            }
        };

        matrix.sort_sparse_rows();
        matrix.examine_sparsity();
        Ok(matrix)
    }
}

/// Reject shapes whose in-memory estimate exceeds what can be allocated
fn check_addressable(
    rows: usize,
    cols: usize,
    estimated_nnz: usize,
    sparse: bool,
) -> StorageResult<()> {
    let bytes = if sparse {
        estimate_sparse_size(rows, estimated_nnz)
    } else {
        estimate_dense_size(rows, cols)
    };
    if bytes > isize::MAX as u64 {
        return Err(StorageError::Unaddressable { rows, cols });
    }
    Ok(())
}

/// Declared dimensions of 0 x 0 mean "take what the file says"
pub(crate) fn resolve_dimensions(
    declared: (usize, usize),
    stored: (usize, usize),
) -> StorageResult<(usize, usize)> {
    if declared == (0, 0) {
        return Ok(stored);
    }
    check_dimensions(declared, stored)?;
    Ok(stored)
}

fn check_dimensions(expected: (usize, usize), found: (usize, usize)) -> StorageResult<()> {
    if expected != found {
        return Err(StorageError::DimensionMismatch { expected, found });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_sparse() -> MatrixBlock {
        let mut m = MatrixBlock::new(40, 30, true);
        m.append_value(0, 29, 1.25).unwrap();
        m.append_value(0, 3, -2.0).unwrap();
        m.append_value(17, 0, 1e-9).unwrap();
        m.append_value(39, 29, 123456.789).unwrap();
        m.sort_sparse_rows();
        m
    }

    fn assert_same(a: &MatrixBlock, b: &MatrixBlock) {
        assert_eq!(a.dimensions(), b.dimensions());
        assert_eq!(a.nnz(), b.nnz());
        let cells: Vec<_> = a.iter_nonzeros().collect();
        let other: Vec<_> = b.iter_nonzeros().collect();
        assert_eq!(cells, other);
    }

    #[test]
    fn test_format_names() {
        for format in [
            StorageFormat::TextCell,
            StorageFormat::MatrixMarket,
            StorageFormat::BinaryCell,
            StorageFormat::BinaryBlock,
        ] {
            assert_eq!(format.as_str().parse::<StorageFormat>().unwrap(), format);
        }
        assert!(matches!(
            "csv".parse::<StorageFormat>(),
            Err(StorageError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_round_trip_every_format() {
        let dir = TempDir::new().unwrap();
        let matrix = sample_sparse();

        for format in [
            StorageFormat::TextCell,
            StorageFormat::MatrixMarket,
            StorageFormat::BinaryCell,
            StorageFormat::BinaryBlock,
        ] {
            let path = dir.path().join(format!("m.{format}"));
            let mc = MatrixCharacteristics::of(&matrix).with_block_size(16, 7);
            write_matrix(&matrix, &path, format, &mc).unwrap();

            let props = ReadProperties::new(&path, format, 40, 30).with_block_size(16, 7);
            let back = read_matrix(&props).unwrap();
            assert_same(&matrix, &back);

            let via_metadata = read_matrix_with_metadata(&path).unwrap();
            assert_same(&matrix, &via_metadata);
        }
    }

    #[test]
    fn test_write_rejects_wrong_characteristics() {
        let dir = TempDir::new().unwrap();
        let matrix = sample_sparse();
        let mc = MatrixCharacteristics::new(2, 2, 1000, 1000, 0);
        let err = write_matrix(&matrix, dir.path().join("m"), StorageFormat::TextCell, &mc)
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Io {
                source: StorageError::DimensionMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let props = ReadProperties::new(dir.path().join("absent"), StorageFormat::TextCell, 2, 2);
        match read_matrix(&props) {
            Err(ConvertError::Io { operation, source }) => {
                assert_eq!(operation, "read matrix");
                assert!(matches!(source, StorageError::Io(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_block_header_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.bin");
        let header = BlockHeader::new(&MatrixCharacteristics::new(1 << 61, 1, 1, 1, 0));
        std::fs::write(&path, header.to_bytes()).unwrap();

        let props = ReadProperties::new(&path, StorageFormat::BinaryBlock, 0, 0);
        assert!(matches!(
            read_matrix(&props),
            Err(ConvertError::Io {
                source: StorageError::Unaddressable { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_estimated_nnz() {
        let props = ReadProperties::new("x", StorageFormat::TextCell, 100, 50);
        assert_eq!(props.estimated_nnz(), 500);
        assert_eq!(props.with_expected_sparsity(2.0).estimated_nnz(), 5000);
    }

    #[test]
    fn test_assembler_sorts_and_normalizes() {
        let mut asm = CellAssembler::sized(2, 2, 0).unwrap();
        asm.push(1, 1, 4.0).unwrap();
        asm.push(0, 0, 1.0).unwrap();
        assert!(matches!(
            asm.push(2, 0, 1.0),
            Err(StorageError::OutOfBounds { row: 3, col: 1, .. })
        ));
        let m = asm.finish().unwrap();
        assert!(!m.is_sparse());
        assert_eq!(m.get(1, 1), 4.0);
    }

    #[test]
    fn test_assembler_rejects_unaddressable_shapes() {
        assert!(matches!(
            CellAssembler::sized(1 << 61, 1, 0),
            Err(StorageError::Unaddressable { cols: 1, .. })
        ));
        assert!(matches!(
            CellAssembler::sized(usize::MAX, usize::MAX, 0),
            Err(StorageError::Unaddressable { .. })
        ));
        assert!(CellAssembler::sized(1_000, 1_000, 10).is_ok());
    }

    #[test]
    fn test_assembler_infers_dimensions() {
        let props = ReadProperties::new("x", StorageFormat::TextCell, 0, 0);
        let mut asm = CellAssembler::for_props(&props).unwrap();
        asm.push(4, 1, 2.0).unwrap();
        asm.push(0, 6, -1.0).unwrap();
        let m = asm.finish().unwrap();
        assert_eq!(m.dimensions(), (5, 7));
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.get(4, 1), 2.0);
        assert_eq!(m.get(0, 6), -1.0);

        let empty = CellAssembler::for_props(&props).unwrap().finish().unwrap();
        assert_eq!(empty.dimensions(), (0, 0));
    }
}
