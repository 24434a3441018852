//! Binary cell format: packed little-endian `(row, col, value)` records,
//! 0-indexed, one per non-zero

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use dataconv_core::MatrixBlock;

use super::{
    CellAssembler, MatrixCharacteristics, MatrixReader, MatrixWriter, ReadProperties,
    StorageError, StorageResult,
};

/// One stored cell, fields kept little-endian on every platform
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct CellRecord {
    row: u64,
    col: u64,
    value_bits: u64,
}

impl CellRecord {
    /// Size of one record in bytes
    pub const SIZE: usize = 24;

    pub fn new(row: usize, col: usize, value: f64) -> Self {
        Self {
            row: (row as u64).to_le(),
            col: (col as u64).to_le(),
            value_bits: value.to_bits().to_le(),
        }
    }

    pub fn row(&self) -> u64 {
        u64::from_le(self.row)
    }

    pub fn col(&self) -> u64 {
        u64::from_le(self.col)
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(u64::from_le(self.value_bits))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCellReader;

#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCellWriter;

impl MatrixReader for BinaryCellReader {
    fn read(&self, props: &ReadProperties) -> StorageResult<MatrixBlock> {
        let bytes = std::fs::read(&props.path)?;
        if bytes.len() % CellRecord::SIZE != 0 {
            return Err(StorageError::BadHeader(format!(
                "file length {} is not a multiple of the {}-byte record size",
                bytes.len(),
                CellRecord::SIZE
            )));
        }

        let mut cells = CellAssembler::for_props(props)?;
        for chunk in bytes.chunks_exact(CellRecord::SIZE) {
            let record: CellRecord = bytemuck::pod_read_unaligned(chunk);
            let (row, col) = (to_index(record.row())?, to_index(record.col())?);
            cells.push(row, col, record.value())?;
        }
        cells.finish()
    }
}

impl MatrixWriter for BinaryCellWriter {
    fn write(
        &self,
        matrix: &MatrixBlock,
        path: &Path,
        _characteristics: &MatrixCharacteristics,
    ) -> StorageResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for (i, j, v) in matrix.iter_nonzeros() {
            out.write_all(bytemuck::bytes_of(&CellRecord::new(i, j, v)))?;
        }
        out.flush()?;
        Ok(())
    }
}

fn to_index(value: u64) -> StorageResult<usize> {
    usize::try_from(value).map_err(|_| StorageError::BadHeader(format!("index {value} overflows")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageFormat;
    use tempfile::NamedTempFile;

    #[test]
    fn test_record_layout() {
        assert_eq!(std::mem::size_of::<CellRecord>(), CellRecord::SIZE);
        let record = CellRecord::new(1, 2, 0.5);
        let bytes = bytemuck::bytes_of(&record);
        assert_eq!(&bytes[0..8], &1u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &2u64.to_le_bytes());
        assert_eq!(&bytes[16..24], &0.5f64.to_le_bytes());
        assert_eq!(record.value(), 0.5);
    }

    #[test]
    fn test_truncated_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 30]).unwrap();
        file.flush().unwrap();

        let props = ReadProperties::new(file.path(), StorageFormat::BinaryCell, 2, 2);
        assert!(matches!(
            BinaryCellReader.read(&props),
            Err(StorageError::BadHeader(_))
        ));
    }

    #[test]
    fn test_out_of_bounds_record() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytemuck::bytes_of(&CellRecord::new(0, 5, 1.0))).unwrap();
        file.flush().unwrap();

        let props = ReadProperties::new(file.path(), StorageFormat::BinaryCell, 2, 2);
        assert!(matches!(
            BinaryCellReader.read(&props),
            Err(StorageError::OutOfBounds { row: 1, col: 6, .. })
        ));

        let inferred = ReadProperties::new(file.path(), StorageFormat::BinaryCell, 0, 0);
        let m = BinaryCellReader.read(&inferred).unwrap();
        assert_eq!(m.dimensions(), (1, 6));
        assert_eq!(m.get(0, 5), 1.0);
    }
}
