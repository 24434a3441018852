//! Binary block format
//!
//! A 48-byte header followed by every `block_rows x block_cols` block in
//! block-row-major order. Each block is a dense row-major run of
//! little-endian f64 values; edge blocks are truncated to the matrix bounds.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[cfg(feature = "mmap")]
use memmap2::MmapOptions;

use dataconv_core::MatrixBlock;

use super::{
    resolve_dimensions, MatrixCharacteristics, MatrixReader, MatrixWriter, ReadProperties,
    StorageError, StorageResult,
};

/// Fixed-size header (48 bytes, 8-byte aligned)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Magic bytes: "MBLK"
    pub magic: [u8; 4],
    /// Format version (1)
    pub version: u8,
    pub rows: u64,
    pub cols: u64,
    pub block_rows: u64,
    pub block_cols: u64,
    pub nnz: u64,
}

impl BlockHeader {
    pub const MAGIC: [u8; 4] = *b"MBLK";

    pub const VERSION: u8 = 1;

    /// Size of the header in bytes
    pub const SIZE: usize = 48;

    pub fn new(characteristics: &MatrixCharacteristics) -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            rows: characteristics.rows as u64,
            cols: characteristics.cols as u64,
            block_rows: characteristics.block_rows as u64,
            block_cols: characteristics.block_cols as u64,
            nnz: characteristics.nnz as u64,
        }
    }

    /// Parse and validate a header
    pub fn from_bytes(bytes: &[u8]) -> StorageResult<Self> {
        if bytes.len() < Self::SIZE {
            return Err(StorageError::BadHeader("file shorter than block header".to_string()));
        }
        if bytes[0..4] != Self::MAGIC {
            return Err(StorageError::BadHeader("invalid magic bytes".to_string()));
        }
        let version = bytes[4];
        if version > Self::VERSION {
            return Err(StorageError::BadHeader(format!("unsupported version {version}")));
        }

        let field = |offset: usize| -> StorageResult<u64> {
            let raw: [u8; 8] = bytes[offset..offset + 8]
                .try_into()
                .map_err(|_| StorageError::BadHeader("truncated header field".to_string()))?;
            Ok(u64::from_le_bytes(raw))
        };

        Ok(Self {
            magic: Self::MAGIC,
            version,
            rows: field(8)?,
            cols: field(16)?,
            block_rows: field(24)?,
            block_cols: field(32)?,
            nnz: field(40)?,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        // bytes 5..8 stay zero
        bytes[8..16].copy_from_slice(&self.rows.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.cols.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.block_rows.to_le_bytes());
        bytes[32..40].copy_from_slice(&self.block_cols.to_le_bytes());
        bytes[40..48].copy_from_slice(&self.nnz.to_le_bytes());
        bytes
    }

    fn dimensions(&self) -> StorageResult<(usize, usize, usize, usize)> {
        let to_usize = |v: u64| {
            usize::try_from(v).map_err(|_| StorageError::BadHeader(format!("{v} overflows")))
        };
        Ok((
            to_usize(self.rows)?,
            to_usize(self.cols)?,
            to_usize(self.block_rows)?,
            to_usize(self.block_cols)?,
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryBlockReader;

#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryBlockWriter;

impl MatrixReader for BinaryBlockReader {
    fn read(&self, props: &ReadProperties) -> StorageResult<MatrixBlock> {
        let file = File::open(&props.path)?;

        // SAFETY: the mapping is read-only and dropped before this call
        // returns; every access in `decode` is bounds-checked against its length.
        #[cfg(feature = "mmap")]
        let bytes = unsafe { MmapOptions::new().map(&file)? };

        #[cfg(not(feature = "mmap"))]
        let bytes = {
            use std::io::Read;

            let mut bytes = Vec::new();
            (&file).read_to_end(&mut bytes)?;
            bytes
        };

        decode(&bytes, props)
    }
}

impl MatrixWriter for BinaryBlockWriter {
    fn write(
        &self,
        matrix: &MatrixBlock,
        path: &Path,
        characteristics: &MatrixCharacteristics,
    ) -> StorageResult<()> {
        let (block_rows, block_cols) = (characteristics.block_rows, characteristics.block_cols);
        if block_rows == 0 || block_cols == 0 {
            return Err(StorageError::InvalidBlockSize {
                block_rows,
                block_cols,
            });
        }

        let header = BlockHeader::new(&MatrixCharacteristics {
            nnz: matrix.nnz(),
            ..*characteristics
        });
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&header.to_bytes())?;

        let (rows, cols) = matrix.dimensions();
        for bi in (0..rows).step_by(block_rows) {
            for bj in (0..cols).step_by(block_cols) {
                for i in bi..(bi + block_rows).min(rows) {
                    for j in bj..(bj + block_cols).min(cols) {
                        out.write_all(&matrix.get(i, j).to_le_bytes())?;
                    }
                }
            }
        }
        out.flush()?;
        Ok(())
    }
}

fn decode(bytes: &[u8], props: &ReadProperties) -> StorageResult<MatrixBlock> {
    let header = BlockHeader::from_bytes(bytes)?;
    let (rows, cols, block_rows, block_cols) = header.dimensions()?;
    let (rows, cols) = resolve_dimensions((props.rows, props.cols), (rows, cols))?;
    if block_rows == 0 || block_cols == 0 {
        return Err(StorageError::InvalidBlockSize {
            block_rows,
            block_cols,
        });
    }

    // The payload length bounds the allocation below.
    let payload_len = rows
        .checked_mul(cols)
        .and_then(|cells| cells.checked_mul(8))
        .ok_or(StorageError::Unaddressable { rows, cols })?;
    let payload = &bytes[BlockHeader::SIZE..];
    if payload.len() != payload_len {
        return Err(StorageError::BadHeader(format!(
            "expected {payload_len} payload bytes, found {}",
            payload.len()
        )));
    }
    let cells = payload_len / 8;

    let mut values = vec![0.0; cells];
    let mut words = payload.chunks_exact(8).map(|chunk| {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        f64::from_le_bytes(raw)
    });
    for bi in (0..rows).step_by(block_rows) {
        for bj in (0..cols).step_by(block_cols) {
            for i in bi..(bi + block_rows).min(rows) {
                for j in bj..(bj + block_cols).min(cols) {
                    if let Some(v) = words.next() {
                        values[i * cols + j] = v;
                    }
                }
            }
        }
    }

    let mut matrix = MatrixBlock::from_dense(rows, cols, values)?;
    matrix.examine_sparsity();
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageFormat;
    use tempfile::TempDir;

    #[test]
    fn test_header_round_trip() {
        let header = BlockHeader::new(&MatrixCharacteristics::new(5, 7, 2, 3, 9));
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"MBLK");
        assert_eq!(BlockHeader::from_bytes(&bytes).unwrap(), header);

        let mut bad = bytes;
        bad[0] = b'X';
        assert!(BlockHeader::from_bytes(&bad).is_err());
        assert!(BlockHeader::from_bytes(&bytes[..20]).is_err());
    }

    #[test]
    fn test_block_order() {
        // 3 x 3 with 2 x 2 blocks: [0..2 x 0..2], [0..2 x 2], [2 x 0..2], [2 x 2]
        let m = MatrixBlock::from_dense(3, 3, (1..=9).map(f64::from).collect()).unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.bin");
        let mc = MatrixCharacteristics::of(&m).with_block_size(2, 2);
        BinaryBlockWriter.write(&m, &path, &mc).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let payload: Vec<f64> = bytes[BlockHeader::SIZE..]
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(payload, vec![1.0, 2.0, 4.0, 5.0, 3.0, 6.0, 7.0, 8.0, 9.0]);

        let props = ReadProperties::new(&path, StorageFormat::BinaryBlock, 3, 3);
        let back = BinaryBlockReader.read(&props).unwrap();
        assert_eq!(back.dense_values(), m.dense_values());
    }

    #[test]
    fn test_header_shape_must_match_payload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.bin");
        let props = ReadProperties::new(&path, StorageFormat::BinaryBlock, 0, 0);

        let tall = BlockHeader::new(&MatrixCharacteristics::new(1 << 61, 1, 1, 1, 0));
        std::fs::write(&path, tall.to_bytes()).unwrap();
        assert!(matches!(
            BinaryBlockReader.read(&props),
            Err(StorageError::Unaddressable { cols: 1, .. })
        ));

        let square = BlockHeader::new(&MatrixCharacteristics::new(1 << 32, 1 << 32, 1, 1, 0));
        std::fs::write(&path, square.to_bytes()).unwrap();
        assert!(matches!(
            BinaryBlockReader.read(&props),
            Err(StorageError::Unaddressable { .. })
        ));

        let short = BlockHeader::new(&MatrixCharacteristics::new(1000, 1000, 10, 10, 0));
        let mut bytes = short.to_bytes().to_vec();
        bytes.extend_from_slice(&1.0f64.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();
        assert!(matches!(
            BinaryBlockReader.read(&props),
            Err(StorageError::BadHeader(_))
        ));
    }

    #[test]
    fn test_invalid_block_size() {
        let m = MatrixBlock::new(2, 2, false);
        let dir = TempDir::new().unwrap();
        let mc = MatrixCharacteristics::of(&m).with_block_size(0, 2);
        assert!(matches!(
            BinaryBlockWriter.write(&m, &dir.path().join("m"), &mc),
            Err(StorageError::InvalidBlockSize { .. })
        ));
    }
}
