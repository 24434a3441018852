//! JSON metadata sidecar stored at `<path>.mtd`

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{MatrixCharacteristics, ReadProperties, StorageFormat, StorageResult};

/// Shape and format of a stored matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixMetadata {
    pub format: StorageFormat,
    #[serde(flatten)]
    pub characteristics: MatrixCharacteristics,
}

impl MatrixMetadata {
    pub fn new(format: StorageFormat, characteristics: MatrixCharacteristics) -> Self {
        Self {
            format,
            characteristics,
        }
    }

    /// Reader properties for the data file at `path`
    ///
    /// The recorded non-zero count becomes the sparsity hint.
    pub fn read_properties(&self, path: &Path) -> ReadProperties {
        let mc = &self.characteristics;
        let cells = mc.rows as f64 * mc.cols as f64;
        let sparsity = if cells > 0.0 { mc.nnz as f64 / cells } else { 0.0 };

        ReadProperties::new(path, self.format, mc.rows, mc.cols)
            .with_block_size(mc.block_rows, mc.block_cols)
            .with_expected_sparsity(sparsity)
    }
}

/// Sidecar path for a data file
pub fn metadata_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".mtd");
    PathBuf::from(name)
}

pub fn write_metadata(path: &Path, metadata: &MatrixMetadata) -> StorageResult<()> {
    let mut out = BufWriter::new(File::create(metadata_path(path))?);
    serde_json::to_writer_pretty(&mut out, metadata)?;
    out.flush()?;
    Ok(())
}

pub fn read_metadata(path: &Path) -> StorageResult<MatrixMetadata> {
    let reader = BufReader::new(File::open(metadata_path(path))?);
    Ok(serde_json::from_reader(reader)?)
}
