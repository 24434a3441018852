//! Matrix Market coordinate format
//!
//! A banner line, optional `%` comments, a `rows cols nnz` size line, then
//! 1-indexed `row col value` entries. Declared dimensions of 0 x 0 take the
//! size line as given.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use dataconv_core::MatrixBlock;

use super::text_cell::{parse_cell_line, write_cells};
use super::{
    resolve_dimensions, CellAssembler, MatrixCharacteristics, MatrixReader, MatrixWriter,
    ReadProperties, StorageError, StorageResult,
};

const BANNER: &str = "%%MatrixMarket matrix coordinate real general";

#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixMarketReader;

#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixMarketWriter;

impl MatrixReader for MatrixMarketReader {
    fn read(&self, props: &ReadProperties) -> StorageResult<MatrixBlock> {
        let reader = BufReader::new(File::open(&props.path)?);
        let mut lines = reader.lines().enumerate();

        let banner = match lines.next() {
            Some((_, line)) => line?,
            None => return Err(StorageError::BadHeader("empty file".to_string())),
        };
        check_banner(&banner)?;

        let mut cells: Option<CellAssembler> = None;
        for (ix, line) in lines {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('%') {
                continue;
            }

            match cells.as_mut() {
                Some(cells) => {
                    let (row, col, value) = parse_cell_line(trimmed, ix + 1)?;
                    cells.push(row, col, value)?;
                }
                None => {
                    let (rows, cols, nnz) = parse_size_line(trimmed, ix + 1)?;
                    let (rows, cols) = resolve_dimensions((props.rows, props.cols), (rows, cols))?;
                    cells = Some(CellAssembler::sized(rows, cols, nnz)?);
                }
            }
        }

        cells
            .ok_or_else(|| StorageError::BadHeader("missing size line".to_string()))?
            .finish()
    }
}

impl MatrixWriter for MatrixMarketWriter {
    fn write(
        &self,
        matrix: &MatrixBlock,
        path: &Path,
        _characteristics: &MatrixCharacteristics,
    ) -> StorageResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{BANNER}")?;
        writeln!(out, "{} {} {}", matrix.rows(), matrix.cols(), matrix.nnz())?;
        write_cells(matrix, &mut out)?;
        out.flush()?;
        Ok(())
    }
}

fn check_banner(line: &str) -> StorageResult<()> {
    let tokens: Vec<String> = line.split_whitespace().map(str::to_ascii_lowercase).collect();
    let supported = tokens.len() == 5
        && tokens[0] == "%%matrixmarket"
        && tokens[1] == "matrix"
        && tokens[2] == "coordinate"
        && matches!(tokens[3].as_str(), "real" | "integer")
        && tokens[4] == "general";
    if !supported {
        return Err(StorageError::BadHeader(format!("unsupported banner {line:?}")));
    }
    Ok(())
}

fn parse_size_line(line: &str, line_no: usize) -> StorageResult<(usize, usize, usize)> {
    let fields: Vec<usize> = line
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| StorageError::Parse {
            line: line_no,
            message: format!("invalid size line {line:?}"),
        })?;

    match fields.as_slice() {
        &[rows, cols, nnz] => Ok((rows, cols, nnz)),
        _ => Err(StorageError::Parse {
            line: line_no,
            message: format!("expected `rows cols nnz`, found {line:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageFormat;
    use tempfile::NamedTempFile;

    fn write_file(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_with_comments() {
        let file = write_file(
            "%%MatrixMarket matrix coordinate real general\n% generated\n%\n3 4 2\n1 4 2.5\n3 1 -1\n",
        );
        let props = ReadProperties::new(file.path(), StorageFormat::MatrixMarket, 0, 0);
        let m = MatrixMarketReader.read(&props).unwrap();
        assert_eq!(m.dimensions(), (3, 4));
        assert_eq!(m.get(0, 3), 2.5);
        assert_eq!(m.get(2, 0), -1.0);
    }

    #[test]
    fn test_declared_dimensions_must_match() {
        let file = write_file("%%MatrixMarket matrix coordinate real general\n3 4 0\n");
        let props = ReadProperties::new(file.path(), StorageFormat::MatrixMarket, 4, 4);
        assert!(matches!(
            MatrixMarketReader.read(&props),
            Err(StorageError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_headers() {
        let props = |f: &NamedTempFile| ReadProperties::new(f.path(), StorageFormat::MatrixMarket, 0, 0);

        let array = write_file("%%MatrixMarket matrix array real general\n2 2\n");
        assert!(matches!(
            MatrixMarketReader.read(&props(&array)),
            Err(StorageError::BadHeader(_))
        ));

        let no_size = write_file("%%MatrixMarket matrix coordinate real general\n% only comments\n");
        assert!(matches!(
            MatrixMarketReader.read(&props(&no_size)),
            Err(StorageError::BadHeader(_))
        ));

        let empty = write_file("");
        assert!(MatrixMarketReader.read(&props(&empty)).is_err());
    }

    #[test]
    fn test_oversized_size_line() {
        let props = |f: &NamedTempFile| ReadProperties::new(f.path(), StorageFormat::MatrixMarket, 0, 0);

        let tall = write_file("%%MatrixMarket matrix coordinate real general\n2305843009213693952 1 0\n");
        assert!(matches!(
            MatrixMarketReader.read(&props(&tall)),
            Err(StorageError::Unaddressable { cols: 1, .. })
        ));

        let huge = format!(
            "%%MatrixMarket matrix coordinate real general\n{} {} 1\n1 1 1.0\n",
            usize::MAX,
            usize::MAX
        );
        let huge = write_file(&huge);
        assert!(matches!(
            MatrixMarketReader.read(&props(&huge)),
            Err(StorageError::Unaddressable { .. })
        ));
    }
}
