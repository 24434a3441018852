//! Text cell format: one `row col value` line per non-zero, 1-indexed

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use dataconv_core::MatrixBlock;

use super::{
    CellAssembler, MatrixCharacteristics, MatrixReader, MatrixWriter, ReadProperties,
    StorageError, StorageResult,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TextCellReader;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextCellWriter;

impl MatrixReader for TextCellReader {
    fn read(&self, props: &ReadProperties) -> StorageResult<MatrixBlock> {
        let reader = BufReader::new(File::open(&props.path)?);
        let mut cells = CellAssembler::for_props(props)?;

        for (ix, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let (row, col, value) = parse_cell_line(&line, ix + 1)?;
            cells.push(row, col, value)?;
        }
        cells.finish()
    }
}

impl MatrixWriter for TextCellWriter {
    fn write(
        &self,
        matrix: &MatrixBlock,
        path: &Path,
        _characteristics: &MatrixCharacteristics,
    ) -> StorageResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        write_cells(matrix, &mut out)?;
        out.flush()?;
        Ok(())
    }
}

/// Parse a 1-indexed `row col value` line into a 0-indexed cell
pub(super) fn parse_cell_line(line: &str, line_no: usize) -> StorageResult<(usize, usize, f64)> {
    let parse_error = |message: String| StorageError::Parse {
        line: line_no,
        message,
    };

    let mut fields = line.split_whitespace();
    let (Some(row), Some(col), Some(value), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(parse_error(format!("expected `row col value`, found {line:?}")));
    };

    let row: usize = row
        .parse()
        .map_err(|_| parse_error(format!("invalid row index {row:?}")))?;
    let col: usize = col
        .parse()
        .map_err(|_| parse_error(format!("invalid column index {col:?}")))?;
    let value: f64 = value
        .parse()
        .map_err(|_| parse_error(format!("invalid value {value:?}")))?;

    if row == 0 || col == 0 {
        return Err(parse_error("cell indexes are 1-based".to_string()));
    }
    Ok((row - 1, col - 1, value))
}

/// Write every non-zero as a 1-indexed `row col value` line
pub(super) fn write_cells<W: Write>(matrix: &MatrixBlock, out: &mut W) -> StorageResult<()> {
    for (i, j, v) in matrix.iter_nonzeros() {
        writeln!(out, "{} {} {}", i + 1, j + 1, v)?;
    }
    Ok(())
}
