//! Diagnostic text rendering for matrices and frames
//!
//! Output is meant for humans. It is not a persistence format and is not
//! guaranteed to parse back.

use std::fmt::Write;

use dataconv_core::{CellValue, FrameBlock, MatrixBlock};

/// Layout used for matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SparseRenderMode {
    /// One `row col value` line per non-zero, 1-indexed
    Coordinates,
    /// Full grid, one line per row
    #[default]
    Rectangular,
}

/// Renderer settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderConfig {
    pub mode: SparseRenderMode,
    pub field_separator: String,
    pub line_separator: String,
    /// Row bound, `None` prints all rows
    pub max_rows: Option<usize>,
    /// Column bound, `None` prints all columns
    pub max_cols: Option<usize>,
    /// Minimum fraction digits, `None` for the default format
    pub decimal_places: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: SparseRenderMode::Rectangular,
            field_separator: " ".to_string(),
            line_separator: "\n".to_string(),
            max_rows: None,
            max_cols: None,
            decimal_places: Some(3),
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render matrices as 1-indexed coordinate triples
    pub fn coordinates(mut self) -> Self {
        self.mode = SparseRenderMode::Coordinates;
        self
    }

    pub fn with_mode(mut self, mode: SparseRenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_field_separator(mut self, separator: impl Into<String>) -> Self {
        self.field_separator = separator.into();
        self
    }

    pub fn with_line_separator(mut self, separator: impl Into<String>) -> Self {
        self.line_separator = separator.into();
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn with_max_cols(mut self, max_cols: usize) -> Self {
        self.max_cols = Some(max_cols);
        self
    }

    /// Set the minimum fraction digits, `None` restores the default format
    pub fn with_decimal_places(mut self, decimal_places: Option<usize>) -> Self {
        self.decimal_places = decimal_places;
        self
    }

    fn bounds(&self, rows: usize, cols: usize) -> (usize, usize) {
        (
            self.max_rows.map_or(rows, |r| r.min(rows)),
            self.max_cols.map_or(cols, |c| c.min(cols)),
        )
    }
}

/// Format a double without digit grouping
///
/// At least `decimal_places` and at most `max(decimal_places, 3)` fraction
/// digits are printed; zeros past the minimum are trimmed.
pub fn format_decimal(value: f64, decimal_places: Option<usize>) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let min = decimal_places.unwrap_or(0);
    let max = min.max(3);
    let mut text = format!("{value:.max$}");

    if let Some(dot) = text.find('.') {
        let keep = dot + 1 + min;
        let trimmed = text.trim_end_matches('0').len().max(keep);
        text.truncate(trimmed);
        if text.ends_with('.') {
            text.pop();
        }
    }

    // -0.0 and negatives that round to zero print like an implicit zero
    if text.starts_with('-') && text[1..].bytes().all(|b| b == b'0' || b == b'.') {
        text.remove(0);
    }
    text
}

/// Render a matrix according to `config`
pub fn render_matrix(matrix: &MatrixBlock, config: &RenderConfig) -> String {
    let (rows, cols) = config.bounds(matrix.rows(), matrix.cols());
    let sep = &config.field_separator;
    let eol = &config.line_separator;
    let mut out = String::new();

    match config.mode {
        SparseRenderMode::Coordinates => {
            // Sparse blocks iterate stored cells, dense blocks scan and skip zeros
            for (i, j, v) in matrix.iter_nonzeros() {
                if i < rows && j < cols {
                    let value = format_decimal(v, config.decimal_places);
                    let _ = write!(out, "{}{sep}{}{sep}{value}{eol}", i + 1, j + 1);
                }
            }
        }
        SparseRenderMode::Rectangular => {
            for i in 0..rows {
                for j in 0..cols {
                    if j > 0 {
                        out.push_str(sep);
                    }
                    out.push_str(&format_decimal(matrix.get(i, j), config.decimal_places));
                }
                out.push_str(eol);
            }
        }
    }
    out
}

/// Render a frame: a size header, column names, column kinds, then rows
///
/// Double cells use the decimal format, other kinds their plain text. Null
/// cells print as empty fields.
pub fn render_frame(frame: &FrameBlock, config: &RenderConfig) -> String {
    let (rows, cols) = config.bounds(frame.rows(), frame.cols());
    let sep = &config.field_separator;
    let eol = &config.line_separator;
    let mut out = String::new();

    let _ = write!(
        out,
        "# FRAME: nrow = {}, ncol = {}{eol}",
        frame.rows(),
        frame.cols()
    );

    out.push('#');
    out.push_str(sep);
    out.push_str(&frame.column_names()[..cols].join(sep));
    out.push_str(eol);

    let kinds: Vec<String> = frame.schema()[..cols].iter().map(|k| k.to_string()).collect();
    out.push('#');
    out.push_str(sep);
    out.push_str(&kinds.join(sep));
    out.push_str(eol);

    for i in 0..rows {
        for j in 0..cols {
            if j > 0 {
                out.push_str(sep);
            }
            match frame.get(i, j) {
                Some(CellValue::Double(v)) => {
                    out.push_str(&format_decimal(v, config.decimal_places));
                }
                Some(other) => {
                    let _ = write!(out, "{other}");
                }
                None => {}
            }
        }
        out.push_str(eol);
    }
    out
}
