//! Columnar frame block
//!
//! A [`FrameBlock`] stores one homogeneous column per declared [`ValueKind`].
//! Numeric and boolean columns hold raw values and store a default for a
//! null write; string columns keep an explicit null marker.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::value::{CellValue, ValueKind};
use crate::{ContainerError, Result};

/// One frame column, homogeneous in its declared kind
#[derive(Debug, Clone, PartialEq)]
pub enum FrameColumn {
    String(Vec<Option<String>>),
    Int64(Vec<i64>),
    Double(Vec<f64>),
    Boolean(Vec<bool>),
}

impl FrameColumn {
    /// Create an empty column of the given kind
    pub fn new(kind: ValueKind) -> Self {
        Self::with_capacity(kind, 0)
    }

    pub fn with_capacity(kind: ValueKind, capacity: usize) -> Self {
        match kind {
            ValueKind::String => FrameColumn::String(Vec::with_capacity(capacity)),
            ValueKind::Int64 => FrameColumn::Int64(Vec::with_capacity(capacity)),
            ValueKind::Double => FrameColumn::Double(Vec::with_capacity(capacity)),
            ValueKind::Boolean => FrameColumn::Boolean(Vec::with_capacity(capacity)),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            FrameColumn::String(_) => ValueKind::String,
            FrameColumn::Int64(_) => ValueKind::Int64,
            FrameColumn::Double(_) => ValueKind::Double,
            FrameColumn::Boolean(_) => ValueKind::Boolean,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FrameColumn::String(v) => v.len(),
            FrameColumn::Int64(v) => v.len(),
            FrameColumn::Double(v) => v.len(),
            FrameColumn::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell at `row`, `None` for a null string or an out-of-range row
    pub fn get(&self, row: usize) -> Option<CellValue> {
        match self {
            FrameColumn::String(v) => v.get(row)?.clone().map(CellValue::String),
            FrameColumn::Int64(v) => v.get(row).map(|&x| CellValue::Int64(x)),
            FrameColumn::Double(v) => v.get(row).map(|&x| CellValue::Double(x)),
            FrameColumn::Boolean(v) => v.get(row).map(|&x| CellValue::Boolean(x)),
        }
    }

    /// Append a cell; `None` appends the kind's null/default
    pub fn push(&mut self, value: Option<CellValue>) -> Result<()> {
        match (self, value) {
            (FrameColumn::String(v), None) => v.push(None),
            (FrameColumn::String(v), Some(CellValue::String(s))) => v.push(Some(s)),
            (FrameColumn::Int64(v), None) => v.push(0),
            (FrameColumn::Int64(v), Some(CellValue::Int64(x))) => v.push(x),
            (FrameColumn::Double(v), None) => v.push(0.0),
            (FrameColumn::Double(v), Some(CellValue::Double(x))) => v.push(x),
            (FrameColumn::Boolean(v), None) => v.push(false),
            (FrameColumn::Boolean(v), Some(CellValue::Boolean(x))) => v.push(x),
            _ => return Err(ContainerError::SchemaMismatch),
        }
        Ok(())
    }
}

/// Tabular container with a per-column declared kind and columnar storage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBlock {
    rows: usize,
    names: Vec<String>,
    columns: Vec<FrameColumn>,
}

impl FrameBlock {
    /// Create an empty frame with the given schema and default column names
    pub fn new(schema: &[ValueKind]) -> Self {
        Self {
            rows: 0,
            names: default_names(schema.len()),
            columns: schema.iter().map(|&kind| FrameColumn::new(kind)).collect(),
        }
    }

    /// Create a frame of `rows` rows and no columns
    pub fn without_columns(rows: usize) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Create an empty frame with explicit column names
    pub fn with_names(schema: &[ValueKind], names: Vec<String>) -> Result<Self> {
        if names.len() != schema.len() {
            return Err(ContainerError::SchemaMismatch);
        }
        let mut frame = Self::new(schema);
        frame.names = names;
        Ok(frame)
    }

    /// Create a frame from complete columns, all of equal length
    pub fn from_columns(columns: Vec<FrameColumn>) -> Result<Self> {
        let rows = columns.first().map_or(0, FrameColumn::len);
        if columns.iter().any(|c| c.len() != rows) {
            return Err(ContainerError::DimensionMismatch);
        }
        Ok(Self {
            rows,
            names: default_names(columns.len()),
            columns,
        })
    }

    /// Parse textual rows into a frame of the given schema
    ///
    /// Empty fields are null. Every row must have one field per column.
    pub fn from_string_rows<S: AsRef<str>>(
        schema: &[ValueKind],
        names: Option<Vec<String>>,
        rows: &[Vec<S>],
    ) -> Result<Self> {
        let mut frame = match names {
            Some(names) => Self::with_names(schema, names)?,
            None => Self::new(schema),
        };

        for row in rows {
            if row.len() != schema.len() {
                return Err(ContainerError::DimensionMismatch);
            }
            for (column, field) in frame.columns.iter_mut().zip(row) {
                let field = field.as_ref();
                let value = if field.is_empty() {
                    None
                } else {
                    Some(column.kind().parse_value(field)?)
                };
                column.push(value)?;
            }
            frame.rows += 1;
        }

        Ok(frame)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    /// Declared kind of every column, in order
    pub fn schema(&self) -> Vec<ValueKind> {
        self.columns.iter().map(FrameColumn::kind).collect()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Replace all column names
    pub fn set_column_names(&mut self, names: Vec<String>) -> Result<()> {
        if names.len() != self.columns.len() {
            return Err(ContainerError::SchemaMismatch);
        }
        self.names = names;
        Ok(())
    }

    pub fn column(&self, col: usize) -> Option<&FrameColumn> {
        self.columns.get(col)
    }

    /// Raw values of a double column, `None` for other kinds
    pub fn double_column(&self, col: usize) -> Option<&[f64]> {
        match self.columns.get(col)? {
            FrameColumn::Double(values) => Some(values),
            _ => None,
        }
    }

    /// True if every column is declared double
    pub fn is_homogeneous_double(&self) -> bool {
        self.columns
            .iter()
            .all(|c| matches!(c, FrameColumn::Double(_)))
    }

    /// Cell at (`row`, `col`), `None` for nulls and out-of-range positions
    pub fn get(&self, row: usize, col: usize) -> Option<CellValue> {
        self.columns.get(col)?.get(row)
    }

    /// All cells of one row
    pub fn row(&self, row: usize) -> Vec<Option<CellValue>> {
        self.columns.iter().map(|c| c.get(row)).collect()
    }

    /// Append one row, one optional cell per column
    pub fn append_row(&mut self, row: &[Option<CellValue>]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ContainerError::SchemaMismatch);
        }
        // Validate first so a failed append leaves columns aligned
        for (column, value) in self.columns.iter().zip(row) {
            if let Some(value) = value {
                if value.kind() != column.kind() {
                    return Err(ContainerError::SchemaMismatch);
                }
            }
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.push(value.clone())?;
        }
        self.rows += 1;
        Ok(())
    }

    /// Append a complete column at the right edge
    ///
    /// The first column of a frame without rows sets the row count.
    pub fn append_column(&mut self, name: Option<String>, column: FrameColumn) -> Result<()> {
        if self.columns.is_empty() && self.rows == 0 {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(ContainerError::DimensionMismatch);
        }
        let name = name.unwrap_or_else(|| format!("C{}", self.columns.len() + 1));
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Textual form of every cell, row by row; nulls stay `None`
    pub fn string_rows(&self) -> Vec<Vec<Option<String>>> {
        (0..self.rows)
            .map(|i| {
                self.columns
                    .iter()
                    .map(|c| c.get(i).map(|v| format!("{v}")))
                    .collect()
            })
            .collect()
    }
}

fn default_names(n: usize) -> Vec<String> {
    (1..=n).map(|j| format!("C{j}")).collect()
}
