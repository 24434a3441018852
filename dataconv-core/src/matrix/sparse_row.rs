//! Per-row storage for sparse matrix blocks

use alloc::vec::Vec;

/// Column-indexed non-zero values of a single row
///
/// Values are appended unsorted and put in column order by [`SparseRow::sort`].
/// Lookups and in-place updates assume the row is sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseRow {
    indexes: Vec<usize>,
    values: Vec<f64>,
}

impl SparseRow {
    /// Create an empty row
    pub const fn new() -> Self {
        Self {
            indexes: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Create an empty row with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indexes: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Column indexes of the stored entries
    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }

    /// Values of the stored entries
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate `(column, value)` pairs in storage order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indexes.iter().copied().zip(self.values.iter().copied())
    }

    /// Append an entry without keeping column order
    pub fn append(&mut self, col: usize, value: f64) {
        self.indexes.push(col);
        self.values.push(value);
    }

    /// True if column indexes are strictly ascending
    pub fn is_sorted(&self) -> bool {
        self.indexes.windows(2).all(|w| w[0] < w[1])
    }

    /// Sort entries by column, keeping the last appended value for duplicates
    ///
    /// Returns the number of duplicate entries removed.
    pub fn sort(&mut self) -> usize {
        if self.is_sorted() {
            return 0;
        }

        let mut entries: Vec<(usize, f64)> = self.iter().collect();
        entries.sort_by_key(|&(col, _)| col);

        let before = entries.len();
        self.indexes.clear();
        self.values.clear();
        for (col, value) in entries {
            match self.indexes.last() {
                Some(&last) if last == col => {
                    if let Some(slot) = self.values.last_mut() {
                        *slot = value;
                    }
                }
                _ => self.append(col, value),
            }
        }

        // A duplicate may have overwritten a non-zero with zero
        let mut write = 0;
        for read in 0..self.indexes.len() {
            if self.values[read] != 0.0 {
                self.indexes[write] = self.indexes[read];
                self.values[write] = self.values[read];
                write += 1;
            }
        }
        self.indexes.truncate(write);
        self.values.truncate(write);

        before - write
    }

    /// Value at `col`, zero if not stored
    pub fn get(&self, col: usize) -> f64 {
        match self.indexes.binary_search(&col) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Set the value at `col`, returning the previous value
    ///
    /// Writing zero removes the entry.
    pub fn set(&mut self, col: usize, value: f64) -> f64 {
        match self.indexes.binary_search(&col) {
            Ok(pos) => {
                let old = self.values[pos];
                if value == 0.0 {
                    self.indexes.remove(pos);
                    self.values.remove(pos);
                } else {
                    self.values[pos] = value;
                }
                old
            }
            Err(pos) => {
                if value != 0.0 {
                    self.indexes.insert(pos, col);
                    self.values.insert(pos, value);
                }
                0.0
            }
        }
    }

    /// Remove all entries, keeping allocated capacity
    pub fn clear(&mut self) {
        self.indexes.clear();
        self.values.clear();
    }
}
