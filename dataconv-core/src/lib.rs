#![no_std]

//! dataconv core - matrix and frame container definitions
//!
//! This crate provides the in-memory containers that the `dataconv`
//! conversion layer reads from and writes to: a dense/sparse matrix block,
//! a columnar frame block, coordinate accumulation maps and the density rule
//! shared by every storage-mode decision. No I/O happens here.

extern crate alloc;

pub mod coordinate;
pub mod density;
pub mod error;
pub mod frame;
pub mod matrix;
pub mod value;

pub use coordinate::{CellIndex, CellMap, CoordinateSource, CrossTabMap};
pub use density::{eval_sparse_format, SKINNY_MATRIX_TURN_POINT, SPARSITY_TURN_POINT};
pub use error::*;
pub use frame::{FrameBlock, FrameColumn};
pub use matrix::{MatrixBlock, SparseRow, StorageMode};
pub use value::{CellValue, ValueKind};
