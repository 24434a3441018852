//! dataconv - conversions between matrix, frame, array and coordinate-map
//! representations
//!
//! ## Architecture
//!
//! - **dataconv-core**: container definitions and the density rule (no I/O)
//! - **dataconv**: the conversions themselves, read leases, `ndarray`
//!   interop and the storage boundary
//!
//! Every conversion reads its input without mutating it and returns a newly
//! allocated result.
//!
//! ## Quick Start
//!
//! ```rust
//! use dataconv::{frame_to_matrix, render_matrix, FrameBlock, FrameColumn, RenderConfig};
//!
//! fn example() -> dataconv::Result<()> {
//!     let frame = FrameBlock::from_columns(vec![
//!         FrameColumn::Double(vec![1.5, 3.5]),
//!         FrameColumn::Double(vec![2.5, 4.5]),
//!     ])
//!     .expect("equal column lengths");
//!
//!     let matrix = frame_to_matrix(&frame)?;
//!     assert_eq!(
//!         render_matrix(&matrix, &RenderConfig::default()),
//!         "1.500 2.500\n3.500 4.500\n"
//!     );
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! ## Features
//!
//! - **mmap**: memory-mapped reads of binary block files
//! - **serde**: serde derives on configs and core containers
//! - **cli**: the `dataconv` inspection binary

pub use dataconv_core::{
    // Containers
    FrameBlock, FrameColumn, MatrixBlock, SparseRow, StorageMode,
    // Values
    CellValue, ValueKind,
    // Coordinate maps
    CellIndex, CellMap, CoordinateSource, CrossTabMap,
    // Density rule
    eval_sparse_format, SKINNY_MATRIX_TURN_POINT, SPARSITY_TURN_POINT,
    ContainerError,
};

pub mod coordinates;
pub mod error;
pub mod flatten;
pub mod frame_bridge;
pub mod interop;
pub mod lease;
pub mod partition;
pub mod render;
pub mod storage;
pub mod tiling;

pub use coordinates::{materialize, materialize_inferred};
pub use error::{ConvertError, Result};
pub use flatten::{
    copy_to_double_vector, from_double_matrix, from_double_vector, to_boolean_vector,
    to_double_list, to_double_matrix, to_double_vector, to_int_vector, VectorOrientation,
};
pub use frame_bridge::{
    frame_to_matrix, frame_to_matrix_with, frame_to_string_rows, matrix_to_frame,
    matrix_to_frame_as, matrix_to_frame_with, matrix_to_frame_with_schema, string_rows_to_frame,
    string_rows_to_frame_with_names, string_rows_to_frame_with_schema, BridgeConfig,
};
pub use interop::{to_array2, to_real_matrix};
pub use lease::{lease, CachedMatrix, MatrixHandle, ReadLease};
pub use partition::{partition, PartitionAxis};
pub use render::{format_decimal, render_frame, render_matrix, RenderConfig, SparseRenderMode};
pub use storage::{
    create_reader, create_writer, read_matrix, read_matrix_with_metadata, write_matrix,
    MatrixCharacteristics, MatrixReader, MatrixWriter, ReadProperties, StorageError,
    StorageFormat,
};
