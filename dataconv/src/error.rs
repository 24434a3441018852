//! Error types for conversions
//!
//! Every failure surfaces as one [`ConvertError`] naming the conversion
//! that failed. Storage failures are wrapped without retry, type-coercion
//! failures propagate as soon as the offending cell is seen.

use dataconv_core::{ContainerError, ValueKind};

use crate::storage::StorageError;

/// Errors raised by conversion operations
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{operation} failed: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("cannot interpret {kind} value {value:?} at ({row}, {col}) as a number")]
    TypeCoercion {
        row: usize,
        col: usize,
        kind: ValueKind,
        value: String,
    },

    #[error("{operation} failed: {source}")]
    Container {
        operation: &'static str,
        source: ContainerError,
    },

    #[error("{operation} failed: destination holds {available} cells, {required} required")]
    DestinationTooSmall {
        operation: &'static str,
        required: usize,
        available: usize,
    },

    #[error("matrix handle could not be acquired for reading: {0}")]
    LeaseUnavailable(String),
}

impl ConvertError {
    /// Wrap a container error with the name of the failing conversion
    pub(crate) fn container(operation: &'static str) -> impl FnOnce(ContainerError) -> Self {
        move |source| ConvertError::Container { operation, source }
    }

    pub(crate) fn io(operation: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| ConvertError::Io { operation, source }
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;
