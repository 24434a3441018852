//! Error types for container operations

/// Errors that can occur while building or reading containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerError {
    /// Buffer length or row width does not match the declared dimensions
    DimensionMismatch,
    /// Row or column index out of bounds
    IndexOutOfBounds,
    /// Row or column set does not match the frame schema
    SchemaMismatch,
    /// A textual value could not be parsed into its declared kind
    ValueParse,
    /// Dimensions too large to address
    CapacityOverflow,
}

impl core::fmt::Display for ContainerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ContainerError::DimensionMismatch => "Dimensions do not match buffer length",
            ContainerError::IndexOutOfBounds => "Index out of bounds",
            ContainerError::SchemaMismatch => "Values do not match frame schema",
            ContainerError::ValueParse => "Value cannot be parsed into its declared kind",
            ContainerError::CapacityOverflow => "Dimensions exceed addressable capacity",
        };
        write!(f, "{msg}")
    }
}

/// Result type for container operations
pub type Result<T> = core::result::Result<T, ContainerError>;

impl core::error::Error for ContainerError {}
