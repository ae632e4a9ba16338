//! Error types for grid, field and assembly operations.

use thiserror::Error;

/// Errors raised while describing a voxel problem or assembling its system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A field's length does not match the grid it is used with.
    #[error("{field} has {actual} values, grid expects {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A conductivity or capacity value is negative, zero where forbidden, or non-finite.
    #[error("invalid {field} value {value} at index {index}")]
    InvalidMaterial {
        field: &'static str,
        index: usize,
        value: f64,
    },

    /// A source value is non-finite.
    #[error("invalid source value {value} at voxel {index}")]
    InvalidSource { index: usize, value: f64 },

    /// Grid dimensions or pitches are unusable.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Boundary policy strength is zero, negative or non-finite.
    #[error("invalid boundary policy: {0}")]
    InvalidBoundary(String),

    /// The assembled matrix has no anchor to a reference value.
    #[error("underconstrained system: {0}")]
    UnderconstrainedSystem(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
