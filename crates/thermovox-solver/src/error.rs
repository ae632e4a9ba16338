//! Error types for solver operations.

use thiserror::Error;

/// Errors raised while solving an assembled voxel system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Problem description or assembly was rejected.
    #[error(transparent)]
    Core(#[from] thermovox_core::Error),

    /// Factorization failed or the solution is not finite.
    #[error("solver diverged: {0}")]
    SolverDiverged(String),

    /// Forward-Euler step exceeds the explicit stability bound.
    #[error("time step {dt:.3e} s exceeds stability bound {dt_max:.3e} s")]
    UnstableStep { dt: f64, dt_max: f64 },

    /// Solved value lies outside its physically admissible range.
    #[error("non-physical value {value} at voxel {index}, expected [{min}, {max}]")]
    NonPhysicalSolution {
        index: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A solver parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operand sizes disagree.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type for solver operations.
pub type Result<T> = std::result::Result<T, Error>;
