//! Error types for sweep operations.

use thiserror::Error;

/// Errors that can occur while running a sweep.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SweepError {
    /// A case was rejected during assembly or failed to solve.
    #[error("Solver error: {0}")]
    Solver(#[from] thermovox_solver::Error),

    /// Invalid sweep setup.
    #[error("Invalid sweep configuration: {0}")]
    InvalidConfig(String),
}

impl From<thermovox_core::Error> for SweepError {
    fn from(e: thermovox_core::Error) -> Self {
        Self::Solver(e.into())
    }
}

/// Result type for sweep operations.
pub type Result<T> = std::result::Result<T, SweepError>;
