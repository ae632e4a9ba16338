//! Error types for stack and design loading.

use thiserror::Error;

/// Errors raised while loading or rasterizing a design.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A design or technology file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A design file is not valid JSON for the expected schema.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Technology file syntax error.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A stack layer has unusable thickness or conductivity.
    #[error("invalid stack: {0}")]
    InvalidStack(String),

    /// Die extent, block geometry or viewport is unusable.
    #[error("invalid design: {0}")]
    InvalidDesign(String),

    /// The rasterized output does not fit the target grid.
    #[error(transparent)]
    Core(#[from] thermovox_core::Error),
}

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;
