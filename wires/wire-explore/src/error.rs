//! Error types for exploration sessions.

use thiserror::Error;
use wire_inflate::InflateError;
use wire_params::ParamError;
use wire_symmetry::SymmetryError;
use wire_types::WireError;

/// Result type for exploration operations.
pub type ExploreResult<T> = Result<T, ExploreError>;

/// Errors that can occur during an exploration session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExploreError {
    /// The operation needs an inflated mesh.
    #[error("{0} needs an inflated mesh; call periodic_inflate first")]
    NotInflated(&'static str),

    /// The default thickness is not a positive finite number.
    #[error("invalid default thickness {0}")]
    InvalidThickness(f64),

    /// The cell size is not a positive finite number.
    #[error("invalid cell size {0}")]
    InvalidCellSize(f64),

    /// An output attribute does not have one entry per element.
    #[error("attribute {name} has {actual} values, expected {expected}")]
    AttributeSizeMismatch {
        /// Attribute name.
        name: String,
        /// Elements times width.
        expected: usize,
        /// Values supplied.
        actual: usize,
    },

    /// Inflation or mesh post-processing failed.
    #[error(transparent)]
    Inflate(#[from] InflateError),

    /// Parameter handling failed.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// Symmetry analysis failed.
    #[error(transparent)]
    Symmetry(#[from] SymmetryError),

    /// The wire network is malformed or could not be loaded.
    #[error(transparent)]
    Wire(#[from] WireError),
}
