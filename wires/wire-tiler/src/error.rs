//! Error types for tiling.

use thiserror::Error;
use wire_params::ParamError;
use wire_types::WireError;

/// Result type for tiling operations.
pub type TilerResult<T> = Result<T, TilerError>;

/// Errors that can occur while tiling.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TilerError {
    /// The guide mesh is malformed.
    #[error("invalid guide mesh: {0}")]
    InvalidGuideMesh(String),

    /// Pattern and guide mesh dimensions differ.
    #[error("pattern is {pattern}D but the guide mesh is {guide}D")]
    DimensionMismatch {
        /// Pattern dimension.
        pattern: usize,
        /// Guide mesh dimension.
        guide: usize,
    },

    /// The pattern has no extent along an axis it must fill.
    #[error("pattern has zero extent along axis {axis}")]
    DegeneratePattern {
        /// Axis index.
        axis: usize,
    },

    /// A cell requests a pattern that does not exist.
    #[error("cell {cell} requests pattern {pattern_id}, but only {available} patterns exist")]
    PatternNotFound {
        /// Cell index.
        cell: usize,
        /// Requested pattern id.
        pattern_id: f64,
        /// Number of patterns.
        available: usize,
    },

    /// Per-cell DOF attributes are incomplete.
    #[error("guide mesh has per-cell DOFs but lacks attribute {0}")]
    MissingDofAttribute(String),

    /// Patterns tiled together use different thickness targets.
    #[error("patterns mix vertex and edge thickness")]
    ThicknessTargetMismatch,

    /// Error from the parameters of a pattern.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// Error from the wire network.
    #[error(transparent)]
    Wire(#[from] WireError),
}
