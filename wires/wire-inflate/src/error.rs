//! Error types for inflation.

use std::path::PathBuf;
use thiserror::Error;
use wire_params::ParamError;
use wire_types::WireError;

use crate::collab::ToolError;
use crate::result::InflatorState;

/// Result type for inflation operations.
pub type InflateResult<T> = Result<T, InflateError>;

/// Errors that can occur while inflating or post-processing a wire network.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InflateError {
    /// A strut is too thick for its length.
    #[error(
        "thickness {thickness} on edge {edge} exceeds {aspect_max} x edge length {length}"
    )]
    GeometryAspect {
        /// Edge index.
        edge: usize,
        /// Largest thickness at either end of the edge.
        thickness: f64,
        /// Edge length.
        length: f64,
        /// Configured aspect limit.
        aspect_max: f64,
    },

    /// The junctions at both ends of an edge reach past each other.
    #[error("junctions overlap on edge {edge}: pullback {pullback} >= length {length}")]
    GeometryOverlap {
        /// Edge index.
        edge: usize,
        /// Sum of the pullback distances at both ends.
        pullback: f64,
        /// Edge length.
        length: f64,
    },

    /// A junction could not be closed into a watertight patch.
    #[error("junction at vertex {vertex} is not watertight: {reason}")]
    GeometryJunction {
        /// Wire vertex index.
        vertex: usize,
        /// What went wrong.
        reason: String,
    },

    /// A thickness value is not a positive finite number.
    #[error("invalid thickness {value} at index {index}")]
    GeometryThickness {
        /// Index into the thickness field.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// The thickness field length does not fit the network.
    #[error("thickness field has {actual} values, expected {expected}")]
    ThicknessFieldMismatch {
        /// Number of vertices or edges.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// The profile is unusable.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// The profile kind does not fit the network dimension.
    #[error("a {profile}-point profile cannot inflate a {dim}D network")]
    ProfileDimensionMismatch {
        /// Number of profile points.
        profile: usize,
        /// Network dimension.
        dim: usize,
    },

    /// The inflated surface intersects itself and the policy is fatal.
    #[error("surface has {count} self-intersecting face pairs, first ({first:?})")]
    SelfIntersection {
        /// Number of intersecting pairs.
        count: usize,
        /// First intersecting face pair.
        first: (usize, usize),
    },

    /// A collaborator (volume mesher, refiner, intersection detector) failed.
    #[error("{tool} failed: {source}")]
    ExternalTool {
        /// Collaborator name.
        tool: String,
        /// The collaborator's own error.
        #[source]
        source: ToolError,
    },

    /// A refinement step produced inconsistent data.
    #[error("invalid refinement: {0}")]
    InvalidRefinement(String),

    /// The operation is not available in the mesh's current state.
    #[error("cannot {operation} a mesh in state {state:?}")]
    InvalidState {
        /// What was attempted.
        operation: &'static str,
        /// Current state.
        state: InflatorState,
    },

    /// A correction table row does not fit the profile.
    #[error("correction for {class} has {actual} offsets, loop has {expected} points")]
    CorrectionMismatch {
        /// Edge class name.
        class: &'static str,
        /// Number of loop points.
        expected: usize,
        /// Number of offsets in the table.
        actual: usize,
    },

    /// Parse error in a correction table.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Parameter evaluation failed.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// The network is malformed.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InflateError {
    /// Create a `Parse` error for the given line.
    #[must_use]
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create a `GeometryJunction` error.
    #[must_use]
    pub fn junction(vertex: usize, reason: impl Into<String>) -> Self {
        Self::GeometryJunction {
            vertex,
            reason: reason.into(),
        }
    }

    /// Wrap a collaborator failure, keeping its error as the source.
    #[must_use]
    pub fn external(tool: impl Into<String>, error: impl Into<ToolError>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            source: error.into(),
        }
    }

    /// Whether this is one of the geometry errors raised by inflation
    /// itself, as opposed to bad input data or a collaborator failure.
    #[must_use]
    pub const fn is_geometry(&self) -> bool {
        matches!(
            self,
            Self::GeometryAspect { .. }
                | Self::GeometryOverlap { .. }
                | Self::GeometryJunction { .. }
                | Self::GeometryThickness { .. }
        )
    }
}
