//! Error types for design parameters.

use std::path::PathBuf;
use thiserror::Error;
use wire_symmetry::SymmetryError;
use wire_types::WireError;

/// Result type for parameter operations.
pub type ParamResult<T> = Result<T, ParamError>;

/// Errors raised while parsing or evaluating a formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FormulaError {
    /// A variable is referenced but not bound.
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    /// A function name is not one of the built-ins.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// The formula text is malformed.
    #[error("syntax error at offset {position}: {message}")]
    Syntax {
        /// Byte offset into the formula text.
        position: usize,
        /// Description of the problem.
        message: String,
    },
}

impl FormulaError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Errors that can occur while building or evaluating parameters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParamError {
    /// A formula failed to parse or evaluate.
    #[error("formula error: {0}")]
    Formula(#[from] FormulaError),

    /// A region of interest references an index outside the target range.
    #[error("ROI index {index} is out of range for {count} {target}s")]
    RoiOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of vertices or edges.
        count: usize,
        /// `vertex` or `edge`.
        target: &'static str,
    },

    /// Offset directions do not match the ROI.
    #[error("{directions} directions given for a ROI of {roi} vertices")]
    DirectionCountMismatch {
        /// ROI size.
        roi: usize,
        /// Number of direction vectors supplied.
        directions: usize,
    },

    /// Axis index outside the network dimension.
    #[error("axis {axis} is invalid in {dim}D")]
    InvalidAxis {
        /// Requested axis.
        axis: usize,
        /// Network dimension.
        dim: usize,
    },

    /// A DOF vector of the wrong length was supplied.
    #[error("expected {expected} DOFs, got {actual}")]
    DofCountMismatch {
        /// Number of DOFs held by the manager.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// The network does not match the one the parameters were built for.
    #[error(
        "parameters were built for {expected_vertices} vertices and {expected_edges} edges, \
         got {vertices} vertices and {edges} edges"
    )]
    NetworkMismatch {
        /// Vertex count the parameters were built for.
        expected_vertices: usize,
        /// Edge count the parameters were built for.
        expected_edges: usize,
        /// Vertex count of the supplied network.
        vertices: usize,
        /// Edge count of the supplied network.
        edges: usize,
    },

    /// A sensitivity source does not match the parameters.
    #[error("{0}")]
    SensitivityMismatch(String),

    /// Parse error in a DOF file.
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

    /// Error from symmetry analysis.
    #[error(transparent)]
    Symmetry(#[from] SymmetryError),

    /// Error from the wire network.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParamError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_error_wraps() {
        let err: ParamError = FormulaError::UndefinedVariable("t".into()).into();
        assert!(matches!(err, ParamError::Formula(_)));
        assert_eq!(format!("{err}"), "formula error: undefined variable: t");
    }

    #[test]
    fn test_dof_count_display() {
        let err = ParamError::DofCountMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(format!("{err}"), "expected 4 DOFs, got 3");
    }
}
