//! Error types for symmetry analysis.

use std::path::PathBuf;
use thiserror::Error;
use wire_types::WireError;

/// Result type for symmetry operations.
pub type SymmetryResult<T> = Result<T, SymmetryError>;

/// Errors that can occur during symmetry analysis.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SymmetryError {
    /// No group operator maps one point onto the other.
    #[error("no symmetry operator maps {from:?} onto {to:?}")]
    Mismatch {
        /// Source point.
        from: [f64; 3],
        /// Target point.
        to: [f64; 3],
    },

    /// The group does not exist in the requested dimension.
    #[error("{group} symmetry is not defined in {dim}D")]
    UnsupportedGroup {
        /// Group name.
        group: &'static str,
        /// Requested dimension.
        dim: usize,
    },

    /// An orbit partition violates its coverage invariant.
    #[error("invalid {target} orbits: {message}")]
    InvalidOrbits {
        /// `vertex` or `edge`.
        target: &'static str,
        /// Description of the violation.
        message: String,
    },

    /// Parse error in an orbit file.
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

    /// Error from the wire network.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SymmetryError {
    pub(crate) fn invalid_orbits(target: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOrbits {
            target,
            message: message.into(),
        }
    }
}
