//! Error types for wire network construction and I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for wire network operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors raised by malformed wire networks or wire files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WireError {
    /// Only 2D and 3D networks are supported.
    #[error("unsupported dimension {0} (expected 2 or 3)")]
    UnsupportedDimension(usize),

    /// An edge references a vertex index outside the vertex range.
    #[error("edge {edge} references vertex {vertex}, but the network has {num_vertices} vertices")]
    InvalidEdge {
        /// Edge index.
        edge: usize,
        /// Offending vertex index.
        vertex: usize,
        /// Number of vertices in the network.
        num_vertices: usize,
    },

    /// An edge connects a vertex to itself.
    #[error("edge {edge} connects vertex {vertex} to itself")]
    DuplicateVertex {
        /// Edge index.
        edge: usize,
        /// The repeated vertex index.
        vertex: usize,
    },

    /// Two edges connect the same pair of vertices.
    #[error("edges {first} and {second} connect the same vertices")]
    DuplicateEdge {
        /// First edge index.
        first: usize,
        /// Second edge index.
        second: usize,
    },

    /// An edge whose endpoints coincide geometrically.
    #[error("edge {edge} has zero length")]
    ZeroLengthEdge {
        /// Edge index.
        edge: usize,
    },

    /// Named attribute does not exist.
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    /// Named attribute already exists.
    #[error("attribute already exists: {0}")]
    AttributeExists(String),

    /// Attribute value count does not fit the vertex/edge count.
    #[error("attribute {name} has {len} values, not a multiple of {count} elements")]
    AttributeSizeMismatch {
        /// Attribute name.
        name: String,
        /// Number of values supplied.
        len: usize,
        /// Number of vertices or edges.
        count: usize,
    },

    /// Computed attributes cannot be overwritten.
    #[error("attribute {0} is computed and cannot be set")]
    ReadOnlyAttribute(String),

    /// Parse error in a wire file.
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

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WireError {
    /// Create a `Parse` error for the given line.
    #[must_use]
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
