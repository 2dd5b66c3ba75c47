//! Wire network data model.
//!
//! A *wire network* is a graph of strut vertices and edges describing a
//! lattice pattern before it is inflated into a solid:
//!
//! - [`WireNetwork`] - vertices, edges, cached adjacency and attributes
//! - [`Aabb`] - axis-aligned bounding box
//! - [`HashGrid`] - tolerance point lookup used for symmetry matching and tiling
//! - [`WireAttributes`] - stored and computed per-vertex/per-edge data
//! - [`PrintabilityPolicy`] - pluggable fabrication checks
//! - [`load_wire`] / [`save_wire`] - the `.wire` text format
//!
//! # Example
//!
//! ```
//! use wire_types::{parse_wire, AttributeKind};
//!
//! let mut network = parse_wire("v 0 0 0\nv 1 0 0\nv 1 1 0\nl 1 2\nl 2 3\n").unwrap();
//! network.add_attribute("edge_length", AttributeKind::Edge).unwrap();
//! assert_eq!(network.attribute("edge_length").unwrap(), &[1.0, 1.0]);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod adjacency;
mod attributes;
mod bounds;
mod error;
mod hash_grid;
mod io;
mod network;
mod printability;

pub use adjacency::Adjacency;
pub use attributes::{Attribute, AttributeKind, ComputedAttribute, WireAttributes};
pub use bounds::Aabb;
pub use error::{WireError, WireResult};
pub use hash_grid::HashGrid;
pub use io::{load_wire, parse_wire, save_wire, write_wire};
pub use network::WireNetwork;
pub use printability::{AlwaysPrintable, OverhangPolicy, PrintabilityPolicy};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
