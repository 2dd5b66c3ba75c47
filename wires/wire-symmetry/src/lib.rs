//! Symmetry analysis for periodic wire patterns.
//!
//! This crate detects and encodes the point-group symmetry of a wire
//! network and derives the design freedom that symmetry leaves:
//!
//! - [`SymmetryOperators`] - operators of the cubic, square or orthotropic group
//! - [`orbit_closure`] - fixed-point orbit of a point under a group
//! - [`SymmetryChecker`] - whether a network is fully cubic (square) symmetric
//! - [`SymmetryOrbits`] - vertex/edge orbit partitions, `.orbit` files
//! - [`IsotropicDofExtractor`] - perturbation directions that keep symmetry
//! - [`IsotropicTransforms`] - operator relating two points of an orbit
//!
//! # Example
//!
//! ```
//! use wire_symmetry::{SymmetryGroup, SymmetryOperators, SymmetryOrbits};
//! use wire_types::parse_wire;
//!
//! let network = parse_wire("v 0 0\nv 1 0\nv 1 1\nv 0 1\nl 1 2\nl 2 3\nl 3 4\nl 4 1\n").unwrap();
//! let ops = SymmetryOperators::new(SymmetryGroup::Square, 2, network.center()).unwrap();
//! let orbits = SymmetryOrbits::compute(&network, &ops, 1e-9).unwrap();
//! assert_eq!(orbits.num_vertex_orbits(), 1);
//! assert_eq!(orbits.num_edge_orbits(), 1);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod checker;
mod dofs;
mod error;
mod operators;
mod orbit;
mod orbits;
mod transforms;

pub use checker::SymmetryChecker;
pub use dofs::IsotropicDofExtractor;
pub use error::{SymmetryError, SymmetryResult};
pub use operators::{SymmetryGroup, SymmetryOperator, SymmetryOperators};
pub use orbit::orbit_closure;
pub use orbits::{load_orbits, parse_orbits, save_orbits, write_orbits, SymmetryOrbits};
pub use transforms::IsotropicTransforms;
