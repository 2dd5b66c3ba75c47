//! Design parameters for wire networks.
//!
//! A wire network's shape is controlled by two families of degrees of
//! freedom (DOFs):
//!
//! - [`ThicknessParameters`] - a scalar thickness per vertex or per edge
//! - [`OffsetParameters`] - vertex displacements along symmetry-preserving
//!   directions
//!
//! Both are owned by a [`ParameterManager`], which flattens them into a
//! single DOF vector, can generate them automatically from symmetry orbits,
//! and turns an inflated surface's [`ShapeSensitivity`] into per-DOF shape
//! velocities.
//!
//! Any DOF may be driven by a [`Formula`] over caller-supplied
//! [`Variables`] instead of its stored value.
//!
//! # Example
//!
//! ```
//! use wire_params::{DofKind, ParameterManager, TargetType, Variables};
//! use wire_symmetry::{SymmetryGroup, SymmetryOperators, SymmetryOrbits};
//! use wire_types::parse_wire;
//!
//! let square = parse_wire("v 0 0\nv 1 0\nv 1 1\nv 0 1\nl 1 2\nl 2 3\nl 3 4\nl 4 1\n").unwrap();
//! let ops = SymmetryOperators::new(SymmetryGroup::Square, 2, square.center()).unwrap();
//! let orbits = SymmetryOrbits::compute(&square, &ops, 1e-9).unwrap();
//!
//! let manager = ParameterManager::from_orbits(
//!     &square, &orbits, 0.1, TargetType::Vertex, DofKind::Isotropic,
//! ).unwrap();
//! assert_eq!(manager.num_thickness_dofs(), 1);
//! assert_eq!(manager.evaluate_thickness(&Variables::new()).unwrap(), vec![0.1; 4]);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod dof_io;
mod error;
mod formula;
mod manager;
mod offset;
mod parameter;
mod sensitivity;
mod thickness;

pub use dof_io::{load_dofs, parse_dofs, save_dofs, write_dofs, DofBuffer};
pub use error::{FormulaError, ParamError, ParamResult};
pub use formula::{Formula, Variables};
pub use manager::ParameterManager;
pub use offset::{OffsetParameter, OffsetParameters};
pub use parameter::{DofKind, PatternParameter, TargetType};
pub use sensitivity::ShapeSensitivity;
pub use thickness::{ThicknessParameter, ThicknessParameters};
