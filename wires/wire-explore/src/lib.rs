//! Design-space exploration of periodic wire patterns.
//!
//! [`PeriodicExploration`] is the session object an optimizer drives. It
//! loads a pattern, fits it to a unit cell, derives symmetry-preserving
//! design parameters and turns each parameter setting into a periodic solid
//! surface with one shape velocity per parameter.
//!
//! # Example
//!
//! ```
//! use wire_explore::{ExplorationConfig, PeriodicExploration};
//! use wire_types::parse_wire;
//!
//! let cross = parse_wire("v 0 0\nv 2 0\nv 2 2\nv 0 2\nv 1 1\nl 1 5\nl 2 5\nl 3 5\nl 4 5\n").unwrap();
//! let mut session = PeriodicExploration::from_network(cross, 0.08, ExplorationConfig::default()).unwrap();
//! session.with_all_parameters().unwrap();
//!
//! let mut dofs = session.get_dofs();
//! dofs[0] = 0.1;
//! session.set_dofs(&dofs).unwrap();
//! session.periodic_inflate().unwrap();
//!
//! let mesh = session.to_mesh().unwrap();
//! assert!(mesh.num_faces() > 0);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod config;
mod error;
mod exploration;
mod output;

pub use config::{ExplorationConfig, PeriodicMode};
pub use error::{ExploreError, ExploreResult};
pub use exploration::{PeriodicExploration, FACE_SOURCE_ATTRIBUTE, SHAPE_VELOCITY_PREFIX};
pub use output::{AttributeDomain, MeshAttribute, OutputMesh};
