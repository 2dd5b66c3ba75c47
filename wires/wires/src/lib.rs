//! Parametric wire networks for periodic microstructure design.
//!
//! This umbrella crate re-exports the `wire-*` crates behind one API. A wire
//! network is a graph of struts; the crates detect its symmetry, derive
//! symmetry-preserving design parameters, tile it over a domain and inflate
//! it into a solid surface whose vertices carry a velocity for every
//! parameter.
//!
//! # Quick Start
//!
//! ```no_run
//! use wires::prelude::*;
//!
//! let mut session =
//!     PeriodicExploration::new("patterns/bcc.wire", 0.05, ExplorationConfig::default()).unwrap();
//! session.with_all_parameters().unwrap();
//! session.load_dofs("bcc.dof").unwrap();
//! session.periodic_inflate().unwrap();
//! session.refine(2).unwrap();
//!
//! let mesh = session.to_mesh().unwrap();
//! println!("{} faces", mesh.num_faces());
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - `WireNetwork`, `.wire` I/O, bounds, printability rules
//! - [`symmetry`] - Symmetry groups, orbits, symmetry-preserving directions
//! - [`params`] - Thickness and offset parameters, formulas, DOF files
//! - [`tiler`] - Tiling patterns over boxes and guide meshes
//! - [`inflate`] - Inflation, refinement, shape velocities
//! - [`explore`] - Design sessions on a single periodic cell
//!
//! # Feature Flags
//!
//! - `serde` - Serialization of configs and value types

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

// =============================================================================
// Re-exports
// =============================================================================

/// Wire networks, `.wire` I/O, bounds and printability rules.
pub use wire_types as types;

/// Symmetry groups, orbits and symmetry-preserving directions.
pub use wire_symmetry as symmetry;

/// Thickness and offset parameters.
pub use wire_params as params;

/// Tiling of patterns over boxes and guide meshes.
pub use wire_tiler as tiler;

/// Inflation into solid surfaces.
pub use wire_inflate as inflate;

/// Design sessions on a single periodic cell.
pub use wire_explore as explore;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports.
///
/// ```
/// use wires::prelude::*;
/// ```
pub mod prelude {
    // Networks
    pub use wire_types::{load_wire, parse_wire, save_wire, Aabb, WireNetwork};

    // Symmetry
    pub use wire_symmetry::{SymmetryChecker, SymmetryGroup, SymmetryOperators, SymmetryOrbits};

    // Parameters
    pub use wire_params::{DofKind, ParameterManager, TargetType, Variables};

    // Tiling
    pub use wire_tiler::{GuideMesh, WireTiler};

    // Inflation
    pub use wire_inflate::{InflatedMesh, InflatorConfig, InflatorEngine, PhantomMeshGenerator};

    // Exploration (main use case)
    pub use wire_explore::{ExplorationConfig, PeriodicExploration};
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let network = parse_wire("v 0 0\nv 1 0\nl 1 2\n").unwrap();
        assert_eq!(network.dim(), 2);
        let manager = ParameterManager::new(&network, 0.1, TargetType::Vertex);
        assert_eq!(manager.num_dofs(), 0);
    }

    #[test]
    fn test_module_reexports() {
        let _ = inflate::InflatorConfig::default();
        let _ = tiler::TilerConfig::default();
        let _ = explore::ExplorationConfig::default();
        assert_eq!(symmetry::SymmetryGroup::isotropic_for(3), symmetry::SymmetryGroup::Cubic);
    }
}
