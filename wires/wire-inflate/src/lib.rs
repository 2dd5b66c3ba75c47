//! Inflation of wire networks into solid surfaces.
//!
//! A wire network is a graph of struts. [`InflatorEngine`] sweeps a
//! [`WireProfile`] along every strut, scaled by the local thickness, and
//! closes the junctions between struts, producing an [`InflatedMesh`]:
//!
//! - a closed, consistently oriented triangle surface (a planar region for
//!   2D networks)
//! - the network edge each face came from
//! - for every surface vertex, its Jacobian with respect to the wire
//!   vertices and its gradient with respect to the thickness field, which a
//!   [`ParameterManager`](wire_params::ParameterManager) turns into one
//!   shape velocity per design parameter
//!
//! The mesh can then be refined through a [`Refiner`], keeping all of the
//! above consistent, and handed to a [`VolumeMesher`].
//!
//! [`PhantomMeshGenerator`] inflates a unit cell as it would appear inside
//! an infinite tiling.
//!
//! # Example
//!
//! ```
//! use wire_inflate::{InflatorConfig, InflatorEngine, LoopRefiner};
//! use wire_params::{ParameterManager, TargetType, Variables};
//! use wire_types::parse_wire;
//!
//! let network = parse_wire("v 0 0 0\nv 1 0 0\nv 1 1 0\nl 1 2\nl 2 3\n").unwrap();
//! let mut manager = ParameterManager::new(&network, 0.1, TargetType::Vertex);
//! manager.add_thickness(vec![0, 1, 2], "", 0.1).unwrap();
//!
//! let engine = InflatorEngine::new(InflatorConfig::default());
//! let mut mesh = engine.inflate(&network, &manager, &Variables::new()).unwrap();
//! assert!(mesh.is_watertight());
//! assert_eq!(mesh.shape_velocities().len(), 1);
//!
//! mesh.refine(&LoopRefiner, 1).unwrap();
//! assert!(mesh.is_watertight());
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod collab;
mod config;
mod correction;
mod engine;
mod error;
mod hull;
mod phantom;
mod profile;
mod refine;
mod replica;
mod result;
mod surface;

pub use collab::{BruteForceDetector, SelfIntersectionDetector, ToolError, VolumeMesher};
pub use config::{InflatorConfig, InflatorVariant, SelfIntersectionPolicy};
pub use correction::{EdgeClass, GeometryCorrectionTable};
pub use engine::InflatorEngine;
pub use error::{InflateError, InflateResult};
pub use phantom::PhantomMeshGenerator;
pub use profile::{Frame, PlacedLoop, WireProfile};
pub use refine::{LoopRefiner, MidpointRefiner, Prolongation, Refinement, RefinementMethod, Refiner};
pub use result::{InflatedMesh, InflatorState};
