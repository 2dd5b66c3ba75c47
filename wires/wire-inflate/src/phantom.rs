//! Periodic inflation through phantom neighbors.
//!
//! A unit cell inflated on its own has open struts where it meets its
//! neighbors. Surrounding the cell with translated copies of itself,
//! inflating the block and cutting it back to the cell gives the surface the
//! cell has inside an infinite tiling.

use nalgebra::Point3;
use tracing::info;
use wire_params::{ParameterManager, TargetType, Variables};
use wire_types::WireNetwork;

use crate::engine::{check_fields, prepare, InflatorEngine};
use crate::error::InflateResult;
use crate::replica::Replica;
use crate::result::InflatedMesh;

/// Inflates a unit cell as part of its periodic tiling.
///
/// The cell is surrounded by its `3^D - 1` translated neighbors, the block
/// is inflated, and only the faces whose centroid lies inside the cell's
/// bounding box are kept. Sensitivities and face sources refer to the
/// original cell. The engine's [`InflatorVariant`](crate::InflatorVariant)
/// is not used: the neighbors already close the cell.
#[derive(Debug, Clone, Default)]
pub struct PhantomMeshGenerator {
    engine: InflatorEngine,
}

impl PhantomMeshGenerator {
    /// Create a generator that inflates with `engine`.
    #[must_use]
    pub const fn new(engine: InflatorEngine) -> Self {
        Self { engine }
    }

    /// The underlying engine.
    #[must_use]
    pub const fn engine(&self) -> &InflatorEngine {
        &self.engine
    }

    /// Inflate with the fields `manager` evaluates and attach shape
    /// velocities, as [`InflatorEngine::inflate`].
    ///
    /// # Errors
    ///
    /// As [`InflatorEngine::inflate`].
    pub fn inflate(
        &self,
        network: &WireNetwork,
        manager: &ParameterManager,
        variables: &Variables,
    ) -> InflateResult<InflatedMesh> {
        let (shaped, thickness) = prepare(network, manager, variables)?;
        let mut mesh = self.inflate_with_fields(&shaped, &thickness, manager.thickness_target())?;
        let velocities = manager.compute_shape_velocity(&mesh)?;
        mesh.set_shape_velocities(velocities)?;
        Ok(mesh)
    }

    /// Inflate with an explicit thickness field.
    ///
    /// # Errors
    ///
    /// As [`InflatorEngine::inflate_with_fields`].
    pub fn inflate_with_fields(
        &self,
        network: &WireNetwork,
        thickness: &[f64],
        target: TargetType,
    ) -> InflateResult<InflatedMesh> {
        let config = self.engine.config();
        check_fields(network, thickness, target, config.merge_tolerance)?;

        let replica = Replica::tiled(network, config.merge_tolerance)?;
        let mut mesh = self.engine.inflate_replica(&replica, thickness, target)?;
        let block_faces = mesh.num_faces();

        let cell = network.bbox();
        let tolerance = cell.diagonal() * 1e-9;
        mesh.retain_faces(|[a, b, c]| {
            let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            cell.contains_with_tolerance(&centroid, tolerance)
        });
        self.engine.check_self_intersection(&mesh)?;

        info!(
            block_faces,
            faces = mesh.num_faces(),
            vertices = mesh.num_vertices(),
            "Inflated phantom cell"
        );
        Ok(mesh)
    }
}
