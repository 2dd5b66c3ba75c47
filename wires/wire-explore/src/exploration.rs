//! The exploration session.

use std::path::Path;

use nalgebra::{Point3, Vector3};
use tracing::{debug, info};
use wire_inflate::{
    InflatedMesh, InflatorEngine, InflatorVariant, PhantomMeshGenerator, VolumeMesher,
};
use wire_params::{DofKind, ParameterManager, Variables};
use wire_symmetry::{SymmetryChecker, SymmetryGroup, SymmetryOperators, SymmetryOrbits};
use wire_types::{load_wire, PrintabilityPolicy, WireNetwork};

use crate::config::{ExplorationConfig, PeriodicMode};
use crate::error::{ExploreError, ExploreResult};
use crate::output::{AttributeDomain, OutputMesh};

/// Name of the per-face source edge attribute in [`OutputMesh`].
pub const FACE_SOURCE_ATTRIBUTE: &str = "face_source";

/// Prefix of the per-DOF velocity attributes in [`OutputMesh`].
pub const SHAPE_VELOCITY_PREFIX: &str = "shape_velocity_";

/// One design session on a periodic wire pattern.
///
/// The session owns the pattern, fitted to a cell of
/// [`cell_size`](ExplorationConfig::cell_size) centered at the origin, and
/// the parameters acting on it. A design iteration is:
///
/// 1. [`set_dofs`](Self::set_dofs)
/// 2. [`periodic_inflate`](Self::periodic_inflate)
/// 3. optionally [`refine`](Self::refine) and
///    [`run_volume_mesher`](Self::run_volume_mesher)
/// 4. read the mesh and its [`shape_velocities`](Self::shape_velocities),
///    or export everything with [`to_mesh`](Self::to_mesh)
///
/// Changing the parameters discards the current mesh.
///
/// # Example
///
/// ```
/// use wire_explore::{ExplorationConfig, PeriodicExploration};
/// use wire_types::parse_wire;
///
/// let square = parse_wire("v 0 0\nv 1 0\nv 1 1\nv 0 1\nl 1 2\nl 2 3\nl 3 4\nl 4 1\n").unwrap();
/// let mut session = PeriodicExploration::from_network(square, 0.1, ExplorationConfig::default()).unwrap();
/// assert!(session.has_cubic_symmetry());
///
/// session.with_all_parameters().unwrap();
/// session.periodic_inflate().unwrap();
/// assert_eq!(session.shape_velocities().unwrap().len(), session.get_dofs().len());
/// ```
#[derive(Debug, Clone)]
pub struct PeriodicExploration {
    config: ExplorationConfig,
    network: WireNetwork,
    default_thickness: f64,
    manager: ParameterManager,
    variables: Variables,
    symmetry: SymmetryChecker,
    mesh: Option<InflatedMesh>,
}

impl PeriodicExploration {
    /// Load a `.wire` file and start a session on it.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::Wire`] if the file cannot be loaded, and any
    /// error of [`from_network`](Self::from_network).
    pub fn new<P: AsRef<Path>>(
        wire_path: P,
        default_thickness: f64,
        config: ExplorationConfig,
    ) -> ExploreResult<Self> {
        let network = load_wire(wire_path)?;
        Self::from_network(network, default_thickness, config)
    }

    /// Start a session on `network`, fitted to the configured cell.
    ///
    /// The session starts with uniform `default_thickness` and no DOFs.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::InvalidThickness`] or
    /// [`ExploreError::InvalidCellSize`] for non-positive values, and
    /// [`ExploreError::Wire`] if the network is not fit for inflation.
    pub fn from_network(
        mut network: WireNetwork,
        default_thickness: f64,
        config: ExplorationConfig,
    ) -> ExploreResult<Self> {
        if !default_thickness.is_finite() || default_thickness <= 0.0 {
            return Err(ExploreError::InvalidThickness(default_thickness));
        }
        if !config.cell_size.is_finite() || config.cell_size <= 0.0 {
            return Err(ExploreError::InvalidCellSize(config.cell_size));
        }

        let half = 0.5 * config.cell_size;
        let mut min = Point3::new(-half, -half, -half);
        let mut max = Point3::new(half, half, half);
        if network.dim() == 2 {
            min.z = 0.0;
            max.z = 0.0;
        }
        network.scale_to_fit(min, max);
        network.validate_for_inflation(config.inflator.merge_tolerance)?;

        let symmetry = SymmetryChecker::new(&network, config.symmetry_tolerance * config.cell_size);
        let manager = ParameterManager::new(&network, default_thickness, config.target);
        info!(
            dim = network.dim(),
            vertices = network.num_vertices(),
            edges = network.num_edges(),
            cubic = symmetry.has_cubic_symmetry(),
            "Started exploration session"
        );
        Ok(Self {
            config,
            network,
            default_thickness,
            manager,
            variables: Variables::new(),
            symmetry,
            mesh: None,
        })
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Generate thickness and offset DOFs from the pattern's symmetry orbits.
    ///
    /// Orbits are computed under the group matching
    /// [`dof_kind`](ExplorationConfig::dof_kind): the isotropic group of the
    /// network's dimension, or the axis reflections.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::Symmetry`] if orbit analysis fails and
    /// [`ExploreError::Param`] if DOF generation fails.
    pub fn with_all_parameters(&mut self) -> ExploreResult<()> {
        let dim = self.network.dim();
        let group = match self.config.dof_kind {
            DofKind::Isotropic => SymmetryGroup::isotropic_for(dim),
            DofKind::Orthotropic => SymmetryGroup::Orthotropic,
        };
        let operators = SymmetryOperators::new(group, dim, self.network.center())?;
        let orbits = SymmetryOrbits::compute(
            &self.network,
            &operators,
            self.config.symmetry_tolerance * self.config.cell_size,
        )?;
        let manager = ParameterManager::from_orbits(
            &self.network,
            &orbits,
            self.default_thickness,
            self.config.target,
            self.config.dof_kind,
        )?;
        self.replace_parameters(manager);
        Ok(())
    }

    /// Use a caller-built parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::Param`] if `manager` was built for a
    /// different topology.
    pub fn with_parameters(&mut self, manager: ParameterManager) -> ExploreResult<()> {
        manager.check_network(&self.network)?;
        self.replace_parameters(manager);
        Ok(())
    }

    fn replace_parameters(&mut self, manager: ParameterManager) {
        debug!(dofs = manager.num_dofs(), "Replaced exploration parameters");
        self.manager = manager;
        self.mesh = None;
    }

    /// The parameters.
    #[must_use]
    pub const fn parameters(&self) -> &ParameterManager {
        &self.manager
    }

    /// Current DOF values, thickness DOFs first.
    #[must_use]
    pub fn get_dofs(&self) -> Vec<f64> {
        self.manager.get_dofs()
    }

    /// Set all DOF values. Discards the current mesh.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::Param`] if the length is wrong.
    pub fn set_dofs(&mut self, dofs: &[f64]) -> ExploreResult<()> {
        self.manager.set_dofs(dofs)?;
        self.mesh = None;
        Ok(())
    }

    /// Load DOF values from a file. Discards the current mesh.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::Param`] if the file cannot be read or does not
    /// fit the parameters.
    pub fn load_dofs<P: AsRef<Path>>(&mut self, path: P) -> ExploreResult<()> {
        self.manager.load_dofs(path)?;
        self.mesh = None;
        Ok(())
    }

    /// Save the current DOF values.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::Param`] if the file cannot be written.
    pub fn save_dofs<P: AsRef<Path>>(&self, path: P) -> ExploreResult<()> {
        Ok(self.manager.save_dofs(path)?)
    }

    /// Bind a formula variable. Discards the current mesh.
    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_string(), value);
        self.mesh = None;
    }

    /// Formula variables.
    #[must_use]
    pub const fn variables(&self) -> &Variables {
        &self.variables
    }

    // =========================================================================
    // Pattern
    // =========================================================================

    /// The fitted pattern, without offsets.
    #[must_use]
    pub const fn network(&self) -> &WireNetwork {
        &self.network
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &ExplorationConfig {
        &self.config
    }

    /// Whether the pattern is invariant under the full cubic (square) group.
    #[must_use]
    pub const fn has_cubic_symmetry(&self) -> bool {
        self.symmetry.has_cubic_symmetry()
    }

    /// Evaluate `policy` on the pattern with the current offsets applied.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::Param`] if the offsets cannot be evaluated.
    pub fn is_printable(&self, policy: &dyn PrintabilityPolicy) -> ExploreResult<bool> {
        let mut shaped = self.network.clone();
        shaped.set_vertices(self.manager.apply_offsets(&self.network, &self.variables)?)?;
        Ok(shaped.is_printable(policy))
    }

    // =========================================================================
    // Meshing
    // =========================================================================

    /// Inflate the pattern periodically with the current DOFs, attaching one
    /// shape velocity per DOF.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::Inflate`] if inflation fails. The previous
    /// mesh is discarded either way.
    pub fn periodic_inflate(&mut self) -> ExploreResult<()> {
        self.mesh = None;
        let mesh = match self.config.mode {
            PeriodicMode::Phantom => PhantomMeshGenerator::new(InflatorEngine::new(
                self.config.inflator.clone(),
            ))
            .inflate(&self.network, &self.manager, &self.variables)?,
            PeriodicMode::Reflective => InflatorEngine::new(
                self.config
                    .inflator
                    .clone()
                    .with_variant(InflatorVariant::Reflective),
            )
            .inflate(&self.network, &self.manager, &self.variables)?,
        };
        info!(
            mode = ?self.config.mode,
            dofs = self.manager.num_dofs(),
            vertices = mesh.num_vertices(),
            faces = mesh.num_faces(),
            "Periodic inflation finished"
        );
        self.mesh = Some(mesh);
        Ok(())
    }

    /// Refine the inflated surface `rounds` times with the configured
    /// scheme.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::NotInflated`] before inflation and
    /// [`ExploreError::Inflate`] if refinement fails.
    pub fn refine(&mut self, rounds: usize) -> ExploreResult<()> {
        let refiner = self.config.refinement;
        let mesh = self.mesh.as_mut().ok_or(ExploreError::NotInflated("refine"))?;
        mesh.refine(&refiner, rounds)?;
        Ok(())
    }

    /// Tetrahedralize the inflated surface.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::NotInflated`] before inflation and
    /// [`ExploreError::Inflate`] wrapping the mesher's diagnostic if it
    /// fails.
    pub fn run_volume_mesher(&mut self, mesher: &mut dyn VolumeMesher) -> ExploreResult<()> {
        let mesh = self
            .mesh
            .as_mut()
            .ok_or(ExploreError::NotInflated("run_volume_mesher"))?;
        mesh.run_volume_mesher(mesher)?;
        Ok(())
    }

    /// The current mesh, if any.
    #[must_use]
    pub const fn mesh(&self) -> Option<&InflatedMesh> {
        self.mesh.as_ref()
    }

    fn require_mesh(&self, operation: &'static str) -> ExploreResult<&InflatedMesh> {
        self.mesh.as_ref().ok_or(ExploreError::NotInflated(operation))
    }

    /// Surface vertices.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::NotInflated`] before inflation.
    pub fn vertices(&self) -> ExploreResult<&[Point3<f64>]> {
        Ok(self.require_mesh("vertices")?.vertices())
    }

    /// Surface triangles.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::NotInflated`] before inflation.
    pub fn faces(&self) -> ExploreResult<&[[usize; 3]]> {
        Ok(self.require_mesh("faces")?.faces())
    }

    /// Tetrahedra; empty until a volume mesher has run.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::NotInflated`] before inflation.
    pub fn voxels(&self) -> ExploreResult<&[[usize; 4]]> {
        Ok(self.require_mesh("voxels")?.voxels())
    }

    /// One velocity field per DOF over the surface vertices.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::NotInflated`] before inflation.
    pub fn shape_velocities(&self) -> ExploreResult<&[Vec<Vector3<f64>>]> {
        Ok(self.require_mesh("shape_velocities")?.shape_velocities())
    }

    /// Export the mesh with a [`FACE_SOURCE_ATTRIBUTE`] face attribute and
    /// one `shape_velocity_<k>` vertex attribute (three values per vertex)
    /// per DOF.
    ///
    /// After volume meshing the export holds the volume vertices; velocities
    /// of interior vertices are zero.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::NotInflated`] before inflation.
    pub fn to_mesh(&self) -> ExploreResult<OutputMesh> {
        let mesh = self.require_mesh("to_mesh")?;
        let vertices = if mesh.voxels().is_empty() {
            mesh.vertices().to_vec()
        } else {
            mesh.volume_vertices().to_vec()
        };
        let num_vertices = vertices.len();
        let mut output = OutputMesh::new(vertices, mesh.faces().to_vec(), mesh.voxels().to_vec());

        #[allow(clippy::cast_precision_loss)]
        let sources = mesh.face_sources().iter().map(|&e| e as f64).collect();
        output.add_attribute(FACE_SOURCE_ATTRIBUTE, AttributeDomain::Face, 1, sources)?;

        for (k, field) in mesh.shape_velocities().iter().enumerate() {
            let mut values: Vec<f64> = field.iter().flat_map(|v| [v.x, v.y, v.z]).collect();
            values.resize(3 * num_vertices, 0.0);
            output.add_attribute(
                &format!("{SHAPE_VELOCITY_PREFIX}{k}"),
                AttributeDomain::Vertex,
                3,
                values,
            )?;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use wire_params::TargetType;
    use wire_types::parse_wire;

    fn square() -> WireNetwork {
        parse_wire("v 0 0\nv 1 0\nv 1 1\nv 0 1\nl 1 2\nl 2 3\nl 3 4\nl 4 1\n").unwrap()
    }

    #[test]
    fn test_network_is_fitted_to_cell() {
        let config = ExplorationConfig::default().with_cell_size(2.0);
        let session = PeriodicExploration::from_network(square(), 0.1, config).unwrap();
        let bbox = session.network().bbox();
        assert_relative_eq!(bbox.min.x, -1.0);
        assert_relative_eq!(bbox.max.y, 1.0);
        assert_relative_eq!(bbox.max.z, 0.0);
        assert!(session.get_dofs().is_empty());
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(
            PeriodicExploration::from_network(square(), 0.0, ExplorationConfig::default()),
            Err(ExploreError::InvalidThickness(_))
        ));
        let negative = ExplorationConfig::default().with_cell_size(-1.0);
        assert!(matches!(
            PeriodicExploration::from_network(square(), 0.1, negative),
            Err(ExploreError::InvalidCellSize(_))
        ));
        let missing = "/nonexistent/pattern.wire";
        assert!(matches!(
            PeriodicExploration::new(missing, 0.1, ExplorationConfig::default()),
            Err(ExploreError::Wire(_))
        ));
    }

    #[test]
    fn test_mesh_accessors_need_inflation() {
        let mut session =
            PeriodicExploration::from_network(square(), 0.1, ExplorationConfig::default()).unwrap();
        assert!(matches!(session.vertices(), Err(ExploreError::NotInflated("vertices"))));
        assert!(matches!(session.refine(1), Err(ExploreError::NotInflated("refine"))));
        assert!(session.to_mesh().is_err());
    }

    #[test]
    fn test_square_parameters() {
        let mut session =
            PeriodicExploration::from_network(square(), 0.1, ExplorationConfig::default()).unwrap();
        session.with_all_parameters().unwrap();
        // Cell corners are fixed by periodicity, so only thickness remains.
        assert_eq!(session.parameters().num_thickness_dofs(), 1);
        assert_eq!(session.parameters().num_offset_dofs(), 0);

        session.periodic_inflate().unwrap();
        assert_eq!(session.shape_velocities().unwrap().len(), 1);
        let output = session.to_mesh().unwrap();
        assert!(output.has_attribute(FACE_SOURCE_ATTRIBUTE));
        assert_eq!(output.attribute("shape_velocity_0").unwrap().width, 3);

        session.set_dofs(&[0.12]).unwrap();
        assert!(session.mesh().is_none());
    }

    #[test]
    fn test_foreign_parameters_rejected() {
        let mut session =
            PeriodicExploration::from_network(square(), 0.1, ExplorationConfig::default()).unwrap();
        let triangle = parse_wire("v 0 0\nv 1 0\nv 0 1\nl 1 2\nl 2 3\nl 3 1\n").unwrap();
        let manager = ParameterManager::new(&triangle, 0.1, TargetType::Vertex);
        assert!(matches!(session.with_parameters(manager), Err(ExploreError::Param(_))));
    }
}
