//! Owner of all design parameters of one wire network.

use std::path::Path;

use nalgebra::{Point3, Vector3};
use tracing::{debug, info};
use wire_symmetry::{IsotropicDofExtractor, IsotropicTransforms, SymmetryGroup, SymmetryOrbits};
use wire_types::WireNetwork;

use crate::dof_io::{load_dofs, save_dofs, DofBuffer};
use crate::error::{ParamError, ParamResult};
use crate::formula::Variables;
use crate::offset::OffsetParameters;
use crate::parameter::{DofKind, PatternParameter, TargetType};
use crate::sensitivity::ShapeSensitivity;
use crate::thickness::ThicknessParameters;

/// Relative tolerance for matching orbit members, scaled by the cell diagonal.
const RELATIVE_TOLERANCE: f64 = 1e-6;

/// Thickness and offset parameters of a wire network.
///
/// A manager is sized for one network topology. It keeps no reference to
/// the network; operations that need geometry take it as an argument and
/// check it against the vertex and edge counts the manager was built for.
///
/// The flat DOF vector ([`get_dofs`](Self::get_dofs)) lists thickness DOFs
/// first, then offset DOFs, each in insertion order.
///
/// # Example
///
/// ```
/// use wire_params::{ParameterManager, TargetType, Variables};
/// use wire_types::parse_wire;
///
/// let network = parse_wire("v 0 0 0\nv 1 0 0\nv 1 1 0\nl 1 2\nl 2 3\n").unwrap();
/// let mut manager = ParameterManager::new(&network, 0.5, TargetType::Vertex);
/// manager.add_thickness(vec![0], "", 0.1).unwrap();
/// manager.set_dofs(&[0.2]).unwrap();
/// let field = manager.evaluate_thickness(&Variables::new()).unwrap();
/// assert_eq!(field, vec![0.2, 0.5, 0.5]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterManager {
    dim: usize,
    num_vertices: usize,
    num_edges: usize,
    thickness: ThicknessParameters,
    offsets: OffsetParameters,
}

impl ParameterManager {
    /// A manager without DOFs: uniform `default_thickness`, no offsets.
    #[must_use]
    pub fn new(network: &WireNetwork, default_thickness: f64, target: TargetType) -> Self {
        let num_targets = match target {
            TargetType::Vertex => network.num_vertices(),
            TargetType::Edge => network.num_edges(),
        };
        Self {
            dim: network.dim(),
            num_vertices: network.num_vertices(),
            num_edges: network.num_edges(),
            thickness: ThicknessParameters::new(target, num_targets, default_thickness),
            offsets: OffsetParameters::new(network.num_vertices(), network.dim()),
        }
    }

    /// A manager with one thickness DOF per orbit and offset DOFs along
    /// every symmetry-preserving direction of each vertex orbit.
    ///
    /// Offset directions are extracted at each orbit's first vertex and
    /// carried to the other members by the group operator relating them,
    /// so equal DOF values move the whole orbit symmetrically. `kind`
    /// selects the group: the isotropic group of the network's dimension, or
    /// the axis reflections. The orbits must have been computed under the
    /// same group.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NetworkMismatch`] if the orbits do not fit the
    /// network and [`ParamError::Symmetry`] if an orbit member is not the
    /// image of its orbit's first vertex.
    pub fn from_orbits(
        network: &WireNetwork,
        orbits: &SymmetryOrbits,
        default_thickness: f64,
        target: TargetType,
        kind: DofKind,
    ) -> ParamResult<Self> {
        let mut manager = Self::new(network, default_thickness, target);
        if orbits.vertex_orbit_ids().len() != network.num_vertices()
            || orbits.edge_orbit_ids().len() != network.num_edges()
        {
            return Err(ParamError::NetworkMismatch {
                expected_vertices: orbits.vertex_orbit_ids().len(),
                expected_edges: orbits.edge_orbit_ids().len(),
                vertices: network.num_vertices(),
                edges: network.num_edges(),
            });
        }

        let thickness_orbits = match target {
            TargetType::Vertex => orbits.vertex_orbits(),
            TargetType::Edge => orbits.edge_orbits(),
        };
        for orbit in thickness_orbits {
            manager.add_thickness(orbit.clone(), "", default_thickness)?;
        }

        let dim = network.dim();
        let group = match kind {
            DofKind::Isotropic => SymmetryGroup::isotropic_for(dim),
            DofKind::Orthotropic => SymmetryGroup::Orthotropic,
        };
        let bbox = network.bbox();
        let tolerance = RELATIVE_TOLERANCE * bbox.diagonal().max(1.0);
        let extractor = IsotropicDofExtractor::with_group(bbox, dim, group, tolerance);
        let transforms = IsotropicTransforms::new(group, dim, bbox.center(), tolerance)?;
        let vertices = network.vertices();

        for orbit in orbits.vertex_orbits() {
            let Some(&seed) = orbit.first() else {
                continue;
            };
            let seed_pos = vertices[seed];
            for direction in extractor.extract_dofs(&seed_pos) {
                let directions = orbit
                    .iter()
                    .map(|&v| {
                        transforms
                            .fit(&seed_pos, &vertices[v])
                            .map(|op| op.apply_vector(&direction))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                manager
                    .offsets
                    .add_with_kind(orbit.clone(), "", 0.0, directions, kind)?;
            }
        }

        info!(
            thickness_dofs = manager.thickness.len(),
            offset_dofs = manager.offsets.len(),
            vertex_orbits = orbits.num_vertex_orbits(),
            edge_orbits = orbits.num_edge_orbits(),
            kind = ?kind,
            "Generated DOFs from symmetry orbits"
        );
        Ok(manager)
    }

    // =========================================================================
    // DOF construction
    // =========================================================================

    /// Add a thickness DOF; see [`ThicknessParameters::add`].
    ///
    /// # Errors
    ///
    /// As [`ThicknessParameters::add`].
    pub fn add_thickness(
        &mut self,
        roi: Vec<usize>,
        formula: &str,
        value: f64,
    ) -> ParamResult<usize> {
        self.thickness.add(roi, formula, value)
    }

    /// Add an isotropic offset DOF; see [`OffsetParameters::add_isotropic`].
    ///
    /// # Errors
    ///
    /// As [`OffsetParameters::add_isotropic`].
    pub fn add_offset_isotropic(
        &mut self,
        roi: Vec<usize>,
        formula: &str,
        value: f64,
        directions: Vec<Vector3<f64>>,
    ) -> ParamResult<usize> {
        self.offsets.add_isotropic(roi, formula, value, directions)
    }

    /// Add an orthotropic offset DOF; see [`OffsetParameters::add_orthotropic`].
    ///
    /// # Errors
    ///
    /// As [`OffsetParameters::add_orthotropic`].
    pub fn add_offset_orthotropic(
        &mut self,
        roi: Vec<usize>,
        formula: &str,
        value: f64,
        axis: usize,
    ) -> ParamResult<usize> {
        self.offsets.add_orthotropic(roi, formula, value, axis)
    }

    // =========================================================================
    // Flat DOF vector
    // =========================================================================

    /// Total number of DOFs.
    #[must_use]
    pub fn num_dofs(&self) -> usize {
        self.thickness.len() + self.offsets.len()
    }

    /// Number of thickness DOFs.
    #[must_use]
    pub fn num_thickness_dofs(&self) -> usize {
        self.thickness.len()
    }

    /// Number of offset DOFs.
    #[must_use]
    pub fn num_offset_dofs(&self) -> usize {
        self.offsets.len()
    }

    /// Current DOF values, thickness first.
    #[must_use]
    pub fn get_dofs(&self) -> Vec<f64> {
        self.dof_buffer().to_vec()
    }

    /// Replace all DOF values.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::DofCountMismatch`] if `dofs` has the wrong length.
    pub fn set_dofs(&mut self, dofs: &[f64]) -> ParamResult<()> {
        if dofs.len() != self.num_dofs() {
            return Err(ParamError::DofCountMismatch {
                expected: self.num_dofs(),
                actual: dofs.len(),
            });
        }
        let (thickness, offset) = dofs.split_at(self.thickness.len());
        for (param, &value) in self.thickness.iter_mut().zip(thickness) {
            param.set_value(value);
        }
        for (param, &value) in self.offsets.iter_mut().zip(offset) {
            param.set_value(value);
        }
        Ok(())
    }

    /// Current DOF values split by kind.
    #[must_use]
    pub fn dof_buffer(&self) -> DofBuffer {
        DofBuffer {
            thickness: self.thickness.iter().map(PatternParameter::value).collect(),
            offset: self.offsets.iter().map(PatternParameter::value).collect(),
        }
    }

    /// Replace all DOF values from a split buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::DofCountMismatch`] if either part has the wrong
    /// length.
    pub fn set_dof_buffer(&mut self, buffer: &DofBuffer) -> ParamResult<()> {
        if buffer.thickness.len() != self.thickness.len() {
            return Err(ParamError::DofCountMismatch {
                expected: self.thickness.len(),
                actual: buffer.thickness.len(),
            });
        }
        if buffer.offset.len() != self.offsets.len() {
            return Err(ParamError::DofCountMismatch {
                expected: self.offsets.len(),
                actual: buffer.offset.len(),
            });
        }
        self.set_dofs(&buffer.to_vec())
    }

    /// Load DOF values from a file written by [`save_dofs`](Self::save_dofs).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or holds
    /// the wrong number of values.
    pub fn load_dofs<P: AsRef<Path>>(&mut self, path: P) -> ParamResult<()> {
        let buffer = load_dofs(path)?;
        self.set_dof_buffer(&buffer)
    }

    /// Save the current DOF values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_dofs<P: AsRef<Path>>(&self, path: P) -> ParamResult<()> {
        save_dofs(&self.dof_buffer(), path)
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// The thickness field.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Formula`] on unbound formula variables.
    pub fn evaluate_thickness(&self, variables: &Variables) -> ParamResult<Vec<f64>> {
        self.thickness.evaluate(variables)
    }

    /// Per-vertex offsets.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Formula`] on unbound formula variables.
    pub fn evaluate_offsets(&self, variables: &Variables) -> ParamResult<Vec<Vector3<f64>>> {
        self.offsets.evaluate(variables)
    }

    /// The network's vertex positions with offsets applied.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NetworkMismatch`] if `network` does not have the
    /// topology the manager was built for, or a formula error.
    pub fn apply_offsets(
        &self,
        network: &WireNetwork,
        variables: &Variables,
    ) -> ParamResult<Vec<Point3<f64>>> {
        self.check_network(network)?;
        let offsets = self.offsets.evaluate(variables)?;
        Ok(network
            .vertices()
            .iter()
            .zip(&offsets)
            .map(|(p, d)| p + d)
            .collect())
    }

    /// Verify that `network` matches the manager's vertex and edge counts.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::NetworkMismatch`] otherwise.
    pub fn check_network(&self, network: &WireNetwork) -> ParamResult<()> {
        if network.num_vertices() == self.num_vertices && network.num_edges() == self.num_edges {
            Ok(())
        } else {
            Err(ParamError::NetworkMismatch {
                expected_vertices: self.num_vertices,
                expected_edges: self.num_edges,
                vertices: network.num_vertices(),
                edges: network.num_edges(),
            })
        }
    }

    // =========================================================================
    // Sensitivities
    // =========================================================================

    /// Shape velocity of every DOF: for DOF `k`, the derivative of every
    /// surface vertex position with respect to the DOF's value.
    ///
    /// Formula-driven DOFs have zero velocity.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::SensitivityMismatch`] if the surface references
    /// wire vertices or thickness entries the manager does not have.
    pub fn compute_shape_velocity(
        &self,
        surface: &dyn ShapeSensitivity,
    ) -> ParamResult<Vec<Vec<Vector3<f64>>>> {
        self.check_sensitivity(surface)?;
        let n = surface.num_surface_vertices();
        let mut velocities = Vec::with_capacity(self.num_dofs());

        for k in 0..self.thickness.len() {
            let derivative = self.thickness.derivative(k);
            velocities.push(
                (0..n)
                    .map(|i| {
                        surface
                            .thickness_gradients(i)
                            .iter()
                            .map(|(j, g)| g * derivative[*j])
                            .sum::<Vector3<f64>>()
                    })
                    .collect(),
            );
        }
        for k in 0..self.offsets.len() {
            let derivative = self.offsets.derivative(k);
            velocities.push(
                (0..n)
                    .map(|i| {
                        surface
                            .wire_vertex_jacobians(i)
                            .iter()
                            .map(|(w, jacobian)| jacobian * derivative[*w])
                            .sum::<Vector3<f64>>()
                    })
                    .collect(),
            );
        }
        debug!(dofs = velocities.len(), vertices = n, "Computed shape velocities");
        Ok(velocities)
    }

    /// Velocity of the surface under each wire-vertex coordinate: entry
    /// `w * dim + a` is the field produced by moving wire vertex `w` along
    /// axis `a`.
    ///
    /// # Errors
    ///
    /// As [`compute_shape_velocity`](Self::compute_shape_velocity).
    pub fn compute_wire_gradient(
        &self,
        surface: &dyn ShapeSensitivity,
    ) -> ParamResult<Vec<Vec<Vector3<f64>>>> {
        self.check_sensitivity(surface)?;
        let n = surface.num_surface_vertices();
        let mut fields = vec![vec![Vector3::zeros(); n]; self.num_vertices * self.dim];
        for i in 0..n {
            for (w, jacobian) in surface.wire_vertex_jacobians(i) {
                for axis in 0..self.dim {
                    fields[w * self.dim + axis][i] += jacobian.column(axis);
                }
            }
        }
        Ok(fields)
    }

    fn check_sensitivity(&self, surface: &dyn ShapeSensitivity) -> ParamResult<()> {
        let num_targets = self.thickness.num_targets();
        for i in 0..surface.num_surface_vertices() {
            if let Some((w, _)) = surface
                .wire_vertex_jacobians(i)
                .iter()
                .find(|(w, _)| *w >= self.num_vertices)
            {
                return Err(ParamError::SensitivityMismatch(format!(
                    "surface vertex {i} follows wire vertex {w}, but the network has {} vertices",
                    self.num_vertices
                )));
            }
            if let Some((j, _)) = surface
                .thickness_gradients(i)
                .iter()
                .find(|(j, _)| *j >= num_targets)
            {
                return Err(ParamError::SensitivityMismatch(format!(
                    "surface vertex {i} depends on thickness entry {j}, but the field has {num_targets} entries"
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Thickness parameters.
    #[must_use]
    pub const fn thickness(&self) -> &ThicknessParameters {
        &self.thickness
    }

    /// Mutable thickness parameters.
    pub fn thickness_mut(&mut self) -> &mut ThicknessParameters {
        &mut self.thickness
    }

    /// Offset parameters.
    #[must_use]
    pub const fn offsets(&self) -> &OffsetParameters {
        &self.offsets
    }

    /// Mutable offset parameters.
    pub fn offsets_mut(&mut self) -> &mut OffsetParameters {
        &mut self.offsets
    }

    /// What the thickness field is indexed by.
    #[must_use]
    pub const fn thickness_target(&self) -> TargetType {
        self.thickness.target()
    }

    /// Network dimension.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Vertex count the manager was built for.
    #[must_use]
    pub const fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Edge count the manager was built for.
    #[must_use]
    pub const fn num_edges(&self) -> usize {
        self.num_edges
    }
}
