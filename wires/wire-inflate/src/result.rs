//! The inflated surface and its sensitivities.

use std::fmt;

use hashbrown::HashMap;
use nalgebra::{Matrix3, Point3, Vector3};
use tracing::{debug, info};
use wire_params::ShapeSensitivity;
use wire_types::Aabb;

use crate::collab::VolumeMesher;
use crate::error::{InflateError, InflateResult};
use crate::refine::{Prolongation, Refiner};

/// Lifecycle of an inflated mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflatorState {
    /// No surface yet.
    Uninflated,
    /// Surface built by the inflator.
    Inflated,
    /// Surface refined at least once.
    Refined,
    /// Interior tetrahedralized; the surface is frozen.
    VolumeMeshed,
}

/// A triangle surface inflated from a wire network.
///
/// Besides geometry it records, per face, the wire edge it was built for,
/// and per vertex its linear dependence on wire vertex positions and on the
/// thickness field. These survive refinement.
#[derive(Debug, Clone)]
pub struct InflatedMesh {
    dim: usize,
    vertices: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
    face_sources: Vec<usize>,
    vertex_jacobians: Vec<Vec<(usize, Matrix3<f64>)>>,
    thickness_gradients: Vec<Vec<(usize, Vector3<f64>)>>,
    shape_velocities: Vec<Vec<Vector3<f64>>>,
    prolongation: Option<Prolongation>,
    volume_vertices: Vec<Point3<f64>>,
    voxels: Vec<[usize; 4]>,
    state: InflatorState,
}

impl InflatedMesh {
    pub(crate) fn new(
        dim: usize,
        vertices: Vec<Point3<f64>>,
        faces: Vec<[usize; 3]>,
        face_sources: Vec<usize>,
        vertex_jacobians: Vec<Vec<(usize, Matrix3<f64>)>>,
        thickness_gradients: Vec<Vec<(usize, Vector3<f64>)>>,
    ) -> Self {
        Self {
            dim,
            vertices,
            faces,
            face_sources,
            vertex_jacobians,
            thickness_gradients,
            shape_velocities: Vec::new(),
            prolongation: None,
            volume_vertices: Vec::new(),
            voxels: Vec::new(),
            state: InflatorState::Inflated,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Dimension of the network this surface was inflated from.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Surface vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Surface triangles.
    #[must_use]
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Number of surface vertices.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of surface triangles.
    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Source wire edge of every face.
    #[must_use]
    pub fn face_sources(&self) -> &[usize] {
        &self.face_sources
    }

    /// Shape velocity of every DOF, one vector per surface vertex. Empty
    /// when the mesh was inflated from explicit fields.
    #[must_use]
    pub fn shape_velocities(&self) -> &[Vec<Vector3<f64>>] {
        &self.shape_velocities
    }

    /// Composite prolongation from the inflated surface to the current one,
    /// if the mesh was refined.
    #[must_use]
    pub const fn prolongation(&self) -> Option<&Prolongation> {
        self.prolongation.as_ref()
    }

    /// Volume vertices (surface vertices first), after volume meshing.
    #[must_use]
    pub fn volume_vertices(&self) -> &[Point3<f64>] {
        &self.volume_vertices
    }

    /// Tetrahedra indexing [`volume_vertices`](Self::volume_vertices).
    #[must_use]
    pub fn voxels(&self) -> &[[usize; 4]] {
        &self.voxels
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> InflatorState {
        self.state
    }

    /// Bounding box of the surface.
    #[must_use]
    pub fn bbox(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    /// Whether the surface is closed and consistently oriented.
    ///
    /// In 3D every edge must be shared by exactly two faces with opposite
    /// orientations. A 2D mesh is a planar region: every face must wind
    /// counter-clockwise and no edge may be used twice in the same direction.
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        let mut directed: HashMap<(usize, usize), usize> =
            HashMap::with_capacity(3 * self.faces.len());
        for &[a, b, c] in &self.faces {
            for edge in [(a, b), (b, c), (c, a)] {
                *directed.entry(edge).or_insert(0) += 1;
            }
        }
        if self.dim == 2 {
            let ccw = self.faces.iter().all(|&[a, b, c]| {
                let (a, b, c) = (self.vertices[a], self.vertices[b], self.vertices[c]);
                (b - a).cross(&(c - a)).z > 0.0
            });
            return ccw && directed.values().all(|&count| count == 1);
        }
        directed
            .iter()
            .all(|(&(a, b), &count)| count == 1 && directed.get(&(b, a)) == Some(&1))
    }

    /// Signed enclosed volume (3D) or signed area (2D).
    #[must_use]
    pub fn signed_measure(&self) -> f64 {
        if self.dim == 2 {
            return self
                .faces
                .iter()
                .map(|&[a, b, c]| {
                    let (a, b, c) = (self.vertices[a], self.vertices[b], self.vertices[c]);
                    (b - a).cross(&(c - a)).z
                })
                .sum::<f64>()
                * 0.5;
        }
        self.faces
            .iter()
            .map(|&[a, b, c]| {
                self.vertices[a]
                    .coords
                    .dot(&self.vertices[b].coords.cross(&self.vertices[c].coords))
            })
            .sum::<f64>()
            / 6.0
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Attach per-DOF shape velocities.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::InvalidRefinement`] if a field does not have
    /// one vector per surface vertex.
    pub fn set_shape_velocities(
        &mut self,
        velocities: Vec<Vec<Vector3<f64>>>,
    ) -> InflateResult<()> {
        if let Some((k, field)) = velocities
            .iter()
            .enumerate()
            .find(|(_, f)| f.len() != self.vertices.len())
        {
            return Err(InflateError::InvalidRefinement(format!(
                "velocity field {k} has {} vectors for {} vertices",
                field.len(),
                self.vertices.len()
            )));
        }
        self.shape_velocities = velocities;
        Ok(())
    }

    /// Refine the surface `rounds` times, carrying face sources, shape
    /// velocities and sensitivities through each prolongation.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::InvalidState`] after volume meshing, the
    /// refiner's own error, or [`InflateError::InvalidRefinement`] if its
    /// output is inconsistent.
    pub fn refine(&mut self, refiner: &dyn Refiner, rounds: usize) -> InflateResult<()> {
        if !matches!(self.state, InflatorState::Inflated | InflatorState::Refined) {
            return Err(InflateError::InvalidState {
                operation: "refine",
                state: self.state,
            });
        }
        for _ in 0..rounds {
            let step = refiner.refine(&self.vertices, &self.faces)?;
            let p = &step.prolongation;
            if p.num_fine() != step.vertices.len() || step.face_parents.len() != step.faces.len() {
                return Err(InflateError::InvalidRefinement(format!(
                    "{} returned {} vertices, {} prolongation rows, {} faces and {} parents",
                    refiner.name(),
                    step.vertices.len(),
                    p.num_fine(),
                    step.faces.len(),
                    step.face_parents.len()
                )));
            }
            let face_sources = step
                .face_parents
                .iter()
                .map(|&parent| {
                    self.face_sources.get(parent).copied().ok_or_else(|| {
                        InflateError::InvalidRefinement(format!(
                            "{} reported parent face {parent} of {}",
                            refiner.name(),
                            self.faces.len()
                        ))
                    })
                })
                .collect::<InflateResult<Vec<usize>>>()?;
            let vertex_jacobians = p.apply_sparse(&self.vertex_jacobians)?;
            let thickness_gradients = p.apply_sparse(&self.thickness_gradients)?;
            let shape_velocities = self
                .shape_velocities
                .iter()
                .map(|field| p.apply_vectors(field))
                .collect::<InflateResult<Vec<_>>>()?;
            let prolongation = match self.prolongation.take() {
                Some(previous) => previous.then(&step.prolongation)?,
                None => step.prolongation,
            };

            self.vertices = step.vertices;
            self.faces = step.faces;
            self.face_sources = face_sources;
            self.vertex_jacobians = vertex_jacobians;
            self.thickness_gradients = thickness_gradients;
            self.shape_velocities = shape_velocities;
            self.prolongation = Some(prolongation);
            self.state = InflatorState::Refined;
        }
        debug!(
            refiner = refiner.name(),
            rounds,
            vertices = self.vertices.len(),
            faces = self.faces.len(),
            "Refined inflated mesh"
        );
        Ok(())
    }

    /// Tetrahedralize the interior with an external mesher.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::InvalidState`] if already volume meshed, and
    /// [`InflateError::ExternalTool`] if the mesher fails, moves the surface
    /// vertices, or returns tetrahedra with invalid indices.
    pub fn run_volume_mesher(&mut self, mesher: &mut dyn VolumeMesher) -> InflateResult<()> {
        if !matches!(self.state, InflatorState::Inflated | InflatorState::Refined) {
            return Err(InflateError::InvalidState {
                operation: "volume mesh",
                state: self.state,
            });
        }
        mesher.set_vertices(&self.vertices);
        mesher.set_faces(&self.faces);
        mesher
            .run()
            .map_err(|e| InflateError::external(mesher.name(), e))?;

        let volume_vertices = mesher.vertices();
        let tool_error = |message: String| InflateError::external(mesher.name(), message);
        if volume_vertices.len() < self.vertices.len()
            || volume_vertices
                .iter()
                .zip(&self.vertices)
                .any(|(a, b)| a != b)
        {
            return Err(tool_error(
                "surface vertices were not kept as the leading volume vertices".to_string(),
            ));
        }
        if let Some(t) = mesher
            .voxels()
            .iter()
            .position(|tet| tet.iter().any(|&v| v >= volume_vertices.len()))
        {
            return Err(tool_error(format!("tetrahedron {t} references a missing vertex")));
        }

        self.volume_vertices = volume_vertices.to_vec();
        self.voxels = mesher.voxels().to_vec();
        self.state = InflatorState::VolumeMeshed;
        info!(
            mesher = mesher.name(),
            vertices = self.volume_vertices.len(),
            voxels = self.voxels.len(),
            "Volume meshed"
        );
        Ok(())
    }

    // =========================================================================
    // Internal editing
    // =========================================================================

    /// Keep only the faces accepted by `keep`, dropping unused vertices.
    pub(crate) fn retain_faces(&mut self, keep: impl Fn(&[Point3<f64>; 3]) -> bool) {
        let mut kept_faces = Vec::new();
        let mut kept_sources = Vec::new();
        for (face, &source) in self.faces.iter().zip(&self.face_sources) {
            if keep(&face.map(|v| self.vertices[v])) {
                kept_faces.push(*face);
                kept_sources.push(source);
            }
        }

        let mut remap = vec![usize::MAX; self.vertices.len()];
        let mut order = Vec::new();
        for face in &mut kept_faces {
            for v in face.iter_mut() {
                if remap[*v] == usize::MAX {
                    remap[*v] = order.len();
                    order.push(*v);
                }
                *v = remap[*v];
            }
        }
        self.vertices = order.iter().map(|&v| self.vertices[v]).collect();
        self.vertex_jacobians = order.iter().map(|&v| self.vertex_jacobians[v].clone()).collect();
        self.thickness_gradients = order
            .iter()
            .map(|&v| self.thickness_gradients[v].clone())
            .collect();
        for field in &mut self.shape_velocities {
            *field = order.iter().map(|&v| field[v]).collect();
        }
        self.faces = kept_faces;
        self.face_sources = kept_sources;
    }

    /// Rewrite sensitivity indices through `vertex_map` (replica vertex to
    /// original vertex and the replica's Jacobian), `thickness_map` and
    /// `edge_map`.
    pub(crate) fn remap_sources(
        &mut self,
        vertex_map: &[(usize, Matrix3<f64>)],
        thickness_map: &[usize],
        edge_map: &[usize],
    ) {
        for terms in &mut self.vertex_jacobians {
            let mut mapped = Vec::with_capacity(terms.len());
            for (w, jacobian) in terms.iter() {
                let (original, transform) = vertex_map[*w];
                crate::refine::add_term(&mut mapped, original, jacobian * transform);
            }
            *terms = mapped;
        }
        for terms in &mut self.thickness_gradients {
            let mut mapped = Vec::with_capacity(terms.len());
            for (j, gradient) in terms.iter() {
                crate::refine::add_term(&mut mapped, thickness_map[*j], *gradient);
            }
            *terms = mapped;
        }
        for source in &mut self.face_sources {
            *source = edge_map[*source];
        }
    }
}

impl ShapeSensitivity for InflatedMesh {
    fn num_surface_vertices(&self) -> usize {
        self.vertices.len()
    }

    fn wire_vertex_jacobians(&self, vertex: usize) -> &[(usize, Matrix3<f64>)] {
        &self.vertex_jacobians[vertex]
    }

    fn thickness_gradients(&self, vertex: usize) -> &[(usize, Vector3<f64>)] {
        &self.thickness_gradients[vertex]
    }
}

impl fmt::Display for InflatedMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}D inflated mesh: {} vertices, {} faces",
            self.dim,
            self.vertices.len(),
            self.faces.len()
        )?;
        if !self.voxels.is_empty() {
            write!(f, ", {} voxels", self.voxels.len())?;
        }
        write!(f, " ({:?})", self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::ToolError;
    use crate::refine::{LoopRefiner, MidpointRefiner};
    use approx::assert_relative_eq;

    /// A unit tetrahedron where vertex `i` follows wire vertex `i` and
    /// thickness entry 0 pushes it along its own position.
    fn tetrahedron() -> InflatedMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let jacobians = (0..4).map(|i| vec![(i, Matrix3::identity())]).collect();
        let gradients = vertices.iter().map(|p| vec![(0, p.coords)]).collect();
        InflatedMesh::new(
            3,
            vertices,
            vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
            vec![0, 1, 2, 3],
            jacobians,
            gradients,
        )
    }

    struct FakeMesher {
        vertices: Vec<Point3<f64>>,
        voxels: Vec<[usize; 4]>,
        fail: bool,
    }

    impl VolumeMesher for FakeMesher {
        fn name(&self) -> &str {
            "fake"
        }
        fn set_vertices(&mut self, vertices: &[Point3<f64>]) {
            self.vertices = vertices.to_vec();
        }
        fn set_faces(&mut self, _faces: &[[usize; 3]]) {}
        fn run(&mut self) -> Result<(), ToolError> {
            if self.fail {
                return Err("boundary is not closed".into());
            }
            self.voxels = vec![[0, 1, 2, 3]];
            Ok(())
        }
        fn vertices(&self) -> &[Point3<f64>] {
            &self.vertices
        }
        fn voxels(&self) -> &[[usize; 4]] {
            &self.voxels
        }
    }

    #[test]
    fn test_tetrahedron_basics() {
        let mesh = tetrahedron();
        assert!(mesh.is_watertight());
        assert_relative_eq!(mesh.signed_measure(), 1.0 / 6.0, epsilon = 1e-12);
        assert_eq!(mesh.state(), InflatorState::Inflated);
    }

    #[test]
    fn test_refine_propagates_data() {
        let mut mesh = tetrahedron();
        mesh.set_shape_velocities(vec![vec![Vector3::x(); 4]]).unwrap();
        mesh.refine(&MidpointRefiner, 2).unwrap();

        assert_eq!(mesh.state(), InflatorState::Refined);
        assert_eq!(mesh.num_faces(), 4 * 16);
        assert_eq!(mesh.face_sources().len(), mesh.num_faces());
        assert_eq!(mesh.face_sources()[0], 0);
        assert_eq!(mesh.face_sources()[16], 1);
        assert!(mesh.is_watertight());

        // A uniform field stays uniform; jacobian rows still sum to identity.
        assert!(mesh.shape_velocities()[0]
            .iter()
            .all(|v| (v - Vector3::x()).norm() < 1e-12));
        for i in 0..mesh.num_vertices() {
            let total: Matrix3<f64> = mesh.wire_vertex_jacobians(i).iter().map(|(_, j)| j).sum();
            assert_relative_eq!(total, Matrix3::identity(), epsilon = 1e-12);
            // The gradient of entry 0 equals the position under midpoint refinement.
            let g = mesh.thickness_gradients(i)[0].1;
            assert_relative_eq!(g, mesh.vertices()[i].coords, epsilon = 1e-12);
        }
        assert_eq!(mesh.prolongation().unwrap().num_coarse(), 4);
    }

    #[test]
    fn test_loop_refinement_shrinks() {
        let mut mesh = tetrahedron();
        let before = mesh.signed_measure();
        mesh.refine(&LoopRefiner, 1).unwrap();
        assert!(mesh.signed_measure() < before);
        assert!(mesh.signed_measure() > 0.0);
    }

    #[test]
    fn test_volume_meshing_freezes_surface() {
        let mut mesh = tetrahedron();
        let mut mesher = FakeMesher {
            vertices: Vec::new(),
            voxels: Vec::new(),
            fail: false,
        };
        mesh.run_volume_mesher(&mut mesher).unwrap();
        assert_eq!(mesh.voxels(), &[[0, 1, 2, 3]]);
        assert_eq!(mesh.state(), InflatorState::VolumeMeshed);
        assert!(matches!(
            mesh.refine(&MidpointRefiner, 1),
            Err(InflateError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_volume_mesher_failure_keeps_diagnostic() {
        let mut mesh = tetrahedron();
        let mut mesher = FakeMesher {
            vertices: Vec::new(),
            voxels: Vec::new(),
            fail: true,
        };
        match mesh.run_volume_mesher(&mut mesher) {
            Err(InflateError::ExternalTool { tool, source }) => {
                assert_eq!(tool, "fake");
                assert_eq!(source.to_string(), "boundary is not closed");
            }
            other => panic!("expected tool error, got {other:?}"),
        }
        assert_eq!(mesh.state(), InflatorState::Inflated);
    }

    #[test]
    fn test_retain_faces_compacts() {
        let mut mesh = tetrahedron();
        mesh.retain_faces(|tri| tri.iter().all(|p| p.z == 0.0));
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.faces(), &[[0, 1, 2]]);
        assert_eq!(mesh.face_sources(), &[0]);
    }
}
