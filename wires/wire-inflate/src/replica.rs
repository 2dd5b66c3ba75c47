//! Transformed copies of a network, welded into one.
//!
//! Used by the reflective variant (mirror images) and the phantom mesh
//! generator (translated neighbors). Every replica vertex and edge remembers
//! the original it came from so sensitivities can be mapped back.

use hashbrown::HashSet;
use nalgebra::{Matrix3, Vector3};
use tracing::debug;
use wire_params::TargetType;
use wire_types::{HashGrid, WireNetwork};

use crate::error::InflateResult;
use crate::result::InflatedMesh;

/// An affine map `x -> linear * x + translation`.
type Transform = (Matrix3<f64>, Vector3<f64>);

pub(crate) struct Replica {
    pub(crate) network: WireNetwork,
    /// Original vertex and the linear part of the map that produced each
    /// replica vertex.
    vertex_origin: Vec<(usize, Matrix3<f64>)>,
    /// Original edge of each replica edge.
    edge_origin: Vec<usize>,
}

impl Replica {
    /// Weld the images of `network` under `transforms`, in order. The first
    /// image to reach a point owns it.
    fn build(
        network: &WireNetwork,
        transforms: &[Transform],
        tolerance: f64,
    ) -> InflateResult<Self> {
        let mut grid = HashGrid::new(tolerance);
        let mut vertex_origin = Vec::new();
        let mut edges = Vec::new();
        let mut edge_origin = Vec::new();
        let mut seen: HashSet<[usize; 2]> = HashSet::new();

        for (linear, translation) in transforms {
            let map: Vec<usize> = network
                .vertices()
                .iter()
                .enumerate()
                .map(|(v, p)| {
                    let (id, inserted) = grid.insert_or_find(linear * p + translation);
                    if inserted {
                        vertex_origin.push((v, *linear));
                    }
                    id
                })
                .collect();
            for (e, &[a, b]) in network.edges().iter().enumerate() {
                let (a, b) = (map[a], map[b]);
                if a != b && seen.insert([a.min(b), a.max(b)]) {
                    edges.push([a, b]);
                    edge_origin.push(e);
                }
            }
        }

        let network = WireNetwork::from_parts(network.dim(), grid.into_points(), edges)?;
        debug!(
            copies = transforms.len(),
            vertices = network.num_vertices(),
            edges = network.num_edges(),
            "Built network replica"
        );
        Ok(Self {
            network,
            vertex_origin,
            edge_origin,
        })
    }

    /// `network` mirrored across the upper faces of its bounding box along
    /// every axis: `2^dim` copies, the original first.
    pub(crate) fn reflected(network: &WireNetwork, tolerance: f64) -> InflateResult<Self> {
        let dim = network.dim();
        let upper = network.bbox().max;
        let transforms: Vec<Transform> = (0..1_usize << dim)
            .map(|mask| {
                let mut linear = Matrix3::identity();
                let mut translation = Vector3::zeros();
                for axis in (0..dim).filter(|a| mask & (1 << a) != 0) {
                    linear[(axis, axis)] = -1.0;
                    translation[axis] = 2.0 * upper[axis];
                }
                (linear, translation)
            })
            .collect();
        Self::build(network, &transforms, tolerance)
    }

    /// `network` with its `3^dim - 1` translated neighbors, the original
    /// first.
    pub(crate) fn tiled(network: &WireNetwork, tolerance: f64) -> InflateResult<Self> {
        let dim = network.dim();
        let size = network.bbox().size();
        let mut transforms: Vec<Transform> = vec![(Matrix3::identity(), Vector3::zeros())];
        let steps: &[f64] = &[-1.0, 0.0, 1.0];
        let z_steps: &[f64] = if dim == 3 { steps } else { &[0.0] };
        for &k in z_steps {
            for &j in steps {
                for &i in steps {
                    if i == 0.0 && j == 0.0 && k == 0.0 {
                        continue;
                    }
                    let offset = Vector3::new(i * size.x, j * size.y, k * size.z);
                    transforms.push((Matrix3::identity(), offset));
                }
            }
        }
        Self::build(network, &transforms, tolerance)
    }

    /// Original thickness entry of each replica thickness entry.
    pub(crate) fn thickness_origin(&self, target: TargetType) -> Vec<usize> {
        match target {
            TargetType::Vertex => self.vertex_origin.iter().map(|(v, _)| *v).collect(),
            TargetType::Edge => self.edge_origin.clone(),
        }
    }

    /// The original thickness field spread over the replica.
    pub(crate) fn pull_thickness(&self, thickness: &[f64], target: TargetType) -> Vec<f64> {
        self.thickness_origin(target)
            .into_iter()
            .map(|i| thickness[i])
            .collect()
    }

    /// Point an inflated replica's sensitivities and face sources back at
    /// the original network.
    pub(crate) fn remap(&self, mesh: &mut InflatedMesh, target: TargetType) {
        mesh.remap_sources(
            &self.vertex_origin,
            &self.thickness_origin(target),
            &self.edge_origin,
        );
    }
}
