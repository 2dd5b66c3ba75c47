//! The wire network: a vertex/edge strut graph with attributes.

use std::sync::OnceLock;

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::adjacency::Adjacency;
use crate::attributes::{AttributeKind, ComputedAttribute, WireAttributes};
use crate::bounds::Aabb;
use crate::error::{WireError, WireResult};
use crate::printability::PrintabilityPolicy;

/// A graph of strut vertices and edges in 2D or 3D.
///
/// Coordinates are stored as `Point3<f64>`; 2D networks keep `z = 0`.
/// Adjacency is computed on first use and cached until the next mutation of
/// vertices or edges.
///
/// # Example
///
/// ```
/// use wire_types::WireNetwork;
/// use nalgebra::Point3;
///
/// let network = WireNetwork::from_parts(
///     3,
///     vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
///     vec![[0, 1]],
/// )
/// .unwrap();
/// assert_eq!(network.vertex_valence(0), 1);
/// assert_eq!(network.edge_length(0), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct WireNetwork {
    dim: usize,
    vertices: Vec<Point3<f64>>,
    edges: Vec<[usize; 2]>,
    attributes: WireAttributes,
    adjacency: OnceLock<Adjacency>,
}

impl WireNetwork {
    /// Create an empty network of dimension 2 or 3.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnsupportedDimension`] for any other dimension.
    pub fn new(dim: usize) -> WireResult<Self> {
        if dim != 2 && dim != 3 {
            return Err(WireError::UnsupportedDimension(dim));
        }
        Ok(Self {
            dim,
            vertices: Vec::new(),
            edges: Vec::new(),
            attributes: WireAttributes::default(),
            adjacency: OnceLock::new(),
        })
    }

    /// Create a network from vertices and edges, validating the edges.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimension is unsupported or an edge is malformed.
    pub fn from_parts(
        dim: usize,
        vertices: Vec<Point3<f64>>,
        edges: Vec<[usize; 2]>,
    ) -> WireResult<Self> {
        let mut network = Self::new(dim)?;
        network.vertices = vertices;
        network.flatten_if_planar();
        network.edges = edges;
        network.validate()?;
        Ok(network)
    }

    /// Spatial dimension (2 or 3).
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Vertex positions.
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Edges as vertex index pairs.
    #[must_use]
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// Number of vertices.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Replace all vertex positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing edges would no longer reference
    /// valid vertices. The previous vertices are kept in that case.
    pub fn set_vertices(&mut self, vertices: Vec<Point3<f64>>) -> WireResult<()> {
        validate_edges(&self.edges, vertices.len())?;
        self.vertices = vertices;
        self.flatten_if_planar();
        self.invalidate();
        Ok(())
    }

    /// Replace all edges.
    ///
    /// # Errors
    ///
    /// Returns an error if an edge is out of range or a self-loop. The
    /// previous edges are kept in that case.
    pub fn set_edges(&mut self, edges: Vec<[usize; 2]>) -> WireResult<()> {
        validate_edges(&edges, self.vertices.len())?;
        self.edges = edges;
        self.invalidate();
        Ok(())
    }

    /// Length of edge `edge`.
    #[must_use]
    pub fn edge_length(&self, edge: usize) -> f64 {
        let [a, b] = self.edges[edge];
        (self.vertices[b] - self.vertices[a]).norm()
    }

    /// Unnormalized direction of edge `edge`, from its first to its second vertex.
    #[must_use]
    pub fn edge_vector(&self, edge: usize) -> Vector3<f64> {
        let [a, b] = self.edges[edge];
        self.vertices[b] - self.vertices[a]
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Axis-aligned bounding box of the vertices.
    #[must_use]
    pub fn bbox(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    /// Center of the bounding box.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        self.bbox().center()
    }

    /// Scale each coordinate axis independently about the origin.
    pub fn scale(&mut self, factors: Vector3<f64>) {
        for v in &mut self.vertices {
            v.coords.component_mul_assign(&factors);
        }
        self.flatten_if_planar();
        self.invalidate();
    }

    /// Scale uniformly about the origin.
    pub fn scale_uniform(&mut self, factor: f64) {
        self.scale(Vector3::repeat(factor));
    }

    /// Scale and translate so the bounding box matches `[min, max]`.
    ///
    /// Axes along which the network is flat are only translated.
    pub fn scale_to_fit(&mut self, min: Point3<f64>, max: Point3<f64>) {
        let bbox = self.bbox();
        if bbox.is_empty() {
            return;
        }
        let size = bbox.size();
        let target = max - min;
        let factors = Vector3::from_fn(|i, _| {
            if size[i] > f64::EPSILON {
                target[i] / size[i]
            } else {
                1.0
            }
        });
        for v in &mut self.vertices {
            let local = (*v - bbox.min).component_mul(&factors);
            *v = min + local;
        }
        self.flatten_if_planar();
        self.invalidate();
    }

    /// Translate all vertices.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for v in &mut self.vertices {
            *v += offset;
        }
        self.flatten_if_planar();
        self.invalidate();
    }

    /// Translate so the bounding box center is at the origin.
    pub fn center_at_origin(&mut self) {
        let center = self.center();
        self.translate(-center.coords);
    }

    fn flatten_if_planar(&mut self) {
        if self.dim == 2 {
            for v in &mut self.vertices {
                v.z = 0.0;
            }
        }
    }

    // =========================================================================
    // Adjacency
    // =========================================================================

    /// Cached adjacency, computed on first access.
    pub fn adjacency(&self) -> &Adjacency {
        self.adjacency
            .get_or_init(|| Adjacency::build(self.vertices.len(), &self.edges))
    }

    /// Vertices connected to `vertex`.
    #[must_use]
    pub fn vertex_neighbors(&self, vertex: usize) -> &[usize] {
        self.adjacency().neighbors(vertex)
    }

    /// Edges incident to `vertex`.
    #[must_use]
    pub fn vertex_edges(&self, vertex: usize) -> &[usize] {
        self.adjacency().incident_edges(vertex)
    }

    /// Number of edges incident to `vertex`.
    #[must_use]
    pub fn vertex_valence(&self, vertex: usize) -> usize {
        self.adjacency().valence(vertex)
    }

    fn invalidate(&mut self) {
        self.adjacency = OnceLock::new();
        let dropped = self
            .attributes
            .invalidate(self.vertices.len(), self.edges.len());
        if !dropped.is_empty() {
            debug!(?dropped, "Dropped attributes that no longer fit the network");
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Returns true if an attribute with this name exists.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Attribute store, for listing names and kinds.
    #[must_use]
    pub fn attributes(&self) -> &WireAttributes {
        &self.attributes
    }

    /// Add a stored attribute with one zero per vertex or edge.
    ///
    /// Names of built-in rules (see [`ComputedAttribute`]) register the
    /// computed attribute instead.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::AttributeExists`] if the name is taken.
    pub fn add_attribute(&mut self, name: &str, kind: AttributeKind) -> WireResult<()> {
        if let Some(rule) = ComputedAttribute::from_name(name) {
            return self.add_computed_attribute(rule);
        }
        let count = self.count_for(kind);
        self.add_attribute_with_values(name, kind, vec![0.0; count])
    }

    /// Add a stored attribute with explicit values.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the value count does not fit.
    pub fn add_attribute_with_values(
        &mut self,
        name: &str,
        kind: AttributeKind,
        values: Vec<f64>,
    ) -> WireResult<()> {
        if self.attributes.contains(name) {
            return Err(WireError::AttributeExists(name.to_owned()));
        }
        self.check_size(name, kind, values.len())?;
        self.attributes.insert_stored(name, kind, values);
        Ok(())
    }

    /// Register a built-in computed attribute.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::AttributeExists`] if the name is taken.
    pub fn add_computed_attribute(&mut self, rule: ComputedAttribute) -> WireResult<()> {
        if self.attributes.contains(rule.name()) {
            return Err(WireError::AttributeExists(rule.name().to_owned()));
        }
        self.attributes.insert_computed(rule);
        Ok(())
    }

    /// Remove an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::AttributeNotFound`] if it does not exist.
    pub fn remove_attribute(&mut self, name: &str) -> WireResult<()> {
        self.attributes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| WireError::AttributeNotFound(name.to_owned()))
    }

    /// Remove all attributes.
    pub fn clear_attributes(&mut self) {
        self.attributes.clear();
    }

    /// Values of an attribute, recomputing computed attributes if dirty.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::AttributeNotFound`] if it does not exist.
    pub fn attribute(&self, name: &str) -> WireResult<&[f64]> {
        self.attributes
            .get(name)
            .map(|attr| attr.values(self))
            .ok_or_else(|| WireError::AttributeNotFound(name.to_owned()))
    }

    /// Number of values per vertex or edge for an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::AttributeNotFound`] if it does not exist.
    pub fn attribute_width(&self, name: &str) -> WireResult<usize> {
        let attr = self
            .attributes
            .get(name)
            .ok_or_else(|| WireError::AttributeNotFound(name.to_owned()))?;
        let count = self.count_for(attr.kind());
        let len = attr.values(self).len();
        Ok(if count == 0 { 0 } else { len / count })
    }

    /// Returns true if the attribute is vertex-wise.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::AttributeNotFound`] if it does not exist.
    pub fn is_vertex_attribute(&self, name: &str) -> WireResult<bool> {
        self.attributes
            .get(name)
            .map(|attr| attr.kind() == AttributeKind::Vertex)
            .ok_or_else(|| WireError::AttributeNotFound(name.to_owned()))
    }

    /// Overwrite the values of a stored attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute is missing, computed, or the value
    /// count does not fit.
    pub fn set_attribute(&mut self, name: &str, values: Vec<f64>) -> WireResult<()> {
        let kind = self
            .attributes
            .get(name)
            .map(|attr| attr.kind())
            .ok_or_else(|| WireError::AttributeNotFound(name.to_owned()))?;
        self.check_size(name, kind, values.len())?;
        if self.attributes.set_stored(name, values) {
            Ok(())
        } else {
            Err(WireError::ReadOnlyAttribute(name.to_owned()))
        }
    }

    fn count_for(&self, kind: AttributeKind) -> usize {
        match kind {
            AttributeKind::Vertex => self.vertices.len(),
            AttributeKind::Edge => self.edges.len(),
        }
    }

    fn check_size(&self, name: &str, kind: AttributeKind, len: usize) -> WireResult<()> {
        let count = self.count_for(kind);
        let fits = if count == 0 {
            len == 0
        } else {
            len > 0 && len % count == 0
        };
        if fits {
            Ok(())
        } else {
            Err(WireError::AttributeSizeMismatch {
                name: name.to_owned(),
                len,
                count,
            })
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check that every edge references two distinct, valid vertices.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidEdge`] or [`WireError::DuplicateVertex`].
    pub fn validate(&self) -> WireResult<()> {
        validate_edges(&self.edges, self.vertices.len())
    }

    /// Stricter validation run before inflation: additionally rejects
    /// duplicate edges and edges shorter than `tol`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::DuplicateEdge`] or [`WireError::ZeroLengthEdge`]
    /// in addition to the structural errors of [`validate`](Self::validate).
    pub fn validate_for_inflation(&self, tol: f64) -> WireResult<()> {
        self.validate()?;

        let mut seen: HashMap<[usize; 2], usize> = HashMap::with_capacity(self.edges.len());
        for (ei, &[a, b]) in self.edges.iter().enumerate() {
            let key = [a.min(b), a.max(b)];
            if let Some(&first) = seen.get(&key) {
                return Err(WireError::DuplicateEdge { first, second: ei });
            }
            seen.insert(key, ei);

            if self.edge_length(ei) <= tol {
                return Err(WireError::ZeroLengthEdge { edge: ei });
            }
        }
        Ok(())
    }

    /// Evaluate a printability policy on this network.
    #[must_use]
    pub fn is_printable(&self, policy: &dyn PrintabilityPolicy) -> bool {
        policy.is_printable(self)
    }
}

fn validate_edges(edges: &[[usize; 2]], num_vertices: usize) -> WireResult<()> {
    for (ei, &[a, b]) in edges.iter().enumerate() {
        for vertex in [a, b] {
            if vertex >= num_vertices {
                return Err(WireError::InvalidEdge {
                    edge: ei,
                    vertex,
                    num_vertices,
                });
            }
        }
        if a == b {
            return Err(WireError::DuplicateVertex {
                edge: ei,
                vertex: a,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> WireNetwork {
        WireNetwork::from_parts(
            2,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1], [1, 2], [2, 3], [3, 0]],
        )
        .unwrap()
    }

    #[test]
    fn test_unsupported_dimension() {
        assert!(matches!(
            WireNetwork::new(4),
            Err(WireError::UnsupportedDimension(4))
        ));
    }

    #[test]
    fn test_invalid_edge_rejected() {
        let result = WireNetwork::from_parts(3, vec![Point3::origin()], vec![[0, 1]]);
        assert!(matches!(
            result,
            Err(WireError::InvalidEdge { vertex: 1, .. })
        ));
    }

    #[test]
    fn test_self_loop_rejected() {
        let result = WireNetwork::from_parts(
            3,
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            vec![[1, 1]],
        );
        assert!(matches!(result, Err(WireError::DuplicateVertex { .. })));
    }

    #[test]
    fn test_planar_network_flattened() {
        let network =
            WireNetwork::from_parts(2, vec![Point3::new(1.0, 2.0, 3.0)], Vec::new()).unwrap();
        assert_relative_eq!(network.vertices()[0].z, 0.0);
    }

    #[test]
    fn test_rejected_vertices_leave_network_unchanged() {
        let mut network = square();
        let before = network.vertices().to_vec();
        let err = network
            .set_vertices(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)])
            .unwrap_err();
        assert!(matches!(err, WireError::InvalidEdge { vertex: 2, .. }));
        assert_eq!(network.vertices(), before.as_slice());
        assert!(network.validate().is_ok());
        assert_eq!(network.vertex_valence(2), 2);
    }

    #[test]
    fn test_adjacency_invalidated_on_edge_change() {
        let mut network = square();
        assert_eq!(network.vertex_valence(0), 2);

        network.set_edges(vec![[0, 1], [0, 2], [0, 3]]).unwrap();
        assert_eq!(network.vertex_valence(0), 3);
        assert_eq!(network.vertex_neighbors(0), &[1, 2, 3]);
    }

    #[test]
    fn test_scale_to_fit() {
        let mut network = square();
        network.scale_to_fit(Point3::new(-1.0, -1.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        let bbox = network.bbox();
        assert_relative_eq!(bbox.min.x, -1.0);
        assert_relative_eq!(bbox.max.y, 1.0);
    }

    #[test]
    fn test_center_at_origin() {
        let mut network = square();
        network.center_at_origin();
        assert_relative_eq!(network.center().x, 0.0);
        assert_relative_eq!(network.center().y, 0.0);
    }

    #[test]
    fn test_computed_attribute_recomputed_after_mutation() {
        let mut network = square();
        network
            .add_computed_attribute(ComputedAttribute::EdgeLength)
            .unwrap();
        assert_relative_eq!(network.attribute("edge_length").unwrap()[0], 1.0);

        network.scale_uniform(2.0);
        assert!(network.attributes().get("edge_length").unwrap().is_dirty());
        assert_relative_eq!(network.attribute("edge_length").unwrap()[0], 2.0);
    }

    #[test]
    fn test_min_angle_attribute() {
        let mut network = square();
        network.add_attribute("vertex_min_angle", AttributeKind::Vertex).unwrap();
        let angles = network.attribute("vertex_min_angle").unwrap();
        assert_relative_eq!(angles[0], std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_stored_attribute_lifecycle() {
        let mut network = square();
        network.add_attribute("weight", AttributeKind::Edge).unwrap();
        assert!(network.has_attribute("weight"));
        assert!(!network.is_vertex_attribute("weight").unwrap());

        network.set_attribute("weight", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(network.attribute("weight").unwrap()[2], 3.0);

        let err = network.set_attribute("weight", vec![1.0]).unwrap_err();
        assert!(matches!(err, WireError::AttributeSizeMismatch { .. }));

        network.remove_attribute("weight").unwrap();
        assert!(matches!(
            network.attribute("weight"),
            Err(WireError::AttributeNotFound(_))
        ));
    }

    #[test]
    fn test_multi_component_attribute() {
        let mut network = square();
        network
            .add_attribute_with_values("offset", AttributeKind::Vertex, vec![0.0; 12])
            .unwrap();
        assert_eq!(network.attribute_width("offset").unwrap(), 3);
    }

    #[test]
    fn test_computed_attribute_read_only() {
        let mut network = square();
        network
            .add_computed_attribute(ComputedAttribute::VertexValence)
            .unwrap();
        let err = network
            .set_attribute("vertex_valence", vec![0.0; 4])
            .unwrap_err();
        assert!(matches!(err, WireError::ReadOnlyAttribute(_)));
    }

    #[test]
    fn test_validate_for_inflation() {
        let mut network = square();
        assert!(network.validate_for_inflation(1e-9).is_ok());

        network.set_edges(vec![[0, 1], [1, 0]]).unwrap();
        assert!(matches!(
            network.validate_for_inflation(1e-9),
            Err(WireError::DuplicateEdge { first: 0, second: 1 })
        ));

        let coincident = WireNetwork::from_parts(
            3,
            vec![Point3::origin(), Point3::origin()],
            vec![[0, 1]],
        )
        .unwrap();
        assert!(matches!(
            coincident.validate_for_inflation(1e-9),
            Err(WireError::ZeroLengthEdge { edge: 0 })
        ));
    }
}
