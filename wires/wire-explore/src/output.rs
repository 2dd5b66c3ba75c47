//! A plain mesh container handed to writers and solvers.

use hashbrown::HashMap;
use nalgebra::Point3;

use crate::error::{ExploreError, ExploreResult};

/// Which elements an attribute has values for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeDomain {
    /// One entry per vertex.
    Vertex,
    /// One entry per triangle.
    Face,
    /// One entry per tetrahedron.
    Voxel,
}

/// A named per-element attribute, stored flat with `width` values per
/// element.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshAttribute {
    /// Element kind.
    pub domain: AttributeDomain,
    /// Values per element.
    pub width: usize,
    /// Flat values.
    pub values: Vec<f64>,
}

/// Vertices, triangles, tetrahedra and named attributes.
///
/// # Example
///
/// ```
/// use nalgebra::Point3;
/// use wire_explore::{AttributeDomain, OutputMesh};
///
/// let mut mesh = OutputMesh::new(
///     vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
///     vec![[0, 1, 2]],
///     Vec::new(),
/// );
/// mesh.add_attribute("area", AttributeDomain::Face, 1, vec![0.5]).unwrap();
/// assert_eq!(mesh.attribute("area").unwrap().values, vec![0.5]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputMesh {
    vertices: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
    voxels: Vec<[usize; 4]>,
    attributes: HashMap<String, MeshAttribute>,
}

impl OutputMesh {
    /// Create a mesh without attributes.
    #[must_use]
    pub fn new(
        vertices: Vec<Point3<f64>>,
        faces: Vec<[usize; 3]>,
        voxels: Vec<[usize; 4]>,
    ) -> Self {
        Self {
            vertices,
            faces,
            voxels,
            attributes: HashMap::new(),
        }
    }

    /// Vertex positions.
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Triangles.
    #[must_use]
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Tetrahedra.
    #[must_use]
    pub fn voxels(&self) -> &[[usize; 4]] {
        &self.voxels
    }

    /// Number of vertices.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Number of tetrahedra.
    #[must_use]
    pub fn num_voxels(&self) -> usize {
        self.voxels.len()
    }

    fn num_elements(&self, domain: AttributeDomain) -> usize {
        match domain {
            AttributeDomain::Vertex => self.vertices.len(),
            AttributeDomain::Face => self.faces.len(),
            AttributeDomain::Voxel => self.voxels.len(),
        }
    }

    /// Add or replace an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`ExploreError::AttributeSizeMismatch`] unless `values` has
    /// `width` entries per element of `domain`.
    pub fn add_attribute(
        &mut self,
        name: &str,
        domain: AttributeDomain,
        width: usize,
        values: Vec<f64>,
    ) -> ExploreResult<()> {
        let expected = self.num_elements(domain) * width;
        if values.len() != expected {
            return Err(ExploreError::AttributeSizeMismatch {
                name: name.to_string(),
                expected,
                actual: values.len(),
            });
        }
        self.attributes.insert(
            name.to_string(),
            MeshAttribute {
                domain,
                width,
                values,
            },
        );
        Ok(())
    }

    /// Whether an attribute exists.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Look up an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&MeshAttribute> {
        self.attributes.get(name)
    }

    /// Attribute names, sorted.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
