//! Guide meshes: the cells a pattern is tiled into.

use hashbrown::HashMap;
use nalgebra::Point3;
use wire_types::Aabb;

use crate::error::{TilerError, TilerResult};

/// Name of the per-cell attribute selecting a pattern in mixed tiling.
pub const PATTERN_ID_ATTRIBUTE: &str = "pattern_id";

/// Name of the per-cell attribute holding DOF `k`.
#[must_use]
pub fn dof_attribute_name(k: usize) -> String {
    format!("dof_{k}")
}

/// A mesh of hexahedral (3D) or quadrilateral (2D) cells.
///
/// Each cell lists its corners so that corner `i + 2j + 4k` sits at local
/// coordinates `(i, j, k)`, i.e. x varies fastest. Quad cells use the first
/// four entries of that order. Cells may be arbitrary (non-affine) hexes;
/// points are placed by trilinear interpolation of the corners.
///
/// Per-cell scalar attributes drive tiling: `pattern_id` selects the pattern
/// in mixed tiling and `dof_0`, `dof_1`, ... override the pattern's DOFs.
///
/// # Example
///
/// ```
/// use wire_tiler::GuideMesh;
/// use wire_types::Aabb;
/// use nalgebra::Point3;
///
/// let bbox = Aabb::new(Point3::origin(), Point3::new(2.0, 1.0, 1.0));
/// let guide = GuideMesh::from_box(&bbox, [2, 1, 1], 3).unwrap();
/// assert_eq!(guide.num_cells(), 2);
/// assert_eq!(guide.num_vertices(), 12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GuideMesh {
    dim: usize,
    vertices: Vec<Point3<f64>>,
    cells: Vec<Vec<usize>>,
    attributes: HashMap<String, Vec<f64>>,
}

impl GuideMesh {
    /// Build a guide mesh from explicit cells.
    ///
    /// # Errors
    ///
    /// Returns [`TilerError::InvalidGuideMesh`] if `dim` is not 2 or 3, a
    /// cell has the wrong number of corners, or a corner index is out of
    /// range.
    pub fn new(
        dim: usize,
        vertices: Vec<Point3<f64>>,
        cells: Vec<Vec<usize>>,
    ) -> TilerResult<Self> {
        if dim != 2 && dim != 3 {
            return Err(TilerError::InvalidGuideMesh(format!(
                "unsupported dimension {dim}"
            )));
        }
        let corners = corners_per_cell(dim);
        for (c, cell) in cells.iter().enumerate() {
            if cell.len() != corners {
                return Err(TilerError::InvalidGuideMesh(format!(
                    "cell {c} has {} corners, expected {corners}",
                    cell.len()
                )));
            }
            if let Some(&v) = cell.iter().find(|&&v| v >= vertices.len()) {
                return Err(TilerError::InvalidGuideMesh(format!(
                    "cell {c} references vertex {v}, but the mesh has {} vertices",
                    vertices.len()
                )));
            }
        }
        Ok(Self {
            dim,
            vertices,
            cells,
            attributes: HashMap::new(),
        })
    }

    /// A regular grid of `reps` cells filling `bbox`. `reps[2]` is ignored
    /// in 2D.
    ///
    /// # Errors
    ///
    /// Returns [`TilerError::InvalidGuideMesh`] if a repetition count is zero.
    pub fn from_box(bbox: &Aabb, reps: [usize; 3], dim: usize) -> TilerResult<Self> {
        let reps = if dim == 2 { [reps[0], reps[1], 1] } else { reps };
        if reps.contains(&0) {
            return Err(TilerError::InvalidGuideMesh(format!(
                "repetitions must be positive, got {reps:?}"
            )));
        }
        let [nx, ny, nz] = reps;
        let layers = if dim == 2 { 1 } else { nz + 1 };
        let size = bbox.size();
        let step = size.component_div(&nalgebra::Vector3::new(nx as f64, ny as f64, nz as f64));

        let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1) * layers);
        for k in 0..layers {
            for j in 0..=ny {
                for i in 0..=nx {
                    // The last layer lands exactly on the box.
                    let coord = |n: usize, count: usize, axis: usize| {
                        if n == count {
                            bbox.max[axis]
                        } else {
                            bbox.min[axis] + step[axis] * n as f64
                        }
                    };
                    let z = if dim == 2 { 0.0 } else { coord(k, nz, 2) };
                    vertices.push(Point3::new(coord(i, nx, 0), coord(j, ny, 1), z));
                }
            }
        }

        let index = |i: usize, j: usize, k: usize| i + (nx + 1) * (j + (ny + 1) * k);
        let mut cells = Vec::with_capacity(nx * ny * nz);
        for k in 0..(layers.max(2) - 1) {
            for j in 0..ny {
                for i in 0..nx {
                    let mut cell = vec![
                        index(i, j, k),
                        index(i + 1, j, k),
                        index(i, j + 1, k),
                        index(i + 1, j + 1, k),
                    ];
                    if dim == 3 {
                        cell.extend([
                            index(i, j, k + 1),
                            index(i + 1, j, k + 1),
                            index(i, j + 1, k + 1),
                            index(i + 1, j + 1, k + 1),
                        ]);
                    }
                    cells.push(cell);
                }
            }
        }
        Self::new(dim, vertices, cells)
    }

    /// Map local coordinates in `[0, 1]^dim` of cell `cell` to space.
    #[must_use]
    pub fn map_point(&self, cell: usize, local: &Point3<f64>) -> Point3<f64> {
        let corners = &self.cells[cell];
        let (u, v, w) = (local.x, local.y, if self.dim == 3 { local.z } else { 0.0 });
        let mut out = nalgebra::Vector3::zeros();
        let factor = |bit: usize, t: f64| if bit == 1 { t } else { 1.0 - t };
        for (c, &vi) in corners.iter().enumerate() {
            let mut weight = factor(c & 1, u) * factor((c >> 1) & 1, v);
            if self.dim == 3 {
                weight *= factor((c >> 2) & 1, w);
            }
            out += self.vertices[vi].coords * weight;
        }
        Point3::from(out)
    }

    /// Attach a per-cell attribute, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`TilerError::InvalidGuideMesh`] if there is not exactly one
    /// value per cell.
    pub fn set_cell_attribute(&mut self, name: &str, values: Vec<f64>) -> TilerResult<()> {
        if values.len() != self.cells.len() {
            return Err(TilerError::InvalidGuideMesh(format!(
                "attribute {name} has {} values for {} cells",
                values.len(),
                self.cells.len()
            )));
        }
        self.attributes.insert(name.to_owned(), values);
        Ok(())
    }

    /// A per-cell attribute.
    #[must_use]
    pub fn cell_attribute(&self, name: &str) -> Option<&[f64]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// Whether a per-cell attribute exists.
    #[must_use]
    pub fn has_cell_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// DOF values painted on `cell` for a pattern with `num_dofs` DOFs.
    ///
    /// Returns `None` when the mesh carries no `dof_0` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`TilerError::MissingDofAttribute`] if `dof_0` exists but some
    /// `dof_k` with `k < num_dofs` does not.
    pub fn cell_dofs(&self, cell: usize, num_dofs: usize) -> TilerResult<Option<Vec<f64>>> {
        if num_dofs == 0 || !self.has_cell_attribute(&dof_attribute_name(0)) {
            return Ok(None);
        }
        (0..num_dofs)
            .map(|k| {
                let name = dof_attribute_name(k);
                self.attributes
                    .get(&name)
                    .map(|values| values[cell])
                    .ok_or(TilerError::MissingDofAttribute(name))
            })
            .collect::<TilerResult<Vec<_>>>()
            .map(Some)
    }

    /// Spatial dimension.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Corner positions.
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Cells as corner index lists.
    #[must_use]
    pub fn cells(&self) -> &[Vec<usize>] {
        &self.cells
    }

    /// Number of corners.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Bounding box of the corners.
    #[must_use]
    pub fn bbox(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }
}

const fn corners_per_cell(dim: usize) -> usize {
    if dim == 2 {
        4
    } else {
        8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_from_box_3d() {
        let guide = GuideMesh::from_box(&unit_box(), [2, 3, 4], 3).unwrap();
        assert_eq!(guide.num_cells(), 24);
        assert_eq!(guide.num_vertices(), 3 * 4 * 5);
        assert!(guide.bbox().approx_eq(&unit_box(), 1e-15));
    }

    #[test]
    fn test_from_box_2d() {
        let bbox = Aabb::new(Point3::origin(), Point3::new(2.0, 2.0, 0.0));
        let guide = GuideMesh::from_box(&bbox, [2, 2, 7], 2).unwrap();
        assert_eq!(guide.num_cells(), 4);
        assert_eq!(guide.num_vertices(), 9);
        assert!(guide.vertices().iter().all(|v| v.z == 0.0));
        assert!(guide.cells().iter().all(|c| c.len() == 4));
    }

    #[test]
    fn test_zero_reps_rejected() {
        assert!(GuideMesh::from_box(&unit_box(), [1, 0, 1], 3).is_err());
    }

    #[test]
    fn test_map_point_corners() {
        let guide = GuideMesh::from_box(&unit_box(), [2, 1, 1], 3).unwrap();
        let p = guide.map_point(1, &Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.5, 0.0, 0.0), epsilon = 1e-15);
        let p = guide.map_point(1, &Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-15);
        let p = guide.map_point(0, &Point3::new(0.5, 0.5, 0.5));
        assert_relative_eq!(p, Point3::new(0.25, 0.5, 0.5), epsilon = 1e-15);
    }

    #[test]
    fn test_map_point_sheared_cell() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(1.5, 1.0, 0.0),
        ];
        let guide = GuideMesh::new(2, vertices, vec![vec![0, 1, 2, 3]]).unwrap();
        let p = guide.map_point(0, &Point3::new(0.5, 0.5, 0.0));
        assert_relative_eq!(p, Point3::new(0.75, 0.5, 0.0), epsilon = 1e-15);
    }

    #[test]
    fn test_invalid_cells() {
        let vertices = vec![Point3::origin(); 4];
        assert!(GuideMesh::new(2, vertices.clone(), vec![vec![0, 1, 2]]).is_err());
        assert!(GuideMesh::new(2, vertices.clone(), vec![vec![0, 1, 2, 4]]).is_err());
        assert!(GuideMesh::new(4, vertices, vec![]).is_err());
    }

    #[test]
    fn test_cell_dofs() {
        let mut guide = GuideMesh::from_box(&unit_box(), [2, 1, 1], 3).unwrap();
        assert_eq!(guide.cell_dofs(0, 2).unwrap(), None);

        guide.set_cell_attribute("dof_0", vec![0.1, 0.2]).unwrap();
        assert!(matches!(
            guide.cell_dofs(1, 2),
            Err(TilerError::MissingDofAttribute(ref name)) if name == "dof_1"
        ));
        guide.set_cell_attribute("dof_1", vec![0.3, 0.4]).unwrap();
        assert_eq!(guide.cell_dofs(1, 2).unwrap(), Some(vec![0.2, 0.4]));
        assert!(guide.set_cell_attribute("dof_2", vec![1.0]).is_err());
    }
}
