//! Symmetry-preserving perturbation directions at a point.

use nalgebra::{Matrix3, Point3, Vector3};
use wire_types::Aabb;

use crate::operators::{SymmetryGroup, SymmetryOperators};

/// Columns shorter than this are treated as outside the fixed subspace.
const BASIS_EPSILON: f64 = 1e-8;

/// Determines the independent directions along which a vertex of a periodic
/// isotropic pattern may move without breaking its symmetry.
///
/// The pattern is assumed to tile space periodically with the bounding box
/// as unit cell and to carry the isotropic point group (cubic in 3D, square
/// in 2D) about the box center. A point's *stabilizer* consists of the group
/// operators that map it to itself up to a lattice translation; allowed
/// directions are the vectors fixed by every stabilizer element. The average
/// of the stabilizer's linear parts is the orthogonal projector onto that
/// subspace, and its columns are orthonormalized to form the result.
///
/// In 3D this yields 0 directions at the center, corners, face centers and
/// edge midpoints of the cell, 1 along a cell edge, 2 inside a cell face and
/// 3 at a generic interior point. Points on interior mirror planes lose the
/// direction normal to the plane.
///
/// # Example
///
/// ```
/// use wire_symmetry::IsotropicDofExtractor;
/// use wire_types::Aabb;
/// use nalgebra::Point3;
///
/// let bbox = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
/// let extractor = IsotropicDofExtractor::new(bbox, 3, 1e-9);
/// assert_eq!(extractor.extract_dofs(&Point3::new(1.0, 1.0, 1.0)).len(), 0);
/// assert_eq!(extractor.extract_dofs(&Point3::new(1.0, 1.0, 0.3)).len(), 1);
/// assert_eq!(extractor.extract_dofs(&Point3::new(1.0, 0.2, 0.3)).len(), 2);
/// assert_eq!(extractor.extract_dofs(&Point3::new(0.1, 0.2, 0.3)).len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct IsotropicDofExtractor {
    bbox: Aabb,
    dim: usize,
    tolerance: f64,
    operators: Vec<Matrix3<f64>>,
}

impl IsotropicDofExtractor {
    /// Create an extractor for the unit cell `bbox` under the isotropic
    /// group of `dim`.
    #[must_use]
    pub fn new(bbox: Aabb, dim: usize, tolerance: f64) -> Self {
        let dim = if dim == 2 { 2 } else { 3 };
        Self::with_group(bbox, dim, SymmetryGroup::isotropic_for(dim), tolerance)
    }

    /// Create an extractor for an arbitrary group, e.g. orthotropic
    /// patterns whose vertices may only move off their mirror planes.
    #[must_use]
    pub fn with_group(bbox: Aabb, dim: usize, group: SymmetryGroup, tolerance: f64) -> Self {
        let dim = if dim == 2 { 2 } else { 3 };
        // Linear parts only; the center is applied explicitly below.
        let operators = SymmetryOperators::new(group, dim, Point3::origin())
            .map(|ops| ops.iter().map(|op| op.linear).collect())
            .unwrap_or_default();
        Self {
            bbox,
            dim,
            tolerance,
            operators,
        }
    }

    /// Unit directions along which `point` may be perturbed.
    #[must_use]
    pub fn extract_dofs(&self, point: &Point3<f64>) -> Vec<Vector3<f64>> {
        let center = self.bbox.center();
        let size = self.bbox.size();
        let local = point - center;

        let mut projector = Matrix3::zeros();
        let mut count = 0.0;
        for linear in &self.operators {
            let delta = local - linear * local;
            if self.is_lattice_vector(&delta, &size) {
                projector += linear;
                count += 1.0;
            }
        }
        if count == 0.0 {
            return Vec::new();
        }
        projector /= count;

        let mut basis: Vec<Vector3<f64>> = Vec::new();
        for axis in 0..self.dim {
            let mut column: Vector3<f64> = projector.column(axis).into_owned();
            for b in &basis {
                column -= *b * b.dot(&column);
            }
            if let Some(unit) = column.try_normalize(BASIS_EPSILON) {
                basis.push(unit);
            }
        }
        basis
    }

    /// Number of independent directions at `point`.
    #[must_use]
    pub fn num_dofs(&self, point: &Point3<f64>) -> usize {
        self.extract_dofs(point).len()
    }

    /// The unit cell.
    #[must_use]
    pub const fn bbox(&self) -> &Aabb {
        &self.bbox
    }

    fn is_lattice_vector(&self, delta: &Vector3<f64>, size: &Vector3<f64>) -> bool {
        (0..self.dim).all(|i| {
            if size[i] <= self.tolerance {
                delta[i].abs() <= self.tolerance
            } else {
                let cells = delta[i] / size[i];
                (cells - cells.round()).abs() * size[i] <= self.tolerance
            }
        })
    }
}
