//! Matching points within an orbit to the operator relating them.

use nalgebra::Point3;

use crate::error::{SymmetryError, SymmetryResult};
use crate::operators::{SymmetryGroup, SymmetryOperator, SymmetryOperators};

/// Finds the group operator that maps one point of an orbit onto another.
///
/// Used to transport perturbation directions from an orbit's seed vertex to
/// every other member, so that offsets stay equivariant under the group.
///
/// # Example
///
/// ```
/// use wire_symmetry::{IsotropicTransforms, SymmetryGroup};
/// use nalgebra::{Point3, Vector3};
///
/// let transforms = IsotropicTransforms::new(SymmetryGroup::Cubic, 3, Point3::origin(), 1e-9).unwrap();
/// let op = transforms.fit(&Point3::new(1.0, 0.0, 0.0), &Point3::new(0.0, -1.0, 0.0)).unwrap();
/// assert_eq!(op.apply_vector(&Vector3::x()), Vector3::new(0.0, -1.0, 0.0));
/// assert!(transforms.fit(&Point3::new(1.0, 0.0, 0.0), &Point3::new(0.5, 0.0, 0.0)).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct IsotropicTransforms {
    operators: SymmetryOperators,
    tolerance: f64,
}

impl IsotropicTransforms {
    /// Create transforms for `group` about `center`.
    ///
    /// # Errors
    ///
    /// Returns [`SymmetryError::UnsupportedGroup`] if the group does not
    /// exist in `dim`.
    pub fn new(
        group: SymmetryGroup,
        dim: usize,
        center: Point3<f64>,
        tolerance: f64,
    ) -> SymmetryResult<Self> {
        Ok(Self {
            operators: SymmetryOperators::new(group, dim, center)?,
            tolerance,
        })
    }

    /// The first operator (in group order) that maps `from` onto `to`.
    ///
    /// # Errors
    ///
    /// Returns [`SymmetryError::Mismatch`] if `to` is not in the orbit of `from`.
    pub fn fit(&self, from: &Point3<f64>, to: &Point3<f64>) -> SymmetryResult<SymmetryOperator> {
        self.operators
            .iter()
            .find(|op| (op.apply(from) - to).norm() <= self.tolerance)
            .copied()
            .ok_or(SymmetryError::Mismatch {
                from: [from.x, from.y, from.z],
                to: [to.x, to.y, to.z],
            })
    }

    /// The underlying operators.
    #[must_use]
    pub const fn operators(&self) -> &SymmetryOperators {
        &self.operators
    }
}
