//! Point-group symmetry operators.
//!
//! Every group handled here is a group of *signed permutation* matrices, so
//! operators are generated exactly (entries are 0 or ±1) and applying them
//! to coordinates introduces no rounding beyond the centering.

use nalgebra::{Matrix3, Point3, Vector3};

use crate::error::{SymmetryError, SymmetryResult};

/// Symmetry class of a wire pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SymmetryGroup {
    /// Full octahedral group `Oh` (48 operators, 3D only).
    #[default]
    Cubic,
    /// Dihedral group of the square `D4` (8 operators) acting on XY.
    Square,
    /// Reflections through the axis-aligned mid planes
    /// (8 operators in 3D, 4 in 2D).
    Orthotropic,
}

impl SymmetryGroup {
    /// The isotropic group for a dimension: cubic in 3D, square in 2D.
    #[must_use]
    pub const fn isotropic_for(dim: usize) -> Self {
        if dim == 2 {
            Self::Square
        } else {
            Self::Cubic
        }
    }

    /// Group name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Cubic => "cubic",
            Self::Square => "square",
            Self::Orthotropic => "orthotropic",
        }
    }
}

/// An affine point-group operator `x ↦ R (x − c) + c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetryOperator {
    /// Linear part (a signed permutation matrix).
    pub linear: Matrix3<f64>,
    /// Fixed center.
    pub center: Point3<f64>,
}

impl SymmetryOperator {
    /// The identity about `center`.
    #[must_use]
    pub fn identity(center: Point3<f64>) -> Self {
        Self {
            linear: Matrix3::identity(),
            center,
        }
    }

    /// Apply to a point.
    #[must_use]
    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        self.center + self.linear * (p - self.center)
    }

    /// Apply the linear part to a direction.
    #[must_use]
    pub fn apply_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.linear * v
    }

    /// Returns true for proper rotations (determinant +1).
    #[must_use]
    pub fn is_rotation(&self) -> bool {
        self.linear.determinant() > 0.0
    }
}

/// The operators of a symmetry group about a center.
///
/// The identity is always the first operator; the remaining order is fixed
/// (permutations in lexicographic order, then sign patterns), which makes
/// every search over the operators deterministic.
///
/// # Example
///
/// ```
/// use wire_symmetry::{SymmetryGroup, SymmetryOperators};
/// use nalgebra::Point3;
///
/// let ops = SymmetryOperators::new(SymmetryGroup::Cubic, 3, Point3::origin()).unwrap();
/// assert_eq!(ops.len(), 48);
/// assert_eq!(ops.rotations_only().len(), 24);
/// ```
#[derive(Debug, Clone)]
pub struct SymmetryOperators {
    group: SymmetryGroup,
    dim: usize,
    operators: Vec<SymmetryOperator>,
}

impl SymmetryOperators {
    /// Generate the operators of `group` in dimension `dim` about `center`.
    ///
    /// # Errors
    ///
    /// Returns [`SymmetryError::UnsupportedGroup`] for the cubic group
    /// outside 3D or any dimension other than 2 or 3.
    pub fn new(group: SymmetryGroup, dim: usize, center: Point3<f64>) -> SymmetryResult<Self> {
        let unsupported = || SymmetryError::UnsupportedGroup {
            group: group.name(),
            dim,
        };
        let (permuted_axes, signed_axes): (usize, usize) = match (group, dim) {
            (SymmetryGroup::Cubic, 3) => (3, 3),
            (SymmetryGroup::Square, 2 | 3) => (2, 2),
            (SymmetryGroup::Orthotropic, 2 | 3) => (1, dim),
            _ => return Err(unsupported()),
        };

        let mut operators = Vec::new();
        for perm in permutations(permuted_axes) {
            for signs in 0..(1u32 << signed_axes) {
                let mut linear = Matrix3::identity();
                for row in 0..3 {
                    let col = if row < permuted_axes { perm[row] } else { row };
                    let negative = row < signed_axes && signs & (1 << row) != 0;
                    for c in 0..3 {
                        linear[(row, c)] = 0.0;
                    }
                    linear[(row, col)] = if negative { -1.0 } else { 1.0 };
                }
                operators.push(SymmetryOperator { linear, center });
            }
        }

        Ok(Self {
            group,
            dim,
            operators,
        })
    }

    /// The group these operators belong to.
    #[must_use]
    pub const fn group(&self) -> SymmetryGroup {
        self.group
    }

    /// Spatial dimension.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// All operators, identity first.
    #[must_use]
    pub fn operators(&self) -> &[SymmetryOperator] {
        &self.operators
    }

    /// Iterate over the operators.
    pub fn iter(&self) -> impl Iterator<Item = &SymmetryOperator> {
        self.operators.iter()
    }

    /// Number of operators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Returns true if there are no operators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// The rotational subgroup (determinant +1).
    ///
    /// In 2D the determinant is taken over the XY block, since the Z row is
    /// always the identity.
    #[must_use]
    pub fn rotations_only(&self) -> Self {
        Self {
            group: self.group,
            dim: self.dim,
            operators: self
                .operators
                .iter()
                .filter(|op| op.is_rotation())
                .copied()
                .collect(),
        }
    }
}

/// All permutations of `0..n` in lexicographic order.
fn permutations(n: usize) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    let mut current: Vec<usize> = (0..n).collect();
    loop {
        result.push(current.clone());
        // Next lexicographic permutation.
        let Some(i) = (1..current.len()).rev().find(|&i| current[i - 1] < current[i]) else {
            break;
        };
        let pivot = i - 1;
        let Some(j) = (pivot + 1..current.len())
            .rev()
            .find(|&j| current[j] > current[pivot])
        else {
            break;
        };
        current.swap(pivot, j);
        current[i..].reverse();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_permutations() {
        assert_eq!(permutations(1), vec![vec![0]]);
        let perms = permutations(3);
        assert_eq!(perms.len(), 6);
        assert_eq!(perms[0], vec![0, 1, 2]);
        assert_eq!(perms[5], vec![2, 1, 0]);
    }

    #[test]
    fn test_group_sizes() {
        let c = Point3::origin();
        let size = |g, d| SymmetryOperators::new(g, d, c).unwrap().len();
        assert_eq!(size(SymmetryGroup::Cubic, 3), 48);
        assert_eq!(size(SymmetryGroup::Square, 2), 8);
        assert_eq!(size(SymmetryGroup::Orthotropic, 3), 8);
        assert_eq!(size(SymmetryGroup::Orthotropic, 2), 4);
    }

    #[test]
    fn test_cubic_requires_3d() {
        assert!(matches!(
            SymmetryOperators::new(SymmetryGroup::Cubic, 2, Point3::origin()),
            Err(SymmetryError::UnsupportedGroup { dim: 2, .. })
        ));
    }

    #[test]
    fn test_identity_first() {
        let ops = SymmetryOperators::new(SymmetryGroup::Cubic, 3, Point3::origin()).unwrap();
        assert_eq!(ops.operators()[0].linear, Matrix3::identity());
    }

    #[test]
    fn test_operators_are_orthogonal() {
        let ops = SymmetryOperators::new(SymmetryGroup::Cubic, 3, Point3::origin()).unwrap();
        for op in ops.iter() {
            let product = op.linear * op.linear.transpose();
            assert_relative_eq!(product, Matrix3::identity(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotations_2d() {
        let ops = SymmetryOperators::new(SymmetryGroup::Square, 2, Point3::origin()).unwrap();
        assert_eq!(ops.rotations_only().len(), 4);
    }

    #[test]
    fn test_apply_about_center() {
        let center = Point3::new(1.0, 1.0, 1.0);
        let ops = SymmetryOperators::new(SymmetryGroup::Orthotropic, 3, center).unwrap();
        // Sign pattern 1 flips X.
        let flipped = ops.operators()[1].apply(&Point3::new(2.0, 1.5, 0.0));
        assert_relative_eq!(flipped, Point3::new(0.0, 1.5, 0.0));
    }
}
