//! Axis-aligned bounding box.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
///
/// An empty box has `min > max` on every axis, so that including the first
/// point makes it a degenerate box around that point.
///
/// # Example
///
/// ```
/// use wire_types::Aabb;
/// use nalgebra::Point3;
///
/// let bbox = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
/// assert_eq!(bbox.center(), Point3::new(1.0, 1.0, 1.0));
/// assert!(bbox.contains(&Point3::new(1.0, 0.5, 2.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// Create a box from two corners, sorting them per axis.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// An empty box that contains nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// The bounding box of a set of points. Empty if there are none.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(p);
        }
        bbox
    }

    /// Returns true if the box contains no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Extent along each axis.
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        if self.is_empty() {
            Vector3::zeros()
        } else {
            self.max - self.min
        }
    }

    /// Half of the extent along each axis.
    #[must_use]
    pub fn half_size(&self) -> Vector3<f64> {
        self.size() * 0.5
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Length of the main diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.size().norm()
    }

    /// Grow the box to include `point`.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Returns true if `point` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Returns true if `point` lies inside the box grown by `tol` on all sides.
    #[must_use]
    pub fn contains_with_tolerance(&self, point: &Point3<f64>, tol: f64) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] - tol && point[i] <= self.max[i] + tol)
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Returns true if both boxes match within `tol` on every corner coordinate.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        (0..3).all(|i| {
            (self.min[i] - other.min[i]).abs() <= tol && (self.max[i] - other.max[i]).abs() <= tol
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_sorts_corners() {
        let bbox = Aabb::new(Point3::new(1.0, 0.0, 5.0), Point3::new(0.0, 2.0, 3.0));
        assert_eq!(bbox.min, Point3::new(0.0, 0.0, 3.0));
        assert_eq!(bbox.max, Point3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_empty() {
        let bbox = Aabb::empty();
        assert!(bbox.is_empty());
        assert_eq!(bbox.size(), Vector3::zeros());
    }

    #[test]
    fn test_from_points() {
        let points = [
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(1.0, 3.0, 0.0),
            Point3::new(0.0, 1.0, -2.0),
        ];
        let bbox = Aabb::from_points(&points);
        assert_eq!(bbox.min, Point3::new(-1.0, 0.0, -2.0));
        assert_eq!(bbox.max, Point3::new(1.0, 3.0, 0.0));
        assert_relative_eq!(bbox.half_size().y, 1.5);
    }

    #[test]
    fn test_contains_with_tolerance() {
        let bbox = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let p = Point3::new(1.0 + 1e-9, 0.5, 0.5);
        assert!(!bbox.contains(&p));
        assert!(bbox.contains_with_tolerance(&p, 1e-6));
    }
}
