//! Strut cross-sections and their placement along edges.

use std::f64::consts::TAU;

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{InflateError, InflateResult};

/// An orthonormal frame attached to a strut.
///
/// `normal` and `binormal` span the cross-section plane and satisfy
/// `normal × binormal = tangent`, so a counter-clockwise profile circulates
/// counter-clockwise around the strut direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Strut direction.
    pub tangent: Vector3<f64>,
    /// First cross-section axis (the profile's local `x`).
    pub normal: Vector3<f64>,
    /// Second cross-section axis (the profile's local `y`).
    pub binormal: Vector3<f64>,
}

impl Frame {
    /// A frame around a 3D strut direction.
    ///
    /// The normal depends only on the direction, so both ends of a strut and
    /// every strut with the same direction get the same frame. It also
    /// depends continuously on it: nudging a strut turns its frame by a
    /// comparable amount instead of flipping it.
    #[must_use]
    pub fn from_tangent(tangent: Vector3<f64>) -> Self {
        let tangent = tangent.try_normalize(f64::EPSILON).unwrap_or(Vector3::z());
        let normal = find_perpendicular(tangent);
        let binormal = tangent.cross(&normal);
        Self {
            tangent,
            normal,
            binormal,
        }
    }

    /// A frame around a strut lying in the `xy` plane: the normal is the
    /// in-plane perpendicular and the binormal is `z`.
    #[must_use]
    pub fn planar(tangent: Vector3<f64>) -> Self {
        let flat = Vector3::new(tangent.x, tangent.y, 0.0);
        let tangent = flat.try_normalize(f64::EPSILON).unwrap_or(Vector3::x());
        Self {
            tangent,
            normal: Vector3::new(-tangent.y, tangent.x, 0.0),
            binormal: Vector3::z(),
        }
    }

    /// The frame a `dim`-dimensional network uses for an edge direction.
    #[must_use]
    pub fn for_direction(direction: Vector3<f64>, dim: usize) -> Self {
        if dim == 2 {
            Self::planar(direction)
        } else {
            Self::from_tangent(direction)
        }
    }

    /// World vector of the local cross-section coordinates `(x, y)`.
    #[must_use]
    pub fn to_world(&self, x: f64, y: f64) -> Vector3<f64> {
        self.normal * x + self.binormal * y
    }

    /// Local cross-section coordinates of a world vector.
    #[must_use]
    pub fn to_local(&self, v: &Vector3<f64>) -> (f64, f64) {
        (v.dot(&self.normal), v.dot(&self.binormal))
    }
}

/// Direction whose projection onto the cross-section plane becomes the frame
/// normal. It is kept away from every axis, face diagonal and body diagonal,
/// so the frame turns smoothly with lattice struts under small offsets.
const REFERENCE: Vector3<f64> = Vector3::new(2.0, 2.0, 9.0);

/// Unit vector perpendicular to the unit vector `t`: the reference
/// direction with its `t` component removed. Continuous in `t` everywhere
/// except along the reference itself.
fn find_perpendicular(t: Vector3<f64>) -> Vector3<f64> {
    let r = REFERENCE.normalize();
    (r - t * r.dot(&t))
        .try_normalize(f64::EPSILON)
        .or_else(|| t.cross(&Vector3::x()).try_normalize(f64::EPSILON))
        .unwrap_or(Vector3::y())
}

/// The cross-section swept along every strut.
///
/// A closed counter-clockwise polygon for 3D networks, or a two-point
/// segment for 2D networks. Coordinates are in units of thickness: a
/// profile placed with thickness `t` is scaled by `t`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WireProfile {
    points: Vec<Point2<f64>>,
}

impl WireProfile {
    /// A regular `sides`-gon inscribed in a circle of diameter 1, with its
    /// first point on the local `x` axis.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::InvalidProfile`] for fewer than 3 sides.
    ///
    /// # Example
    ///
    /// ```
    /// use wire_inflate::WireProfile;
    ///
    /// let hexagon = WireProfile::regular(6).unwrap();
    /// assert_eq!(hexagon.num_points(), 6);
    /// assert!((hexagon.max_radius() - 0.5).abs() < 1e-12);
    /// ```
    #[allow(clippy::cast_precision_loss)]
    pub fn regular(sides: usize) -> InflateResult<Self> {
        if sides < 3 {
            return Err(InflateError::InvalidProfile(format!(
                "a polygon needs at least 3 sides, got {sides}"
            )));
        }
        let points = (0..sides)
            .map(|k| {
                let angle = TAU * k as f64 / sides as f64;
                Point2::new(0.5 * angle.cos(), 0.5 * angle.sin())
            })
            .collect();
        Ok(Self { points })
    }

    /// An axis-aligned unit square, so struts have width equal to their
    /// thickness across flats.
    #[must_use]
    pub fn square() -> Self {
        Self {
            points: vec![
                Point2::new(-0.5, -0.5),
                Point2::new(0.5, -0.5),
                Point2::new(0.5, 0.5),
                Point2::new(-0.5, 0.5),
            ],
        }
    }

    /// The unit segment used by 2D networks.
    #[must_use]
    pub fn segment() -> Self {
        Self {
            points: vec![Point2::new(-0.5, 0.0), Point2::new(0.5, 0.0)],
        }
    }

    /// A custom profile. Two points form a segment; three or more form a
    /// polygon, which is reversed if given clockwise.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::InvalidProfile`] for fewer than two points,
    /// non-finite coordinates, a zero-length segment or a zero-area polygon.
    pub fn from_points(mut points: Vec<Point2<f64>>) -> InflateResult<Self> {
        if points.len() < 2 {
            return Err(InflateError::InvalidProfile(format!(
                "need at least 2 points, got {}",
                points.len()
            )));
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(InflateError::InvalidProfile(
                "non-finite coordinate".to_string(),
            ));
        }
        if points.len() == 2 {
            if (points[1] - points[0]).norm() <= f64::EPSILON {
                return Err(InflateError::InvalidProfile(
                    "zero-length segment".to_string(),
                ));
            }
            return Ok(Self { points });
        }

        let area = signed_area(&points);
        if area.abs() <= f64::EPSILON {
            return Err(InflateError::InvalidProfile("zero-area polygon".to_string()));
        }
        if area < 0.0 {
            points.reverse();
        }
        Ok(Self { points })
    }

    /// Profile points in counter-clockwise order.
    #[must_use]
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Number of profile points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Whether this is a 2D segment profile.
    #[must_use]
    pub fn is_segment(&self) -> bool {
        self.points.len() == 2
    }

    /// Largest distance of a profile point from the strut axis, per unit
    /// thickness.
    #[must_use]
    pub fn max_radius(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.coords.norm())
            .fold(0.0, f64::max)
    }

    /// Place the profile around `center`, perpendicular to `direction`.
    #[must_use]
    pub fn place(
        &self,
        direction: &Vector3<f64>,
        center: &Point3<f64>,
        thickness: f64,
    ) -> PlacedLoop {
        let frame = if self.is_segment() {
            Frame::planar(*direction)
        } else {
            Frame::from_tangent(*direction)
        };
        self.place_in_frame(frame, center, thickness)
    }

    /// Place the profile around `center` in a given frame.
    #[must_use]
    pub fn place_in_frame(&self, frame: Frame, center: &Point3<f64>, thickness: f64) -> PlacedLoop {
        let thickness_gradients: Vec<Vector3<f64>> = self
            .points
            .iter()
            .map(|p| frame.to_world(p.x, p.y))
            .collect();
        let points = thickness_gradients
            .iter()
            .map(|g| center + g * thickness)
            .collect();
        PlacedLoop {
            points,
            thickness_gradients,
            frame,
            center: *center,
            thickness,
        }
    }
}

fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        * 0.5
}

/// A profile placed in space around one end of a strut.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLoop {
    /// Loop points in profile order.
    pub points: Vec<Point3<f64>>,
    /// Derivative of each point with respect to the loop's thickness.
    pub thickness_gradients: Vec<Vector3<f64>>,
    /// Frame the profile was placed in.
    pub frame: Frame,
    /// Loop center on the strut axis.
    pub center: Point3<f64>,
    /// Thickness the profile was scaled by.
    pub thickness: f64,
}

impl PlacedLoop {
    /// Number of loop points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }
}
