//! Pluggable printability predicates for wire networks.

use nalgebra::Vector3;

use crate::network::WireNetwork;

/// A rule deciding whether a wire network can be fabricated.
pub trait PrintabilityPolicy {
    /// Returns true if `network` satisfies the rule.
    fn is_printable(&self, network: &WireNetwork) -> bool;
}

/// Accepts every network.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPrintable;

impl PrintabilityPolicy for AlwaysPrintable {
    fn is_printable(&self, _network: &WireNetwork) -> bool {
        true
    }
}

/// Rejects struts that overhang more than a maximum angle.
///
/// The angle of a strut is measured from the build direction (0° is
/// vertical, 90° is horizontal). Struts lying on the build plate (both
/// endpoints at the lowest height) are supported and always accepted.
///
/// # Example
///
/// ```
/// use wire_types::{OverhangPolicy, WireNetwork};
/// use nalgebra::Point3;
///
/// let network = WireNetwork::from_parts(
///     3,
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(0.0, 0.0, 1.0),
///         Point3::new(1.0, 0.0, 1.0),
///     ],
///     vec![[0, 1], [1, 2]],
/// )
/// .unwrap();
///
/// // The horizontal strut at z = 1 overhangs by 90 degrees.
/// assert!(!network.is_printable(&OverhangPolicy::default()));
/// assert!(network.is_printable(&OverhangPolicy::default().with_max_overhang(90.0)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct OverhangPolicy {
    /// Build direction (up).
    pub build_direction: Vector3<f64>,
    /// Maximum overhang angle in degrees.
    pub max_overhang_angle: f64,
    /// Height tolerance for detecting struts on the build plate.
    pub plate_tolerance: f64,
}

impl Default for OverhangPolicy {
    fn default() -> Self {
        Self {
            build_direction: Vector3::z(),
            max_overhang_angle: 45.0,
            plate_tolerance: 1e-6,
        }
    }
}

impl OverhangPolicy {
    /// Policy for planar networks printed along +Y.
    #[must_use]
    pub fn planar() -> Self {
        Self {
            build_direction: Vector3::y(),
            ..Self::default()
        }
    }

    /// Set the build direction.
    #[must_use]
    pub fn with_build_direction(mut self, direction: Vector3<f64>) -> Self {
        self.build_direction = direction;
        self
    }

    /// Set the maximum overhang angle in degrees.
    #[must_use]
    pub const fn with_max_overhang(mut self, degrees: f64) -> Self {
        self.max_overhang_angle = degrees;
        self
    }
}

impl PrintabilityPolicy for OverhangPolicy {
    fn is_printable(&self, network: &WireNetwork) -> bool {
        let Some(up) = self.build_direction.try_normalize(f64::EPSILON) else {
            return false;
        };
        let base = network
            .vertices()
            .iter()
            .map(|v| v.coords.dot(&up))
            .fold(f64::INFINITY, f64::min);
        let max_angle = self.max_overhang_angle.to_radians();

        network.edges().iter().all(|&[a, b]| {
            let pa = network.vertices()[a];
            let pb = network.vertices()[b];
            let on_plate = (pa.coords.dot(&up) - base).abs() <= self.plate_tolerance
                && (pb.coords.dot(&up) - base).abs() <= self.plate_tolerance;
            if on_plate {
                return true;
            }
            match (pb - pa).try_normalize(f64::EPSILON) {
                Some(dir) => dir.dot(&up).abs().clamp(0.0, 1.0).acos() <= max_angle + 1e-12,
                None => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_always_printable() {
        let network = WireNetwork::new(3).unwrap();
        assert!(network.is_printable(&AlwaysPrintable));
    }

    #[test]
    fn test_struts_on_plate_are_supported() {
        let network = WireNetwork::from_parts(
            3,
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            vec![[0, 1]],
        )
        .unwrap();
        assert!(network.is_printable(&OverhangPolicy::default()));
    }

    #[test]
    fn test_diagonal_strut_at_limit() {
        let network = WireNetwork::from_parts(
            3,
            vec![Point3::origin(), Point3::new(1.0, 0.0, 1.0)],
            vec![[0, 1]],
        )
        .unwrap();
        assert!(network.is_printable(&OverhangPolicy::default()));
        assert!(!network.is_printable(&OverhangPolicy::default().with_max_overhang(30.0)));
    }

    #[test]
    fn test_planar_policy() {
        let network = WireNetwork::from_parts(
            2,
            vec![
                Point3::origin(),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            vec![[0, 1], [1, 2]],
        )
        .unwrap();
        assert!(!network.is_printable(&OverhangPolicy::planar()));
    }
}
