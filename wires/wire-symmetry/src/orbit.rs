//! Orbit closure of a point under a set of operators.

// Quantized keys are the canonical ordering; truncation is the intent.
#![allow(clippy::cast_possible_truncation)]

use std::collections::BTreeMap;

use nalgebra::Point3;

use crate::operators::SymmetryOperators;

/// Compute the orbit of `seed` under `operators`.
///
/// Starting from `{seed}`, every operator is applied to every member and the
/// images are inserted until the set stops growing. Members are kept in a
/// canonically ordered map keyed by coordinates quantized to `tol`, so the
/// returned points are sorted lexicographically and the result does not
/// depend on operator order.
///
/// # Example
///
/// ```
/// use wire_symmetry::{orbit_closure, SymmetryGroup, SymmetryOperators};
/// use nalgebra::Point3;
///
/// let ops = SymmetryOperators::new(SymmetryGroup::Square, 2, Point3::origin()).unwrap();
/// let orbit = orbit_closure(&Point3::new(1.0, 0.0, 0.0), &ops.rotations_only(), 1e-9);
/// assert_eq!(orbit.len(), 4);
/// ```
#[must_use]
pub fn orbit_closure(
    seed: &Point3<f64>,
    operators: &SymmetryOperators,
    tol: f64,
) -> Vec<Point3<f64>> {
    let scale = 1.0 / tol.max(f64::EPSILON);
    let key = |p: &Point3<f64>| -> [i64; 3] {
        [
            (p.x * scale).round() as i64,
            (p.y * scale).round() as i64,
            (p.z * scale).round() as i64,
        ]
    };

    let mut members: BTreeMap<[i64; 3], Point3<f64>> = BTreeMap::new();
    members.insert(key(seed), *seed);

    loop {
        let before = members.len();
        let current: Vec<Point3<f64>> = members.values().copied().collect();
        for p in &current {
            for op in operators.iter() {
                let image = op.apply(p);
                members.entry(key(&image)).or_insert(image);
            }
        }
        if members.len() == before {
            break;
        }
    }

    members.into_values().collect()
}
