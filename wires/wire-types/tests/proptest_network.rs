//! Property-based tests for wire networks and the hash grid.
//!
//! Run with: cargo test -p wire-types -- proptest

use nalgebra::{Point3, Vector3};
use proptest::prelude::*;
use wire_types::{parse_wire, write_wire, HashGrid, WireNetwork};

/// Distinct points on a lattice with spacing 0.25.
fn arb_points() -> impl Strategy<Value = Vec<Point3<f64>>> {
    prop::collection::btree_set(prop::array::uniform3(-8i32..=8), 2..24).prop_map(|set| {
        set.into_iter()
            .map(|[x, y, z]| Point3::new(f64::from(x), f64::from(y), f64::from(z)) * 0.25)
            .collect()
    })
}

fn chain(points: Vec<Point3<f64>>) -> WireNetwork {
    let edges = (1..points.len()).map(|i| [i - 1, i]).collect();
    WireNetwork::from_parts(3, points, edges).unwrap()
}

proptest! {
    #[test]
    fn proptest_hash_grid_merges_within_tolerance(
        points in arb_points(),
        jitter in prop::array::uniform3(-1.0f64..1.0),
    ) {
        let tol = 1e-6;
        let mut grid = HashGrid::new(tol);
        for p in &points {
            let (_, inserted) = grid.insert_or_find(*p);
            prop_assert!(inserted);
        }

        let offset = Vector3::from(jitter) * (0.4 * tol / 3.0_f64.sqrt());
        for (i, p) in points.iter().enumerate() {
            prop_assert_eq!(grid.insert_or_find(p + offset), (i, false));
        }
        prop_assert_eq!(grid.len(), points.len());
    }

    #[test]
    fn proptest_wire_text_round_trip(points in arb_points()) {
        let network = chain(points);
        let mut text = Vec::new();
        write_wire(&network, &mut text).unwrap();

        let parsed = parse_wire(&String::from_utf8(text).unwrap()).unwrap();
        prop_assert_eq!(parsed.vertices(), network.vertices());
        prop_assert_eq!(parsed.edges(), network.edges());
    }

    #[test]
    fn proptest_scale_to_fit_hits_target_box(points in arb_points()) {
        let mut network = chain(points);
        let size = network.bbox().size();
        let min = Point3::new(-0.5, -0.5, -0.5);
        let max = Point3::new(0.5, 0.5, 0.5);
        network.scale_to_fit(min, max);

        let bbox = network.bbox();
        for axis in 0..3 {
            // Flat axes are only translated.
            if size[axis] > f64::EPSILON {
                prop_assert!((bbox.min[axis] - min[axis]).abs() < 1e-12);
                prop_assert!((bbox.max[axis] - max[axis]).abs() < 1e-12);
            } else {
                prop_assert!((bbox.min[axis] - min[axis]).abs() < 1e-12);
            }
        }
    }
}
