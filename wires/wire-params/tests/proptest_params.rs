//! Property tests for parameter evaluation.

use proptest::prelude::*;
use wire_params::{OffsetParameters, TargetType, ThicknessParameters, Variables};

fn roi_strategy(n: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::btree_set(0..n, 1..=n).prop_map(|s| s.into_iter().collect())
}

proptest! {
    #[test]
    fn thickness_takes_last_covering_value(
        default in 0.01f64..1.0,
        dofs in prop::collection::vec((roi_strategy(10), 0.01f64..1.0), 0..6),
    ) {
        let mut params = ThicknessParameters::new(TargetType::Vertex, 10, default);
        for (roi, value) in &dofs {
            params.add(roi.clone(), "", *value).unwrap();
        }
        let field = params.evaluate(&Variables::new()).unwrap();
        for (i, t) in field.iter().enumerate() {
            let expected = dofs
                .iter()
                .rev()
                .find(|(roi, _)| roi.contains(&i))
                .map_or(default, |(_, v)| *v);
            prop_assert_eq!(*t, expected);
        }
    }

    #[test]
    fn thickness_derivatives_partition_covered_indices(
        dofs in prop::collection::vec(roi_strategy(8), 1..5),
    ) {
        let mut params = ThicknessParameters::new(TargetType::Edge, 8, 0.5);
        for roi in &dofs {
            params.add(roi.clone(), "", 0.1).unwrap();
        }
        let owners = params.owners();
        for i in 0..8 {
            let total: f64 = (0..params.len()).map(|k| params.derivative(k)[i]).sum();
            prop_assert_eq!(total, if owners[i].is_some() { 1.0 } else { 0.0 });
        }
    }

    #[test]
    fn offsets_are_linear_in_values(
        a in -1.0f64..1.0,
        b in -1.0f64..1.0,
        axis in 0usize..3,
    ) {
        let mut offsets = OffsetParameters::new(3, 3);
        offsets.add_orthotropic(vec![0, 2], "", a, axis).unwrap();
        offsets.add_orthotropic(vec![2], "", b, axis).unwrap();
        let field = offsets.evaluate(&Variables::new()).unwrap();
        prop_assert!((field[0][axis] - a).abs() < 1e-12);
        prop_assert!((field[2][axis] - (a + b)).abs() < 1e-12);
        prop_assert_eq!(field[1].norm(), 0.0);
    }
}
