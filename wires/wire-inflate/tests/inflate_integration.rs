//! End-to-end inflation of small lattices.

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use wire_inflate::{
    GeometryCorrectionTable, InflateError, InflatedMesh, InflatorConfig, InflatorEngine,
    InflatorState, LoopRefiner, MidpointRefiner, PhantomMeshGenerator, WireProfile,
};
use wire_params::{ParameterManager, ShapeSensitivity, TargetType, Variables};
use wire_types::{parse_wire, WireNetwork};

const CUBE: &str = "\
v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0 0 1\nv 1 0 1\nv 1 1 1\nv 0 1 1\n\
l 1 2\nl 2 3\nl 3 4\nl 4 1\nl 5 6\nl 6 7\nl 7 8\nl 8 5\nl 1 5\nl 2 6\nl 3 7\nl 4 8\n";

fn cube() -> WireNetwork {
    parse_wire(CUBE).unwrap()
}

fn bcc() -> WireNetwork {
    let mut text = String::from(CUBE);
    text.push_str("v 0.5 0.5 0.5\n");
    for v in 1..=8 {
        text.push_str(&format!("l {v} 9\n"));
    }
    parse_wire(&text).unwrap()
}

fn uniform(network: &WireNetwork, thickness: f64) -> ParameterManager {
    let mut manager = ParameterManager::new(network, thickness, TargetType::Vertex);
    manager
        .add_thickness((0..network.num_vertices()).collect(), "", thickness)
        .unwrap();
    manager
}

fn inflate_uniform(network: &WireNetwork, thickness: f64) -> InflatedMesh {
    InflatorEngine::default()
        .inflate(network, &uniform(network, thickness), &Variables::new())
        .unwrap()
}

// =============================================================================
// Surfaces
// =============================================================================

#[test]
fn bcc_cell_is_closed() {
    let mesh = inflate_uniform(&bcc(), 0.05);
    assert!(mesh.is_watertight());
    assert!(mesh.signed_measure() > 0.0);
    assert_eq!(mesh.state(), InflatorState::Inflated);

    // Every surface point stays within a strut radius of the network.
    let bbox = mesh.bbox();
    for axis in 0..3 {
        assert!(bbox.min[axis] > -0.05 && bbox.max[axis] < 1.05);
    }
}

#[test]
fn square_profile_is_closed() {
    let mesh = InflatorEngine::default()
        .with_profile(WireProfile::square())
        .inflate_with_fields(&cube(), &[0.1; 8], TargetType::Vertex)
        .unwrap();
    assert!(mesh.is_watertight());
    assert_eq!(mesh.num_vertices(), 12 * 2 * 4);
}

#[test]
fn planar_triangle_network() {
    let network = parse_wire(
        "v 0 0\nv 2 0\nv 1 1.5\nv 1 0.5\nl 1 2\nl 2 3\nl 3 1\nl 1 4\nl 2 4\nl 3 4\n",
    )
    .unwrap();
    let mesh = InflatorEngine::default()
        .inflate_with_fields(&network, &[0.05; 6], TargetType::Edge)
        .unwrap();
    assert_eq!(mesh.dim(), 2);
    assert!(mesh.is_watertight());
    assert!(mesh.vertices().iter().all(|p| p.z == 0.0));
}

#[test]
fn profile_must_fit_dimension() {
    let err = InflatorEngine::default()
        .with_profile(WireProfile::segment())
        .inflate_with_fields(&cube(), &[0.1; 8], TargetType::Vertex)
        .unwrap_err();
    assert!(matches!(err, InflateError::ProfileDimensionMismatch { dim: 3, .. }));
}

#[test]
fn structural_errors_come_first() {
    let network = parse_wire("v 0 0 0\nv 1 0 0\nl 1 2\nl 2 1\n").unwrap();
    let err = InflatorEngine::default()
        .inflate_with_fields(&network, &[0.1, 0.1], TargetType::Vertex)
        .unwrap_err();
    assert!(matches!(err, InflateError::Wire(_)));
}

// =============================================================================
// Sensitivities
// =============================================================================

#[test]
fn thickness_velocity_matches_finite_difference() {
    let network = bcc();
    let h = 1e-6;
    let base = inflate_uniform(&network, 0.05);
    let moved = inflate_uniform(&network, 0.05 + h);
    assert_eq!(base.num_vertices(), moved.num_vertices());

    let velocity = &base.shape_velocities()[0];
    for ((p, q), v) in base.vertices().iter().zip(moved.vertices()).zip(velocity) {
        let fd = (q - p) / h;
        assert_relative_eq!(fd, *v, epsilon = 1e-6);
    }
}

#[test]
fn translation_velocity_is_rigid() {
    let network = cube();
    let mut manager = ParameterManager::new(&network, 0.1, TargetType::Vertex);
    manager
        .add_offset_orthotropic((0..8).collect(), "", 0.0, 0)
        .unwrap();
    let mesh = InflatorEngine::default()
        .inflate(&network, &manager, &Variables::new())
        .unwrap();
    assert_eq!(mesh.shape_velocities().len(), 1);
    for v in &mesh.shape_velocities()[0] {
        assert_relative_eq!(*v, Vector3::x(), epsilon = 1e-12);
    }

    let gradient = manager.compute_wire_gradient(&mesh).unwrap();
    assert_eq!(gradient.len(), 8 * 3);
}

#[test]
fn single_vertex_offset_velocity_tracks_finite_difference() {
    // Only the body center moves, so the diagonal struts turn while the
    // cube edges stay axis-aligned.
    let network = bcc();
    let mut manager = uniform(&network, 0.05);
    manager.add_offset_orthotropic(vec![8], "", 0.0, 0).unwrap();
    let engine = InflatorEngine::default();
    let variables = Variables::new();
    let base = engine.inflate(&network, &manager, &variables).unwrap();

    let h = 1e-6;
    manager.set_dofs(&[0.05, h]).unwrap();
    let moved = engine.inflate(&network, &manager, &variables).unwrap();
    assert_eq!(base.num_vertices(), moved.num_vertices());

    // Loops move rigidly with their vertex; what is left over comes from
    // struts turning and pullbacks changing, both of order thickness.
    let velocity = &base.shape_velocities()[1];
    let worst = base
        .vertices()
        .iter()
        .zip(moved.vertices())
        .zip(velocity)
        .map(|((p, q), v)| ((q - p) / h - v).norm())
        .fold(0.0_f64, f64::max);
    assert!(worst < 0.5, "worst velocity error {worst}");
}

#[test]
fn formula_driven_thickness_has_no_velocity() {
    let network = cube();
    let mut manager = ParameterManager::new(&network, 0.1, TargetType::Vertex);
    manager.add_thickness((0..8).collect(), "t", 0.1).unwrap();
    let mut variables = Variables::new();
    variables.insert("t".to_string(), 0.08);

    let mesh = InflatorEngine::default()
        .inflate(&network, &manager, &variables)
        .unwrap();
    assert!(mesh.shape_velocities()[0].iter().all(|v| v.norm() == 0.0));

    let err = InflatorEngine::default()
        .inflate(&network, &manager, &Variables::new())
        .unwrap_err();
    assert!(matches!(err, InflateError::Param(_)));
}

// =============================================================================
// Variants
// =============================================================================

#[test]
fn reflective_cube_corner() {
    // One octant of the cube lattice: three struts from the origin.
    let corner =
        parse_wire("v 0 0 0\nv 0.5 0 0\nv 0 0.5 0\nv 0 0 0.5\nl 1 2\nl 1 3\nl 1 4\n").unwrap();
    let mesh = InflatorEngine::new(InflatorConfig::reflective())
        .inflate(&corner, &uniform(&corner, 0.05), &Variables::new())
        .unwrap();
    assert!(mesh.is_watertight());
    assert!(mesh.face_sources().iter().all(|&e| e < 3));
    let bbox = mesh.bbox();
    assert!(bbox.max.x > 0.9 && bbox.max.y > 0.9 && bbox.max.z > 0.9);
    for i in 0..mesh.num_surface_vertices() {
        assert!(mesh.wire_vertex_jacobians(i).iter().all(|(w, _)| *w < 4));
    }
    assert_eq!(mesh.shape_velocities()[0].len(), mesh.num_vertices());
}

#[test]
fn phantom_cell_is_cropped() {
    let network = cube();
    let generator = PhantomMeshGenerator::default();
    let mesh = generator
        .inflate(&network, &uniform(&network, 0.1), &Variables::new())
        .unwrap();
    assert!(mesh.num_faces() > 0);
    assert!(mesh.face_sources().iter().all(|&e| e < 12));

    let bbox = mesh.bbox();
    for axis in 0..3 {
        assert!(bbox.min[axis] > -0.1 && bbox.max[axis] < 1.1);
    }
    for face in mesh.faces() {
        let c = face
            .iter()
            .map(|&v| mesh.vertices()[v].coords)
            .sum::<Vector3<f64>>()
            / 3.0;
        let c = Point3::from(c);
        assert!((0..3).all(|a| c[a] > -1e-6 && c[a] < 1.0 + 1e-6));
    }
}

// =============================================================================
// Corrections and refinement
// =============================================================================

#[test]
fn correction_moves_axis_struts() {
    let offsets = vec!["0.002,0"; 8].join(",");
    let text = format!("class,thickness,offsets\naxis,0.1,{offsets}\n");
    let table = GeometryCorrectionTable::parse(&text).unwrap();

    let plain = InflatorEngine::default()
        .inflate_with_fields(&cube(), &[0.1; 8], TargetType::Vertex)
        .unwrap();
    let corrected = InflatorEngine::default()
        .with_correction(table)
        .inflate_with_fields(&cube(), &[0.1; 8], TargetType::Vertex)
        .unwrap();
    assert!(corrected.is_watertight());
    assert_eq!(plain.num_vertices(), corrected.num_vertices());
    for (p, q) in plain.vertices().iter().zip(corrected.vertices()) {
        assert_relative_eq!((q - p).norm(), 0.002, epsilon = 1e-12);
    }
}

#[test]
fn correction_with_wrong_point_count_fails() {
    let table = GeometryCorrectionTable::parse("axis,0.1,0,0,0,0,0,0\n").unwrap();
    let err = InflatorEngine::default()
        .with_correction(table)
        .inflate_with_fields(&cube(), &[0.1; 8], TargetType::Vertex)
        .unwrap_err();
    assert!(matches!(err, InflateError::CorrectionMismatch { expected: 8, actual: 3, .. }));
}

#[test]
fn refinement_keeps_everything_in_step() {
    let mut mesh = inflate_uniform(&cube(), 0.1);
    let coarse_faces = mesh.num_faces();
    mesh.refine(&MidpointRefiner, 1).unwrap();
    mesh.refine(&LoopRefiner, 1).unwrap();

    assert_eq!(mesh.state(), InflatorState::Refined);
    assert_eq!(mesh.num_faces(), coarse_faces * 16);
    assert_eq!(mesh.face_sources().len(), mesh.num_faces());
    assert_eq!(mesh.shape_velocities()[0].len(), mesh.num_vertices());
    assert!(mesh.is_watertight());
    let prolongation = mesh.prolongation().unwrap();
    assert_eq!(prolongation.num_fine(), mesh.num_vertices());
}
