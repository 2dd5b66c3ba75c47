//! API regression tests for the wire crates.
//!
//! Organized in tiers following the pipeline:
//!
//! - Tier 1: Networks (wire-types)
//! - Tier 2: Symmetry (wire-symmetry)
//! - Tier 3: Parameters (wire-params)
//! - Tier 4: Tiling and inflation (wire-tiler, wire-inflate)
//! - Tier 5: Exploration (wire-explore)
//!
//! A failure here after an API change means the change is breaking.

// Allow test-specific patterns
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::path::PathBuf;

use wires::prelude::*;
use wires::{explore, inflate, params, symmetry, types};

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

// =============================================================================
// TIER 1: Networks
// =============================================================================

mod tier1_networks {
    use super::*;

    #[test]
    fn load_data_files() {
        let cube = load_wire(data("cube.wire")).unwrap();
        assert_eq!(cube.dim(), 3);
        assert_eq!(cube.num_vertices(), 8);
        assert_eq!(cube.num_edges(), 12);

        let bcc = load_wire(data("bcc.wire")).unwrap();
        assert_eq!(bcc.num_vertices(), 9);
        assert_eq!(bcc.vertex_neighbors(8).len(), 8);
    }

    #[test]
    fn planar_files_are_2d() {
        let square =
            parse_wire("v 0 0\nv 1 0\nv 1 1\nv 0 1\nl 1 2\nl 2 3\nl 3 4\nl 4 1\n").unwrap();
        assert_eq!(square.dim(), 2);
        assert!(square.vertices().iter().all(|v| v.z == 0.0));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bcc.wire");
        let bcc = load_wire(data("bcc.wire")).unwrap();
        save_wire(&bcc, &path).unwrap();

        let reloaded = load_wire(&path).unwrap();
        assert_eq!(reloaded.vertices(), bcc.vertices());
        assert_eq!(reloaded.edges(), bcc.edges());
    }

    #[test]
    fn bounds_and_fitting() {
        let mut diamond = load_wire(data("diamond.wire")).unwrap();
        let bbox = diamond.bbox();
        assert_eq!(bbox.size(), types::Vector3::new(2.0, 2.0, 2.0));

        diamond.scale_to_fit(
            types::Point3::new(-0.5, -0.5, -0.5),
            types::Point3::new(0.5, 0.5, 0.5),
        );
        assert_eq!(diamond.center(), types::Point3::origin());
    }

    #[test]
    fn printability_policies() {
        let cube = load_wire(data("cube.wire")).unwrap();
        assert!(cube.is_printable(&types::AlwaysPrintable));
        // The top square hangs at 90 degrees.
        assert!(!cube.is_printable(&types::OverhangPolicy::default()));
    }
}

// =============================================================================
// TIER 2: Symmetry
// =============================================================================

mod tier2_symmetry {
    use super::*;

    #[test]
    fn cubic_symmetry_detection() {
        for (name, expected) in [("cube.wire", true), ("bcc.wire", true), ("diamond.wire", false)] {
            let network = load_wire(data(name)).unwrap();
            let checker = SymmetryChecker::new(&network, 1e-9);
            assert_eq!(checker.has_cubic_symmetry(), expected, "{name}");
        }
    }

    #[test]
    fn checker_tracks_vertex_edits() {
        let mut network = load_wire(data("bcc.wire")).unwrap();
        let mut checker = SymmetryChecker::new(&network, 1e-9);
        assert!(checker.has_cubic_symmetry());

        let mut vertices = network.vertices().to_vec();
        vertices[8].x += 0.1;
        network.set_vertices(vertices).unwrap();
        checker.update(&network);
        assert!(!checker.has_cubic_symmetry());
    }

    #[test]
    fn rotational_orbits() {
        let seed = types::Point3::new(1.0, 0.0, 0.0);
        let square =
            SymmetryOperators::new(SymmetryGroup::Square, 2, types::Point3::origin()).unwrap();
        let orbit = symmetry::orbit_closure(&seed, &square.rotations_only(), 1e-9);
        assert_eq!(orbit.len(), 4);

        let cubic =
            SymmetryOperators::new(SymmetryGroup::Cubic, 3, types::Point3::origin()).unwrap();
        let orbit = symmetry::orbit_closure(&seed, &cubic.rotations_only(), 1e-9);
        assert_eq!(orbit.len(), 6);
    }

    #[test]
    fn network_orbits() {
        let bcc = load_wire(data("bcc.wire")).unwrap();
        let ops = SymmetryOperators::new(SymmetryGroup::Cubic, 3, bcc.center()).unwrap();
        let orbits = SymmetryOrbits::compute(&bcc, &ops, 1e-9).unwrap();
        assert_eq!(orbits.num_vertex_orbits(), 2);
        assert_eq!(orbits.num_edge_orbits(), 1);
    }

    #[test]
    fn orbit_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bcc.orbit");
        let bcc = load_wire(data("bcc.wire")).unwrap();
        let ops = SymmetryOperators::new(SymmetryGroup::Cubic, 3, bcc.center()).unwrap();
        let orbits = SymmetryOrbits::compute(&bcc, &ops, 1e-9).unwrap();

        symmetry::save_orbits(&orbits, &path).unwrap();
        let loaded = symmetry::load_orbits(&path, bcc.num_vertices(), bcc.num_edges()).unwrap();
        assert_eq!(loaded, orbits);
    }
}

// =============================================================================
// TIER 3: Parameters
// =============================================================================

mod tier3_parameters {
    use super::*;

    #[test]
    fn cube_thickness_field() {
        let cube = load_wire(data("cube.wire")).unwrap();
        let mut thickness =
            params::ThicknessParameters::new(TargetType::Vertex, cube.num_vertices(), 0.5);
        assert_eq!(thickness.evaluate(&Variables::new()).unwrap(), vec![0.5; 8]);

        thickness.add(vec![0, 1], "", 0.1).unwrap();
        let field = thickness.evaluate(&Variables::new()).unwrap();
        assert_eq!(field[..2], [0.1, 0.1]);
        assert!(field[2..].iter().all(|&t| t == 0.5));
    }

    #[test]
    fn symmetric_parameters() {
        let bcc = load_wire(data("bcc.wire")).unwrap();
        let ops = SymmetryOperators::new(SymmetryGroup::Cubic, 3, bcc.center()).unwrap();
        let orbits = SymmetryOrbits::compute(&bcc, &ops, 1e-9).unwrap();
        let mut manager = ParameterManager::from_orbits(
            &bcc,
            &orbits,
            0.05,
            TargetType::Vertex,
            DofKind::Isotropic,
        )
        .unwrap();
        assert_eq!(manager.num_thickness_dofs(), 2);
        assert_eq!(manager.num_offset_dofs(), 0);

        manager.set_dofs(&[0.04, 0.08]).unwrap();
        let field = manager.evaluate_thickness(&Variables::new()).unwrap();
        assert_eq!(field[0], 0.04);
        assert_eq!(field[8], 0.08);
    }

    #[test]
    fn formulas_and_dof_files() {
        let cube = load_wire(data("cube.wire")).unwrap();
        let mut manager = ParameterManager::new(&cube, 0.1, TargetType::Vertex);
        manager.add_thickness(vec![0, 1, 2, 3], "0.5 * t", 0.0).unwrap();
        manager.add_offset_orthotropic(vec![4, 5, 6, 7], "", 0.0, 2).unwrap();

        let mut variables = Variables::new();
        variables.insert("t".to_string(), 0.2);
        let field = manager.evaluate_thickness(&variables).unwrap();
        assert!((field[0] - 0.1).abs() < 1e-12);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.dof");
        manager.set_dofs(&[0.0, 0.25]).unwrap();
        manager.save_dofs(&path).unwrap();
        let mut other = manager.clone();
        other.set_dofs(&[0.0, 0.0]).unwrap();
        other.load_dofs(&path).unwrap();
        assert_eq!(other.get_dofs(), manager.get_dofs());
    }
}

// =============================================================================
// TIER 4: Tiling and inflation
// =============================================================================

mod tier4_tiling_and_inflation {
    use super::*;

    #[test]
    fn tile_cube_grid() {
        let cube = load_wire(data("cube.wire")).unwrap();
        let manager = ParameterManager::new(&cube, 0.1, TargetType::Vertex);
        let bbox = Aabb::new(types::Point3::origin(), types::Point3::new(2.0, 2.0, 2.0));
        let tiled = WireTiler::new(cube).tile_with_box(&manager, &bbox, [2, 2, 2]).unwrap();
        assert_eq!(tiled.num_vertices(), 27);
        assert_eq!(tiled.num_edges(), 54);
        assert_eq!(
            tiled.attribute(wires::tiler::THICKNESS_ATTRIBUTE).unwrap(),
            &[0.1; 27][..]
        );
    }

    #[test]
    fn inflate_bcc() {
        let bcc = load_wire(data("bcc.wire")).unwrap();
        let mut manager = ParameterManager::new(&bcc, 0.05, TargetType::Vertex);
        manager.add_thickness((0..9).collect(), "", 0.05).unwrap();

        let mesh = InflatorEngine::new(InflatorConfig::default())
            .inflate(&bcc, &manager, &Variables::new())
            .unwrap();
        assert!(mesh.is_watertight());
        assert_eq!(mesh.state(), inflate::InflatorState::Inflated);
        assert_eq!(mesh.shape_velocities().len(), 1);
        assert_eq!(mesh.face_sources().len(), mesh.num_faces());
    }

    #[test]
    fn inflate_phantom_cell() {
        let cube = load_wire(data("cube.wire")).unwrap();
        let mut manager = ParameterManager::new(&cube, 0.1, TargetType::Vertex);
        manager.add_thickness((0..8).collect(), "", 0.1).unwrap();
        let mesh = PhantomMeshGenerator::default()
            .inflate(&cube, &manager, &Variables::new())
            .unwrap();
        assert!(mesh.num_faces() > 0);
        assert!(mesh.face_sources().iter().all(|&e| e < 12));
    }
}

// =============================================================================
// TIER 5: Exploration
// =============================================================================

mod tier5_exploration {
    use super::*;

    #[test]
    fn bcc_design_iteration() {
        let mut session =
            PeriodicExploration::new(data("bcc.wire"), 0.05, ExplorationConfig::default()).unwrap();
        assert!(session.has_cubic_symmetry());
        session.with_all_parameters().unwrap();
        assert_eq!(session.get_dofs(), vec![0.05, 0.05]);

        session.set_dofs(&[0.04, 0.06]).unwrap();
        session.periodic_inflate().unwrap();
        assert_eq!(session.shape_velocities().unwrap().len(), 2);

        let mesh = session.to_mesh().unwrap();
        assert!(mesh.has_attribute(explore::FACE_SOURCE_ATTRIBUTE));
        assert!(mesh.has_attribute("shape_velocity_1"));
    }

    #[test]
    fn diamond_is_not_cubic() {
        let config = ExplorationConfig::default();
        let session = PeriodicExploration::new(data("diamond.wire"), 0.05, config).unwrap();
        assert!(!session.has_cubic_symmetry());
    }
}

// =============================================================================
// Error handling
// =============================================================================

mod error_handling {
    use super::*;

    #[test]
    fn missing_files() {
        assert!(matches!(
            load_wire(data("missing.wire")),
            Err(types::WireError::FileNotFound { .. })
        ));
        assert!(matches!(
            PeriodicExploration::new(data("missing.wire"), 0.05, ExplorationConfig::default()),
            Err(explore::ExploreError::Wire(_))
        ));
    }

    #[test]
    fn malformed_input() {
        assert!(matches!(
            parse_wire("v 0 0 0\nl 1 2\n"),
            Err(types::WireError::InvalidEdge { .. })
        ));
        assert!(matches!(parse_wire("v 0 zero 0\n"), Err(types::WireError::Parse { .. })));
    }

    #[test]
    fn wrong_dof_count() {
        let cube = load_wire(data("cube.wire")).unwrap();
        let mut manager = ParameterManager::new(&cube, 0.1, TargetType::Vertex);
        assert!(matches!(
            manager.set_dofs(&[0.1]),
            Err(params::ParamError::DofCountMismatch { .. })
        ));
    }
}
