//! The inflation driver.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};
use wire_params::{ParameterManager, TargetType, Variables};
use wire_types::WireNetwork;

use crate::collab::{BruteForceDetector, SelfIntersectionDetector};
use crate::config::{InflatorConfig, InflatorVariant, SelfIntersectionPolicy};
use crate::correction::GeometryCorrectionTable;
use crate::error::{InflateError, InflateResult};
use crate::profile::WireProfile;
use crate::replica::Replica;
use crate::result::InflatedMesh;
use crate::surface::{inflate_surface, SurfaceInput};

/// Turns a wire network and a thickness field into a closed triangle surface.
///
/// The engine holds no per-network state: every call takes the network (and
/// parameters) it works on, and the same inputs always give the same mesh.
///
/// # Example
///
/// ```
/// use wire_inflate::{InflatorConfig, InflatorEngine};
/// use wire_params::TargetType;
/// use wire_types::parse_wire;
///
/// let network = parse_wire("v 0 0 0\nv 1 0 0\nl 1 2\n").unwrap();
/// let engine = InflatorEngine::new(InflatorConfig::default());
/// let mesh = engine
///     .inflate_with_fields(&network, &[0.2], TargetType::Edge)
///     .unwrap();
/// assert!(mesh.is_watertight());
/// ```
#[derive(Clone)]
pub struct InflatorEngine {
    config: InflatorConfig,
    profile: Option<WireProfile>,
    correction: Option<GeometryCorrectionTable>,
    detector: Arc<dyn SelfIntersectionDetector>,
}

impl Default for InflatorEngine {
    fn default() -> Self {
        Self::new(InflatorConfig::default())
    }
}

impl fmt::Debug for InflatorEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InflatorEngine")
            .field("config", &self.config)
            .field("profile", &self.profile)
            .field("correction", &self.correction.as_ref().map(GeometryCorrectionTable::num_rows))
            .field("detector", &self.detector.name())
            .finish()
    }
}

impl InflatorEngine {
    /// Create an engine with the default profile and the brute-force
    /// self-intersection detector.
    #[must_use]
    pub fn new(config: InflatorConfig) -> Self {
        Self {
            config,
            profile: None,
            correction: None,
            detector: Arc::new(BruteForceDetector::default()),
        }
    }

    /// Use `profile` instead of the default for the network's dimension.
    #[must_use]
    pub fn with_profile(mut self, profile: WireProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Correct every placed loop through `table`.
    #[must_use]
    pub fn with_correction(mut self, table: GeometryCorrectionTable) -> Self {
        self.correction = Some(table);
        self
    }

    /// Use `detector` for self-intersection checks.
    #[must_use]
    pub fn with_detector(mut self, detector: Arc<dyn SelfIntersectionDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &InflatorConfig {
        &self.config
    }

    /// The profile used for a `dim`-dimensional network: the configured one,
    /// or a regular polygon (3D) or a segment (2D).
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::InvalidProfile`] if the configured number of
    /// sides is below three.
    pub fn profile_for(&self, dim: usize) -> InflateResult<WireProfile> {
        match (&self.profile, dim) {
            (Some(profile), _) => Ok(profile.clone()),
            (None, 2) => Ok(WireProfile::segment()),
            (None, _) => WireProfile::regular(self.config.profile_sides),
        }
    }

    // =========================================================================
    // Inflation
    // =========================================================================

    /// Inflate `network` with the thickness and offsets `manager` evaluates,
    /// and attach one shape velocity per DOF to the result.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::Param`] if the manager does not fit the
    /// network or a formula fails, and any error of
    /// [`inflate_with_fields`](Self::inflate_with_fields).
    pub fn inflate(
        &self,
        network: &WireNetwork,
        manager: &ParameterManager,
        variables: &Variables,
    ) -> InflateResult<InflatedMesh> {
        let (shaped, thickness) = prepare(network, manager, variables)?;
        let mut mesh =
            self.inflate_with_fields(&shaped, &thickness, manager.thickness_target())?;
        let velocities = manager.compute_shape_velocity(&mesh)?;
        mesh.set_shape_velocities(velocities)?;
        Ok(mesh)
    }

    /// Inflate `network` with an explicit thickness field, one value per
    /// vertex or per edge depending on `target`.
    ///
    /// # Errors
    ///
    /// - [`InflateError::Wire`] if the network fails structural validation
    /// - [`InflateError::ThicknessFieldMismatch`] or
    ///   [`InflateError::GeometryThickness`] for a bad thickness field
    /// - any of the `Geometry*` errors raised while building the surface
    /// - [`InflateError::SelfIntersection`] under the fatal policy
    pub fn inflate_with_fields(
        &self,
        network: &WireNetwork,
        thickness: &[f64],
        target: TargetType,
    ) -> InflateResult<InflatedMesh> {
        check_fields(network, thickness, target, self.config.merge_tolerance)?;
        let mesh = match self.config.variant {
            InflatorVariant::Raw => self.build(network, thickness, target)?,
            InflatorVariant::Reflective => {
                let replica = Replica::reflected(network, self.config.merge_tolerance)?;
                self.inflate_replica(&replica, thickness, target)?
            }
        };
        self.check_self_intersection(&mesh)?;

        info!(
            variant = ?self.config.variant,
            edges = network.num_edges(),
            vertices = mesh.num_vertices(),
            faces = mesh.num_faces(),
            "Inflated wire network"
        );
        Ok(mesh)
    }

    /// Inflate a replica and map its sensitivities back to the original.
    pub(crate) fn inflate_replica(
        &self,
        replica: &Replica,
        thickness: &[f64],
        target: TargetType,
    ) -> InflateResult<InflatedMesh> {
        let pulled = replica.pull_thickness(thickness, target);
        let mut mesh = self.build(&replica.network, &pulled, target)?;
        replica.remap(&mut mesh, target);
        Ok(mesh)
    }

    fn build(
        &self,
        network: &WireNetwork,
        thickness: &[f64],
        target: TargetType,
    ) -> InflateResult<InflatedMesh> {
        let profile = self.profile_for(network.dim())?;
        inflate_surface(&SurfaceInput {
            network,
            thickness,
            target,
            profile: &profile,
            correction: self.correction.as_ref(),
            config: &self.config,
        })
    }

    pub(crate) fn check_self_intersection(&self, mesh: &InflatedMesh) -> InflateResult<()> {
        let policy = self.config.self_intersection;
        if !policy.detects() {
            return Ok(());
        }
        let pairs = self
            .detector
            .detect(mesh.vertices(), mesh.faces())
            .map_err(|e| InflateError::external(self.detector.name(), e))?;
        let Some(&first) = pairs.first() else {
            return Ok(());
        };
        if policy == SelfIntersectionPolicy::Fatal {
            return Err(InflateError::SelfIntersection {
                count: pairs.len(),
                first,
            });
        }
        warn!(
            detector = self.detector.name(),
            count = pairs.len(),
            first = ?first,
            "Inflated surface intersects itself"
        );
        Ok(())
    }
}

/// The network with `manager`'s offsets applied, and its thickness field.
pub(crate) fn prepare(
    network: &WireNetwork,
    manager: &ParameterManager,
    variables: &Variables,
) -> InflateResult<(WireNetwork, Vec<f64>)> {
    manager.check_network(network)?;
    let thickness = manager.evaluate_thickness(variables)?;
    let mut shaped = network.clone();
    shaped.set_vertices(manager.apply_offsets(network, variables)?)?;
    Ok((shaped, thickness))
}

/// Structural validation plus the thickness field's length and values.
pub(crate) fn check_fields(
    network: &WireNetwork,
    thickness: &[f64],
    target: TargetType,
    tolerance: f64,
) -> InflateResult<()> {
    network.validate_for_inflation(tolerance)?;
    let expected = match target {
        TargetType::Vertex => network.num_vertices(),
        TargetType::Edge => network.num_edges(),
    };
    if thickness.len() != expected {
        return Err(InflateError::ThicknessFieldMismatch {
            expected,
            actual: thickness.len(),
        });
    }
    if let Some((index, &value)) = thickness
        .iter()
        .enumerate()
        .find(|(_, t)| !t.is_finite() || **t <= 0.0)
    {
        return Err(InflateError::GeometryThickness { index, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::ToolError;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use wire_params::ShapeSensitivity;
    use wire_types::parse_wire;

    fn unit_cube() -> WireNetwork {
        parse_wire(
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0 0 1\nv 1 0 1\nv 1 1 1\nv 0 1 1\n\
             l 1 2\nl 2 3\nl 3 4\nl 4 1\nl 5 6\nl 6 7\nl 7 8\nl 8 5\n\
             l 1 5\nl 2 6\nl 3 7\nl 4 8\n",
        )
        .unwrap()
    }

    fn square() -> WireNetwork {
        parse_wire("v 0 0\nv 1 0\nv 1 1\nv 0 1\nl 1 2\nl 2 3\nl 3 4\nl 4 1\n").unwrap()
    }

    struct AlwaysHit;

    impl SelfIntersectionDetector for AlwaysHit {
        fn name(&self) -> &str {
            "always-hit"
        }

        fn detect(
            &self,
            _vertices: &[Point3<f64>],
            faces: &[[usize; 3]],
        ) -> Result<Vec<(usize, usize)>, ToolError> {
            Ok(vec![(0, faces.len() - 1)])
        }
    }

    struct Broken;

    impl SelfIntersectionDetector for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn detect(
            &self,
            _vertices: &[Point3<f64>],
            _faces: &[[usize; 3]],
        ) -> Result<Vec<(usize, usize)>, ToolError> {
            Err("license expired".into())
        }
    }

    #[test]
    fn test_cube_is_watertight() {
        let mesh = InflatorEngine::default()
            .inflate_with_fields(&unit_cube(), &[0.1; 8], TargetType::Vertex)
            .unwrap();
        assert!(mesh.is_watertight());
        assert!(mesh.signed_measure() > 0.0);
        // Twelve struts of two eight-point loops each.
        assert_eq!(mesh.num_vertices(), 12 * 2 * 8);
        assert_eq!(mesh.face_sources().len(), mesh.num_faces());
        assert!(mesh.face_sources().iter().all(|&e| e < 12));
    }

    #[test]
    fn test_square_outline_area() {
        let mesh = InflatorEngine::default()
            .inflate_with_fields(&square(), &[0.1; 4], TargetType::Edge)
            .unwrap();
        assert!(mesh.is_watertight());
        // Four struts of width 0.1 pulled back 0.055 at each corner, plus
        // four corner quads of area 0.0055.
        assert_relative_eq!(mesh.signed_measure(), 4.0 * 0.89 * 0.1 + 4.0 * 0.0055, epsilon = 1e-9);
    }

    #[test]
    fn test_inflation_is_deterministic() {
        let engine = InflatorEngine::default();
        let a = engine
            .inflate_with_fields(&unit_cube(), &[0.1; 8], TargetType::Vertex)
            .unwrap();
        let b = engine
            .inflate_with_fields(&unit_cube(), &[0.1; 8], TargetType::Vertex)
            .unwrap();
        assert_eq!(a.vertices(), b.vertices());
        assert_eq!(a.faces(), b.faces());
    }

    #[test]
    fn test_rejects_bad_fields() {
        let engine = InflatorEngine::default();
        assert!(matches!(
            engine.inflate_with_fields(&unit_cube(), &[0.1; 3], TargetType::Vertex),
            Err(InflateError::ThicknessFieldMismatch { expected: 8, actual: 3 })
        ));
        let mut field = vec![0.1; 12];
        field[4] = -0.1;
        assert!(matches!(
            engine.inflate_with_fields(&unit_cube(), &field, TargetType::Edge),
            Err(InflateError::GeometryThickness { index: 4, .. })
        ));
    }

    #[test]
    fn test_thick_struts_fail() {
        let engine = InflatorEngine::new(InflatorConfig::default().with_aspect_max(10.0));
        let err = engine
            .inflate_with_fields(&unit_cube(), &[0.9; 8], TargetType::Vertex)
            .unwrap_err();
        assert!(matches!(err, InflateError::GeometryOverlap { .. }));

        let err = InflatorEngine::default()
            .inflate_with_fields(&unit_cube(), &[1.5; 8], TargetType::Vertex)
            .unwrap_err();
        assert!(matches!(err, InflateError::GeometryAspect { .. }));
        assert!(err.is_geometry());
    }

    #[test]
    fn test_self_intersection_policies() {
        let network = unit_cube();
        let fatal =
            InflatorEngine::new(InflatorConfig::strict()).with_detector(Arc::new(AlwaysHit));
        assert!(matches!(
            fatal.inflate_with_fields(&network, &[0.1; 8], TargetType::Vertex),
            Err(InflateError::SelfIntersection { count: 1, .. })
        ));

        let warn = InflatorEngine::new(
            InflatorConfig::default().with_self_intersection(SelfIntersectionPolicy::Warn),
        )
        .with_detector(Arc::new(AlwaysHit));
        assert!(warn
            .inflate_with_fields(&network, &[0.1; 8], TargetType::Vertex)
            .is_ok());

        let broken = InflatorEngine::new(InflatorConfig::strict()).with_detector(Arc::new(Broken));
        match broken.inflate_with_fields(&network, &[0.1; 8], TargetType::Vertex) {
            Err(InflateError::ExternalTool { tool, source }) => {
                assert_eq!(tool, "broken");
                assert_eq!(source.to_string(), "license expired");
            }
            other => panic!("expected a tool error, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_cube_passes_brute_force_detection() {
        let mesh = InflatorEngine::new(InflatorConfig::strict())
            .inflate_with_fields(&unit_cube(), &[0.1; 8], TargetType::Vertex)
            .unwrap();
        assert!(mesh.is_watertight());
    }

    #[test]
    fn test_reflective_maps_back_to_original() {
        let corner = parse_wire("v 0 0\nv 1 0\nv 1 1\nl 1 2\nl 2 3\n").unwrap();
        let mesh = InflatorEngine::new(InflatorConfig::reflective())
            .inflate_with_fields(&corner, &[0.1, 0.1], TargetType::Edge)
            .unwrap();
        assert!(mesh.is_watertight());
        assert!(mesh.face_sources().iter().all(|&e| e < 2));
        for i in 0..mesh.num_surface_vertices() {
            assert!(mesh.wire_vertex_jacobians(i).iter().all(|(w, _)| *w < 3));
            assert!(mesh.thickness_gradients(i).iter().all(|(j, _)| *j < 2));
        }
    }

    #[test]
    fn test_parameter_driven_inflation_has_velocities() {
        let network = unit_cube();
        let mut manager = ParameterManager::new(&network, 0.1, TargetType::Vertex);
        manager.add_thickness((0..8).collect(), "", 0.1).unwrap();
        let mesh = InflatorEngine::default()
            .inflate(&network, &manager, &Variables::new())
            .unwrap();
        assert_eq!(mesh.shape_velocities().len(), 1);
        let field = &mesh.shape_velocities()[0];
        assert_eq!(field.len(), mesh.num_vertices());
        // Thickening pushes every surface point outward.
        assert!(field.iter().all(|v| v.norm() > 0.0));
    }

    #[test]
    fn test_parameter_mismatch() {
        let manager = ParameterManager::new(&square(), 0.1, TargetType::Vertex);
        assert!(matches!(
            InflatorEngine::default().inflate(&unit_cube(), &manager, &Variables::new()),
            Err(InflateError::Param(_))
        ));
    }
}
