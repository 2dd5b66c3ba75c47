//! Strut tubes joined at junction patches.
//!
//! Every edge end gets a profile loop, pulled back from its vertex so the
//! loops around one vertex do not collide. Loops at the two ends of an edge
//! are bridged into a tube. The loops around a vertex are closed off by the
//! convex hull of their points with the loop caps removed (3D), or by the
//! convex polygon of their endpoints (2D). Dangling 3D ends get a flat cap.
//!
//! Surface vertex `k` of the loop at end `s` of edge `e` has index
//! `(2e + s) * m + k` for an `m`-point profile.

use hashbrown::HashMap;
use nalgebra::{Matrix3, Point3, Vector3};
use tracing::{debug, warn};
use wire_params::TargetType;
use wire_types::WireNetwork;

use crate::config::InflatorConfig;
use crate::correction::GeometryCorrectionTable;
use crate::error::{InflateError, InflateResult};
use crate::hull::{convex_hull_2d, convex_hull_3d};
use crate::profile::{Frame, WireProfile};
use crate::refine::add_term;
use crate::result::InflatedMesh;

/// Lower bound on the pullback factor, in profile radii.
const MIN_PULLBACK_FACTOR: f64 = 0.5;

/// Struts meeting at less than this angle (radians) cannot be joined.
const MIN_JUNCTION_ANGLE: f64 = 1e-6;

/// How far the loops around one vertex sit from it.
#[derive(Debug, Clone, Copy, Default)]
struct Pullback {
    /// Distance along each strut, `factor * t_max`.
    distance: f64,
    /// Multiple of the largest incident thickness.
    factor: f64,
    /// Thickness entry holding that largest thickness.
    source: usize,
}

/// Everything the builder reads.
pub(crate) struct SurfaceInput<'a> {
    pub(crate) network: &'a WireNetwork,
    pub(crate) thickness: &'a [f64],
    pub(crate) target: TargetType,
    pub(crate) profile: &'a WireProfile,
    pub(crate) correction: Option<&'a GeometryCorrectionTable>,
    pub(crate) config: &'a InflatorConfig,
}

impl SurfaceInput<'_> {
    /// Thickness entry and value for the loop at end `end` of edge `edge`.
    fn loop_thickness(&self, edge: usize, end: usize) -> (usize, f64) {
        let index = match self.target {
            TargetType::Vertex => self.network.edges()[edge][end],
            TargetType::Edge => edge,
        };
        (index, self.thickness[index])
    }

    /// Which end of `edge` sits at `vertex`.
    fn end_at(&self, edge: usize, vertex: usize) -> usize {
        usize::from(self.network.edges()[edge][0] != vertex)
    }
}

#[derive(Default)]
struct SurfaceParts {
    vertices: Vec<Point3<f64>>,
    jacobians: Vec<Vec<(usize, Matrix3<f64>)>>,
    gradients: Vec<Vec<(usize, Vector3<f64>)>>,
    faces: Vec<[usize; 3]>,
    face_sources: Vec<usize>,
}

impl SurfaceParts {
    fn push_face(&mut self, face: [usize; 3], source: usize) {
        self.faces.push(face);
        self.face_sources.push(source);
    }
}

/// Inflate a validated network with a validated thickness field.
pub(crate) fn inflate_surface(input: &SurfaceInput<'_>) -> InflateResult<InflatedMesh> {
    let network = input.network;
    let dim = network.dim();
    let profile = input.profile;
    if (dim == 2) != profile.is_segment() {
        return Err(InflateError::ProfileDimensionMismatch {
            profile: profile.num_points(),
            dim,
        });
    }

    check_aspect(input)?;
    let pullbacks = compute_pullbacks(input)?;
    check_overlap(network, &pullbacks)?;

    let mut parts = SurfaceParts::default();
    place_loops(input, &pullbacks, &mut parts)?;
    build_struts(network.num_edges(), profile.num_points(), dim, &mut parts);

    let m = profile.num_points();
    let (mut junctions, mut caps) = (0_usize, 0_usize);
    for v in 0..network.num_vertices() {
        let loops: Vec<usize> = network
            .vertex_edges(v)
            .iter()
            .map(|&e| 2 * e + input.end_at(e, v))
            .collect();
        match (loops.len(), dim) {
            (0, _) => warn!(vertex = v, "Skipping isolated vertex"),
            (1, 2) => {}
            (1, _) => {
                close_cap(loops[0], m, &mut parts);
                caps += 1;
            }
            (_, 2) => {
                close_polygon_junction(v, &loops, &mut parts)?;
                junctions += 1;
            }
            _ => {
                close_hull_junction(v, &loops, m, &mut parts)?;
                junctions += 1;
            }
        }
    }

    debug!(
        struts = network.num_edges(),
        junctions,
        caps,
        vertices = parts.vertices.len(),
        faces = parts.faces.len(),
        "Built strut surface"
    );
    Ok(InflatedMesh::new(
        dim,
        parts.vertices,
        parts.faces,
        parts.face_sources,
        parts.jacobians,
        parts.gradients,
    ))
}

fn check_aspect(input: &SurfaceInput<'_>) -> InflateResult<()> {
    for edge in 0..input.network.num_edges() {
        let length = input.network.edge_length(edge);
        let thickness = input
            .loop_thickness(edge, 0)
            .1
            .max(input.loop_thickness(edge, 1).1);
        if thickness > input.config.aspect_max * length {
            return Err(InflateError::GeometryAspect {
                edge,
                thickness,
                length,
                aspect_max: input.config.aspect_max,
            });
        }
    }
    Ok(())
}

/// The pullback at each vertex: `κ · t_max`, where
/// `κ = max(margin · ρ · cot(θ_min / 2), ρ / 2)` for profile radius `ρ` and
/// smallest angle `θ_min` between incident struts. This keeps every loop
/// plane a supporting plane of the junction's points. Vertices with fewer
/// than two struts are not pulled back.
fn compute_pullbacks(input: &SurfaceInput<'_>) -> InflateResult<Vec<Pullback>> {
    let network = input.network;
    let radius = input.profile.max_radius();
    let vertices = network.vertices();

    (0..network.num_vertices())
        .map(|v| {
            let incident = network.vertex_edges(v);
            if incident.len() < 2 {
                return Ok(Pullback::default());
            }
            let directions: Vec<Vector3<f64>> = network
                .vertex_neighbors(v)
                .iter()
                .map(|&n| (vertices[n] - vertices[v]).normalize())
                .collect();
            let mut min_angle = std::f64::consts::PI;
            for (i, a) in directions.iter().enumerate() {
                for b in &directions[i + 1..] {
                    min_angle = min_angle.min(a.dot(b).clamp(-1.0, 1.0).acos());
                }
            }
            if min_angle < MIN_JUNCTION_ANGLE {
                return Err(InflateError::junction(v, "two struts leave in the same direction"));
            }

            let factor = (input.config.pullback_margin * radius / (0.5 * min_angle).tan())
                .max(MIN_PULLBACK_FACTOR * radius);
            let mut largest = (0, f64::NEG_INFINITY);
            for &e in incident {
                let (index, t) = input.loop_thickness(e, input.end_at(e, v));
                if t > largest.1 {
                    largest = (index, t);
                }
            }
            Ok(Pullback {
                distance: factor * largest.1,
                factor,
                source: largest.0,
            })
        })
        .collect()
}

fn check_overlap(network: &WireNetwork, pullbacks: &[Pullback]) -> InflateResult<()> {
    for (edge, &[a, b]) in network.edges().iter().enumerate() {
        let pullback = pullbacks[a].distance + pullbacks[b].distance;
        let length = network.edge_length(edge);
        if pullback >= length {
            return Err(InflateError::GeometryOverlap {
                edge,
                pullback,
                length,
            });
        }
    }
    Ok(())
}

fn place_loops(
    input: &SurfaceInput<'_>,
    pullbacks: &[Pullback],
    parts: &mut SurfaceParts,
) -> InflateResult<()> {
    let network = input.network;
    for (edge, &ends) in network.edges().iter().enumerate() {
        let axis = network.edge_vector(edge) / network.edge_length(edge);
        let frame = Frame::for_direction(axis, network.dim());
        for (end, &v) in ends.iter().enumerate() {
            let outward = if end == 0 { axis } else { -axis };
            let pullback = pullbacks[v];
            let center = network.vertices()[v] + outward * pullback.distance;
            let (index, thickness) = input.loop_thickness(edge, end);

            let mut placed = input.profile.place_in_frame(frame, &center, thickness);
            if let Some(table) = input.correction {
                table.apply_correction(&axis, &mut placed)?;
            }
            for (p, g) in placed.points.iter().zip(&placed.thickness_gradients) {
                let mut terms = vec![(index, *g)];
                if pullback.distance > 0.0 {
                    add_term(&mut terms, pullback.source, outward * pullback.factor);
                }
                parts.vertices.push(*p);
                parts.jacobians.push(vec![(v, Matrix3::identity())]);
                parts.gradients.push(terms);
            }
        }
    }
    Ok(())
}

/// Bridge the two loops of every edge. Outward orientation follows from the
/// profile circulating counter-clockwise around the edge direction.
fn build_struts(num_edges: usize, m: usize, dim: usize, parts: &mut SurfaceParts) {
    for edge in 0..num_edges {
        let a = 2 * edge * m;
        let b = a + m;
        if dim == 2 {
            parts.push_face([a, b, b + 1], edge);
            parts.push_face([a, b + 1, a + 1], edge);
            continue;
        }
        for k in 0..m {
            let k1 = (k + 1) % m;
            parts.push_face([a + k, a + k1, b + k1], edge);
            parts.push_face([a + k, b + k1, b + k], edge);
        }
    }
}

/// Fan-triangulate the loop at a dangling end, facing away from the strut.
fn close_cap(loop_id: usize, m: usize, parts: &mut SurfaceParts) {
    let edge = loop_id / 2;
    let s = loop_id * m;
    for k in 1..m - 1 {
        if loop_id % 2 == 0 {
            parts.push_face([s, s + k + 1, s + k], edge);
        } else {
            parts.push_face([s, s + k, s + k + 1], edge);
        }
    }
}

/// The loop that owns most corners of a junction face, as an index into
/// `loops`.
fn majority(owners: [usize; 3]) -> usize {
    if owners[1] == owners[2] {
        owners[1]
    } else {
        owners[0]
    }
}

fn close_hull_junction(
    vertex: usize,
    loops: &[usize],
    m: usize,
    parts: &mut SurfaceParts,
) -> InflateResult<()> {
    let ids: Vec<usize> = loops.iter().flat_map(|&l| l * m..(l + 1) * m).collect();
    let points: Vec<Point3<f64>> = ids.iter().map(|&i| parts.vertices[i]).collect();
    let hull = convex_hull_3d(&points)
        .ok_or_else(|| InflateError::junction(vertex, "loops do not span a volume"))?;

    let kept: Vec<[usize; 3]> = hull
        .into_iter()
        .filter(|tri| {
            let owners = tri.map(|i| i / m);
            owners[0] != owners[1] || owners[1] != owners[2]
        })
        .collect();

    let mut used = vec![false; points.len()];
    let mut edge_count: HashMap<(usize, usize), usize> = HashMap::with_capacity(3 * kept.len());
    for tri in &kept {
        for i in 0..3 {
            used[tri[i]] = true;
            let (a, b) = (tri[i], tri[(i + 1) % 3]);
            *edge_count.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }
    if let Some(i) = used.iter().position(|u| !u) {
        return Err(InflateError::junction(
            vertex,
            format!("point {} of loop {} lies inside the junction", i % m, loops[i / m]),
        ));
    }
    for l in 0..loops.len() {
        for k in 0..m {
            let (a, b) = (l * m + k, l * m + (k + 1) % m);
            if edge_count.get(&(a.min(b), a.max(b))) != Some(&1) {
                return Err(InflateError::junction(
                    vertex,
                    format!("loop {} is not on the junction boundary", loops[l]),
                ));
            }
        }
    }
    let boundary = edge_count.values().filter(|&&c| c == 1).count();
    if boundary != loops.len() * m || edge_count.values().any(|&c| c > 2) {
        return Err(InflateError::junction(vertex, "junction patch is not a manifold"));
    }

    for tri in kept {
        let owner = majority(tri.map(|i| i / m));
        parts.push_face(tri.map(|i| ids[i]), loops[owner] / 2);
    }
    Ok(())
}

fn close_polygon_junction(
    vertex: usize,
    loops: &[usize],
    parts: &mut SurfaceParts,
) -> InflateResult<()> {
    let ids: Vec<usize> = loops.iter().flat_map(|&l| [2 * l, 2 * l + 1]).collect();
    let points: Vec<Point3<f64>> = ids.iter().map(|&i| parts.vertices[i]).collect();
    let hull = convex_hull_2d(&points);
    if hull.len() != points.len() {
        return Err(InflateError::junction(
            vertex,
            "a strut end lies inside the junction polygon",
        ));
    }
    let position: Vec<usize> = {
        let mut position = vec![0; hull.len()];
        for (p, &i) in hull.iter().enumerate() {
            position[i] = p;
        }
        position
    };
    let n = hull.len();
    for (l, &loop_id) in loops.iter().enumerate() {
        let (p0, p1) = (position[2 * l], position[2 * l + 1]);
        if (p0 + 1) % n != p1 && (p1 + 1) % n != p0 {
            return Err(InflateError::junction(
                vertex,
                format!("strut {} is split by the junction polygon", loop_id / 2),
            ));
        }
    }

    for i in 1..n - 1 {
        let tri = [hull[0], hull[i], hull[i + 1]];
        let owner = majority(tri.map(|k| k / 2));
        parts.push_face(tri.map(|k| ids[k]), loops[owner] / 2);
    }
    Ok(())
}
