//! Convex hulls for closing strut junctions.
//!
//! Junction point sets are small (a few loops of a few points each), so a
//! plain incremental hull is used.

use hashbrown::HashSet;
use nalgebra::{Point3, Vector3};
use wire_types::Aabb;

/// Relative tolerance for visibility tests.
const HULL_EPSILON: f64 = 1e-10;

struct HullFace {
    vertices: [usize; 3],
    normal: Vector3<f64>,
    alive: bool,
}

impl HullFace {
    fn new(points: &[Point3<f64>], vertices: [usize; 3]) -> Self {
        let [a, b, c] = vertices.map(|i| points[i]);
        let normal = (b - a)
            .cross(&(c - a))
            .try_normalize(f64::MIN_POSITIVE)
            .unwrap_or_else(Vector3::zeros);
        Self {
            vertices,
            normal,
            alive: true,
        }
    }

    fn distance(&self, points: &[Point3<f64>], p: &Point3<f64>) -> f64 {
        (p - points[self.vertices[0]]).dot(&self.normal)
    }
}

/// Outward-oriented triangles of the convex hull of `points`.
///
/// Returns `None` when the points do not span a volume. Points on or
/// inside the hull do not appear in any face.
pub(crate) fn convex_hull_3d(points: &[Point3<f64>]) -> Option<Vec<[usize; 3]>> {
    if points.len() < 4 {
        return None;
    }
    let scale = Aabb::from_points(points).diagonal().max(f64::MIN_POSITIVE);
    let eps = HULL_EPSILON * scale;

    let [a, b, c, d] = initial_simplex(points, eps)?;
    let mut faces = Vec::with_capacity(2 * points.len());
    for tri in [[a, b, c], [b, a, d], [c, b, d], [a, c, d]] {
        faces.push(HullFace::new(points, tri));
    }

    for (index, p) in points.iter().enumerate() {
        if [a, b, c, d].contains(&index) {
            continue;
        }
        let visible: Vec<usize> = faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.alive && f.distance(points, p) > eps)
            .map(|(i, _)| i)
            .collect();
        if visible.is_empty() {
            continue;
        }

        let mut directed: HashSet<(usize, usize)> = HashSet::with_capacity(3 * visible.len());
        for &fi in &visible {
            let [u, v, w] = faces[fi].vertices;
            directed.extend([(u, v), (v, w), (w, u)]);
        }
        let mut horizon = Vec::new();
        for &fi in &visible {
            let [u, v, w] = faces[fi].vertices;
            for (s, t) in [(u, v), (v, w), (w, u)] {
                if !directed.contains(&(t, s)) {
                    horizon.push((s, t));
                }
            }
            faces[fi].alive = false;
        }
        for (s, t) in horizon {
            faces.push(HullFace::new(points, [s, t, index]));
        }
    }

    Some(
        faces
            .into_iter()
            .filter(|f| f.alive)
            .map(|f| f.vertices)
            .collect(),
    )
}

/// Four points spanning a tetrahedron, ordered so that `[a, b, c]` faces
/// away from `d`.
fn initial_simplex(points: &[Point3<f64>], eps: f64) -> Option<[usize; 4]> {
    let a = 0;
    let b = argmax(points, |p| (p - points[a]).norm())?;
    if (points[b] - points[a]).norm() <= eps {
        return None;
    }
    let axis = (points[b] - points[a]).normalize();
    let line_distance = |p: &Point3<f64>| {
        let v = p - points[a];
        (v - axis * v.dot(&axis)).norm()
    };
    let c = argmax(points, line_distance)?;
    if line_distance(&points[c]) <= eps {
        return None;
    }
    let normal = (points[b] - points[a])
        .cross(&(points[c] - points[a]))
        .normalize();
    let plane_distance = |p: &Point3<f64>| (p - points[a]).dot(&normal);
    let d = argmax(points, |p| plane_distance(p).abs())?;
    let offset = plane_distance(&points[d]);
    if offset.abs() <= eps {
        return None;
    }
    if offset > 0.0 {
        Some([a, c, b, d])
    } else {
        Some([a, b, c, d])
    }
}

fn argmax(points: &[Point3<f64>], score: impl Fn(&Point3<f64>) -> f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let s = score(p);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best.map(|(i, _)| i)
}

/// Counter-clockwise convex hull of points in the `xy` plane, by monotone
/// chain. Collinear boundary points are dropped.
pub(crate) fn convex_hull_2d(points: &[Point3<f64>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| {
        points[i]
            .x
            .total_cmp(&points[j].x)
            .then(points[i].y.total_cmp(&points[j].y))
    });
    if order.len() < 3 {
        return order;
    }
    let scale = Aabb::from_points(points).diagonal().max(f64::MIN_POSITIVE);
    let eps = HULL_EPSILON * scale * scale;
    let turn = |o: usize, a: usize, b: usize| {
        let (o, a, b) = (points[o], points[a], points[b]);
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    };

    let mut hull: Vec<usize> = Vec::with_capacity(2 * order.len());
    for &i in &order {
        while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], i) <= eps {
            hull.pop();
        }
        hull.push(i);
    }
    let lower_len = hull.len() + 1;
    for &i in order.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && turn(hull[hull.len() - 2], hull[hull.len() - 1], i) <= eps
        {
            hull.pop();
        }
        hull.push(i);
    }
    hull.pop();
    hull
}
