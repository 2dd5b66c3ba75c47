//! Contracts for external tools the inflator hands work to.

use std::error::Error;

use nalgebra::Point3;
use wire_types::Aabb;

/// Boxed error returned by collaborators.
pub type ToolError = Box<dyn Error + Send + Sync>;

/// Finds pairs of intersecting faces in a triangle surface.
pub trait SelfIntersectionDetector: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Intersecting face pairs `(i, j)` with `i < j`.
    ///
    /// # Errors
    ///
    /// Returns the tool's own error if detection could not run.
    fn detect(
        &self,
        vertices: &[Point3<f64>],
        faces: &[[usize; 3]],
    ) -> Result<Vec<(usize, usize)>, ToolError>;
}

/// A tetrahedral volume mesher.
///
/// The surface vertices must be the first vertices of the volume mesh.
pub trait VolumeMesher {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Set the boundary vertices.
    fn set_vertices(&mut self, vertices: &[Point3<f64>]);

    /// Set the boundary triangles.
    fn set_faces(&mut self, faces: &[[usize; 3]]);

    /// Mesh the interior.
    ///
    /// # Errors
    ///
    /// Returns the tool's own error if meshing failed.
    fn run(&mut self) -> Result<(), ToolError>;

    /// Volume vertices after [`run`](Self::run).
    fn vertices(&self) -> &[Point3<f64>];

    /// Tetrahedra after [`run`](Self::run).
    fn voxels(&self) -> &[[usize; 4]];
}

/// Tests every pair of faces that share no vertex.
///
/// Quadratic in the face count; meant for unit cells, not tiled lattices.
#[derive(Debug, Clone, Copy)]
pub struct BruteForceDetector {
    /// Relative tolerance for the edge/triangle tests.
    pub epsilon: f64,
}

impl Default for BruteForceDetector {
    fn default() -> Self {
        Self { epsilon: 1e-10 }
    }
}

impl SelfIntersectionDetector for BruteForceDetector {
    fn name(&self) -> &str {
        "brute-force"
    }

    fn detect(
        &self,
        vertices: &[Point3<f64>],
        faces: &[[usize; 3]],
    ) -> Result<Vec<(usize, usize)>, ToolError> {
        if let Some(fi) = faces
            .iter()
            .position(|f| f.iter().any(|&v| v >= vertices.len()))
        {
            return Err(format!("face {fi} references a missing vertex").into());
        }
        let scale = Aabb::from_points(vertices).diagonal().max(f64::MIN_POSITIVE);
        let eps = self.epsilon * scale;
        let boxes: Vec<Aabb> = faces
            .iter()
            .map(|f| Aabb::from_points(f.iter().map(|&v| &vertices[v])))
            .collect();

        let mut pairs = Vec::new();
        for i in 0..faces.len() {
            for j in (i + 1)..faces.len() {
                if faces[i].iter().any(|v| faces[j].contains(v)) {
                    continue;
                }
                if !boxes_overlap(&boxes[i], &boxes[j], eps) {
                    continue;
                }
                let [a0, a1, a2] = faces[i].map(|v| vertices[v]);
                let [b0, b1, b2] = faces[j].map(|v| vertices[v]);
                if triangles_intersect(&[a0, a1, a2], &[b0, b1, b2], eps) {
                    pairs.push((i, j));
                }
            }
        }
        Ok(pairs)
    }
}

fn boxes_overlap(a: &Aabb, b: &Aabb, eps: f64) -> bool {
    (0..3).all(|k| a.min[k] <= b.max[k] + eps && b.min[k] <= a.max[k] + eps)
}

/// Whether any edge of either triangle crosses the other triangle.
fn triangles_intersect(a: &[Point3<f64>; 3], b: &[Point3<f64>; 3], eps: f64) -> bool {
    let crosses = |t: &[Point3<f64>; 3], s: &[Point3<f64>; 3]| {
        (0..3).any(|k| edge_crosses_triangle(&s[k], &s[(k + 1) % 3], t, eps))
    };
    crosses(a, b) || crosses(b, a)
}

/// Möller-Trumbore restricted to the segment `e0 e1`.
fn edge_crosses_triangle(
    e0: &Point3<f64>,
    e1: &Point3<f64>,
    tri: &[Point3<f64>; 3],
    eps: f64,
) -> bool {
    let direction = e1 - e0;
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];
    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);
    // Parallel or degenerate.
    if a.abs() < eps * eps {
        return false;
    }
    let f = 1.0 / a;
    let s = e0 - tri[0];
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }
    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }
    let t = f * edge2.dot(&q);
    (0.0..=1.0).contains(&t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crossing_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        (
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(0.5, 0.5, -1.0),
                Point3::new(0.5, 0.5, 1.0),
                Point3::new(3.0, 3.0, 0.0),
            ],
            vec![[0, 1, 2], [3, 4, 5]],
        )
    }

    #[test]
    fn test_detects_crossing_faces() {
        let (vertices, faces) = crossing_triangles();
        let pairs = BruteForceDetector::default().detect(&vertices, &faces).unwrap();
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn test_ignores_separated_faces() {
        let (mut vertices, faces) = crossing_triangles();
        for v in &mut vertices[3..] {
            v.z += 5.0;
        }
        let pairs = BruteForceDetector::default().detect(&vertices, &faces).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_rejects_bad_indices() {
        let (vertices, _) = crossing_triangles();
        assert!(BruteForceDetector::default()
            .detect(&vertices, &[[0, 1, 9]])
            .is_err());
    }
}
