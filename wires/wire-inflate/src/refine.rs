//! Surface refinement with explicit prolongation operators.
//!
//! A refinement round maps a coarse surface to a fine one whose vertices
//! are fixed linear combinations of the coarse vertices. The combination
//! weights form a sparse [`Prolongation`] matrix, which is also what carries
//! shape velocities and sensitivities from the coarse to the fine surface.

// Valence counts become weights
#![allow(clippy::cast_precision_loss)]

use std::ops::{AddAssign, Mul};

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::error::{InflateError, InflateResult};

/// Add `value` to the term for `index`, appending a new term if needed.
pub(crate) fn add_term<T: AddAssign>(terms: &mut Vec<(usize, T)>, index: usize, value: T) {
    if let Some((_, existing)) = terms.iter_mut().find(|(i, _)| *i == index) {
        *existing += value;
    } else {
        terms.push((index, value));
    }
}

/// A sparse row-major matrix mapping coarse vertex data to fine vertex data.
///
/// Row `i` lists `(coarse_vertex, weight)` pairs; fine value `i` is the
/// weighted sum of the coarse values.
#[derive(Debug, Clone, PartialEq)]
pub struct Prolongation {
    num_coarse: usize,
    rows: Vec<Vec<(usize, f64)>>,
}

impl Prolongation {
    /// The identity on `n` vertices.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self {
            num_coarse: n,
            rows: (0..n).map(|i| vec![(i, 1.0)]).collect(),
        }
    }

    /// Build from explicit rows.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::InvalidRefinement`] if a row references a
    /// coarse index `>= num_coarse`.
    pub fn from_rows(num_coarse: usize, rows: Vec<Vec<(usize, f64)>>) -> InflateResult<Self> {
        for (i, row) in rows.iter().enumerate() {
            if let Some((j, _)) = row.iter().find(|(j, _)| *j >= num_coarse) {
                return Err(InflateError::InvalidRefinement(format!(
                    "row {i} references coarse vertex {j} of {num_coarse}"
                )));
            }
        }
        Ok(Self { num_coarse, rows })
    }

    /// Number of coarse vertices (columns).
    #[must_use]
    pub const fn num_coarse(&self) -> usize {
        self.num_coarse
    }

    /// Number of fine vertices (rows).
    #[must_use]
    pub fn num_fine(&self) -> usize {
        self.rows.len()
    }

    /// Row `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[(usize, f64)] {
        &self.rows[i]
    }

    /// The composition "`self`, then `next`": maps this operator's coarse
    /// vertices directly to `next`'s fine vertices.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::InvalidRefinement`] if `next` does not start
    /// where `self` ends.
    pub fn then(&self, next: &Self) -> InflateResult<Self> {
        if next.num_coarse != self.num_fine() {
            return Err(InflateError::InvalidRefinement(format!(
                "cannot compose {} fine vertices with an operator on {}",
                self.num_fine(),
                next.num_coarse
            )));
        }
        let rows = next
            .rows
            .iter()
            .map(|row| {
                let mut combined = Vec::new();
                for &(j, w) in row {
                    for &(k, v) in &self.rows[j] {
                        add_term(&mut combined, k, w * v);
                    }
                }
                combined
            })
            .collect();
        Ok(Self {
            num_coarse: self.num_coarse,
            rows,
        })
    }

    fn check_len(&self, len: usize) -> InflateResult<()> {
        if len == self.num_coarse {
            Ok(())
        } else {
            Err(InflateError::InvalidRefinement(format!(
                "expected {} coarse values, got {len}",
                self.num_coarse
            )))
        }
    }

    /// Prolong vertex positions.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::InvalidRefinement`] on a length mismatch.
    pub fn apply_points(&self, coarse: &[Point3<f64>]) -> InflateResult<Vec<Point3<f64>>> {
        self.check_len(coarse.len())?;
        Ok(self
            .rows
            .iter()
            .map(|row| {
                Point3::from(
                    row.iter()
                        .map(|&(j, w)| coarse[j].coords * w)
                        .sum::<Vector3<f64>>(),
                )
            })
            .collect())
    }

    /// Prolong a per-vertex vector field.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::InvalidRefinement`] on a length mismatch.
    pub fn apply_vectors(&self, coarse: &[Vector3<f64>]) -> InflateResult<Vec<Vector3<f64>>> {
        self.check_len(coarse.len())?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.iter().map(|&(j, w)| coarse[j] * w).sum())
            .collect())
    }

    /// Prolong per-vertex sparse terms, merging terms with equal indices.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::InvalidRefinement`] on a length mismatch.
    pub fn apply_sparse<T>(&self, coarse: &[Vec<(usize, T)>]) -> InflateResult<Vec<Vec<(usize, T)>>>
    where
        T: Copy + AddAssign + Mul<f64, Output = T>,
    {
        self.check_len(coarse.len())?;
        Ok(self
            .rows
            .iter()
            .map(|row| {
                let mut terms = Vec::new();
                for &(j, w) in row {
                    for &(index, value) in &coarse[j] {
                        add_term(&mut terms, index, value * w);
                    }
                }
                terms
            })
            .collect())
    }
}

/// One round of refinement.
#[derive(Debug, Clone)]
pub struct Refinement {
    /// Fine vertices.
    pub vertices: Vec<Point3<f64>>,
    /// Fine triangles, with the orientation of their parents.
    pub faces: Vec<[usize; 3]>,
    /// Coarse-to-fine vertex operator.
    pub prolongation: Prolongation,
    /// Coarse face each fine face came from.
    pub face_parents: Vec<usize>,
}

/// A surface subdivision scheme.
pub trait Refiner {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Refine a triangle surface once.
    ///
    /// # Errors
    ///
    /// Implementations wrapping external tools report their failures as
    /// [`InflateError::ExternalTool`].
    fn refine(&self, vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> InflateResult<Refinement>;
}

/// Splits every triangle into four at its edge midpoints. The surface
/// shape is unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointRefiner;

/// Loop subdivision: splits like [`MidpointRefiner`] and smooths vertices
/// with Loop's weights. Boundary curves are smoothed along themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopRefiner;

/// Refinement scheme selector for configuration structs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefinementMethod {
    /// [`MidpointRefiner`].
    Midpoint,
    /// [`LoopRefiner`].
    #[default]
    Loop,
}

impl Refiner for MidpointRefiner {
    fn name(&self) -> &str {
        "midpoint"
    }

    fn refine(&self, vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> InflateResult<Refinement> {
        let mut rows: Vec<Vec<(usize, f64)>> =
            (0..vertices.len()).map(|i| vec![(i, 1.0)]).collect();
        let (faces, face_parents) = split_faces(faces, &mut rows, |a, b| vec![(a, 0.5), (b, 0.5)])?;
        finish(vertices, rows, faces, face_parents)
    }
}

impl Refiner for LoopRefiner {
    fn name(&self) -> &str {
        "loop"
    }

    fn refine(&self, vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> InflateResult<Refinement> {
        let edge_opposites = build_edge_opposites(faces);
        let neighbors = build_vertex_neighbors(vertices.len(), faces);

        let mut rows: Vec<Vec<(usize, f64)>> = (0..vertices.len())
            .map(|v| loop_vertex_row(v, &neighbors[v], &edge_opposites))
            .collect();
        let (faces, face_parents) = split_faces(faces, &mut rows, |a, b| {
            match edge_opposites.get(&normalize_edge(a, b)).map(Vec::as_slice) {
                Some(&[c, d]) => vec![(a, 0.375), (b, 0.375), (c, 0.125), (d, 0.125)],
                _ => vec![(a, 0.5), (b, 0.5)],
            }
        })?;
        finish(vertices, rows, faces, face_parents)
    }
}

impl Refiner for RefinementMethod {
    fn name(&self) -> &str {
        match self {
            Self::Midpoint => MidpointRefiner.name(),
            Self::Loop => LoopRefiner.name(),
        }
    }

    fn refine(&self, vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> InflateResult<Refinement> {
        match self {
            Self::Midpoint => MidpointRefiner.refine(vertices, faces),
            Self::Loop => LoopRefiner.refine(vertices, faces),
        }
    }
}

const fn normalize_edge(v0: usize, v1: usize) -> (usize, usize) {
    if v0 < v1 {
        (v0, v1)
    } else {
        (v1, v0)
    }
}

/// Split every face into four, appending one row per new edge vertex.
fn split_faces(
    faces: &[[usize; 3]],
    rows: &mut Vec<Vec<(usize, f64)>>,
    edge_row: impl Fn(usize, usize) -> Vec<(usize, f64)>,
) -> InflateResult<(Vec<[usize; 3]>, Vec<usize>)> {
    let num_coarse = rows.len();
    let mut edge_vertices: HashMap<(usize, usize), usize> = HashMap::new();
    let mut new_faces = Vec::with_capacity(faces.len() * 4);
    let mut parents = Vec::with_capacity(faces.len() * 4);

    let mut edge_vertex = |a: usize, b: usize, rows: &mut Vec<Vec<(usize, f64)>>| {
        *edge_vertices.entry(normalize_edge(a, b)).or_insert_with(|| {
            rows.push(edge_row(a, b));
            rows.len() - 1
        })
    };

    for (fi, &[v0, v1, v2]) in faces.iter().enumerate() {
        if [v0, v1, v2].iter().any(|&v| v >= num_coarse) {
            return Err(InflateError::InvalidRefinement(format!(
                "face {fi} references a vertex outside 0..{num_coarse}"
            )));
        }
        let m01 = edge_vertex(v0, v1, rows);
        let m12 = edge_vertex(v1, v2, rows);
        let m20 = edge_vertex(v2, v0, rows);

        new_faces.push([v0, m01, m20]);
        new_faces.push([v1, m12, m01]);
        new_faces.push([v2, m20, m12]);
        new_faces.push([m01, m12, m20]);
        parents.extend([fi; 4]);
    }
    Ok((new_faces, parents))
}

fn finish(
    vertices: &[Point3<f64>],
    rows: Vec<Vec<(usize, f64)>>,
    faces: Vec<[usize; 3]>,
    face_parents: Vec<usize>,
) -> InflateResult<Refinement> {
    let prolongation = Prolongation::from_rows(vertices.len(), rows)?;
    let vertices = prolongation.apply_points(vertices)?;
    debug!(
        vertices = vertices.len(),
        faces = faces.len(),
        "Refined surface"
    );
    Ok(Refinement {
        vertices,
        faces,
        prolongation,
        face_parents,
    })
}

/// Map each undirected edge to the vertices opposite it in its faces.
fn build_edge_opposites(faces: &[[usize; 3]]) -> HashMap<(usize, usize), Vec<usize>> {
    let mut opposites: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for face in faces {
        for i in 0..3 {
            let edge = normalize_edge(face[i], face[(i + 1) % 3]);
            opposites.entry(edge).or_default().push(face[(i + 2) % 3]);
        }
    }
    opposites
}

/// Sorted neighbor lists.
fn build_vertex_neighbors(num_vertices: usize, faces: &[[usize; 3]]) -> Vec<Vec<usize>> {
    let mut neighbors = vec![Vec::new(); num_vertices];
    for face in faces {
        for i in 0..3 {
            let (a, b) = (face[i], face[(i + 1) % 3]);
            if a < num_vertices && b < num_vertices {
                neighbors[a].push(b);
                neighbors[b].push(a);
            }
        }
    }
    for list in &mut neighbors {
        list.sort_unstable();
        list.dedup();
    }
    neighbors
}

/// Loop's weights for an existing vertex.
fn loop_vertex_row(
    v: usize,
    neighbors: &[usize],
    edge_opposites: &HashMap<(usize, usize), Vec<usize>>,
) -> Vec<(usize, f64)> {
    if neighbors.is_empty() {
        return vec![(v, 1.0)];
    }
    let face_counts: Vec<usize> = neighbors
        .iter()
        .map(|&n| edge_opposites.get(&normalize_edge(v, n)).map_or(0, Vec::len))
        .collect();

    if face_counts.iter().all(|&c| c == 2) {
        // Warren's weights.
        let n = neighbors.len();
        let beta = if n == 3 {
            3.0 / 16.0
        } else {
            3.0 / (8.0 * n as f64)
        };
        let mut row = vec![(v, (n as f64).mul_add(-beta, 1.0))];
        row.extend(neighbors.iter().map(|&nb| (nb, beta)));
        return row;
    }

    let boundary: Vec<usize> = neighbors
        .iter()
        .zip(&face_counts)
        .filter(|(_, c)| **c == 1)
        .map(|(&nb, _)| nb)
        .collect();
    if boundary.len() == 2 && face_counts.iter().all(|&c| c <= 2) {
        vec![(v, 0.75), (boundary[0], 0.125), (boundary[1], 0.125)]
    } else {
        vec![(v, 1.0)]
    }
}
