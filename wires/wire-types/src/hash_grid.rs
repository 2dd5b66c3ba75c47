//! Tolerance-based point lookup on a uniform hash grid.

// Grid coordinates are quantized floats; truncation is the intent.
#![allow(clippy::cast_possible_truncation)]

use hashbrown::HashMap;
use nalgebra::Point3;

/// Smallest cell size used when a zero tolerance is requested.
const MIN_CELL_SIZE: f64 = 1e-12;

/// Spatial hash of points with tolerance matching.
///
/// Points are bucketed into cubic cells whose size equals the tolerance, so
/// any point within `tol` of a query lies in the 27-cell neighbourhood of the
/// query's cell. Lookups return the lowest matching index, which keeps merges
/// deterministic regardless of insertion batching.
///
/// # Example
///
/// ```
/// use wire_types::HashGrid;
/// use nalgebra::Point3;
///
/// let mut grid = HashGrid::new(1e-6);
/// let (a, new_a) = grid.insert_or_find(Point3::new(1.0, 0.0, 0.0));
/// let (b, new_b) = grid.insert_or_find(Point3::new(1.0 + 1e-9, 0.0, 0.0));
/// assert_eq!(a, b);
/// assert!(new_a && !new_b);
/// ```
#[derive(Debug, Clone)]
pub struct HashGrid {
    cell_size: f64,
    tolerance: f64,
    cells: HashMap<[i64; 3], Vec<usize>>,
    points: Vec<Point3<f64>>,
}

impl HashGrid {
    /// Create an empty grid matching points closer than `tolerance`.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        let tolerance = tolerance.abs();
        Self {
            cell_size: tolerance.max(MIN_CELL_SIZE),
            tolerance,
            cells: HashMap::new(),
            points: Vec::new(),
        }
    }

    /// Build a grid holding `points` in order, without merging.
    #[must_use]
    pub fn from_points(points: &[Point3<f64>], tolerance: f64) -> Self {
        let mut grid = Self::new(tolerance);
        for p in points {
            grid.insert(*p);
        }
        grid
    }

    fn key(&self, p: &Point3<f64>) -> [i64; 3] {
        [
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        ]
    }

    /// Append a point, returning its index. Does not check for duplicates.
    pub fn insert(&mut self, p: Point3<f64>) -> usize {
        let index = self.points.len();
        let key = self.key(&p);
        self.cells.entry(key).or_default().push(index);
        self.points.push(p);
        index
    }

    /// Lowest index of a stored point within tolerance of `p`.
    #[must_use]
    pub fn find(&self, p: &Point3<f64>) -> Option<usize> {
        let [kx, ky, kz] = self.key(p);
        let mut best: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.cells.get(&[kx + dx, ky + dy, kz + dz]) else {
                        continue;
                    };
                    for &i in bucket {
                        if (self.points[i] - p).norm() <= self.tolerance
                            && best.map_or(true, |b| i < b)
                        {
                            best = Some(i);
                        }
                    }
                }
            }
        }
        best
    }

    /// Return the index of a matching point, inserting `p` if there is none.
    ///
    /// The flag is true when a new point was inserted.
    pub fn insert_or_find(&mut self, p: Point3<f64>) -> (usize, bool) {
        match self.find(&p) {
            Some(i) => (i, false),
            None => (self.insert(p), true),
        }
    }

    /// Stored points in insertion order.
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Take ownership of the stored points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point3<f64>> {
        self.points
    }

    /// Number of stored points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no points are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
