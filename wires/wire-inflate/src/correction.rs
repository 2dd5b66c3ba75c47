//! Per-vertex geometry corrections for placed profile loops.
//!
//! # Format
//!
//! ```text
//! # class,thickness,du0,dv0,du1,dv1,...
//! axis,0.1,0.01,0,0.01,0,0.01,0,0.01,0
//! axis,0.3,0.02,0,0.02,0,0.02,0,0.02,0
//! body_diagonal,0.2,0,0.005,0,0.005,0,0.005,0,0.005
//! ```
//!
//! Each row gives, for one edge class and one thickness, an offset `(du, dv)`
//! per loop point in the strut frame. Offsets are interpolated linearly in
//! thickness and clamped outside the tabulated range.
//!
//! # Canonical order
//!
//! Offsets are indexed from the loop's canonical start: the point whose
//! angle, measured counter-clockwise around the strut from the frame's
//! normal, is smallest. Rotating the loop's point order therefore does not
//! change which point receives which offset.

use std::f64::consts::TAU;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use hashbrown::HashMap;
use nalgebra::{Vector2, Vector3};
use tracing::debug;

use crate::error::{InflateError, InflateResult};
use crate::profile::PlacedLoop;

/// Tolerance for classifying edge directions.
const CLASS_TOLERANCE: f64 = 1e-6;

/// Angles this close below a full turn count as zero.
const ANGLE_WRAP_TOLERANCE: f64 = 1e-9;

/// Edge direction classes distinguished by the correction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeClass {
    /// Parallel to a coordinate axis.
    Axis,
    /// Along the diagonal of a coordinate plane.
    FaceDiagonal,
    /// Along a body diagonal of the unit cube.
    BodyDiagonal,
    /// Any other direction.
    General,
}

impl EdgeClass {
    /// Classify an edge direction.
    ///
    /// # Example
    ///
    /// ```
    /// use nalgebra::Vector3;
    /// use wire_inflate::EdgeClass;
    ///
    /// assert_eq!(EdgeClass::classify(&Vector3::new(0.0, -2.0, 0.0)), EdgeClass::Axis);
    /// assert_eq!(EdgeClass::classify(&Vector3::new(1.0, 0.0, -1.0)), EdgeClass::FaceDiagonal);
    /// assert_eq!(EdgeClass::classify(&Vector3::new(1.0, 1.0, 1.0)), EdgeClass::BodyDiagonal);
    /// assert_eq!(EdgeClass::classify(&Vector3::new(1.0, 2.0, 0.0)), EdgeClass::General);
    /// ```
    #[must_use]
    pub fn classify(direction: &Vector3<f64>) -> Self {
        let Some(d) = direction.try_normalize(f64::EPSILON) else {
            return Self::General;
        };
        let magnitudes: Vec<f64> = d
            .iter()
            .map(|c| c.abs())
            .filter(|c| *c > CLASS_TOLERANCE)
            .collect();
        let equal = magnitudes
            .windows(2)
            .all(|w| (w[0] - w[1]).abs() <= CLASS_TOLERANCE);
        match (magnitudes.len(), equal) {
            (1, _) => Self::Axis,
            (2, true) => Self::FaceDiagonal,
            (3, true) => Self::BodyDiagonal,
            _ => Self::General,
        }
    }

    /// Name used in correction files.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Axis => "axis",
            Self::FaceDiagonal => "face_diagonal",
            Self::BodyDiagonal => "body_diagonal",
            Self::General => "general",
        }
    }

    /// Parse a class name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "axis" => Some(Self::Axis),
            "face_diagonal" => Some(Self::FaceDiagonal),
            "body_diagonal" => Some(Self::BodyDiagonal),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CorrectionRow {
    thickness: f64,
    offsets: Vec<Vector2<f64>>,
}

/// Loop corrections keyed by edge class and thickness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryCorrectionTable {
    rows: HashMap<EdgeClass, Vec<CorrectionRow>>,
}

impl GeometryCorrectionTable {
    /// An empty table, which corrects nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a CSV correction table.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::FileNotFound`], an I/O error, or a parse error.
    pub fn load<P: AsRef<Path>>(path: P) -> InflateResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                InflateError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                InflateError::Io(e)
            }
        })?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        let table = Self::parse(&content)?;
        debug!(path = %path.display(), rows = table.num_rows(), "Loaded correction table");
        Ok(table)
    }

    /// Parse CSV correction rows. Blank lines, `#` comments and a header
    /// line starting with `class` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::Parse`] for unknown classes, malformed numbers,
    /// an odd number of offset values, rows of one class with different
    /// point counts, or a thickness repeated within a class.
    pub fn parse(content: &str) -> InflateResult<Self> {
        let mut table = Self::new();
        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() || line.starts_with("class") {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < 4 {
                return Err(InflateError::parse(
                    line_no,
                    "expected class, thickness and at least one offset pair",
                ));
            }
            let class = EdgeClass::from_name(fields[0]).ok_or_else(|| {
                InflateError::parse(line_no, format!("unknown edge class {:?}", fields[0]))
            })?;
            let values = fields[1..]
                .iter()
                .map(|f| {
                    f.parse::<f64>()
                        .map_err(|e| InflateError::parse(line_no, format!("bad number {f:?}: {e}")))
                })
                .collect::<InflateResult<Vec<f64>>>()?;
            if values[1..].len() % 2 != 0 {
                return Err(InflateError::parse(line_no, "odd number of offset values"));
            }
            let offsets = values[1..]
                .chunks_exact(2)
                .map(|c| [c[0], c[1]])
                .collect();
            table
                .insert(class, values[0], offsets)
                .map_err(|e| InflateError::parse(line_no, e.to_string()))?;
        }
        Ok(table)
    }

    /// Add a row.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::CorrectionMismatch`] if the class already has
    /// rows with a different point count, and [`InflateError::InvalidProfile`]
    /// for a non-finite or repeated thickness.
    pub fn insert(
        &mut self,
        class: EdgeClass,
        thickness: f64,
        offsets: Vec<[f64; 2]>,
    ) -> InflateResult<()> {
        if !thickness.is_finite() {
            return Err(InflateError::InvalidProfile(format!(
                "correction thickness {thickness} is not finite"
            )));
        }
        let rows = self.rows.entry(class).or_default();
        if let Some(first) = rows.first() {
            if first.offsets.len() != offsets.len() {
                return Err(InflateError::CorrectionMismatch {
                    class: class.name(),
                    expected: first.offsets.len(),
                    actual: offsets.len(),
                });
            }
        }
        let position = rows.partition_point(|r| r.thickness < thickness);
        if rows.get(position).is_some_and(|r| r.thickness == thickness) {
            return Err(InflateError::InvalidProfile(format!(
                "{} already has a row for thickness {thickness}",
                class.name()
            )));
        }
        rows.insert(
            position,
            CorrectionRow {
                thickness,
                offsets: offsets.into_iter().map(Vector2::from).collect(),
            },
        );
        Ok(())
    }

    /// Total number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Interpolated offsets for `class` at `thickness`, with their
    /// derivative with respect to thickness. `None` if the class has no rows.
    #[must_use]
    pub fn lookup(
        &self,
        class: EdgeClass,
        thickness: f64,
    ) -> Option<(Vec<Vector2<f64>>, Vec<Vector2<f64>>)> {
        let rows = self.rows.get(&class).filter(|r| !r.is_empty())?;
        let upper = rows.partition_point(|r| r.thickness <= thickness);
        if upper == 0 || upper == rows.len() {
            let row = &rows[upper.saturating_sub(1).min(rows.len() - 1)];
            let zero = vec![Vector2::zeros(); row.offsets.len()];
            return Some((row.offsets.clone(), zero));
        }
        let (a, b) = (&rows[upper - 1], &rows[upper]);
        let span = b.thickness - a.thickness;
        let w = (thickness - a.thickness) / span;
        let offsets = a
            .offsets
            .iter()
            .zip(&b.offsets)
            .map(|(oa, ob)| oa * (1.0 - w) + ob * w)
            .collect();
        let slopes = a
            .offsets
            .iter()
            .zip(&b.offsets)
            .map(|(oa, ob)| (ob - oa) / span)
            .collect();
        Some((offsets, slopes))
    }

    /// Correct a placed loop around a strut with direction `edge_direction`.
    ///
    /// The loop's thickness gradients are updated with the slope of the
    /// interpolated offsets. Loops of a class without rows are unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`InflateError::CorrectionMismatch`] if the class's rows do not
    /// have one offset per loop point.
    pub fn apply_correction(
        &self,
        edge_direction: &Vector3<f64>,
        placed: &mut PlacedLoop,
    ) -> InflateResult<()> {
        let class = EdgeClass::classify(edge_direction);
        let Some((offsets, slopes)) = self.lookup(class, placed.thickness) else {
            return Ok(());
        };
        let n = placed.num_points();
        if offsets.len() != n {
            return Err(InflateError::CorrectionMismatch {
                class: class.name(),
                expected: n,
                actual: offsets.len(),
            });
        }
        let start = canonical_start(placed);
        for (k, (offset, slope)) in offsets.iter().zip(&slopes).enumerate() {
            let i = (start + k) % n;
            placed.points[i] += placed.frame.to_world(offset.x, offset.y);
            placed.thickness_gradients[i] += placed.frame.to_world(slope.x, slope.y);
        }
        Ok(())
    }
}

/// Index of the loop point with the smallest counter-clockwise angle from
/// the frame normal.
fn canonical_start(placed: &PlacedLoop) -> usize {
    let mut best = (f64::INFINITY, 0);
    for (i, p) in placed.points.iter().enumerate() {
        let (x, y) = placed.frame.to_local(&(p - placed.center));
        let mut angle = y.atan2(x).rem_euclid(TAU);
        if angle > TAU - ANGLE_WRAP_TOLERANCE {
            angle = 0.0;
        }
        if angle < best.0 {
            best = (angle, i);
        }
    }
    best.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::WireProfile;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    const TABLE: &str = "\
class,thickness,du0,dv0,du1,dv1,du2,dv2,du3,dv3
# axis-aligned struts
axis,0.1,0.01,0,0,0,0,0,0,0
axis,0.3,0.03,0,0,0,0,0,0,0
body_diagonal,0.2,0,0.5,0,0.5,0,0.5,0,0.5
";

    #[test]
    fn test_parse_and_lookup() {
        let table = GeometryCorrectionTable::parse(TABLE).unwrap();
        assert_eq!(table.num_rows(), 3);

        let (offsets, slopes) = table.lookup(EdgeClass::Axis, 0.2).unwrap();
        assert_relative_eq!(offsets[0].x, 0.02, epsilon = 1e-12);
        assert_relative_eq!(slopes[0].x, 0.1, epsilon = 1e-12);

        // Clamped outside the range.
        let (offsets, slopes) = table.lookup(EdgeClass::Axis, 1.0).unwrap();
        assert_relative_eq!(offsets[0].x, 0.03, epsilon = 1e-12);
        assert_relative_eq!(slopes[0].x, 0.0);
        let (offsets, _) = table.lookup(EdgeClass::Axis, 0.0).unwrap();
        assert_relative_eq!(offsets[0].x, 0.01, epsilon = 1e-12);

        assert!(table.lookup(EdgeClass::General, 0.2).is_none());
    }

    #[test]
    fn test_parse_errors() {
        for (text, line) in [
            ("diagonal,0.1,0,0\n", 1),
            ("axis,0.1,0\n", 1),
            ("axis,0.1,0,0,0\n", 1),
            ("axis,abc,0,0\n", 1),
            ("axis,0.1,0,0\naxis,0.2,0,0,0,0\n", 2),
            ("axis,0.1,0,0\naxis,0.1,1,1\n", 2),
        ] {
            match GeometryCorrectionTable::parse(text) {
                Err(InflateError::Parse { line: l, .. }) => assert_eq!(l, line, "{text:?}"),
                other => panic!("expected parse error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_correction_moves_canonical_point() {
        let table = GeometryCorrectionTable::parse(TABLE).unwrap();
        let profile = WireProfile::regular(4).unwrap();
        let mut placed = profile.place(&Vector3::x(), &Point3::origin(), 0.1);
        let before = placed.clone();
        table.apply_correction(&Vector3::x(), &mut placed).unwrap();

        // Point 0 lies on the frame normal, so it is the canonical start.
        let moved = placed.points[0] - before.points[0];
        assert_relative_eq!(moved, placed.frame.normal * 0.01, epsilon = 1e-12);
        for i in 1..4 {
            assert_relative_eq!(placed.points[i], before.points[i], epsilon = 1e-12);
        }
        assert_relative_eq!(
            placed.thickness_gradients[0] - before.thickness_gradients[0],
            placed.frame.normal * 0.1,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_correction_ignores_starting_vertex() {
        let table = GeometryCorrectionTable::parse(TABLE).unwrap();
        let profile = WireProfile::regular(4).unwrap();
        let mut placed = profile.place(&Vector3::y(), &Point3::new(0.0, 0.5, 0.0), 0.2);

        let mut rotated = placed.clone();
        rotated.points.rotate_left(1);
        rotated.thickness_gradients.rotate_left(1);

        table.apply_correction(&Vector3::y(), &mut placed).unwrap();
        table.apply_correction(&Vector3::y(), &mut rotated).unwrap();
        rotated.points.rotate_right(1);
        for (a, b) in placed.points.iter().zip(&rotated.points) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_correction_point_count_mismatch() {
        let table = GeometryCorrectionTable::parse(TABLE).unwrap();
        let profile = WireProfile::regular(6).unwrap();
        let mut placed = profile.place(&Vector3::z(), &Point3::origin(), 0.1);
        assert!(matches!(
            table.apply_correction(&Vector3::z(), &mut placed),
            Err(InflateError::CorrectionMismatch { expected: 6, actual: 4, .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = GeometryCorrectionTable::load("/nonexistent/correction.csv").unwrap_err();
        assert!(matches!(err, InflateError::FileNotFound { .. }));
    }
}
