//! Offset parameters: symmetry-constrained vertex displacements.

use nalgebra::Vector3;

use crate::error::{ParamError, ParamResult};
use crate::formula::{Formula, Variables};
use crate::parameter::{parse_formula, DofKind, PatternParameter, TargetType};

/// An offset DOF: every ROI vertex moves by `value` times its own direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetParameter {
    roi: Vec<usize>,
    directions: Vec<Vector3<f64>>,
    formula: Option<Formula>,
    value: f64,
    kind: DofKind,
}

impl OffsetParameter {
    /// Per-ROI-vertex displacement directions, parallel to [`roi`](PatternParameter::roi).
    #[must_use]
    pub fn directions(&self) -> &[Vector3<f64>] {
        &self.directions
    }
}

impl PatternParameter for OffsetParameter {
    fn roi(&self) -> &[usize] {
        &self.roi
    }

    fn formula(&self) -> Option<&Formula> {
        self.formula.as_ref()
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    fn target_type(&self) -> TargetType {
        TargetType::Vertex
    }

    fn dof_kind(&self) -> DofKind {
        self.kind
    }
}

/// Vertex offsets of a network and the DOFs that drive them.
///
/// Contributions of all DOFs add up, so DOFs along independent directions of
/// the same vertex combine into a general displacement.
///
/// # Example
///
/// ```
/// use wire_params::{OffsetParameters, Variables};
/// use nalgebra::Vector3;
///
/// let mut offsets = OffsetParameters::new(2, 3);
/// offsets.add_orthotropic(vec![0, 1], "", 0.1, 0).unwrap();
/// offsets.add_isotropic(vec![1], "", 0.2, vec![Vector3::z()]).unwrap();
/// let field = offsets.evaluate(&Variables::new()).unwrap();
/// assert_eq!(field[0], Vector3::new(0.1, 0.0, 0.0));
/// assert_eq!(field[1], Vector3::new(0.1, 0.0, 0.2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetParameters {
    num_vertices: usize,
    dim: usize,
    params: Vec<OffsetParameter>,
}

impl OffsetParameters {
    /// An empty parameter set for a `dim`-dimensional network.
    #[must_use]
    pub const fn new(num_vertices: usize, dim: usize) -> Self {
        Self {
            num_vertices,
            dim,
            params: Vec::new(),
        }
    }

    /// Add an isotropic DOF with one direction per ROI vertex.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::DirectionCountMismatch`] if `directions` is not
    /// parallel to `roi`, [`ParamError::RoiOutOfRange`] for invalid indices
    /// and [`ParamError::Formula`] if the formula does not parse.
    pub fn add_isotropic(
        &mut self,
        roi: Vec<usize>,
        formula: &str,
        value: f64,
        directions: Vec<Vector3<f64>>,
    ) -> ParamResult<usize> {
        self.add_with_kind(roi, formula, value, directions, DofKind::Isotropic)
    }

    /// Add an orthotropic DOF moving every ROI vertex along `axis`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::InvalidAxis`] if `axis >= dim`, otherwise as
    /// [`add_isotropic`](Self::add_isotropic).
    pub fn add_orthotropic(
        &mut self,
        roi: Vec<usize>,
        formula: &str,
        value: f64,
        axis: usize,
    ) -> ParamResult<usize> {
        if axis >= self.dim {
            return Err(ParamError::InvalidAxis {
                axis,
                dim: self.dim,
            });
        }
        let mut direction = Vector3::zeros();
        direction[axis] = 1.0;
        let directions = vec![direction; roi.len()];
        self.add_with_kind(roi, formula, value, directions, DofKind::Orthotropic)
    }

    /// Add a DOF with explicit per-vertex directions and symmetry class.
    ///
    /// # Errors
    ///
    /// As [`add_isotropic`](Self::add_isotropic).
    pub fn add_with_kind(
        &mut self,
        roi: Vec<usize>,
        formula: &str,
        value: f64,
        directions: Vec<Vector3<f64>>,
        kind: DofKind,
    ) -> ParamResult<usize> {
        if directions.len() != roi.len() {
            return Err(ParamError::DirectionCountMismatch {
                roi: roi.len(),
                directions: directions.len(),
            });
        }
        if let Some(&index) = roi.iter().find(|&&i| i >= self.num_vertices) {
            return Err(ParamError::RoiOutOfRange {
                index,
                count: self.num_vertices,
                target: TargetType::Vertex.name(),
            });
        }
        self.params.push(OffsetParameter {
            roi,
            directions,
            formula: parse_formula(formula)?,
            value,
            kind,
        });
        Ok(self.params.len() - 1)
    }

    /// Per-vertex displacement under `variables`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Formula`] if a formula references an unbound
    /// variable.
    pub fn evaluate(&self, variables: &Variables) -> ParamResult<Vec<Vector3<f64>>> {
        let mut field = vec![Vector3::zeros(); self.num_vertices];
        for param in &self.params {
            let value = param.evaluate(variables)?;
            for (&v, d) in param.roi.iter().zip(&param.directions) {
                field[v] += d * value;
            }
        }
        Ok(field)
    }

    /// Partial derivative of the displacement field with respect to DOF
    /// `dof`'s value: its direction on ROI vertices, zero elsewhere and for
    /// formula-driven DOFs.
    #[must_use]
    pub fn derivative(&self, dof: usize) -> Vec<Vector3<f64>> {
        let mut field = vec![Vector3::zeros(); self.num_vertices];
        if let Some(param) = self.params.get(dof).filter(|p| !p.is_formula_driven()) {
            for (&v, d) in param.roi.iter().zip(&param.directions) {
                field[v] += d;
            }
        }
        field
    }

    /// Number of vertices.
    #[must_use]
    pub const fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Network dimension.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Number of DOFs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether there are no DOFs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// DOF `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&OffsetParameter> {
        self.params.get(index)
    }

    /// Mutable DOF `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut OffsetParameter> {
        self.params.get_mut(index)
    }

    /// Iterate over the DOFs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &OffsetParameter> {
        self.params.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut OffsetParameter> {
        self.params.iter_mut()
    }
}
