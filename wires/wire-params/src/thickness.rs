//! Thickness parameters: a per-vertex or per-edge scalar field.

use crate::error::{ParamError, ParamResult};
use crate::formula::{Formula, Variables};
use crate::parameter::{parse_formula, DofKind, PatternParameter, TargetType};

/// A thickness DOF: one scalar applied to every index in its ROI.
#[derive(Debug, Clone, PartialEq)]
pub struct ThicknessParameter {
    roi: Vec<usize>,
    formula: Option<Formula>,
    value: f64,
    target: TargetType,
}

impl PatternParameter for ThicknessParameter {
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
        self.target
    }

    fn dof_kind(&self) -> DofKind {
        DofKind::Isotropic
    }
}

/// The thickness field of a network and the DOFs that drive it.
///
/// Indices not covered by any DOF keep the default thickness. When several
/// DOFs cover the same index, the one added last wins.
///
/// # Example
///
/// ```
/// use wire_params::{ThicknessParameters, TargetType, Variables};
///
/// let mut params = ThicknessParameters::new(TargetType::Vertex, 4, 0.5);
/// params.add(vec![0, 1], "", 0.1).unwrap();
/// let field = params.evaluate(&Variables::new()).unwrap();
/// assert_eq!(field, vec![0.1, 0.1, 0.5, 0.5]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ThicknessParameters {
    target: TargetType,
    num_targets: usize,
    default: f64,
    params: Vec<ThicknessParameter>,
}

impl ThicknessParameters {
    /// An empty parameter set over `num_targets` vertices or edges.
    #[must_use]
    pub const fn new(target: TargetType, num_targets: usize, default: f64) -> Self {
        Self {
            target,
            num_targets,
            default,
            params: Vec::new(),
        }
    }

    /// Add a DOF and return its index.
    ///
    /// `formula` may be blank, in which case the DOF uses `value`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::RoiOutOfRange`] for invalid ROI indices and
    /// [`ParamError::Formula`] if the formula does not parse.
    pub fn add(&mut self, roi: Vec<usize>, formula: &str, value: f64) -> ParamResult<usize> {
        if let Some(&index) = roi.iter().find(|&&i| i >= self.num_targets) {
            return Err(ParamError::RoiOutOfRange {
                index,
                count: self.num_targets,
                target: self.target.name(),
            });
        }
        self.params.push(ThicknessParameter {
            roi,
            formula: parse_formula(formula)?,
            value,
            target: self.target,
        });
        Ok(self.params.len() - 1)
    }

    /// The thickness field under `variables`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Formula`] if a formula references an unbound
    /// variable. Only DOFs that own at least one index are evaluated, so a
    /// DOF fully overridden by later ones never fails.
    pub fn evaluate(&self, variables: &Variables) -> ParamResult<Vec<f64>> {
        let owners = self.owners();
        let mut values: Vec<Option<f64>> = vec![None; self.params.len()];
        for &k in owners.iter().flatten() {
            if values[k].is_none() {
                values[k] = Some(self.params[k].evaluate(variables)?);
            }
        }
        Ok(owners
            .iter()
            .map(|owner| owner.and_then(|k| values[k]).unwrap_or(self.default))
            .collect())
    }

    /// Partial derivative of the field with respect to DOF `dof`'s value.
    ///
    /// Entry `i` is 1 where `dof` is the last DOF covering index `i` and is
    /// not formula-driven, and 0 elsewhere.
    #[must_use]
    pub fn derivative(&self, dof: usize) -> Vec<f64> {
        let owners = self.owners();
        let active = self.params.get(dof).is_some_and(|p| !p.is_formula_driven());
        owners
            .iter()
            .map(|owner| {
                if active && *owner == Some(dof) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// For every index, the DOF whose value it takes (the last covering one).
    #[must_use]
    pub fn owners(&self) -> Vec<Option<usize>> {
        let mut owners = vec![None; self.num_targets];
        for (k, param) in self.params.iter().enumerate() {
            for &i in &param.roi {
                owners[i] = Some(k);
            }
        }
        owners
    }

    /// What the field is indexed by.
    #[must_use]
    pub const fn target(&self) -> TargetType {
        self.target
    }

    /// Length of the field.
    #[must_use]
    pub const fn num_targets(&self) -> usize {
        self.num_targets
    }

    /// Value of uncovered indices.
    #[must_use]
    pub const fn default_thickness(&self) -> f64 {
        self.default
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
    pub fn get(&self, index: usize) -> Option<&ThicknessParameter> {
        self.params.get(index)
    }

    /// Mutable DOF `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut ThicknessParameter> {
        self.params.get_mut(index)
    }

    /// Iterate over the DOFs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ThicknessParameter> {
        self.params.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ThicknessParameter> {
        self.params.iter_mut()
    }
}
