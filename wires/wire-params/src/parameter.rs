//! The common interface of thickness and offset parameters.

use crate::error::FormulaError;
use crate::formula::{Formula, Variables};

/// What a parameter's region of interest indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetType {
    /// Wire vertices.
    #[default]
    Vertex,
    /// Wire edges.
    Edge,
}

impl TargetType {
    /// Lowercase name, as used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Edge => "edge",
        }
    }
}

/// How a parameter's perturbation relates to the pattern symmetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DofKind {
    /// Preserves the full cubic (square) symmetry.
    #[default]
    Isotropic,
    /// Preserves only the axis reflections.
    Orthotropic,
}

/// A single design degree of freedom acting on a set of vertices or edges.
///
/// The parameter's scalar is either its stored [`value`](Self::value) or,
/// when a [`formula`](Self::formula) is attached, the formula evaluated
/// against caller-supplied [`Variables`].
pub trait PatternParameter {
    /// Indices of the vertices or edges the parameter acts on.
    fn roi(&self) -> &[usize];

    /// Attached formula, if any.
    fn formula(&self) -> Option<&Formula>;

    /// The stored constant value.
    fn value(&self) -> f64;

    /// Replace the stored constant value.
    fn set_value(&mut self, value: f64);

    /// What the ROI indexes.
    fn target_type(&self) -> TargetType;

    /// Symmetry class of the parameter.
    fn dof_kind(&self) -> DofKind;

    /// The parameter's scalar under `variables`.
    ///
    /// # Errors
    ///
    /// Returns a [`FormulaError`] if the attached formula references an
    /// unbound variable.
    fn evaluate(&self, variables: &Variables) -> Result<f64, FormulaError> {
        match self.formula() {
            Some(formula) => formula.evaluate(variables),
            None => Ok(self.value()),
        }
    }

    /// Whether the scalar comes from a formula rather than the stored value.
    ///
    /// Formula-driven parameters do not respond to [`set_value`](Self::set_value)
    /// and contribute no shape velocity.
    fn is_formula_driven(&self) -> bool {
        self.formula().is_some()
    }
}

/// Parse an optional formula; blank text means "no formula".
pub(crate) fn parse_formula(source: &str) -> Result<Option<Formula>, FormulaError> {
    if source.trim().is_empty() {
        Ok(None)
    } else {
        Formula::parse(source).map(Some)
    }
}
