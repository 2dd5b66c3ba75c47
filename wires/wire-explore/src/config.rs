//! Configuration for exploration sessions.

use wire_inflate::{InflatorConfig, RefinementMethod};
use wire_params::{DofKind, TargetType};

/// How the periodic surface of a cell is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PeriodicMode {
    /// Inflate the cell surrounded by its translated neighbors and crop it
    /// back to the cell.
    #[default]
    Phantom,

    /// Treat the network as one octant (quadrant) of a mirror-symmetric cell
    /// and inflate its reflections.
    Reflective,
}

/// Parameters for [`PeriodicExploration`](crate::PeriodicExploration).
///
/// # Example
///
/// ```
/// use wire_explore::{ExplorationConfig, PeriodicMode};
/// use wire_params::DofKind;
///
/// let config = ExplorationConfig::reflective()
///     .with_cell_size(2.0)
///     .with_dof_kind(DofKind::Orthotropic);
/// assert_eq!(config.mode, PeriodicMode::Reflective);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExplorationConfig {
    /// Edge length of the cubic (square) cell the network is fitted to,
    /// centered at the origin.
    pub cell_size: f64,

    /// Periodic inflation strategy.
    pub mode: PeriodicMode,

    /// Inflation parameters. The variant is set by [`mode`](Self::mode).
    pub inflator: InflatorConfig,

    /// Subdivision scheme used by `refine`.
    pub refinement: RefinementMethod,

    /// Whether thickness lives on vertices or edges.
    pub target: TargetType,

    /// Symmetry class of generated offset DOFs.
    pub dof_kind: DofKind,

    /// Matching tolerance for symmetry detection, relative to the cell size.
    pub symmetry_tolerance: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            mode: PeriodicMode::default(),
            inflator: InflatorConfig::default(),
            refinement: RefinementMethod::default(),
            target: TargetType::default(),
            dof_kind: DofKind::default(),
            symmetry_tolerance: 1e-6,
        }
    }
}

impl ExplorationConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with [`PeriodicMode::Reflective`].
    #[must_use]
    pub fn reflective() -> Self {
        Self {
            mode: PeriodicMode::Reflective,
            ..Self::default()
        }
    }

    /// Set the cell size.
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the periodic mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: PeriodicMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the inflation parameters.
    #[must_use]
    pub fn with_inflator(mut self, inflator: InflatorConfig) -> Self {
        self.inflator = inflator;
        self
    }

    /// Set the refinement scheme.
    #[must_use]
    pub const fn with_refinement(mut self, refinement: RefinementMethod) -> Self {
        self.refinement = refinement;
        self
    }

    /// Set the thickness target.
    #[must_use]
    pub const fn with_target(mut self, target: TargetType) -> Self {
        self.target = target;
        self
    }

    /// Set the symmetry class of generated offset DOFs.
    #[must_use]
    pub const fn with_dof_kind(mut self, kind: DofKind) -> Self {
        self.dof_kind = kind;
        self
    }

    /// Set the relative symmetry tolerance.
    #[must_use]
    pub fn with_symmetry_tolerance(mut self, tolerance: f64) -> Self {
        self.symmetry_tolerance = tolerance;
        self
    }
}
