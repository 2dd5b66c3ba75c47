//! Inflation parameters.

/// How the network is prepared before inflation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InflatorVariant {
    /// Inflate the network as given.
    #[default]
    Raw,

    /// Mirror the network across the upper faces of its bounding box
    /// (2^D copies) and inflate the union. Sensitivities still refer to the
    /// original vertices and thickness entries.
    Reflective,
}

/// What to do when the inflated surface intersects itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelfIntersectionPolicy {
    /// Skip detection; downstream tools resolve intersections.
    #[default]
    Ignore,

    /// Run detection and log intersecting pairs, but keep the surface.
    Warn,

    /// Run detection and fail on any intersecting pair.
    Fatal,
}

impl SelfIntersectionPolicy {
    /// Whether this policy runs the detector.
    #[must_use]
    pub const fn detects(&self) -> bool {
        !matches!(self, Self::Ignore)
    }
}

/// Parameters for [`InflatorEngine`](crate::InflatorEngine).
///
/// # Example
///
/// ```
/// use wire_inflate::{InflatorConfig, InflatorVariant, SelfIntersectionPolicy};
///
/// let config = InflatorConfig::reflective()
///     .with_aspect_max(0.5)
///     .with_self_intersection(SelfIntersectionPolicy::Fatal);
/// assert_eq!(config.variant, InflatorVariant::Reflective);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InflatorConfig {
    /// Network preparation.
    pub variant: InflatorVariant,

    /// Thickness may be at most `aspect_max` times the length of the edge it
    /// sits on.
    pub aspect_max: f64,

    /// Self-intersection handling.
    pub self_intersection: SelfIntersectionPolicy,

    /// Number of sides of the default polygon profile for 3D networks.
    pub profile_sides: usize,

    /// Safety factor on the junction pullback distance.
    pub pullback_margin: f64,

    /// Vertices closer than this are merged when the network is mirrored
    /// or tiled; edges shorter than this are rejected.
    pub merge_tolerance: f64,
}

impl Default for InflatorConfig {
    fn default() -> Self {
        Self {
            variant: InflatorVariant::default(),
            aspect_max: 1.0,
            self_intersection: SelfIntersectionPolicy::default(),
            profile_sides: 8,
            pullback_margin: 1.1,
            merge_tolerance: 1e-9,
        }
    }
}

impl InflatorConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the [`InflatorVariant::Reflective`] variant.
    #[must_use]
    pub fn reflective() -> Self {
        Self {
            variant: InflatorVariant::Reflective,
            ..Self::default()
        }
    }

    /// Defaults with fatal self-intersection detection.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            self_intersection: SelfIntersectionPolicy::Fatal,
            ..Self::default()
        }
    }

    /// Set the variant.
    #[must_use]
    pub const fn with_variant(mut self, variant: InflatorVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the thickness-to-length limit.
    #[must_use]
    pub fn with_aspect_max(mut self, aspect_max: f64) -> Self {
        self.aspect_max = aspect_max;
        self
    }

    /// Set the self-intersection policy.
    #[must_use]
    pub const fn with_self_intersection(mut self, policy: SelfIntersectionPolicy) -> Self {
        self.self_intersection = policy;
        self
    }

    /// Set the number of sides of the default 3D profile.
    #[must_use]
    pub const fn with_profile_sides(mut self, sides: usize) -> Self {
        self.profile_sides = sides;
        self
    }

    /// Set the pullback safety factor.
    #[must_use]
    pub fn with_pullback_margin(mut self, margin: f64) -> Self {
        self.pullback_margin = margin;
        self
    }

    /// Set the merge tolerance.
    #[must_use]
    pub fn with_merge_tolerance(mut self, tolerance: f64) -> Self {
        self.merge_tolerance = tolerance;
        self
    }
}
