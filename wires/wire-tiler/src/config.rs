//! Configuration for tiling.

/// Configuration for [`WireTiler`](crate::WireTiler) and
/// [`MixedMeshTiler`](crate::MixedMeshTiler).
///
/// # Example
///
/// ```
/// use wire_tiler::TilerConfig;
///
/// let config = TilerConfig::default().with_parallel(true).with_merge_tolerance(1e-8);
/// assert!(config.parallel);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TilerConfig {
    /// Vertices of neighboring cells closer than this are merged.
    pub merge_tolerance: f64,

    /// Generate cells in parallel (via rayon). The merge is always sequential.
    pub parallel: bool,
}

impl Default for TilerConfig {
    fn default() -> Self {
        Self {
            merge_tolerance: 1e-6,
            parallel: false,
        }
    }
}

impl TilerConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the vertex merge tolerance.
    #[must_use]
    pub fn with_merge_tolerance(mut self, tolerance: f64) -> Self {
        self.merge_tolerance = tolerance;
        self
    }

    /// Enable or disable parallel cell generation.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
