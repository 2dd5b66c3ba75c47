//! Detection of full cubic (square) symmetry of a wire network.

use tracing::debug;
use wire_types::{HashGrid, WireNetwork};

use crate::operators::{SymmetryGroup, SymmetryOperators};

/// Checks whether a network's vertex set is invariant under the isotropic
/// group (cubic in 3D, square in 2D) centered at its bounding-box center.
///
/// The result is cached; call [`update`](Self::update) after mutating the
/// network's vertices.
///
/// # Example
///
/// ```
/// use wire_symmetry::SymmetryChecker;
/// use wire_types::parse_wire;
///
/// let square = parse_wire("v 0 0\nv 1 0\nv 1 1\nv 0 1\nl 1 2\nl 2 3\nl 3 4\nl 4 1\n").unwrap();
/// assert!(SymmetryChecker::new(&square, 1e-6).has_cubic_symmetry());
/// ```
#[derive(Debug, Clone)]
pub struct SymmetryChecker {
    tolerance: f64,
    symmetric: bool,
}

impl SymmetryChecker {
    /// Run the check on `network` with matching tolerance `tolerance`.
    #[must_use]
    pub fn new(network: &WireNetwork, tolerance: f64) -> Self {
        let mut checker = Self {
            tolerance,
            symmetric: false,
        };
        checker.update(network);
        checker
    }

    /// Recompute the cached result for the current vertices of `network`.
    pub fn update(&mut self, network: &WireNetwork) {
        self.symmetric = is_invariant(network, self.tolerance);
    }

    /// Result of the last check.
    #[must_use]
    pub const fn has_cubic_symmetry(&self) -> bool {
        self.symmetric
    }

    /// Matching tolerance.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

fn is_invariant(network: &WireNetwork, tolerance: f64) -> bool {
    if network.num_vertices() == 0 {
        return true;
    }
    let group = SymmetryGroup::isotropic_for(network.dim());
    let Ok(operators) = SymmetryOperators::new(group, network.dim(), network.center()) else {
        return false;
    };
    let grid = HashGrid::from_points(network.vertices(), tolerance);

    for (gi, op) in operators.iter().enumerate() {
        for (vi, v) in network.vertices().iter().enumerate() {
            if grid.find(&op.apply(v)).is_none() {
                debug!(
                    operator = gi,
                    vertex = vi,
                    "Vertex image not found; network is not symmetric"
                );
                return false;
            }
        }
    }
    true
}
