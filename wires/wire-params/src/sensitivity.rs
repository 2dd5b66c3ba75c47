//! The view of an inflated surface needed to compute shape velocities.

use nalgebra::{Matrix3, Vector3};

/// Linearized dependence of a surface's vertices on the wire network.
///
/// Implemented by inflation results. Every output vertex `x_i` depends on
/// the wire vertex positions `p_w` through Jacobian blocks `∂x_i/∂p_w`
/// (the identity for a vertex rigidly attached to `p_w`, a reflection for
/// one attached to a mirrored copy of it) and on the thickness field `t_j`
/// through vector gradients `∂x_i/∂t_j`. Refinement keeps both linear, so
/// refined surfaces expose combined blocks and gradients.
pub trait ShapeSensitivity {
    /// Number of output vertices.
    fn num_surface_vertices(&self) -> usize;

    /// `(wire_vertex, ∂x/∂p)` pairs for output vertex `vertex`.
    fn wire_vertex_jacobians(&self, vertex: usize) -> &[(usize, Matrix3<f64>)];

    /// `(thickness_index, ∂x/∂t)` pairs for output vertex `vertex`.
    fn thickness_gradients(&self, vertex: usize) -> &[(usize, Vector3<f64>)];
}
