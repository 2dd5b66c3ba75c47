//! Tiling several patterns into one guide mesh.

use tracing::info;
use wire_params::{ParameterManager, Variables};
use wire_types::WireNetwork;

use crate::config::TilerConfig;
use crate::error::{TilerError, TilerResult};
use crate::guide::{GuideMesh, PATTERN_ID_ATTRIBUTE};
use crate::tiler::{generate_cells, instantiate_cell, merge_cells, Pattern};

/// Tiles a guide mesh whose cells each choose one of several patterns.
///
/// The `pattern_id` cell attribute selects the pattern (0-based index into
/// the list given to [`new`](Self::new)); without it every cell uses
/// pattern 0. Neighboring cells are joined purely by coordinate
/// coincidence, so patterns meant to be mixed must agree on the vertices
/// they place on shared cell faces.
#[derive(Debug, Clone)]
pub struct MixedMeshTiler {
    patterns: Vec<(WireNetwork, ParameterManager)>,
    config: TilerConfig,
    variables: Variables,
}

impl MixedMeshTiler {
    /// A tiler over `patterns`, each paired with its parameters.
    #[must_use]
    pub fn new(patterns: Vec<(WireNetwork, ParameterManager)>) -> Self {
        Self {
            patterns,
            config: TilerConfig::default(),
            variables: Variables::new(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: TilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Bindings for formula-driven parameters.
    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// Tile every cell of `guide` with its chosen pattern.
    ///
    /// # Errors
    ///
    /// Returns [`TilerError::PatternNotFound`] for a `pattern_id` that is
    /// negative, fractional or out of range,
    /// [`TilerError::ThicknessTargetMismatch`] if the patterns disagree on
    /// vertex versus edge thickness, and the errors of
    /// [`WireTiler::tile_with_guide_mesh`](crate::WireTiler::tile_with_guide_mesh).
    pub fn tile(&self, guide: &GuideMesh) -> TilerResult<WireNetwork> {
        let Some((first_network, first_params)) = self.patterns.first() else {
            return Err(TilerError::PatternNotFound {
                cell: 0,
                pattern_id: 0.0,
                available: 0,
            });
        };
        let target = first_params.thickness_target();
        let dim = first_network.dim();

        let mut patterns = Vec::with_capacity(self.patterns.len());
        for (network, params) in &self.patterns {
            if network.dim() != guide.dim() {
                return Err(TilerError::DimensionMismatch {
                    pattern: network.dim(),
                    guide: guide.dim(),
                });
            }
            if params.thickness_target() != target {
                return Err(TilerError::ThicknessTargetMismatch);
            }
            patterns.push(Pattern::new(network, params)?);
        }

        let choice = self.pattern_choice(guide)?;
        let cells = generate_cells(guide.num_cells(), self.config.parallel, |cell| {
            instantiate_cell(&patterns[choice[cell]], guide, cell, &self.variables)
        })?;
        let network = merge_cells(dim, cells, self.config.merge_tolerance, target)?;
        info!(
            cells = guide.num_cells(),
            patterns = self.patterns.len(),
            vertices = network.num_vertices(),
            edges = network.num_edges(),
            "Tiled mixed wire patterns"
        );
        Ok(network)
    }

    fn pattern_choice(&self, guide: &GuideMesh) -> TilerResult<Vec<usize>> {
        let Some(ids) = guide.cell_attribute(PATTERN_ID_ATTRIBUTE) else {
            return Ok(vec![0; guide.num_cells()]);
        };
        ids.iter()
            .enumerate()
            .map(|(cell, &id)| {
                let valid = id >= 0.0 && id.fract() == 0.0 && (id as usize) < self.patterns.len();
                if valid {
                    Ok(id as usize)
                } else {
                    Err(TilerError::PatternNotFound {
                        cell,
                        pattern_id: id,
                        available: self.patterns.len(),
                    })
                }
            })
            .collect()
    }

    /// The patterns.
    #[must_use]
    pub fn patterns(&self) -> &[(WireNetwork, ParameterManager)] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiler::THICKNESS_ATTRIBUTE;
    use nalgebra::Point3;
    use wire_params::TargetType;
    use wire_types::Aabb;

    fn square() -> WireNetwork {
        WireNetwork::from_parts(
            2,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1], [1, 2], [2, 3], [3, 0]],
        )
        .unwrap()
    }

    /// The square with both diagonals through a center vertex.
    fn crossed_square() -> WireNetwork {
        let mut vertices = square().vertices().to_vec();
        vertices.push(Point3::new(0.5, 0.5, 0.0));
        let mut edges = square().edges().to_vec();
        edges.extend([[0, 4], [1, 4], [2, 4], [3, 4]]);
        WireNetwork::from_parts(2, vertices, edges).unwrap()
    }

    fn tiler() -> MixedMeshTiler {
        let a = square();
        let b = crossed_square();
        let pa = ParameterManager::new(&a, 0.1, TargetType::Vertex);
        let pb = ParameterManager::new(&b, 0.2, TargetType::Vertex);
        MixedMeshTiler::new(vec![(a, pa), (b, pb)])
    }

    fn guide() -> GuideMesh {
        let bbox = Aabb::new(Point3::origin(), Point3::new(2.0, 1.0, 0.0));
        GuideMesh::from_box(&bbox, [2, 1, 1], 2).unwrap()
    }

    #[test]
    fn test_mixed_tiling() {
        let mut guide = guide();
        guide.set_cell_attribute("pattern_id", vec![0.0, 1.0]).unwrap();
        let tiled = tiler().tile(&guide).unwrap();
        // 6 grid vertices plus one center, 7 grid edges plus four diagonals.
        assert_eq!(tiled.num_vertices(), 7);
        assert_eq!(tiled.num_edges(), 11);
        let thickness = tiled.attribute(THICKNESS_ATTRIBUTE).unwrap();
        assert_eq!(thickness[6], 0.2);
        assert_eq!(thickness[0], 0.1);
    }

    #[test]
    fn test_default_pattern() {
        let tiled = tiler().tile(&guide()).unwrap();
        assert_eq!(tiled.num_vertices(), 6);
        assert_eq!(tiled.num_edges(), 7);
    }

    #[test]
    fn test_invalid_pattern_id() {
        for id in [2.0, -1.0, 0.5] {
            let mut guide = guide();
            guide.set_cell_attribute("pattern_id", vec![0.0, id]).unwrap();
            assert!(matches!(
                tiler().tile(&guide),
                Err(TilerError::PatternNotFound { cell: 1, .. })
            ));
        }
    }

    #[test]
    fn test_thickness_target_mismatch() {
        let a = square();
        let pa = ParameterManager::new(&a, 0.1, TargetType::Vertex);
        let pb = ParameterManager::new(&a, 0.1, TargetType::Edge);
        let tiler = MixedMeshTiler::new(vec![(a.clone(), pa), (a, pb)]);
        assert!(matches!(
            tiler.tile(&guide()),
            Err(TilerError::ThicknessTargetMismatch)
        ));
    }
}
