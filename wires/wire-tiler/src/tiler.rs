//! Tiling a single pattern over a box or guide mesh.

use hashbrown::HashSet;
use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, info};
use wire_params::{ParameterManager, TargetType, Variables};
use wire_types::{Aabb, AttributeKind, HashGrid, WireNetwork};

use crate::config::TilerConfig;
use crate::error::{TilerError, TilerResult};
use crate::guide::GuideMesh;

/// Name of the thickness attribute written onto tiled networks.
pub const THICKNESS_ATTRIBUTE: &str = "thickness";

/// A pattern with its parameters, ready to be instantiated in cells.
#[derive(Debug, Clone)]
pub(crate) struct Pattern<'a> {
    pub network: &'a WireNetwork,
    pub params: &'a ParameterManager,
    pub bbox: Aabb,
}

impl<'a> Pattern<'a> {
    pub(crate) fn new(network: &'a WireNetwork, params: &'a ParameterManager) -> TilerResult<Self> {
        params.check_network(network)?;
        let bbox = network.bbox();
        let size = bbox.size();
        if let Some(axis) = (0..network.dim()).find(|&a| size[a] <= f64::EPSILON) {
            return Err(TilerError::DegeneratePattern { axis });
        }
        Ok(Self {
            network,
            params,
            bbox,
        })
    }
}

/// One instantiated cell, in cell-local vertex numbering.
#[derive(Debug, Clone, Default)]
pub(crate) struct CellWires {
    pub vertices: Vec<Point3<f64>>,
    pub edges: Vec<[usize; 2]>,
    pub thickness: Vec<f64>,
}

/// Instantiate `pattern` in cell `cell` of `guide`.
pub(crate) fn instantiate_cell(
    pattern: &Pattern<'_>,
    guide: &GuideMesh,
    cell: usize,
    variables: &Variables,
) -> TilerResult<CellWires> {
    let painted = guide.cell_dofs(cell, pattern.params.num_dofs())?;
    let owned;
    let params = match painted {
        Some(dofs) => {
            let mut p = pattern.params.clone();
            p.set_dofs(&dofs)?;
            owned = p;
            &owned
        }
        None => pattern.params,
    };

    let positions = params.apply_offsets(pattern.network, variables)?;
    let thickness = params.evaluate_thickness(variables)?;
    let min = pattern.bbox.min;
    let size = pattern.bbox.size();
    let dim = pattern.network.dim();

    let vertices = positions
        .iter()
        .map(|p| {
            let mut local = Point3::origin();
            for axis in 0..dim {
                local[axis] = (p[axis] - min[axis]) / size[axis];
            }
            guide.map_point(cell, &local)
        })
        .collect();

    Ok(CellWires {
        vertices,
        edges: pattern.network.edges().to_vec(),
        thickness,
    })
}

/// Merge cells into one network by coordinate coincidence.
///
/// Vertices within `tolerance` are welded (the first occurrence keeps its
/// position and thickness); edges that become duplicates or collapse are
/// dropped.
pub(crate) fn merge_cells(
    dim: usize,
    cells: Vec<CellWires>,
    tolerance: f64,
    target: TargetType,
) -> TilerResult<WireNetwork> {
    let mut grid = HashGrid::new(tolerance);
    let mut vertex_thickness = Vec::new();
    let mut edges = Vec::new();
    let mut edge_thickness = Vec::new();
    let mut seen: HashSet<[usize; 2]> = HashSet::new();
    let mut emitted = 0usize;

    for cell in cells {
        let map: Vec<usize> = cell
            .vertices
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let (index, inserted) = grid.insert_or_find(*p);
                if inserted && target == TargetType::Vertex {
                    vertex_thickness.push(cell.thickness[i]);
                }
                index
            })
            .collect();
        for (e, [a, b]) in cell.edges.iter().enumerate() {
            emitted += 1;
            let (a, b) = (map[*a], map[*b]);
            if a == b {
                continue;
            }
            let key = if a < b { [a, b] } else { [b, a] };
            if seen.insert(key) {
                edges.push([a, b]);
                if target == TargetType::Edge {
                    edge_thickness.push(cell.thickness[e]);
                }
            }
        }
    }

    let merged_vertices = grid.len();
    let mut network = WireNetwork::from_parts(dim, grid.into_points(), edges)?;
    let (kind, values) = match target {
        TargetType::Vertex => (AttributeKind::Vertex, vertex_thickness),
        TargetType::Edge => (AttributeKind::Edge, edge_thickness),
    };
    network.add_attribute_with_values(THICKNESS_ATTRIBUTE, kind, values)?;
    debug!(
        vertices = merged_vertices,
        edges = network.num_edges(),
        dropped_edges = emitted - network.num_edges(),
        "Merged tiled cells"
    );
    Ok(network)
}

/// Generate all cells, sequentially or with rayon.
pub(crate) fn generate_cells<F>(
    num_cells: usize,
    parallel: bool,
    generate: F,
) -> TilerResult<Vec<CellWires>>
where
    F: Fn(usize) -> TilerResult<CellWires> + Sync + Send,
{
    if parallel {
        (0..num_cells).into_par_iter().map(generate).collect()
    } else {
        (0..num_cells).map(generate).collect()
    }
}

/// Tiles one parametric pattern over a box or a guide mesh.
///
/// Every cell receives a copy of the pattern whose bounding box is mapped
/// onto the cell by trilinear (bilinear in 2D) interpolation, after applying
/// the pattern's offsets. Thickness is evaluated per cell and written to the
/// result as the `thickness` attribute (per vertex or per edge, following
/// the parameters' target). Coincident vertices of neighboring cells are
/// welded once all cells are generated.
///
/// # Example
///
/// ```
/// use wire_params::{ParameterManager, TargetType};
/// use wire_tiler::WireTiler;
/// use wire_types::{parse_wire, Aabb};
/// use nalgebra::Point3;
///
/// let square = parse_wire("v 0 0\nv 1 0\nv 1 1\nv 0 1\nl 1 2\nl 2 3\nl 3 4\nl 4 1\n").unwrap();
/// let params = ParameterManager::new(&square, 0.1, TargetType::Vertex);
/// let tiler = WireTiler::new(square);
/// let bbox = Aabb::new(Point3::origin(), Point3::new(3.0, 3.0, 0.0));
/// let tiled = tiler.tile_with_box(&params, &bbox, [3, 3, 1]).unwrap();
/// assert_eq!(tiled.num_vertices(), 16);
/// assert_eq!(tiled.num_edges(), 24);
/// ```
#[derive(Debug, Clone)]
pub struct WireTiler {
    pattern: WireNetwork,
    config: TilerConfig,
    variables: Variables,
}

impl WireTiler {
    /// A tiler for `pattern` with default configuration.
    #[must_use]
    pub fn new(pattern: WireNetwork) -> Self {
        Self {
            pattern,
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

    /// Tile `reps` copies of the pattern filling `bbox`.
    ///
    /// # Errors
    ///
    /// As [`tile_with_guide_mesh`](Self::tile_with_guide_mesh), plus
    /// [`TilerError::InvalidGuideMesh`] for zero repetitions.
    pub fn tile_with_box(
        &self,
        params: &ParameterManager,
        bbox: &Aabb,
        reps: [usize; 3],
    ) -> TilerResult<WireNetwork> {
        let guide = GuideMesh::from_box(bbox, reps, self.pattern.dim())?;
        self.tile_with_guide_mesh(params, &guide)
    }

    /// Tile one copy of the pattern into every cell of `guide`.
    ///
    /// DOFs painted on the guide mesh (`dof_0`, `dof_1`, ...) override the
    /// values held by `params` for their cell.
    ///
    /// # Errors
    ///
    /// Returns [`TilerError::DimensionMismatch`] if pattern and guide differ
    /// in dimension, [`TilerError::DegeneratePattern`] for a flat pattern,
    /// and parameter errors for mismatched or unevaluable parameters.
    pub fn tile_with_guide_mesh(
        &self,
        params: &ParameterManager,
        guide: &GuideMesh,
    ) -> TilerResult<WireNetwork> {
        let dim = self.pattern.dim();
        if guide.dim() != dim {
            return Err(TilerError::DimensionMismatch {
                pattern: dim,
                guide: guide.dim(),
            });
        }
        let pattern = Pattern::new(&self.pattern, params)?;
        let cells = generate_cells(guide.num_cells(), self.config.parallel, |cell| {
            instantiate_cell(&pattern, guide, cell, &self.variables)
        })?;
        let network = merge_cells(
            dim,
            cells,
            self.config.merge_tolerance,
            params.thickness_target(),
        )?;
        info!(
            cells = guide.num_cells(),
            vertices = network.num_vertices(),
            edges = network.num_edges(),
            parallel = self.config.parallel,
            "Tiled wire pattern"
        );
        Ok(network)
    }

    /// The pattern being tiled.
    #[must_use]
    pub const fn pattern(&self) -> &WireNetwork {
        &self.pattern
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &TilerConfig {
        &self.config
    }
}
