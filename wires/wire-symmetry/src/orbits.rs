//! Vertex and edge orbit partitions.
//!
//! # `.orbit` format
//!
//! ```text
//! # one orbit per line: kind, 1-based orbit id, 0-based member indices
//! v 1 0 2 4 6
//! v 2 1 3 5 7
//! e 1 0 1 2 3
//! ```
//!
//! Orbit ids of each kind must cover `1..=n` exactly once.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use hashbrown::HashMap;
use tracing::{debug, warn};
use wire_types::{HashGrid, WireNetwork};

use crate::error::{SymmetryError, SymmetryResult};
use crate::operators::SymmetryOperators;

/// Partition of a network's vertices and edges into symmetry orbits.
///
/// Orbits are stored in id order: orbit `k` (0-based position) has id
/// `k + 1`. Members of each orbit are sorted, and orbits computed from a
/// network are ordered by their smallest member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetryOrbits {
    vertex_orbits: Vec<Vec<usize>>,
    edge_orbits: Vec<Vec<usize>>,
    vertex_ids: Vec<usize>,
    edge_ids: Vec<usize>,
}

impl SymmetryOrbits {
    /// Build from explicit orbits, validating the partition invariant.
    ///
    /// # Errors
    ///
    /// Returns [`SymmetryError::InvalidOrbits`] if an orbit is empty, an
    /// index is out of range, or an index is missing or repeated.
    pub fn from_parts(
        num_vertices: usize,
        num_edges: usize,
        vertex_orbits: Vec<Vec<usize>>,
        edge_orbits: Vec<Vec<usize>>,
    ) -> SymmetryResult<Self> {
        let vertex_ids = assign_ids("vertex", &vertex_orbits, num_vertices)?;
        let edge_ids = assign_ids("edge", &edge_orbits, num_edges)?;
        let mut orbits = Self {
            vertex_orbits,
            edge_orbits,
            vertex_ids,
            edge_ids,
        };
        for orbit in orbits
            .vertex_orbits
            .iter_mut()
            .chain(orbits.edge_orbits.iter_mut())
        {
            orbit.sort_unstable();
        }
        Ok(orbits)
    }

    /// Compute orbits of `network` under `operators`.
    ///
    /// Two vertices share an orbit if some operator maps one onto the other
    /// within `tol`; edges share an orbit if an operator maps the endpoints of
    /// one onto the endpoints of the other. Images that match no vertex or
    /// edge are skipped (the network is not fully symmetric under the group)
    /// and reported through `tracing`.
    ///
    /// # Errors
    ///
    /// Propagates validation errors of the resulting partition, which cannot
    /// occur for a valid network.
    pub fn compute(
        network: &WireNetwork,
        operators: &SymmetryOperators,
        tol: f64,
    ) -> SymmetryResult<Self> {
        let n = network.num_vertices();
        let grid = HashGrid::from_points(network.vertices(), tol);

        // image[g][v] = index of operator g applied to vertex v.
        let mut images: Vec<Vec<Option<usize>>> = Vec::with_capacity(operators.len());
        let mut unmatched = 0usize;
        for op in operators.iter() {
            let row: Vec<Option<usize>> = network
                .vertices()
                .iter()
                .map(|v| grid.find(&op.apply(v)))
                .collect();
            unmatched += row.iter().filter(|m| m.is_none()).count();
            images.push(row);
        }

        let mut vertex_sets = DisjointSets::new(n);
        for row in &images {
            for (v, image) in row.iter().enumerate() {
                if let Some(w) = image {
                    vertex_sets.union(v, *w);
                }
            }
        }

        let mut edge_lookup: HashMap<[usize; 2], usize> =
            HashMap::with_capacity(network.num_edges());
        for (ei, &[a, b]) in network.edges().iter().enumerate() {
            edge_lookup.entry([a.min(b), a.max(b)]).or_insert(ei);
        }
        let mut edge_sets = DisjointSets::new(network.num_edges());
        for row in &images {
            for (ei, &[a, b]) in network.edges().iter().enumerate() {
                if let (Some(ga), Some(gb)) = (row[a], row[b]) {
                    match edge_lookup.get(&[ga.min(gb), ga.max(gb)]) {
                        Some(&image) => edge_sets.union(ei, image),
                        None => unmatched += 1,
                    }
                }
            }
        }

        if unmatched > 0 {
            warn!(unmatched, "Symmetry images without a matching vertex or edge");
        }

        let orbits = Self::from_parts(
            n,
            network.num_edges(),
            vertex_sets.groups(),
            edge_sets.groups(),
        )?;
        debug!(
            vertex_orbits = orbits.num_vertex_orbits(),
            edge_orbits = orbits.num_edge_orbits(),
            "Computed symmetry orbits"
        );
        Ok(orbits)
    }

    /// Vertex orbits in id order.
    #[must_use]
    pub fn vertex_orbits(&self) -> &[Vec<usize>] {
        &self.vertex_orbits
    }

    /// Edge orbits in id order.
    #[must_use]
    pub fn edge_orbits(&self) -> &[Vec<usize>] {
        &self.edge_orbits
    }

    /// 1-based orbit id of every vertex.
    #[must_use]
    pub fn vertex_orbit_ids(&self) -> &[usize] {
        &self.vertex_ids
    }

    /// 1-based orbit id of every edge.
    #[must_use]
    pub fn edge_orbit_ids(&self) -> &[usize] {
        &self.edge_ids
    }

    /// Number of vertex orbits.
    #[must_use]
    pub fn num_vertex_orbits(&self) -> usize {
        self.vertex_orbits.len()
    }

    /// Number of edge orbits.
    #[must_use]
    pub fn num_edge_orbits(&self) -> usize {
        self.edge_orbits.len()
    }
}

fn assign_ids(
    target: &'static str,
    orbits: &[Vec<usize>],
    count: usize,
) -> SymmetryResult<Vec<usize>> {
    let mut ids = vec![0usize; count];
    for (k, orbit) in orbits.iter().enumerate() {
        if orbit.is_empty() {
            return Err(SymmetryError::invalid_orbits(
                target,
                format!("orbit {} is empty", k + 1),
            ));
        }
        for &index in orbit {
            if index >= count {
                return Err(SymmetryError::invalid_orbits(
                    target,
                    format!("index {index} out of range (count {count})"),
                ));
            }
            if ids[index] != 0 {
                return Err(SymmetryError::invalid_orbits(
                    target,
                    format!("index {index} belongs to orbits {} and {}", ids[index], k + 1),
                ));
            }
            ids[index] = k + 1;
        }
    }
    if let Some(missing) = ids.iter().position(|&id| id == 0) {
        return Err(SymmetryError::invalid_orbits(
            target,
            format!("index {missing} belongs to no orbit"),
        ));
    }
    Ok(ids)
}

/// Union-find with path halving.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Smaller root wins so roots are the smallest members.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }

    /// Groups ordered by smallest member, members ascending.
    fn groups(mut self) -> Vec<Vec<usize>> {
        let n = self.parent.len();
        let mut slot: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for i in 0..n {
            let root = self.find(i);
            let k = *slot.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[k].push(i);
        }
        groups
    }
}

// =============================================================================
// .orbit files
// =============================================================================

/// Load orbits from an `.orbit` file and validate them against the counts.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is malformed, or violates
/// the partition invariant.
pub fn load_orbits<P: AsRef<Path>>(
    path: P,
    num_vertices: usize,
    num_edges: usize,
) -> SymmetryResult<SymmetryOrbits> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SymmetryError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SymmetryError::Io(e)
        }
    })?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    parse_orbits(&content, num_vertices, num_edges)
}

/// Parse `.orbit` text and validate it against the counts.
///
/// # Errors
///
/// Returns [`SymmetryError::Parse`] for malformed lines and
/// [`SymmetryError::InvalidOrbits`] if ids are not dense or the partition is
/// incomplete.
pub fn parse_orbits(
    content: &str,
    num_vertices: usize,
    num_edges: usize,
) -> SymmetryResult<SymmetryOrbits> {
    let mut vertex_entries: Vec<(usize, Vec<usize>)> = Vec::new();
    let mut edge_entries: Vec<(usize, Vec<usize>)> = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let kind = tokens.next();
        let numbers = tokens
            .map(|t| {
                t.parse::<usize>().map_err(|e| SymmetryError::Parse {
                    line: line_no,
                    message: format!("bad index {t:?}: {e}"),
                })
            })
            .collect::<SymmetryResult<Vec<_>>>()?;
        let Some((&id, members)) = numbers.split_first() else {
            return Err(SymmetryError::Parse {
                line: line_no,
                message: "missing orbit id".to_owned(),
            });
        };
        match kind {
            Some("v") => vertex_entries.push((id, members.to_vec())),
            Some("e") => edge_entries.push((id, members.to_vec())),
            other => {
                return Err(SymmetryError::Parse {
                    line: line_no,
                    message: format!("unknown orbit kind {other:?}"),
                })
            }
        }
    }

    let vertex_orbits = order_by_id("vertex", vertex_entries)?;
    let edge_orbits = order_by_id("edge", edge_entries)?;
    SymmetryOrbits::from_parts(num_vertices, num_edges, vertex_orbits, edge_orbits)
}

fn order_by_id(
    target: &'static str,
    entries: Vec<(usize, Vec<usize>)>,
) -> SymmetryResult<Vec<Vec<usize>>> {
    let n = entries.len();
    let mut slots: Vec<Option<Vec<usize>>> = vec![None; n];
    for (id, members) in entries {
        if id == 0 || id > n {
            return Err(SymmetryError::invalid_orbits(
                target,
                format!("orbit id {id} outside 1..={n}"),
            ));
        }
        if slots[id - 1].is_some() {
            return Err(SymmetryError::invalid_orbits(
                target,
                format!("orbit id {id} listed twice"),
            ));
        }
        slots[id - 1] = Some(members);
    }
    // Ids are in range and unique, so every slot is filled.
    Ok(slots.into_iter().flatten().collect())
}

/// Save orbits to an `.orbit` file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_orbits<P: AsRef<Path>>(orbits: &SymmetryOrbits, path: P) -> SymmetryResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_orbits(orbits, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write orbits in `.orbit` format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_orbits<W: Write>(orbits: &SymmetryOrbits, writer: &mut W) -> SymmetryResult<()> {
    for (kind, list) in [("v", orbits.vertex_orbits()), ("e", orbits.edge_orbits())] {
        for (k, orbit) in list.iter().enumerate() {
            write!(writer, "{kind} {}", k + 1)?;
            for index in orbit {
                write!(writer, " {index}")?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}
