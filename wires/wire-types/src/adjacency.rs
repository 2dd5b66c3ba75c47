//! Vertex adjacency derived from the edge list.

/// Vertex-to-vertex and vertex-to-edge adjacency of a wire network.
///
/// Neighbours are listed in edge order, so the adjacency is deterministic
/// for a given edge list.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    neighbors: Vec<Vec<usize>>,
    incident_edges: Vec<Vec<usize>>,
}

impl Adjacency {
    /// Build adjacency for `num_vertices` vertices connected by `edges`.
    ///
    /// Edges are assumed to be valid (see [`WireNetwork::validate`](crate::WireNetwork::validate)).
    #[must_use]
    pub fn build(num_vertices: usize, edges: &[[usize; 2]]) -> Self {
        let mut neighbors = vec![Vec::new(); num_vertices];
        let mut incident_edges = vec![Vec::new(); num_vertices];

        for (ei, &[a, b]) in edges.iter().enumerate() {
            if a >= num_vertices || b >= num_vertices {
                continue;
            }
            neighbors[a].push(b);
            neighbors[b].push(a);
            incident_edges[a].push(ei);
            incident_edges[b].push(ei);
        }

        Self {
            neighbors,
            incident_edges,
        }
    }

    /// Vertices connected to `vertex` by an edge.
    #[must_use]
    pub fn neighbors(&self, vertex: usize) -> &[usize] {
        self.neighbors.get(vertex).map_or(&[], Vec::as_slice)
    }

    /// Edges incident to `vertex`.
    #[must_use]
    pub fn incident_edges(&self, vertex: usize) -> &[usize] {
        self.incident_edges.get(vertex).map_or(&[], Vec::as_slice)
    }

    /// Number of edges incident to `vertex`.
    #[must_use]
    pub fn valence(&self, vertex: usize) -> usize {
        self.incident_edges(vertex).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_path() {
        let adj = Adjacency::build(3, &[[0, 1], [1, 2]]);
        assert_eq!(adj.neighbors(1), &[0, 2]);
        assert_eq!(adj.incident_edges(1), &[0, 1]);
        assert_eq!(adj.valence(0), 1);
        assert_eq!(adj.valence(2), 1);
    }

    #[test]
    fn test_out_of_range_vertex() {
        let adj = Adjacency::build(2, &[[0, 1]]);
        assert!(adj.neighbors(7).is_empty());
        assert_eq!(adj.valence(7), 0);
    }
}
