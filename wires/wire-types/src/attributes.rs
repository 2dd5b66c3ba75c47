//! Named per-vertex and per-edge attributes.
//!
//! Attributes are either *stored* (user supplied values) or *computed*
//! (built-in rules evaluated lazily from the network geometry). Computed
//! attributes are cached and the cache is dropped whenever the network's
//! vertices or edges change, so the next access recomputes them.

use std::sync::OnceLock;

use hashbrown::HashMap;

use crate::network::WireNetwork;

/// Whether an attribute holds one record per vertex or per edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// One record per vertex.
    Vertex,
    /// One record per edge.
    Edge,
}

/// Built-in attributes computed from the network geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputedAttribute {
    /// Number of edges incident to each vertex.
    VertexValence,
    /// Smallest angle (radians) between two edges meeting at each vertex.
    /// Vertices with fewer than two edges report `π`.
    VertexMinAngle,
    /// Length of each edge.
    EdgeLength,
}

impl ComputedAttribute {
    /// All built-in rules.
    pub const ALL: [Self; 3] = [Self::VertexValence, Self::VertexMinAngle, Self::EdgeLength];

    /// Attribute name under which the rule is registered.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::VertexValence => "vertex_valence",
            Self::VertexMinAngle => "vertex_min_angle",
            Self::EdgeLength => "edge_length",
        }
    }

    /// Look up a rule by attribute name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rule| rule.name() == name)
    }

    /// Whether the rule produces vertex or edge records.
    #[must_use]
    pub const fn kind(&self) -> AttributeKind {
        match self {
            Self::VertexValence | Self::VertexMinAngle => AttributeKind::Vertex,
            Self::EdgeLength => AttributeKind::Edge,
        }
    }

    /// Evaluate the rule on `network`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn compute(&self, network: &WireNetwork) -> Vec<f64> {
        match self {
            Self::VertexValence => (0..network.num_vertices())
                .map(|v| network.vertex_valence(v) as f64)
                .collect(),
            Self::VertexMinAngle => (0..network.num_vertices())
                .map(|v| min_incident_angle(network, v))
                .collect(),
            Self::EdgeLength => (0..network.num_edges())
                .map(|e| network.edge_length(e))
                .collect(),
        }
    }
}

fn min_incident_angle(network: &WireNetwork, vertex: usize) -> f64 {
    let origin = network.vertices()[vertex];
    let directions: Vec<_> = network
        .vertex_neighbors(vertex)
        .iter()
        .filter_map(|&n| (network.vertices()[n] - origin).try_normalize(f64::EPSILON))
        .collect();

    let mut min_angle = std::f64::consts::PI;
    for (i, a) in directions.iter().enumerate() {
        for b in &directions[i + 1..] {
            min_angle = min_angle.min(a.dot(b).clamp(-1.0, 1.0).acos());
        }
    }
    min_angle
}

#[derive(Debug, Clone)]
enum Storage {
    Stored(Vec<f64>),
    Computed {
        rule: ComputedAttribute,
        cache: OnceLock<Vec<f64>>,
    },
}

/// A single named attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    kind: AttributeKind,
    storage: Storage,
}

impl Attribute {
    /// Vertex-wise or edge-wise.
    #[must_use]
    pub const fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Returns true for built-in attributes.
    #[must_use]
    pub const fn is_computed(&self) -> bool {
        matches!(self.storage, Storage::Computed { .. })
    }

    /// Returns true if a computed attribute must be re-evaluated on access.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        match &self.storage {
            Storage::Stored(_) => false,
            Storage::Computed { cache, .. } => cache.get().is_none(),
        }
    }

    pub(crate) fn values<'a>(&'a self, network: &WireNetwork) -> &'a [f64] {
        match &self.storage {
            Storage::Stored(values) => values,
            Storage::Computed { rule, cache } => cache.get_or_init(|| rule.compute(network)),
        }
    }
}

/// Attribute store of a wire network.
#[derive(Debug, Clone, Default)]
pub struct WireAttributes {
    entries: HashMap<String, Attribute>,
}

impl WireAttributes {
    /// Returns true if an attribute with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.entries.get(name)
    }

    /// Attribute names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert_stored(&mut self, name: &str, kind: AttributeKind, values: Vec<f64>) {
        self.entries.insert(
            name.to_owned(),
            Attribute {
                kind,
                storage: Storage::Stored(values),
            },
        );
    }

    pub(crate) fn insert_computed(&mut self, rule: ComputedAttribute) {
        self.entries.insert(
            rule.name().to_owned(),
            Attribute {
                kind: rule.kind(),
                storage: Storage::Computed {
                    rule,
                    cache: OnceLock::new(),
                },
            },
        );
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Attribute> {
        self.entries.remove(name)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace the values of a stored attribute. Returns false if `name` is computed.
    pub(crate) fn set_stored(&mut self, name: &str, values: Vec<f64>) -> bool {
        match self.entries.get_mut(name) {
            Some(Attribute {
                storage: Storage::Stored(slot),
                ..
            }) => {
                *slot = values;
                true
            }
            _ => false,
        }
    }

    /// Drop cached values of computed attributes, and stored attributes whose
    /// size no longer fits the given vertex/edge counts.
    pub(crate) fn invalidate(&mut self, num_vertices: usize, num_edges: usize) -> Vec<String> {
        let mut dropped = Vec::new();
        self.entries.retain(|name, attr| match &mut attr.storage {
            Storage::Computed { cache, .. } => {
                *cache = OnceLock::new();
                true
            }
            Storage::Stored(values) => {
                let count = match attr.kind {
                    AttributeKind::Vertex => num_vertices,
                    AttributeKind::Edge => num_edges,
                };
                let fits = if count == 0 {
                    values.is_empty()
                } else {
                    values.len() % count == 0 && !values.is_empty()
                };
                if !fits {
                    dropped.push(name.clone());
                }
                fits
            }
        });
        dropped.sort_unstable();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_names_round_trip() {
        for rule in ComputedAttribute::ALL {
            assert_eq!(ComputedAttribute::from_name(rule.name()), Some(rule));
        }
        assert_eq!(ComputedAttribute::from_name("thickness"), None);
    }

    #[test]
    fn test_set_stored_rejects_computed() {
        let mut attrs = WireAttributes::default();
        attrs.insert_computed(ComputedAttribute::EdgeLength);
        attrs.insert_stored("weight", AttributeKind::Vertex, vec![1.0, 2.0]);

        assert!(!attrs.set_stored("edge_length", vec![1.0]));
        assert!(attrs.set_stored("weight", vec![3.0, 4.0]));
        assert_eq!(attrs.names(), vec!["edge_length", "weight"]);
    }

    #[test]
    fn test_invalidate_drops_mismatched() {
        let mut attrs = WireAttributes::default();
        attrs.insert_stored("weight", AttributeKind::Vertex, vec![1.0, 2.0]);
        attrs.insert_stored("flag", AttributeKind::Edge, vec![1.0]);

        let dropped = attrs.invalidate(3, 1);
        assert_eq!(dropped, vec!["weight".to_owned()]);
        assert!(attrs.contains("flag"));
    }
}
