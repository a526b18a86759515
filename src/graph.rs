//! Base graph module. Nodes are identified by a dense integer id space `[0,N)`, edges by
//! a dense integer id space `[0,M)`, each edge storing its endpoints with `source < target`.
//! Parallel edges between the same pair of nodes are collapsed at insertion time, following
//! the same dedup-on-insert convention the contraction graph relies on for its own merges.
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::{fmt, hash::Hash};

/// Default integer type for node and edge indices
/// Needs to be increased for very large graphs > u32::max
pub type DefaultIdx = u32;

pub trait IndexType: Copy + Default + Hash + Ord + fmt::Debug {
    fn new(idx: usize) -> Self;
    fn index(&self) -> usize;
    fn max() -> Self;
}

impl IndexType for usize {
    #[inline(always)]
    fn new(x: usize) -> Self {
        x
    }
    #[inline(always)]
    fn index(&self) -> Self {
        *self
    }
    #[inline(always)]
    fn max() -> Self {
        ::std::usize::MAX
    }
}

impl IndexType for u32 {
    #[inline(always)]
    fn new(x: usize) -> Self {
        x as u32
    }
    #[inline(always)]
    fn index(&self) -> usize {
        *self as usize
    }
    #[inline(always)]
    fn max() -> Self {
        ::std::u32::MAX
    }
}

impl IndexType for u16 {
    #[inline(always)]
    fn new(x: usize) -> Self {
        x as u16
    }
    #[inline(always)]
    fn index(&self) -> usize {
        *self as usize
    }
    #[inline(always)]
    fn max() -> Self {
        ::std::u16::MAX
    }
}

impl IndexType for u8 {
    #[inline(always)]
    fn new(x: usize) -> Self {
        x as u8
    }
    #[inline(always)]
    fn index(&self) -> usize {
        *self as usize
    }
    #[inline(always)]
    fn max() -> Self {
        ::std::u8::MAX
    }
}

/// Node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct NodeIndex<Idx = DefaultIdx>(Idx);

impl NodeIndex {
    #[inline]
    pub fn new(x: usize) -> Self {
        NodeIndex(IndexType::new(x))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0.index()
    }

    #[inline]
    pub fn end() -> Self {
        NodeIndex(IndexType::max())
    }
}

impl<Idx: IndexType> From<Idx> for NodeIndex<Idx> {
    fn from(ix: Idx) -> Self {
        NodeIndex(ix)
    }
}

/// Short version of `NodeIndex::new`
pub fn node_index(index: usize) -> NodeIndex {
    NodeIndex::new(index)
}

/// Edge identifier.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, PartialOrd, Eq, Ord, Hash, Deserialize, Serialize,
)]
pub struct EdgeIndex<Idx = DefaultIdx>(Idx);

impl<Idx: IndexType> From<Idx> for EdgeIndex<Idx> {
    fn from(ix: Idx) -> Self {
        EdgeIndex(ix)
    }
}

impl<Idx: IndexType> EdgeIndex<Idx> {
    #[inline]
    pub fn new(x: usize) -> Self {
        EdgeIndex(IndexType::new(x))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0.index()
    }

    /// An invalid `EdgeIndex` used to denote absence of an edge, for example
    /// to end an adjacency list.
    #[inline]
    pub fn end() -> Self {
        EdgeIndex(IndexType::max())
    }
}

/// Short version of `EdgeIndex::new`
pub fn edge_index(index: usize) -> EdgeIndex {
    EdgeIndex::new(index)
}

/// An undirected edge connecting `u` and `v` with `u < v`, carrying a weight used as the
/// initial value fed into a [`crate::merge_rules::MergeRule`] once clustering starts.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Edge<Idx = DefaultIdx> {
    pub u: NodeIndex<Idx>,
    pub v: NodeIndex<Idx>,
    pub weight: f64,
}

impl Edge {
    /// Builds an edge, ordering endpoints so that `u < v`.
    pub fn new(a: NodeIndex, b: NodeIndex, weight: f64) -> Self {
        let (u, v) = if a <= b { (a, b) } else { (b, a) };
        Edge { u, v, weight }
    }
}

/// A simple undirected graph `G = (V,E)` with node ids in `[0,N)` and edge ids in `[0,M)`.
/// Each node's adjacency list is kept sorted by neighbor id; parallel edges are collapsed on
/// insertion (the lower-weight edge wins, matching the contraction graph's own merge
/// convention), so `adjacency[u]` always has exactly one entry per distinct neighbor.
#[derive(Clone, Serialize, Deserialize)]
pub struct Graph<Idx = DefaultIdx> {
    /// For each node, the sorted list of `(neighbor, edge_id)` pairs.
    pub adjacency: Vec<Vec<(NodeIndex<Idx>, EdgeIndex<Idx>)>>,
    pub edges: Vec<Edge<Idx>>,
}

impl Graph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self {
            adjacency: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Creates a new empty graph with preallocated memory for `num_nodes` nodes and
    /// `num_edges` edges.
    pub fn with_capacity(num_nodes: usize, num_edges: usize) -> Self {
        Self {
            adjacency: Vec::with_capacity(num_nodes),
            edges: Vec::with_capacity(num_edges),
        }
    }

    /// Builds a graph from `num_nodes` nodes and a flat `(u, v, weight)` edge list.
    pub fn from_edges(num_nodes: usize, edges: impl IntoIterator<Item = (usize, usize, f64)>) -> Self {
        let mut g = Self::with_capacity(num_nodes, 0);
        for _ in 0..num_nodes {
            g.add_node();
        }
        for (u, v, w) in edges {
            g.add_edge(node_index(u), node_index(v), w);
        }
        g
    }

    /// Adds a new node and returns its index.
    pub fn add_node(&mut self) -> NodeIndex {
        let node_idx = NodeIndex::new(self.adjacency.len());
        assert!(
            NodeIndex::end() != node_idx,
            "Maximum number of nodes for index type {} exceeded",
            std::any::type_name::<DefaultIdx>()
        );
        self.adjacency.push(Vec::new());
        node_idx
    }

    /// Adds `n` new nodes, returning the index of the first one added.
    pub fn add_nodes(&mut self, n: usize) -> NodeIndex {
        assert!(n > 0, "add_nodes called with n=0");
        let first = NodeIndex::new(self.adjacency.len());
        for _ in 0..n {
            self.add_node();
        }
        first
    }

    /// Adds a new edge `(u, v)` with the given `weight`.
    ///
    /// **Panics** if `u == v` (self-loops are not supported at this layer) or if either
    /// endpoint does not exist.
    ///
    /// If an edge between `u` and `v` already exists, the existing edge's weight is
    /// overwritten with `weight` and its id is returned rather than creating a parallel edge.
    pub fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, weight: f64) -> EdgeIndex {
        assert!(a != b, "self-loops are not supported ({:?})", a);
        assert!(
            a.index() < self.adjacency.len(),
            "node index ({}) does not exist",
            a.index()
        );
        assert!(
            b.index() < self.adjacency.len(),
            "node index ({}) does not exist",
            b.index()
        );

        let (u, v) = if a <= b { (a, b) } else { (b, a) };

        if let Some(&(_, existing)) = self.adjacency[u.index()]
            .iter()
            .find(|(n, _)| *n == v)
        {
            debug!(
                "Updated edge ({:?},{:?}) weight from {} to {}",
                u, v, self.edges[existing.index()].weight, weight
            );
            self.edges[existing.index()].weight = weight;
            return existing;
        }

        let edge_idx = EdgeIndex::new(self.edges.len());
        assert!(
            EdgeIndex::end() != edge_idx,
            "Maximum number of edges for index type {} exceeded",
            std::any::type_name::<DefaultIdx>()
        );

        self.edges.push(Edge { u, v, weight });

        let ui = self.adjacency[u.index()].partition_point(|(n, _)| *n < v);
        self.adjacency[u.index()].insert(ui, (v, edge_idx));
        let vi = self.adjacency[v.index()].partition_point(|(n, _)| *n < u);
        self.adjacency[v.index()].insert(vi, (u, edge_idx));

        edge_idx
    }

    pub fn number_of_nodes(&self) -> usize {
        self.adjacency.len()
    }

    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, e: EdgeIndex) -> &Edge {
        &self.edges[e.index()]
    }

    /// Returns `(u, v)` with `u < v` for the given edge.
    pub fn uv(&self, e: EdgeIndex) -> (NodeIndex, NodeIndex) {
        let edge = self.edge(e);
        (edge.u, edge.v)
    }

    /// Returns an iterator over `(neighbor, edge_id)` pairs of `node`, sorted by neighbor.
    pub fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, EdgeIndex)> + '_ {
        self.adjacency[node.index()].iter().copied()
    }

    pub fn degree(&self, node: NodeIndex) -> usize {
        self.adjacency[node.index()].len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Builds a dense `node -> edge-id-set` lookup (`FxHashMap` keyed on neighbor) for `node`,
    /// useful when many membership checks against a single node's neighborhood are needed.
    pub fn neighbor_map(&self, node: NodeIndex) -> FxHashMap<NodeIndex, EdgeIndex> {
        self.adjacency[node.index()].iter().copied().collect()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Macro to create an undirected edge tuple `(u, v, weight)`.
/// ```
/// use graph_agglo::edge;
/// let e = edge!(0, 1, 3.0);
/// assert_eq!(e, (0usize, 1usize, 3.0));
/// ```
#[macro_export]
macro_rules! edge {
    ($u:expr, $v:expr, $weight:expr) => {
        ($u, $v, $weight)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_nodes_and_edges() {
        let mut g = Graph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();

        let e_ab = g.add_edge(a, b, 1.0);
        let e_bc = g.add_edge(b, c, 2.0);

        assert_eq!(g.number_of_nodes(), 3);
        assert_eq!(g.number_of_edges(), 2);
        assert_eq!(g.uv(e_ab), (a, b));
        assert_eq!(g.uv(e_bc), (b, c));
        assert_eq!(g.degree(b), 2);
    }

    #[test]
    fn add_duplicate_edge_updates_weight_not_count() {
        let mut g = Graph::new();
        let a = g.add_node();
        let b = g.add_node();

        let e1 = g.add_edge(a, b, 2.0);
        let e2 = g.add_edge(b, a, 1.0);

        assert_eq!(e1, e2);
        assert_eq!(g.number_of_edges(), 1);
        assert_eq!(g.edge(e1).weight, 1.0);
    }

    #[test]
    fn endpoints_are_ordered() {
        let mut g = Graph::new();
        let a = g.add_node();
        let b = g.add_node();
        let e = g.add_edge(b, a, 1.0);
        let (u, v) = g.uv(e);
        assert!(u < v);
    }

    #[test]
    #[should_panic]
    fn self_loop_panics() {
        let mut g = Graph::new();
        let a = g.add_node();
        g.add_edge(a, a, 1.0);
    }

    #[test]
    fn from_edges_builds_expected_shape() {
        let g = Graph::from_edges(4, vec![(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0)]);
        assert_eq!(g.number_of_nodes(), 4);
        assert_eq!(g.number_of_edges(), 3);
    }
}
