//! The edge contraction graph (ECG): maintains live nodes/edges under repeated contraction
//! and routes every mutation back to a [`crate::cluster_policy::ClusterPolicy`].
//!
//! Cyclic ownership between the graph and its policy (the source models this as mutual
//! references, with the policy templated on the graph type) is resolved here by never
//! letting the policy hold a reference to the graph at all: every policy callback takes
//! the graph as an explicit `&EdgeContractionGraph` parameter, so the graph's own mutable
//! methods and the policy's read-only queries never alias.
use log::debug;
use rustc_hash::FxHashMap;

use crate::cluster_policy::ClusterPolicy;
use crate::error::{Error, Result};
use crate::graph::{EdgeIndex, Graph, NodeIndex};
use crate::union_find::UnionFind;

pub struct EdgeContractionGraph<'g> {
    graph: &'g Graph,
    uf: UnionFind,
    alive_node: Vec<bool>,
    alive_edge: Vec<bool>,
    /// `adjacency[rep]`: for every currently-alive representative, its neighbor reps mapped
    /// to the surviving edge id between them.
    adjacency: Vec<FxHashMap<NodeIndex, EdgeIndex>>,
    num_alive_nodes: usize,
    num_alive_edges: usize,
    /// Populated only when `ultrametric_contour_map` is enabled: `(edge, priority)` in
    /// contraction order.
    ucm_ledger: Option<Vec<(EdgeIndex, f64)>>,
}

impl<'g> EdgeContractionGraph<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self::with_ucm(graph, false)
    }

    pub fn with_ucm(graph: &'g Graph, ultrametric_contour_map: bool) -> Self {
        let n = graph.number_of_nodes();
        let m = graph.number_of_edges();
        let mut adjacency = vec![FxHashMap::default(); n];
        for node in 0..n {
            let node_idx = NodeIndex::new(node);
            for (neighbor, e) in graph.neighbors(node_idx) {
                adjacency[node].insert(neighbor, e);
            }
        }
        EdgeContractionGraph {
            graph,
            uf: UnionFind::new(n),
            alive_node: vec![true; n],
            alive_edge: vec![true; m],
            adjacency,
            num_alive_nodes: n,
            num_alive_edges: m,
            ucm_ledger: if ultrametric_contour_map {
                Some(Vec::new())
            } else {
                None
            },
        }
    }

    pub fn base_graph(&self) -> &Graph {
        self.graph
    }

    pub fn number_of_nodes(&self) -> usize {
        self.num_alive_nodes
    }

    pub fn number_of_edges(&self) -> usize {
        self.num_alive_edges
    }

    pub fn is_edge_alive(&self, e: EdgeIndex) -> bool {
        self.alive_edge[e.index()]
    }

    pub fn is_node_alive(&self, n: NodeIndex) -> bool {
        self.alive_node[n.index()]
    }

    /// Finds the current representative of `node`, compressing the union-find path as it goes.
    pub fn find(&mut self, node: NodeIndex) -> NodeIndex {
        NodeIndex::new(self.uf.find(node.index()))
    }

    /// Returns the current representatives of `e`'s endpoints.
    pub fn uv(&mut self, e: EdgeIndex) -> (NodeIndex, NodeIndex) {
        let (u, v) = self.graph.uv(e);
        (self.find(u), self.find(v))
    }

    pub fn ucm_ledger(&self) -> Option<&[(EdgeIndex, f64)]> {
        self.ucm_ledger.as_deref()
    }

    /// Returns the neighbor reps and connecting edge ids of a currently-alive `rep`.
    pub fn neighbors(&self, rep: NodeIndex) -> impl Iterator<Item = (NodeIndex, EdgeIndex)> + '_ {
        self.adjacency[rep.index()].iter().map(|(&n, &e)| (n, e))
    }

    /// Contracts edge `e`: merges its endpoints' representatives and routes every resulting
    /// mutation through `policy`'s callbacks. See module docs for the ownership resolution.
    ///
    /// Errors with [`Error::PrecondViolation`] if `e`'s endpoints already share a
    /// representative (a stale edge, e.g. one a policy popped from its own queue before
    /// lazily discarding it); callers should treat this as "skip and continue", never fatal.
    pub fn contract_edge(&mut self, policy: &mut dyn ClusterPolicy, e: EdgeIndex) -> Result<()> {
        let (ru, rv) = self.uv(e);
        if ru == rv {
            return Err(Error::PrecondViolation(format!(
                "cannot contract edge {:?}: endpoints already share representative {:?}",
                e, ru
            )));
        }
        debug!("contracting edge {:?} ({:?} -- {:?})", e, ru, rv);

        if let Some(ledger) = &mut self.ucm_ledger {
            if let Some(p) = policy.priority_of(self, e) {
                ledger.push((e, p));
            }
        }

        policy.contract_edge(self, e);

        let survivor_idx = self.uf.link(ru.index(), rv.index());
        let (a, d) = if survivor_idx == ru.index() {
            (ru, rv)
        } else {
            (rv, ru)
        };

        policy.merge_nodes(self, a, d);

        let neighbors_of_d: Vec<(NodeIndex, EdgeIndex)> = self.adjacency[d.index()]
            .iter()
            .map(|(&n, &eid)| (n, eid))
            .collect();

        for (n, e_prime) in neighbors_of_d {
            if n == a {
                // d and a were already neighbors via e_prime; that edge becomes a self-loop
                // and is simply dropped without a merge_edges callback (nothing survives it).
                self.alive_edge[e_prime.index()] = false;
                self.num_alive_edges -= 1;
                continue;
            }
            let existing = self.adjacency[a.index()].get(&n).copied();
            match existing {
                Some(e_existing) => {
                    let (alive, dead) = if e_existing.index() <= e_prime.index() {
                        (e_existing, e_prime)
                    } else {
                        (e_prime, e_existing)
                    };
                    policy.merge_edges(self, alive, dead);
                    self.alive_edge[dead.index()] = false;
                    self.num_alive_edges -= 1;
                    self.adjacency[a.index()].insert(n, alive);
                    self.adjacency[n.index()].insert(a, alive);
                }
                None => {
                    self.adjacency[a.index()].insert(n, e_prime);
                    self.adjacency[n.index()].insert(a, e_prime);
                }
            }
            self.adjacency[n.index()].remove(&d);
        }

        self.adjacency[d.index()].clear();
        self.adjacency[a.index()].remove(&d);
        self.alive_node[d.index()] = false;
        self.alive_edge[e.index()] = false;
        self.num_alive_nodes -= 1;
        self.num_alive_edges -= 1;

        policy.contract_edge_done(self, e);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster_policy::NullPolicy;

    #[test]
    fn contracting_collapses_parallel_edges() {
        // Triangle 0-1-2: contracting (0,1) must merge the two remaining edges
        // (0,2) and (1,2) into a single surviving edge incident on the merged node.
        let g = Graph::from_edges(3, vec![(0, 1, 1.0), (0, 2, 2.0), (1, 2, 3.0)]);
        let mut ecg = EdgeContractionGraph::new(&g);
        let mut policy = NullPolicy;

        ecg.contract_edge(&mut policy, EdgeIndex::new(0)).unwrap();

        assert_eq!(ecg.number_of_nodes(), 2);
        assert_eq!(ecg.number_of_edges(), 1);
    }

    #[test]
    fn contracting_stale_edge_errors() {
        let g = Graph::from_edges(3, vec![(0, 1, 1.0), (1, 2, 1.0)]);
        let mut ecg = EdgeContractionGraph::new(&g);
        let mut policy = NullPolicy;
        ecg.contract_edge(&mut policy, EdgeIndex::new(0)).unwrap();
        // After contracting (0,1), edge 0 is now a self-loop on its own representative.
        assert!(ecg.contract_edge(&mut policy, EdgeIndex::new(0)).is_err());
    }

    #[test]
    fn node_count_is_non_increasing() {
        let g = Graph::from_edges(4, vec![(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)]);
        let mut ecg = EdgeContractionGraph::new(&g);
        let mut policy = NullPolicy;
        let mut prev = ecg.number_of_nodes();
        for e in [0, 1, 2] {
            ecg.contract_edge(&mut policy, EdgeIndex::new(e)).unwrap();
            assert!(ecg.number_of_nodes() <= prev);
            prev = ecg.number_of_nodes();
        }
        assert_eq!(ecg.number_of_nodes(), 1);
    }
}
