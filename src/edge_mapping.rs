//! Projects edge-indexed data across a node relabeling (§4.11).
//!
//! Grounded on `original_source/include/nifty/tools/edge_mapping.hxx`: given a graph's
//! `uv` list and a `node_labeling` (e.g. the output of [`crate::agglomerative`]'s
//! contraction order), builds the induced graph over the relabeled node set and a mapping
//! from old edge id to new edge id (or `None` for edges that became self-loops). The
//! reference computes this with a per-thread scratch map merged under a single lock;
//! since this crate's [`crate::graph::Graph`] already dedups parallel edges on insertion,
//! the same effect falls out of just rebuilding the graph through [`crate::graph::Graph::add_edge`].
use rayon::prelude::*;

use crate::graph::{EdgeIndex, Graph, NodeIndex};
use crate::merge_rules::MergeRule;

/// Maps edges of an original graph onto the edges of a graph relabeled by `node_labeling`.
pub struct EdgeMapping {
    new_graph: Graph,
    /// `old_to_new[old_edge] = Some(new_edge)`, or `None` if the edge became a self-loop.
    old_to_new: Vec<Option<EdgeIndex>>,
    new_edge_counts: Vec<u64>,
}

impl EdgeMapping {
    /// Builds the induced graph and edge mapping for `graph` under `node_labeling`
    /// (`node_labeling[old_node] = new_node`).
    pub fn new(graph: &Graph, node_labeling: &[NodeIndex]) -> EdgeMapping {
        let num_new_nodes = node_labeling.iter().map(|n| n.index()).max().map_or(0, |m| m + 1);
        let mut new_graph = Graph::with_capacity(num_new_nodes, graph.number_of_edges());
        if num_new_nodes > 0 {
            new_graph.add_nodes(num_new_nodes);
        }

        let mut old_to_new = Vec::with_capacity(graph.number_of_edges());
        let mut new_edge_counts = Vec::new();

        for edge in graph.edges() {
            let nu = node_labeling[edge.u.index()];
            let nv = node_labeling[edge.v.index()];
            if nu == nv {
                old_to_new.push(None);
                continue;
            }
            let new_edge = new_graph.add_edge(nu, nv, edge.weight);
            if new_edge.index() == new_edge_counts.len() {
                new_edge_counts.push(0);
            }
            new_edge_counts[new_edge.index()] += 1;
            old_to_new.push(Some(new_edge));
        }

        EdgeMapping {
            new_graph,
            old_to_new,
            new_edge_counts,
        }
    }

    pub fn new_graph(&self) -> &Graph {
        &self.new_graph
    }

    /// The new edge id `old_edge` maps to, or `None` if it collapsed into a self-loop.
    pub fn new_edge_id(&self, old_edge: EdgeIndex) -> Option<EdgeIndex> {
        self.old_to_new[old_edge.index()]
    }

    /// How many old edges were folded into `new_edge` (1 if no parallel edges collapsed).
    pub fn edge_count(&self, new_edge: EdgeIndex) -> u64 {
        self.new_edge_counts[new_edge.index()]
    }

    /// Projects per-edge values from the old edge space onto the new one, accumulating
    /// values that landed on the same new edge with `merge_rule`. `sizes` gives each old
    /// edge's weight for the accumulation (pass all-ones if the rule doesn't use it).
    pub fn map_edge_values(&self, values: &[f64], sizes: &[f64], merge_rule: MergeRule) -> Vec<f64> {
        let num_new_edges = self.new_graph.number_of_edges();
        let mut acc: Vec<Option<(f64, f64)>> = vec![None; num_new_edges];

        for (old_edge_idx, mapped) in self.old_to_new.iter().enumerate() {
            let Some(new_edge) = mapped else { continue };
            let entry = &mut acc[new_edge.index()];
            let contribution = (values[old_edge_idx], sizes[old_edge_idx]);
            *entry = Some(match entry {
                None => contribution,
                Some(existing) => merge_rule.merge(*existing, contribution),
            });
        }

        acc.into_iter().map(|e| e.map(|(v, _)| v).unwrap_or(0.0)).collect()
    }

    /// Rayon-parallel variant of [`EdgeMapping::map_edge_values`] for large edge sets:
    /// folds per-worker partial accumulators before merging, mirroring the reference's
    /// per-thread-scratch-then-serial-fold shape.
    pub fn map_edge_values_parallel(&self, values: &[f64], sizes: &[f64], merge_rule: MergeRule) -> Vec<f64> {
        let num_new_edges = self.new_graph.number_of_edges();
        let chunk_results: Vec<Vec<Option<(f64, f64)>>> = self
            .old_to_new
            .par_iter()
            .enumerate()
            .fold(
                || vec![None; num_new_edges],
                |mut local: Vec<Option<(f64, f64)>>, (old_edge_idx, mapped)| {
                    if let Some(new_edge) = mapped {
                        let contribution = (values[old_edge_idx], sizes[old_edge_idx]);
                        let entry = &mut local[new_edge.index()];
                        *entry = Some(match entry {
                            None => contribution,
                            Some(existing) => merge_rule.merge(*existing, contribution),
                        });
                    }
                    local
                },
            )
            .collect();

        let mut acc: Vec<Option<(f64, f64)>> = vec![None; num_new_edges];
        for local in chunk_results {
            for (i, v) in local.into_iter().enumerate() {
                if let Some(contribution) = v {
                    acc[i] = Some(match acc[i] {
                        None => contribution,
                        Some(existing) => merge_rule.merge(existing, contribution),
                    });
                }
            }
        }
        acc.into_iter().map(|e| e.map(|(v, _)| v).unwrap_or(0.0)).collect()
    }

    /// List of new edge ids actually produced by the mapping, in id order.
    pub fn new_edge_ids(&self) -> Vec<EdgeIndex> {
        (0..self.new_graph.number_of_edges()).map(EdgeIndex::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node_index;

    fn path_graph() -> Graph {
        Graph::from_edges(4, vec![(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0)])
    }

    #[test]
    fn collapses_self_loops_under_relabeling() {
        let g = path_graph();
        // merge nodes 0 and 1 into the same new node 0; 2 -> 1, 3 -> 2
        let labeling = vec![node_index(0), node_index(0), node_index(1), node_index(2)];
        let mapping = EdgeMapping::new(&g, &labeling);

        assert_eq!(mapping.new_edge_id(crate::graph::edge_index(0)), None);
        assert!(mapping.new_edge_id(crate::graph::edge_index(1)).is_some());
        assert!(mapping.new_edge_id(crate::graph::edge_index(2)).is_some());
        assert_eq!(mapping.new_graph().number_of_edges(), 2);
    }

    #[test]
    fn parallel_edges_are_merged_by_rule() {
        // Graph where two old edges map onto the same new edge after relabeling.
        let mut g = Graph::new();
        let a = g.add_node();
        let b = g.add_node();
        let c = g.add_node();
        let d = g.add_node();
        let e0 = g.add_edge(a, b, 1.0);
        let e1 = g.add_edge(c, d, 3.0);

        // a,c -> new node 0; b,d -> new node 1: both old edges map onto the same new edge.
        let labeling = vec![node_index(0), node_index(1), node_index(0), node_index(1)];
        let mapping = EdgeMapping::new(&g, &labeling);
        assert_eq!(mapping.new_graph().number_of_edges(), 1);
        assert_eq!(mapping.new_edge_id(e0), mapping.new_edge_id(e1));

        let values = vec![1.0, 3.0];
        let sizes = vec![1.0, 1.0];
        let mapped = mapping.map_edge_values(&values, &sizes, MergeRule::Max);
        assert_eq!(mapped[mapping.new_edge_id(e0).unwrap().index()], 3.0);
    }
}
