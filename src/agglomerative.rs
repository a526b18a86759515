//! The agglomerative clustering driver: repeatedly asks a [`ClusterPolicy`] for the next
//! edge to contract until it declares itself done. Grounded on `node_contraction.rs`'s
//! `run_with_strategy` main loop shape and its `indicatif` progress-bar usage.
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::cluster_policy::ClusterPolicy;
use crate::contraction_graph::EdgeContractionGraph;
use crate::error::Result;
use crate::graph::{EdgeIndex, Graph, NodeIndex};

pub struct AgglomerativeClustering<'g> {
    ecg: EdgeContractionGraph<'g>,
    contracted_order: Vec<EdgeIndex>,
    show_progress: bool,
}

impl<'g> AgglomerativeClustering<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        AgglomerativeClustering {
            ecg: EdgeContractionGraph::new(graph),
            contracted_order: Vec::new(),
            show_progress: true,
        }
    }

    pub fn with_ucm(graph: &'g Graph, ultrametric_contour_map: bool) -> Self {
        AgglomerativeClustering {
            ecg: EdgeContractionGraph::with_ucm(graph, ultrametric_contour_map),
            contracted_order: Vec::new(),
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Runs `policy` to completion, contracting edges until `policy.is_done()`.
    pub fn run(&mut self, policy: &mut dyn ClusterPolicy) -> Result<()> {
        let start_nodes = self.ecg.number_of_nodes();
        let bar = if self.show_progress {
            let pb = ProgressBar::new(start_nodes as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} nodes remaining",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            Some(pb)
        } else {
            None
        };

        let mut last_reported = start_nodes;
        let step = (start_nodes / 20).max(1);

        while !policy.is_done(&mut self.ecg) {
            let Some((e, _priority)) = policy.edge_to_contract_next(&mut self.ecg) else {
                break;
            };
            match self.ecg.contract_edge(policy, e) {
                Ok(()) => {
                    self.contracted_order.push(e);
                }
                Err(_) => {
                    // The policy handed back a now-stale edge; skip it and let the next
                    // `is_done`/`edge_to_contract_next` pair revalidate its own state.
                    continue;
                }
            }

            if last_reported - self.ecg.number_of_nodes() >= step {
                last_reported = self.ecg.number_of_nodes();
                if let Some(pb) = &bar {
                    pb.set_position((start_nodes - last_reported) as u64);
                }
                info!(
                    "agglomerative clustering: {} nodes remaining",
                    self.ecg.number_of_nodes()
                );
            }
        }

        if let Some(pb) = bar {
            pb.finish_with_message("clustering complete");
        }
        Ok(())
    }

    /// The final representative of `node`.
    pub fn find(&mut self, node: NodeIndex) -> NodeIndex {
        self.ecg.find(node)
    }

    /// The sequence of edges contracted, in contraction order.
    pub fn contraction_order(&self) -> &[EdgeIndex] {
        &self.contracted_order
    }

    pub fn ecg(&self) -> &EdgeContractionGraph<'g> {
        &self.ecg
    }

    /// Builds the final dense node-to-representative labeling.
    pub fn node_labeling(&mut self) -> Vec<NodeIndex> {
        let n = self.ecg.base_graph().number_of_nodes();
        (0..n).map(|i| self.ecg.find(NodeIndex::new(i))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::EdgeWeightedPolicy;
    use crate::merge_rules::MergeRule;
    use crate::settings::ClusterPolicySettings;

    #[test]
    fn clustering_is_monotone_and_terminates() {
        // 3x3 grid, edge weight = edge index, max-priority merge rule, stop at 1 node.
        let mut edges = Vec::new();
        let idx = |x: usize, y: usize| y * 3 + x;
        let mut w = 0.0;
        for y in 0..3 {
            for x in 0..3 {
                if x + 1 < 3 {
                    edges.push((idx(x, y), idx(x + 1, y), w));
                    w += 1.0;
                }
                if y + 1 < 3 {
                    edges.push((idx(x, y), idx(x, y + 1), w));
                    w += 1.0;
                }
            }
        }
        let g = Graph::from_edges(9, edges.clone());
        let edge_values: Vec<f64> = (0..g.number_of_edges()).map(|i| edges[i].2).collect();
        let edge_sizes = vec![1.0; g.number_of_edges()];
        let node_sizes = vec![1.0; 9];

        let mut policy = EdgeWeightedPolicy::new(
            &g,
            edge_values,
            edge_sizes,
            node_sizes,
            MergeRule::Max,
            ClusterPolicySettings::new().stop_nodes(1),
        );

        let mut driver = AgglomerativeClustering::new(&g).with_progress(false);
        driver.run(&mut policy).unwrap();

        assert_eq!(driver.ecg().number_of_nodes(), 1);
        // 9 nodes collapsing to 1 takes exactly 8 contractions, regardless of how many
        // of the 12 grid edges existed to begin with.
        assert_eq!(driver.contraction_order().len(), 8);

        let labels = driver.node_labeling();
        let first = labels[0];
        assert!(labels.iter().all(|&l| l == first));
    }
}
