//! The simplest cluster policy: a single scalar `edge_value`/`edge_size` pair per edge,
//! contracted greedily in priority order. Priority is lazily revalidated on every peek
//! at the queue's top, rather than eagerly recomputed for every neighbor of a merged node
//! — any edge whose priority has drifted out of date (because a neighboring node's size
//! changed, or because the size-regularizer threshold was crossed) is caught the next time
//! it would be popped, not before.
use crate::cluster_policy::ClusterPolicy;
use crate::contraction_graph::EdgeContractionGraph;
use crate::graph::{EdgeIndex, Graph, NodeIndex};
use crate::merge_rules::MergeRule;
use crate::priority_queue::{IndexedPriorityQueue, Mode};
use crate::settings::ClusterPolicySettings;

pub struct EdgeWeightedPolicy {
    edge_value: Vec<f64>,
    edge_size: Vec<f64>,
    node_size: Vec<f64>,
    pq: IndexedPriorityQueue,
    merge_rule: MergeRule,
    settings: ClusterPolicySettings,
}

impl EdgeWeightedPolicy {
    pub fn new(
        graph: &Graph,
        edge_values: Vec<f64>,
        edge_sizes: Vec<f64>,
        node_sizes: Vec<f64>,
        merge_rule: MergeRule,
        settings: ClusterPolicySettings,
    ) -> Self {
        let m = graph.number_of_edges();
        assert_eq!(edge_values.len(), m);
        assert_eq!(edge_sizes.len(), m);
        assert_eq!(node_sizes.len(), graph.number_of_nodes());

        let mut policy = EdgeWeightedPolicy {
            edge_value: edge_values,
            edge_size: edge_sizes,
            node_size: node_sizes,
            pq: IndexedPriorityQueue::with_capacity(Mode::Max, m),
            merge_rule,
            settings,
        };

        for e in 0..m {
            let (u, v) = graph.uv(EdgeIndex::new(e));
            let p = policy.compute_priority(e, u.index(), v.index());
            policy.pq.push(e as u64, p).expect("initial priority is never NaN");
        }
        policy
    }

    fn compute_priority(&self, e: usize, rep_u: usize, rep_v: usize) -> f64 {
        if self.node_size[rep_u] >= self.settings.size_thresh_max
            || self.node_size[rep_v] >= self.settings.size_thresh_max
        {
            return f64::NEG_INFINITY;
        }
        let mut p = self.edge_value[e];
        if self.settings.size_regularizer > 0.0 && self.settings.size_thresh_max.is_finite() {
            let combined_size = self.node_size[rep_u] + self.node_size[rep_v];
            let reg = 1.0 - self.settings.size_regularizer * combined_size / self.settings.size_thresh_max;
            p *= reg.max(0.0);
        }
        p
    }

    /// Pops (and discards) any stale entries at the top of the queue — self-loops, or
    /// entries whose recomputed priority no longer matches what's stored — until the top
    /// is either valid or the queue is empty.
    fn revalidate_top(&mut self, ecg: &mut EdgeContractionGraph) {
        loop {
            let Some((eid, stored_priority)) = self.pq.top() else {
                return;
            };
            let e = EdgeIndex::new(eid as usize);
            if !ecg.is_edge_alive(e) {
                self.pq.delete(eid);
                continue;
            }
            let (ru, rv) = ecg.uv(e);
            if ru == rv {
                self.pq.delete(eid);
                continue;
            }
            let actual = self.compute_priority(eid as usize, ru.index(), rv.index());
            if (actual - stored_priority).abs() > 1e-12 {
                self.pq.push(eid, actual).expect("recomputed priority is never NaN");
                continue;
            }
            return;
        }
    }
}

impl ClusterPolicy for EdgeWeightedPolicy {
    fn edge_to_contract_next(
        &mut self,
        ecg: &mut EdgeContractionGraph,
    ) -> Option<(EdgeIndex, f64)> {
        self.revalidate_top(ecg);
        self.pq.pop().map(|(id, p)| (EdgeIndex::new(id as usize), p))
    }

    fn is_done(&mut self, ecg: &mut EdgeContractionGraph) -> bool {
        self.revalidate_top(ecg);
        ecg.number_of_nodes() <= self.settings.stop_nodes
            || self.pq.is_empty()
            || self.pq.top_priority().unwrap_or(f64::NEG_INFINITY) < self.settings.stop_priority
    }

    fn contract_edge(&mut self, _ecg: &EdgeContractionGraph, e: EdgeIndex) {
        self.pq.delete(e.index() as u64);
    }

    fn merge_nodes(&mut self, _ecg: &EdgeContractionGraph, a: NodeIndex, d: NodeIndex) {
        self.node_size[a.index()] += self.node_size[d.index()];
    }

    fn merge_edges(&mut self, _ecg: &EdgeContractionGraph, alive: EdgeIndex, dead: EdgeIndex) {
        let (value, size) = self.merge_rule.merge(
            (self.edge_value[alive.index()], self.edge_size[alive.index()]),
            (self.edge_value[dead.index()], self.edge_size[dead.index()]),
        );
        self.edge_value[alive.index()] = value;
        self.edge_size[alive.index()] = size;
        self.pq.delete(dead.index() as u64);

        // The priority for `alive` is fully recomputed lazily the next time it reaches
        // the top of the queue (see `revalidate_top`); push it back with its raw value
        // so it stays discoverable in the meantime.
        let p = self.edge_value[alive.index()];
        self.pq
            .push(alive.index() as u64, p)
            .expect("merged priority is never NaN");
    }

    fn contract_edge_done(&mut self, _ecg: &EdgeContractionGraph, _e: EdgeIndex) {}

    fn priority_of(&self, _ecg: &EdgeContractionGraph, e: EdgeIndex) -> Option<f64> {
        self.pq.priority_of(e.index() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster_policy::ClusterPolicy;

    #[test]
    fn picks_highest_value_edge_first() {
        let g = Graph::from_edges(3, vec![(0, 1, 1.0), (1, 2, 5.0)]);
        let node_sizes = vec![1.0; 3];
        let edge_sizes = vec![1.0; 2];
        let edge_values = vec![1.0, 5.0];
        let mut policy = EdgeWeightedPolicy::new(
            &g,
            edge_values,
            edge_sizes,
            node_sizes,
            MergeRule::ArithmeticMean,
            ClusterPolicySettings::new().stop_nodes(1),
        );
        let mut ecg = EdgeContractionGraph::new(&g);
        let (e, p) = policy.edge_to_contract_next(&mut ecg).unwrap();
        assert_eq!(e, EdgeIndex::new(1));
        assert_eq!(p, 5.0);
    }
}
