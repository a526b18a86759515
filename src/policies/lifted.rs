//! Two policies over graphs carrying a per-edge `is_lifted` flag (edges connecting
//! non-lattice-adjacent nodes): `LiftedEdgeWeightedPolicy` treats lifted edges purely as
//! statistics carriers via a per-edge histogram, and `LiftedAggloPolicy` additionally
//! tracks non-link ("mutex") constraints the same way the GASP policy does.
use crate::cluster_policy::ClusterPolicy;
use crate::contraction_graph::EdgeContractionGraph;
use crate::graph::{EdgeIndex, Graph, NodeIndex};
use crate::histogram::Histogram;
use crate::merge_rules::MergeRule;
use crate::mutex::MutexSets;
use crate::priority_queue::{IndexedPriorityQueue, Mode};
use crate::settings::ClusterPolicySettings;

/// Average-linkage-style policy: priority is the configured quantile of a per-edge
/// histogram of observed values, so the *least* dissimilar local edge is always merged
/// next. Lifted edges are given `+inf` priority, which (in this policy's min-heap) means
/// they are never chosen, only ever contributing their histogram on a neighboring merge.
pub struct LiftedEdgeWeightedPolicy {
    histograms: Vec<Histogram>,
    is_lifted: Vec<bool>,
    pq: IndexedPriorityQueue,
    quantile: f64,
    stop_nodes: usize,
    stop_priority: f64,
}

impl LiftedEdgeWeightedPolicy {
    pub fn new(
        graph: &Graph,
        initial_values: Vec<f64>,
        is_lifted: Vec<bool>,
        min_val: f64,
        max_val: f64,
        num_bins: usize,
        quantile: f64,
        stop_nodes: usize,
        stop_priority: f64,
    ) -> Self {
        let m = graph.number_of_edges();
        assert_eq!(initial_values.len(), m);
        assert_eq!(is_lifted.len(), m);

        let mut histograms = Vec::with_capacity(m);
        for &v in &initial_values {
            let mut h = Histogram::new(min_val, max_val, num_bins);
            h.insert(v, 1.0);
            histograms.push(h);
        }

        let mut policy = LiftedEdgeWeightedPolicy {
            histograms,
            is_lifted,
            pq: IndexedPriorityQueue::with_capacity(Mode::Min, m),
            quantile,
            stop_nodes,
            stop_priority,
        };
        for e in 0..m {
            let p = policy.priority(e);
            policy.pq.push(e as u64, p).expect("initial priority is never NaN");
        }
        policy
    }

    fn priority(&self, e: usize) -> f64 {
        if self.is_lifted[e] {
            f64::INFINITY
        } else {
            self.histograms[e].quantile(self.quantile)
        }
    }

    fn revalidate_top(&mut self, ecg: &mut EdgeContractionGraph) {
        loop {
            let Some((eid, _)) = self.pq.top() else { return };
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
            return;
        }
    }
}

impl ClusterPolicy for LiftedEdgeWeightedPolicy {
    fn edge_to_contract_next(
        &mut self,
        ecg: &mut EdgeContractionGraph,
    ) -> Option<(EdgeIndex, f64)> {
        self.revalidate_top(ecg);
        self.pq.pop().map(|(id, p)| (EdgeIndex::new(id as usize), p))
    }

    fn is_done(&mut self, ecg: &mut EdgeContractionGraph) -> bool {
        self.revalidate_top(ecg);
        ecg.number_of_nodes() <= self.stop_nodes
            || self.pq.is_empty()
            || self.pq.top_priority().unwrap_or(f64::INFINITY) > self.stop_priority
    }

    fn contract_edge(&mut self, _ecg: &EdgeContractionGraph, e: EdgeIndex) {
        self.pq.delete(e.index() as u64);
    }

    fn merge_nodes(&mut self, _ecg: &EdgeContractionGraph, _a: NodeIndex, _d: NodeIndex) {}

    fn merge_edges(&mut self, _ecg: &EdgeContractionGraph, alive: EdgeIndex, dead: EdgeIndex) {
        let dead_hist = self.histograms[dead.index()].clone();
        self.histograms[alive.index()].merge(&dead_hist);
        self.is_lifted[alive.index()] = self.is_lifted[alive.index()] && self.is_lifted[dead.index()];
        self.pq.delete(dead.index() as u64);
        let p = self.priority(alive.index());
        self.pq.push(alive.index() as u64, p).expect("merged priority is never NaN");
    }

    fn contract_edge_done(&mut self, _ecg: &EdgeContractionGraph, _e: EdgeIndex) {}

    fn priority_of(&self, _ecg: &EdgeContractionGraph, e: EdgeIndex) -> Option<f64> {
        self.pq.priority_of(e.index() as u64)
    }
}

/// Lifted variant of the GASP policy: separate merge/not-merge accumulators plus an
/// `is_merge_edge` flag, with priority penalized by how many non-link constraints are
/// already registered on either endpoint. Non-link bookkeeping reuses [`MutexSets`]
/// directly rather than a separate structure (see DESIGN.md's open-question decision).
pub struct LiftedAggloPolicy {
    merge_value: Vec<f64>,
    merge_size: Vec<f64>,
    not_merge_value: Vec<f64>,
    not_merge_size: Vec<f64>,
    is_merge_edge: Vec<bool>,
    mutexes: MutexSets,
    pq: IndexedPriorityQueue,
    merge_rule_0: MergeRule,
    merge_rule_1: MergeRule,
    settings: ClusterPolicySettings,
}

const NON_LINK_PENALTY: f64 = 0.1;

impl LiftedAggloPolicy {
    pub fn new(
        graph: &Graph,
        merge_value: Vec<f64>,
        not_merge_value: Vec<f64>,
        is_merge_edge: Vec<bool>,
        settings: ClusterPolicySettings,
    ) -> Self {
        let m = graph.number_of_edges();
        let n = graph.number_of_nodes();
        assert_eq!(merge_value.len(), m);
        assert_eq!(not_merge_value.len(), m);
        assert_eq!(is_merge_edge.len(), m);

        let merge_rule_0 = settings.merge_rule_0.clone();
        let merge_rule_1 = settings.merge_rule_1.clone();

        let mut policy = LiftedAggloPolicy {
            merge_value,
            merge_size: vec![1.0; m],
            not_merge_value,
            not_merge_size: vec![1.0; m],
            is_merge_edge,
            mutexes: MutexSets::new(n),
            pq: IndexedPriorityQueue::with_capacity(Mode::Max, m),
            merge_rule_0,
            merge_rule_1,
            settings,
        };
        for e in 0..m {
            let p = policy.base_priority(e);
            policy.pq.push(e as u64, p).expect("initial priority is never NaN");
        }
        policy
    }

    fn base_priority(&self, e: usize) -> f64 {
        if !self.is_merge_edge[e] {
            return f64::NEG_INFINITY;
        }
        0.5 * (self.merge_value[e] + (1.0 - self.not_merge_value[e]))
    }

    fn penalized_priority(&self, e: usize, rep_u: usize, rep_v: usize) -> f64 {
        let base = self.base_priority(e);
        if base == f64::NEG_INFINITY {
            return base;
        }
        let penalty = NON_LINK_PENALTY
            * (self.mutexes.len_of(rep_u as u64) + self.mutexes.len_of(rep_v as u64)) as f64;
        base - penalty
    }

    fn revalidate_top(&mut self, ecg: &mut EdgeContractionGraph) {
        loop {
            let Some((eid, stored)) = self.pq.top() else { return };
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
            if self.mutexes.check_mutex(ru.index() as u64, rv.index() as u64) {
                self.pq.delete(eid);
                self.mutexes.insert_mutex(ru.index() as u64, rv.index() as u64);
                continue;
            }
            let actual = self.penalized_priority(eid as usize, ru.index(), rv.index());
            if (actual - stored).abs() > 1e-12 {
                self.pq.push(eid, actual).expect("recomputed priority is never NaN");
                continue;
            }
            return;
        }
    }
}

impl ClusterPolicy for LiftedAggloPolicy {
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
            || self.pq.top_priority().unwrap_or(f64::NEG_INFINITY) < self.settings.threshold
    }

    fn contract_edge(&mut self, _ecg: &EdgeContractionGraph, e: EdgeIndex) {
        self.pq.delete(e.index() as u64);
    }

    fn merge_nodes(&mut self, _ecg: &EdgeContractionGraph, a: NodeIndex, d: NodeIndex) {
        if self.mutexes.len_of(d.index() as u64) > 0 {
            self.mutexes.merge_mutexes(d.index() as u64, a.index() as u64);
        }
    }

    fn merge_edges(&mut self, _ecg: &EdgeContractionGraph, alive: EdgeIndex, dead: EdgeIndex) {
        let a = alive.index();
        let d = dead.index();
        let (mv, ms) = self
            .merge_rule_0
            .merge((self.merge_value[a], self.merge_size[a]), (self.merge_value[d], self.merge_size[d]));
        let (nv, ns) = self.merge_rule_1.merge(
            (self.not_merge_value[a], self.not_merge_size[a]),
            (self.not_merge_value[d], self.not_merge_size[d]),
        );
        self.merge_value[a] = mv;
        self.merge_size[a] = ms;
        self.not_merge_value[a] = nv;
        self.not_merge_size[a] = ns;
        self.is_merge_edge[a] = self.is_merge_edge[a] || self.is_merge_edge[d];
        self.pq.delete(d as u64);
        let p = self.base_priority(a);
        self.pq.push(a as u64, p).expect("merged priority is never NaN");
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
    fn lifted_edge_is_never_chosen_in_min_heap() {
        let g = Graph::from_edges(3, vec![(0, 1, 0.0), (0, 2, 0.0)]);
        let values = vec![0.3, 0.9];
        let is_lifted = vec![false, true];
        let mut policy = LiftedEdgeWeightedPolicy::new(
            &g, values, is_lifted, 0.0, 1.0, 20, 0.5, 1, f64::INFINITY,
        );
        let mut ecg = EdgeContractionGraph::new(&g);
        let (e, _) = policy.edge_to_contract_next(&mut ecg).unwrap();
        assert_eq!(e, EdgeIndex::new(0));
    }
}
