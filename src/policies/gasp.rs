//! GASP / probabilistic cluster policy: every edge carries an attractive accumulator
//! (`acc0`, "how much evidence favors merging") and a repulsive one (`acc1`, "how much
//! favors not merging"), plus a flag marking whether it is a local (lattice) edge at all —
//! non-local (lifted) edges only ever contribute statistics. Endpoints that get blocked by
//! a repulsive edge are recorded in a per-node mutex set and never merged afterwards.
use crate::cluster_policy::ClusterPolicy;
use crate::contraction_graph::EdgeContractionGraph;
use crate::graph::{EdgeIndex, Graph, NodeIndex};
use crate::merge_rules::MergeRule;
use crate::mutex::MutexSets;
use crate::priority_queue::{IndexedPriorityQueue, Mode};
use crate::settings::ClusterPolicySettings;

pub struct GaspPolicy {
    acc0: Vec<f64>,
    acc0_size: Vec<f64>,
    acc1: Vec<f64>,
    acc1_size: Vec<f64>,
    is_local_edge: Vec<bool>,
    mutexes: MutexSets,
    pq: IndexedPriorityQueue,
    merge_rule_0: MergeRule,
    merge_rule_1: MergeRule,
    settings: ClusterPolicySettings,
}

impl GaspPolicy {
    pub fn new(
        graph: &Graph,
        acc0: Vec<f64>,
        acc1: Vec<f64>,
        is_local_edge: Vec<bool>,
        settings: ClusterPolicySettings,
    ) -> Self {
        let m = graph.number_of_edges();
        let n = graph.number_of_nodes();
        assert_eq!(acc0.len(), m);
        assert_eq!(acc1.len(), m);
        assert_eq!(is_local_edge.len(), m);

        let merge_rule_0 = settings.merge_rule_0.clone();
        let merge_rule_1 = settings.merge_rule_1.clone();

        let mut policy = GaspPolicy {
            acc0,
            acc0_size: vec![1.0; m],
            acc1,
            acc1_size: vec![1.0; m],
            is_local_edge,
            mutexes: MutexSets::new(n),
            pq: IndexedPriorityQueue::with_capacity(Mode::Max, m),
            merge_rule_0,
            merge_rule_1,
            settings,
        };

        for e in 0..m {
            let p = policy.priority(e);
            policy.pq.push(e as u64, p).expect("initial priority is never NaN");
        }
        policy
    }

    fn priority(&self, e: usize) -> f64 {
        if !self.is_local_edge[e] {
            return f64::NEG_INFINITY;
        }
        0.5 * (self.acc0[e] + (1.0 - self.acc1[e]))
    }

    /// Lazily pops self-loops and mutex-forbidden edges from the top of the queue,
    /// registering a mutex constraint for every forbidden edge encountered, until the top
    /// is either contractable or the queue is empty.
    fn revalidate_top(&mut self, ecg: &mut EdgeContractionGraph) {
        loop {
            let Some((eid, _)) = self.pq.top() else {
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
            if self.mutexes.check_mutex(ru.index() as u64, rv.index() as u64) {
                self.pq.delete(eid);
                self.mutexes.insert_mutex(ru.index() as u64, rv.index() as u64);
                continue;
            }
            return;
        }
    }
}

impl ClusterPolicy for GaspPolicy {
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

        let zero_init_override = self.settings.zero_init && self.is_local_edge[a] != self.is_local_edge[d];

        if zero_init_override && !self.is_local_edge[a] {
            // `alive` was a pure statistics carrier with no observations yet; adopt `dead`'s.
            self.acc0[a] = self.acc0[d];
            self.acc0_size[a] = self.acc0_size[d];
            self.acc1[a] = self.acc1[d];
            self.acc1_size[a] = self.acc1_size[d];
        } else {
            let (v0, s0) = self
                .merge_rule_0
                .merge((self.acc0[a], self.acc0_size[a]), (self.acc0[d], self.acc0_size[d]));
            let (v1, s1) = self
                .merge_rule_1
                .merge((self.acc1[a], self.acc1_size[a]), (self.acc1[d], self.acc1_size[d]));
            self.acc0[a] = v0;
            self.acc0_size[a] = s0;
            self.acc1[a] = v1;
            self.acc1_size[a] = s1;
        }

        self.is_local_edge[a] = self.is_local_edge[a] || self.is_local_edge[d];
        self.pq.delete(d as u64);
        let p = self.priority(a);
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
    fn highest_attractive_lowest_repulsive_wins_first() {
        // 4 nodes: attractive (0-1, 0.9), (2-3, 0.9), (1-2, 0.8) with some repulsion.
        let g = Graph::from_edges(4, vec![(0, 1, 0.0), (2, 3, 0.0), (1, 2, 0.0)]);
        let acc0 = vec![0.9, 0.9, 0.8];
        let acc1 = vec![0.0, 0.0, 1.0];
        let is_local = vec![true, true, true];
        let mut policy = GaspPolicy::new(
            &g,
            acc0,
            acc1,
            is_local,
            ClusterPolicySettings::new().stop_nodes(1).threshold(f64::NEG_INFINITY),
        );
        let mut ecg = EdgeContractionGraph::new(&g);

        // (0-1) and (2-3) both score 0.95, (1-2) scores 0.4; lower id wins the tie.
        let (e, p) = policy.edge_to_contract_next(&mut ecg).unwrap();
        assert_eq!(e, EdgeIndex::new(0));
        assert!((p - 0.95).abs() < 1e-9);
    }

    #[test]
    fn mutex_conflict_is_respected_once_registered() {
        let g = Graph::from_edges(4, vec![(0, 1, 0.0), (2, 3, 0.0), (1, 2, 0.0)]);
        let acc0 = vec![0.9, 0.9, 0.8];
        let acc1 = vec![0.0, 0.0, 1.0];
        let is_local = vec![true, true, true];
        let mut policy = GaspPolicy::new(
            &g,
            acc0,
            acc1,
            is_local,
            ClusterPolicySettings::new().stop_nodes(1).threshold(f64::NEG_INFINITY),
        );
        let mut ecg = EdgeContractionGraph::new(&g);

        policy.mutexes.insert_mutex(1, 2);
        ecg.contract_edge(&mut policy, EdgeIndex::new(0)).unwrap();
        ecg.contract_edge(&mut policy, EdgeIndex::new(1)).unwrap();
        // Both sides are now mutexed against each other; the (1-2) edge must never surface.
        assert!(policy.is_done(&mut ecg) || policy.pq.top().unwrap().0 != 2);
    }
}
