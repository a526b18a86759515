//! The mutex watershed expressed as a cluster policy (as opposed to the standalone,
//! ECG-free entry points in [`crate::mutex_watershed`]): priority is the magnitude of a
//! signed merge-rule-combined edge value; positive values are attractive (contracted),
//! negative are repulsive (registered as a mutex and never contracted).
use crate::cluster_policy::ClusterPolicy;
use crate::contraction_graph::EdgeContractionGraph;
use crate::graph::{EdgeIndex, Graph, NodeIndex};
use crate::merge_rules::MergeRule;
use crate::mutex::MutexSets;
use crate::priority_queue::{IndexedPriorityQueue, Mode};

pub struct MutexWatershedPolicy {
    edge_value: Vec<f64>,
    edge_size: Vec<f64>,
    mutexes: MutexSets,
    pq: IndexedPriorityQueue,
}

impl MutexWatershedPolicy {
    pub fn new(graph: &Graph, signed_weights: Vec<f64>) -> Self {
        let m = graph.number_of_edges();
        let n = graph.number_of_nodes();
        assert_eq!(signed_weights.len(), m);

        let mut policy = MutexWatershedPolicy {
            edge_value: signed_weights,
            edge_size: vec![1.0; m],
            mutexes: MutexSets::new(n),
            pq: IndexedPriorityQueue::with_capacity(Mode::Max, m),
        };
        for e in 0..m {
            let p = policy.edge_value[e].abs();
            policy.pq.push(e as u64, p).expect("initial priority is never NaN");
        }
        policy
    }

    fn is_attractive(&self, e: usize) -> bool {
        self.edge_value[e] >= 0.0
    }

    /// Pops self-loops outright; pops repulsive edges after registering the mutex between
    /// their current reps; leaves the top in place once it names a contractable
    /// attractive edge (or the queue empties).
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
            if self.mutexes.check_mutex(ru.index() as u64, rv.index() as u64) {
                self.pq.delete(eid);
                continue;
            }
            if !self.is_attractive(eid as usize) {
                self.pq.delete(eid);
                self.mutexes.insert_mutex(ru.index() as u64, rv.index() as u64);
                continue;
            }
            return;
        }
    }
}

impl ClusterPolicy for MutexWatershedPolicy {
    fn edge_to_contract_next(
        &mut self,
        ecg: &mut EdgeContractionGraph,
    ) -> Option<(EdgeIndex, f64)> {
        self.revalidate_top(ecg);
        self.pq.pop().map(|(id, p)| (EdgeIndex::new(id as usize), p))
    }

    fn is_done(&mut self, ecg: &mut EdgeContractionGraph) -> bool {
        self.revalidate_top(ecg);
        self.pq.is_empty()
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
        let (value, size) = MergeRule::MutexWatershedAbsMax.merge(
            (self.edge_value[alive.index()], self.edge_size[alive.index()]),
            (self.edge_value[dead.index()], self.edge_size[dead.index()]),
        );
        self.edge_value[alive.index()] = value;
        self.edge_size[alive.index()] = size;
        self.pq.delete(dead.index() as u64);
        let p = value.abs();
        self.pq.push(alive.index() as u64, p).expect("merged priority is never NaN");
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
    fn repulsive_edge_is_never_contracted() {
        let g = Graph::from_edges(3, vec![(0, 1, 0.0), (1, 2, 0.0)]);
        let weights = vec![0.9, -0.5];
        let mut policy = MutexWatershedPolicy::new(&g, weights);
        let mut ecg = EdgeContractionGraph::new(&g);
        while !policy.is_done(&mut ecg) {
            let (e, _) = policy.edge_to_contract_next(&mut ecg).unwrap();
            ecg.contract_edge(&mut policy, e).unwrap();
        }
        assert_eq!(ecg.number_of_nodes(), 2);
    }
}
