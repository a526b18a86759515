//! The cluster policy trait: every concrete agglomeration strategy (edge-weighted, GASP,
//! lifted, mutex-watershed-as-policy) implements this to tell the driver which edge to
//! contract next and to keep its own per-edge/per-node bookkeeping in sync with the graph.
use crate::contraction_graph::EdgeContractionGraph;
use crate::graph::{EdgeIndex, NodeIndex};

pub trait ClusterPolicy {
    /// Returns the next edge to contract together with its priority, or `None` if the
    /// policy has nothing left to offer (callers should still check [`is_done`] first).
    ///
    /// [`is_done`]: ClusterPolicy::is_done
    fn edge_to_contract_next(&mut self, ecg: &mut EdgeContractionGraph) -> Option<(EdgeIndex, f64)>;

    /// May mutate internal bookkeeping (lazily discarding stale/forbidden top-of-queue
    /// entries) as part of deciding whether clustering should stop.
    fn is_done(&mut self, ecg: &mut EdgeContractionGraph) -> bool;

    /// Called by the contraction graph immediately before an edge is contracted.
    fn contract_edge(&mut self, ecg: &EdgeContractionGraph, e: EdgeIndex);

    /// Called once `a` has absorbed `d` (union-find link already performed).
    fn merge_nodes(&mut self, ecg: &EdgeContractionGraph, a: NodeIndex, d: NodeIndex);

    /// Called when two parallel edges collapse into one; `alive` survives, `dead` is
    /// discarded. Exactly one call per collapsing pair.
    fn merge_edges(&mut self, ecg: &EdgeContractionGraph, alive: EdgeIndex, dead: EdgeIndex);

    /// Called after all bookkeeping for a contraction has completed.
    fn contract_edge_done(&mut self, ecg: &EdgeContractionGraph, e: EdgeIndex);

    /// Current priority of `e` if still tracked by this policy, used only to populate the
    /// optional ultrametric-contour-map ledger.
    fn priority_of(&self, ecg: &EdgeContractionGraph, e: EdgeIndex) -> Option<f64>;
}

/// A policy that never offers an edge to contract; useful for exercising the contraction
/// graph's own mutation logic in isolation from any particular agglomeration strategy.
pub struct NullPolicy;

impl ClusterPolicy for NullPolicy {
    fn edge_to_contract_next(
        &mut self,
        _ecg: &mut EdgeContractionGraph,
    ) -> Option<(EdgeIndex, f64)> {
        None
    }

    fn is_done(&mut self, _ecg: &mut EdgeContractionGraph) -> bool {
        true
    }

    fn contract_edge(&mut self, _ecg: &EdgeContractionGraph, _e: EdgeIndex) {}
    fn merge_nodes(&mut self, _ecg: &EdgeContractionGraph, _a: NodeIndex, _d: NodeIndex) {}
    fn merge_edges(&mut self, _ecg: &EdgeContractionGraph, _alive: EdgeIndex, _dead: EdgeIndex) {}
    fn contract_edge_done(&mut self, _ecg: &EdgeContractionGraph, _e: EdgeIndex) {}
    fn priority_of(&self, _ecg: &EdgeContractionGraph, _e: EdgeIndex) -> Option<f64> {
        None
    }
}
