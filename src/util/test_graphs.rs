//! Shared fixtures for the scenarios in spec §8 (S1-S6), used by both inline unit tests and
//! the top-level `tests/` integration suite.
use crate::graph::Graph;
use crate::histogram::Histogram;
use crate::rag::label_volume::InMemoryLabelVolume;

/// S1: a 3x3 grid with 4-neighbor edges, weights assigned in increasing insertion order
/// (`w[i] = i`), matching the "contract exactly 8 edges in strictly decreasing weight
/// order" scenario.
pub fn grid_3x3() -> Graph {
    let idx = |x: usize, y: usize| y * 3 + x;
    let mut edges = Vec::new();
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
    Graph::from_edges(9, edges)
}

/// S2: 4 nodes, attractive edges `(0-1, 0.9)`, `(2-3, 0.9)`, `(1-2, 0.8)`, with `(1-2)`
/// additionally carrying a mutex constraint of weight `1.0`. Returns the graph plus,
/// separately, the mutex edge's endpoints and weight (the base [`Graph`] itself has no
/// notion of mutex constraints).
pub fn mutex_conflict_graph() -> (Graph, (usize, usize), f64) {
    let g = Graph::from_edges(4, vec![(0, 1, 0.9), (2, 3, 0.9), (1, 2, 0.8)]);
    (g, (1, 2), 1.0)
}

/// S4: a small graph with one lifted (non-local) edge. Returns the graph plus a
/// `is_lifted` flag per edge in the same order as [`Graph::edges`].
pub fn lifted_edge_graph() -> (Graph, Vec<bool>) {
    // 0-1, 1-2 are local; 0-2 is the lifted long-range edge.
    let g = Graph::from_edges(3, vec![(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0)]);
    let is_lifted = vec![false, false, true];
    (g, is_lifted)
}

/// S5: two single-sample histograms at 0.2 and 0.8, built over the `[0, 1]` range with
/// `num_bins` bins (spec requires `num_bins >= 40` to get `quantile(0.5) in [0.4, 0.6]`).
pub fn paired_histogram_samples(num_bins: usize) -> (Histogram, Histogram) {
    let mut a = Histogram::new(0.0, 1.0, num_bins);
    a.insert(0.2, 1.0);
    let mut b = Histogram::new(0.0, 1.0, num_bins);
    b.insert(0.8, 1.0);
    (a, b)
}

/// S6: a 3x4x4 label volume with supervoxel ids `{0..2}` in z=0, `{3..5}` in z=1, and
/// `{6..8}` in z=2, laid out as three vertical strips per slice so each slice has exactly
/// three distinct supervoxels.
pub fn stacked_label_volume() -> InMemoryLabelVolume {
    let mut data = Vec::with_capacity(3 * 4 * 4);
    for z in 0..3usize {
        let base = (z * 3) as u64;
        for _y in 0..4 {
            for x in 0..4 {
                let strip = (x * 3) / 4;
                data.push(base + strip as u64);
            }
        }
    }
    InMemoryLabelVolume::new([3, 4, 4], data).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_3x3_has_twelve_edges() {
        let g = grid_3x3();
        assert_eq!(g.number_of_nodes(), 9);
        assert_eq!(g.number_of_edges(), 12);
    }

    #[test]
    fn mutex_conflict_graph_has_expected_shape() {
        let (g, mutex_edge, mutex_weight) = mutex_conflict_graph();
        assert_eq!(g.number_of_nodes(), 4);
        assert_eq!(g.number_of_edges(), 3);
        assert_eq!(mutex_edge, (1, 2));
        assert_eq!(mutex_weight, 1.0);
    }

    #[test]
    fn lifted_edge_graph_marks_exactly_one_edge() {
        let (g, is_lifted) = lifted_edge_graph();
        assert_eq!(is_lifted.len(), g.number_of_edges());
        assert_eq!(is_lifted.iter().filter(|&&b| b).count(), 1);
    }

    #[test]
    fn paired_histograms_merge_to_expected_quantile() {
        let (mut a, b) = paired_histogram_samples(40);
        a.merge(&b);
        let q = a.quantile(0.5);
        assert!((0.4..=0.6).contains(&q));
    }

    #[test]
    fn stacked_label_volume_has_expected_shape() {
        let vol = stacked_label_volume();
        assert_eq!(vol.shape(), [3, 4, 4]);
    }
}
