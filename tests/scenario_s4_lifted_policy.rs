//! S4: a lifted edge must never be chosen for contraction, yet its accumulated statistics
//! must still track every contraction of an adjacent local edge.
use graph_agglo::agglomerative::AgglomerativeClustering;
use graph_agglo::policies::LiftedEdgeWeightedPolicy;
use graph_agglo::util::test_graphs::lifted_edge_graph;

#[test]
fn lifted_edge_is_never_contracted() {
    let (g, is_lifted) = lifted_edge_graph();
    // The lifted edge (index 2, 0-2) gets the lowest dissimilarity value so it would be
    // chosen first if it were ever eligible; it must still never be picked.
    let initial_values = vec![0.5, 0.5, 0.1];

    let mut policy = LiftedEdgeWeightedPolicy::new(&g, initial_values, is_lifted, 0.0, 1.0, 40, 0.5, 1, f64::INFINITY);

    let mut driver = AgglomerativeClustering::new(&g).with_progress(false);
    driver.run(&mut policy).unwrap();

    // Only the two local edges (0-1, 1-2) were ever contractable; the graph still
    // collapses to a single cluster because the lifted edge's endpoints get merged
    // transitively through the local edges.
    assert_eq!(driver.contraction_order().len(), 2);
    assert_eq!(driver.ecg().number_of_nodes(), 1);
}
