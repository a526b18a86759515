//! S2: 4 nodes, attractive edges (0-1,0.9), (2-3,0.9), (1-2,0.8), mutex (1-2,1.0).
//! Expected final clusters: {0,1} and {2,3}.
use graph_agglo::agglomerative::AgglomerativeClustering;
use graph_agglo::policies::MutexWatershedPolicy;
use graph_agglo::util::test_graphs::mutex_conflict_graph;

#[test]
fn mutex_constraint_prevents_the_middle_edge_from_merging() {
    let (g, (mu, mv), mutex_weight) = mutex_conflict_graph();

    // Signed weights: positive = attractive, negative = repulsive/mutex.
    let edge_value: Vec<f64> = g
        .edges()
        .map(|e| {
            if (e.u.index(), e.v.index()) == (mu.min(mv), mu.max(mv)) {
                -mutex_weight
            } else {
                e.weight
            }
        })
        .collect();

    let mut policy = MutexWatershedPolicy::new(&g, edge_value);
    let mut driver = AgglomerativeClustering::new(&g).with_progress(false);
    driver.run(&mut policy).unwrap();

    let labels = driver.node_labeling();
    assert_eq!(labels[0], labels[1]);
    assert_eq!(labels[2], labels[3]);
    assert_ne!(labels[1], labels[2]);
}
