//! S1: 3x3 grid, max-priority merge rule, stop at 1 node.
use graph_agglo::agglomerative::AgglomerativeClustering;
use graph_agglo::merge_rules::MergeRule;
use graph_agglo::policies::EdgeWeightedPolicy;
use graph_agglo::settings::ClusterPolicySettings;
use graph_agglo::util::test_graphs::grid_3x3;

#[test]
fn grid_contracts_to_single_cluster_in_decreasing_weight_order() {
    let g = grid_3x3();
    let edge_values: Vec<f64> = g.edges().map(|e| e.weight).collect();
    let edge_sizes = vec![1.0; g.number_of_edges()];
    let node_sizes = vec![1.0; g.number_of_nodes()];

    let mut policy = EdgeWeightedPolicy::new(
        &g,
        edge_values.clone(),
        edge_sizes,
        node_sizes,
        MergeRule::Max,
        ClusterPolicySettings::new().stop_nodes(1),
    );

    let mut driver = AgglomerativeClustering::new(&g).with_progress(false);
    driver.run(&mut policy).unwrap();

    assert_eq!(driver.ecg().number_of_nodes(), 1);
    assert_eq!(driver.contraction_order().len(), 8);

    let weights: Vec<f64> = driver
        .contraction_order()
        .iter()
        .map(|&e| edge_values[e.index()])
        .collect();
    for w in weights.windows(2) {
        assert!(w[0] > w[1], "contraction order must be strictly decreasing by weight");
    }
}
