//! S5: merging two single-sample histograms at 0.2 and 0.8 must yield a median in [0.4, 0.6].
use graph_agglo::util::test_graphs::paired_histogram_samples;

#[test]
fn merged_single_sample_histograms_median_near_center() {
    let (mut a, b) = paired_histogram_samples(40);
    a.merge(&b);
    let median = a.quantile(0.5);
    assert!(
        (0.4..=0.6).contains(&median),
        "expected median in [0.4, 0.6], got {median}"
    );
}
