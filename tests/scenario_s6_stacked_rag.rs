//! S6: a 3x4x4 stacked label volume must produce the expected dense per-slice edge offsets.
use graph_agglo::rag::{StackedRag, StackedRagSettings};
use graph_agglo::util::test_graphs::stacked_label_volume;

#[test]
fn builds_expected_in_slice_and_between_slice_offsets() {
    let vol = stacked_label_volume();
    let rag = StackedRag::build(&vol, StackedRagSettings::new()).unwrap();

    let k0 = rag.slice_meta(0).in_slice_count;
    let k1 = rag.slice_meta(1).in_slice_count;
    let k2 = rag.slice_meta(2).in_slice_count;

    assert_eq!(rag.slice_meta(0).in_slice_offset, 0);
    assert_eq!(rag.slice_meta(1).in_slice_offset, k0);
    assert_eq!(rag.slice_meta(2).in_slice_offset, k0 + k1);
    assert_eq!(rag.slice_meta(0).between_slice_offset, k0 + k1 + k2);
}
