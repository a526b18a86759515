//! Re-exports of the most commonly used items in `graph_agglo`.
pub use crate::agglomerative::AgglomerativeClustering;
pub use crate::cluster_policy::ClusterPolicy;
pub use crate::contraction_graph::EdgeContractionGraph;
pub use crate::error::{Error, Result};
pub use crate::graph::{node_index, EdgeIndex, Graph, NodeIndex};
pub use crate::histogram::Histogram;
pub use crate::merge_rules::MergeRule;
pub use crate::mutex::MutexSets;
pub use crate::policies::{EdgeWeightedPolicy, GaspPolicy, LiftedAggloPolicy, LiftedEdgeWeightedPolicy, MutexWatershedPolicy};
pub use crate::settings::ClusterPolicySettings;

pub use crate::mutex_watershed::{compute_mws_clustering, compute_mws_segmentation};
pub use crate::rag::{LabelVolume, StackedRag};
