//! Agglomerative graph clustering, Mutex Watershed segmentation, and region-adjacency-graph
//! construction over edge-weighted graphs and label volumes.
//!
//! # Basic usage
//! ```
//! use graph_agglo::graph::Graph;
//! use graph_agglo::agglomerative::AgglomerativeClustering;
//! use graph_agglo::merge_rules::MergeRule;
//! use graph_agglo::policies::EdgeWeightedPolicy;
//! use graph_agglo::settings::ClusterPolicySettings;
//!
//! // A 4-node path graph with increasing edge weights.
//! let g = Graph::from_edges(4, vec![(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0)]);
//!
//! let edge_sizes = vec![1.0; g.number_of_edges()];
//! let node_sizes = vec![1.0; g.number_of_nodes()];
//! let edge_values: Vec<f64> = g.edges().map(|e| e.weight).collect();
//! let mut policy = EdgeWeightedPolicy::new(
//!     &g,
//!     edge_values,
//!     edge_sizes,
//!     node_sizes,
//!     MergeRule::Max,
//!     ClusterPolicySettings::new().stop_nodes(1),
//! );
//!
//! let mut clustering = AgglomerativeClustering::new(&g);
//! clustering.run(&mut policy).unwrap();
//! assert_eq!(clustering.ecg().number_of_nodes(), 1);
//! ```
pub mod agglomerative;
pub mod cluster_policy;
pub mod constants;
pub mod contraction_graph;
pub mod edge_mapping;
pub mod error;
pub mod graph;
pub mod histogram;
pub mod long_range_adjacency;
pub mod merge_rules;
pub mod mutex;
pub mod mutex_watershed;
pub mod perturb_and_map;
pub mod policies;
pub mod prelude;
pub mod priority_queue;
pub mod rag;
pub mod settings;
pub mod statistics;
pub mod union_find;
pub mod util;
