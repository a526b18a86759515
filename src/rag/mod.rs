//! Region-adjacency graph construction over label volumes (§4.10).
pub mod label_volume;
pub mod stacked_rag;

pub use label_volume::{InMemoryLabelVolume, LabelVolume};
pub use stacked_rag::{SliceMeta, StackedRag, StackedRagSettings};
