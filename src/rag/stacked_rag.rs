//! The stacked 2D region-adjacency graph builder (§4.10): treats a 3D label volume as `Z`
//! independent 2D slices, builds within-slice adjacency in parallel, then between-slice
//! adjacency in a second parallel pass, and finally assembles everything into a single
//! [`Graph`] whose edge-id space is partitioned `[in-slice | between-slice]`.
//!
//! Grounded on `original_source/include/nifty/graph/rag/detail_rag/compute_grid_rag_stacked.hxx`'s
//! six-phase algorithm. The reference's shared per-node adjacency structure is safely
//! writable from multiple threads only because disjoint slices never touch the same node;
//! this port sidesteps that requirement entirely by having each parallel phase return its
//! own private result (a per-slice edge-count map), which a short serial pass then folds
//! into the shared [`Graph`] — same two-phase shape, no unsafe aliasing.
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::graph::{node_index, EdgeIndex, Graph, NodeIndex};
use crate::rag::label_volume::LabelVolume;

/// Per-slice bookkeeping surfaced by the builder, matching spec §4.10's output metadata.
#[derive(Clone, Copy, Debug, Default)]
pub struct SliceMeta {
    pub min_node: u64,
    pub max_node: u64,
    pub in_slice_offset: usize,
    pub in_slice_count: usize,
    pub between_slice_offset: usize,
    pub between_slice_count: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StackedRagSettings {
    pub ignore_label: Option<u64>,
}

impl StackedRagSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_label(mut self, label: u64) -> Self {
        self.ignore_label = Some(label);
        self
    }
}

pub struct StackedRag {
    graph: Graph,
    edge_lengths: Vec<u64>,
    num_in_slice_edges: usize,
    num_between_slice_edges: usize,
    slices: Vec<SliceMeta>,
    ignore_label: Option<u64>,
}

struct SlicePhase1 {
    min_node: u64,
    max_node: u64,
    edge_counts: FxHashMap<(u64, u64), u64>,
}

fn scan_slice(labels: &dyn LabelVolume, z: usize, shape: [usize; 3], ignore_label: Option<u64>) -> Result<SlicePhase1> {
    let (ny, nx) = (shape[1], shape[2]);
    let mut buf = vec![0u64; ny * nx];
    labels.read_subarray([z, 0, 0], [z + 1, ny, nx], &mut buf)?;

    let mut min_node = u64::MAX;
    let mut max_node = 0u64;
    let mut edge_counts: FxHashMap<(u64, u64), u64> = FxHashMap::default();

    let at = |buf: &[u64], y: usize, x: usize| buf[y * nx + x];

    for y in 0..ny {
        for x in 0..nx {
            let lu = at(&buf, y, x);
            if ignore_label == Some(lu) {
                continue;
            }
            min_node = min_node.min(lu);
            max_node = max_node.max(lu);

            if x + 1 < nx {
                let lv = at(&buf, y, x + 1);
                if ignore_label != Some(lv) && lu != lv {
                    let key = (lu.min(lv), lu.max(lv));
                    *edge_counts.entry(key).or_insert(0) += 1;
                }
            }
            if y + 1 < ny {
                let lv = at(&buf, y + 1, x);
                if ignore_label != Some(lv) && lu != lv {
                    let key = (lu.min(lv), lu.max(lv));
                    *edge_counts.entry(key).or_insert(0) += 1;
                }
            }
        }
    }

    Ok(SlicePhase1 {
        min_node,
        max_node,
        edge_counts,
    })
}

fn scan_between_slices(
    labels: &dyn LabelVolume,
    z: usize,
    shape: [usize; 3],
    ignore_label: Option<u64>,
) -> Result<FxHashMap<(u64, u64), u64>> {
    let (ny, nx) = (shape[1], shape[2]);
    let mut buf_a = vec![0u64; ny * nx];
    let mut buf_b = vec![0u64; ny * nx];
    labels.read_subarray([z, 0, 0], [z + 1, ny, nx], &mut buf_a)?;
    labels.read_subarray([z + 1, 0, 0], [z + 2, ny, nx], &mut buf_b)?;

    let mut edge_counts: FxHashMap<(u64, u64), u64> = FxHashMap::default();
    for y in 0..ny {
        for x in 0..nx {
            let lu = buf_a[y * nx + x];
            let lv = buf_b[y * nx + x];
            if ignore_label == Some(lu) || ignore_label == Some(lv) {
                continue;
            }
            if lu != lv {
                let key = (lu.min(lv), lu.max(lv));
                *edge_counts.entry(key).or_insert(0) += 1;
            }
        }
    }
    Ok(edge_counts)
}

impl StackedRag {
    /// Runs the full six-phase build described in spec §4.10 against `labels`.
    pub fn build(labels: &dyn LabelVolume, settings: StackedRagSettings) -> Result<StackedRag> {
        let shape = labels.shape();
        let num_slices = shape[0];
        if num_slices == 0 {
            return Err(Error::PrecondViolation("label volume has zero slices".to_string()));
        }

        // Phase 1: per-slice in-slice adjacency and edge counts, in parallel.
        let phase1: Vec<SlicePhase1> = (0..num_slices)
            .into_par_iter()
            .map(|z| scan_slice(labels, z, shape, settings.ignore_label))
            .collect::<Result<Vec<_>>>()?;

        // Phase 2: serial prefix sum over in-slice edge offsets, checking the
        // dense-and-monotonic supervoxel-id invariant the stacked RAG depends on.
        let mut slices = vec![SliceMeta::default(); num_slices];
        let mut running = 0usize;
        for z in 0..num_slices {
            let count = phase1[z].edge_counts.len();
            slices[z].min_node = phase1[z].min_node;
            slices[z].max_node = phase1[z].max_node;
            slices[z].in_slice_offset = running;
            slices[z].in_slice_count = count;
            running += count;

            let prev_nonempty = z > 0 && phase1[z - 1].min_node != u64::MAX;
            let cur_nonempty = phase1[z].min_node != u64::MAX;
            if prev_nonempty && cur_nonempty && phase1[z - 1].max_node + 1 != phase1[z].min_node {
                return Err(Error::PrecondViolation(format!(
                    "unusable supervoxels for stacked RAG: slice {} max_node {} + 1 != slice {} min_node {}",
                    z - 1,
                    phase1[z - 1].max_node,
                    z,
                    phase1[z].min_node
                )));
            }
        }
        let num_in_slice_edges = running;

        // Phase 3: materialize in-slice edges and lengths, per slice in parallel, then a
        // cheap serial flatten into the shared graph (see module docs for why this is
        // split this way instead of writing into shared adjacency directly).
        let mut in_slice_batches: Vec<Vec<(u64, u64, u64)>> = (0..num_slices)
            .into_par_iter()
            .map(|z| {
                let mut pairs: Vec<(u64, u64, u64)> = phase1[z]
                    .edge_counts
                    .iter()
                    .map(|(&(u, v), &len)| (u, v, len))
                    .collect();
                pairs.sort_unstable();
                pairs
            })
            .collect();

        let max_node_overall = phase1.iter().map(|p| p.max_node).max().unwrap_or(0);
        let num_nodes = (max_node_overall + 1) as usize;

        let mut graph = Graph::with_capacity(num_nodes, num_in_slice_edges);
        graph.add_nodes(num_nodes);
        let mut edge_lengths = Vec::with_capacity(num_in_slice_edges);
        for batch in in_slice_batches.drain(..) {
            for (u, v, len) in batch {
                graph.add_edge(node_index(u as usize), node_index(v as usize), 0.0);
                edge_lengths.push(len);
            }
        }

        // Phase 4: between-slice adjacency, two parallel waves (even-z then odd-z) so
        // that no wave ever schedules two workers against the same pair of slices.
        let mut between_counts: Vec<FxHashMap<(u64, u64), u64>> = vec![FxHashMap::default(); num_slices.saturating_sub(1)];
        for parity in [0usize, 1usize] {
            let results: Vec<(usize, FxHashMap<(u64, u64), u64>)> = (0..num_slices.saturating_sub(1))
                .into_par_iter()
                .filter(|&z| z % 2 == parity)
                .map(|z| scan_between_slices(labels, z, shape, settings.ignore_label).map(|m| (z, m)))
                .collect::<Result<Vec<_>>>()?;
            for (z, m) in results {
                between_counts[z] = m;
            }
        }

        // Phase 5: serial prefix sum over between-slice edge offsets.
        let mut running = num_in_slice_edges;
        for z in 0..num_slices {
            slices[z].between_slice_offset = running;
            let count = between_counts.get(z).map(|m| m.len()).unwrap_or(0);
            slices[z].between_slice_count = count;
            running += count;
        }
        let num_between_slice_edges = running - num_in_slice_edges;

        // Phase 6: materialize between-slice edges and lengths, per slice in parallel,
        // then flatten into the shared graph.
        let mut between_batches: Vec<Vec<(u64, u64, u64)>> = (0..num_slices.saturating_sub(1))
            .into_par_iter()
            .map(|z| {
                let mut pairs: Vec<(u64, u64, u64)> = between_counts[z]
                    .iter()
                    .map(|(&(u, v), &len)| (u, v, len))
                    .collect();
                pairs.sort_unstable();
                pairs
            })
            .collect();

        for batch in between_batches.drain(..) {
            for (u, v, len) in batch {
                graph.add_edge(node_index(u as usize), node_index(v as usize), 0.0);
                edge_lengths.push(len);
            }
        }

        Ok(StackedRag {
            graph,
            edge_lengths,
            num_in_slice_edges,
            num_between_slice_edges,
            slices,
            ignore_label: settings.ignore_label,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn edge_length(&self, e: EdgeIndex) -> u64 {
        self.edge_lengths[e.index()]
    }

    pub fn num_in_slice_edges(&self) -> usize {
        self.num_in_slice_edges
    }

    pub fn num_between_slice_edges(&self) -> usize {
        self.num_between_slice_edges
    }

    pub fn slice_meta(&self, z: usize) -> SliceMeta {
        self.slices[z]
    }

    pub fn num_slices(&self) -> usize {
        self.slices.len()
    }

    /// Whether `e` is a between-slice (as opposed to in-slice) edge.
    pub fn is_between_slice(&self, e: EdgeIndex) -> bool {
        e.index() >= self.num_in_slice_edges
    }

    /// Flattens this RAG into the integer-stream layout described in spec §6:
    /// `[range, ignore_label_flag, {n_in_slice_edges[z], in_slice_offset[z]} for z,
    /// <base graph serialization>]`. `range` is fixed at `1` (adjacent slices only) for
    /// the plain stacked RAG.
    pub fn serialize(&self) -> Vec<u64> {
        let mut out = Vec::new();
        out.push(1); // range
        match self.ignore_label {
            Some(v) => {
                out.push(1);
                out.push(v);
            }
            None => out.push(0),
        }
        out.push(self.slices.len() as u64);
        for s in &self.slices {
            out.push(s.in_slice_count as u64);
            out.push(s.in_slice_offset as u64);
            out.push(s.between_slice_count as u64);
            out.push(s.between_slice_offset as u64);
            out.push(s.min_node);
            out.push(s.max_node);
        }
        out.push(self.graph.number_of_nodes() as u64);
        out.push(self.graph.number_of_edges() as u64);
        for edge in self.graph.edges() {
            out.push(edge.u.index() as u64);
            out.push(edge.v.index() as u64);
        }
        for &len in &self.edge_lengths {
            out.push(len);
        }
        out
    }

    /// Inverse of [`StackedRag::serialize`].
    pub fn deserialize(stream: &[u64]) -> Result<StackedRag> {
        let mut it = stream.iter().copied();
        let mut next = || {
            it.next()
                .ok_or_else(|| Error::PrecondViolation("truncated stacked RAG stream".to_string()))
        };

        let _range = next()?;
        let ignore_flag = next()?;
        let ignore_label = if ignore_flag != 0 { Some(next()?) } else { None };

        let num_slices = next()? as usize;
        let mut slices = Vec::with_capacity(num_slices);
        for _ in 0..num_slices {
            slices.push(SliceMeta {
                in_slice_count: next()? as usize,
                in_slice_offset: next()? as usize,
                between_slice_count: next()? as usize,
                between_slice_offset: next()? as usize,
                min_node: next()?,
                max_node: next()?,
            });
        }

        let num_nodes = next()? as usize;
        let num_edges = next()? as usize;
        let mut uv = Vec::with_capacity(num_edges);
        for _ in 0..num_edges {
            let u = next()? as usize;
            let v = next()? as usize;
            uv.push((u, v));
        }
        let mut edge_lengths = Vec::with_capacity(num_edges);
        for _ in 0..num_edges {
            edge_lengths.push(next()?);
        }

        let mut graph = Graph::with_capacity(num_nodes, num_edges);
        graph.add_nodes(num_nodes);
        for (u, v) in uv {
            graph.add_edge(node_index(u), node_index(v), 0.0);
        }

        let num_in_slice_edges = slices.iter().map(|s| s.in_slice_count).sum();
        let num_between_slice_edges = slices.iter().map(|s| s.between_slice_count).sum();

        Ok(StackedRag {
            graph,
            edge_lengths,
            num_in_slice_edges,
            num_between_slice_edges,
            slices,
            ignore_label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::label_volume::InMemoryLabelVolume;

    /// S6: 3x4x4 volume, supervoxels {0..2} in z=0, {3..5} in z=1, {6..8} in z=2.
    fn s6_volume() -> InMemoryLabelVolume {
        let mut data = Vec::with_capacity(3 * 4 * 4);
        for z in 0..3usize {
            let base = (z * 3) as u64;
            for y in 0..4 {
                for x in 0..4 {
                    // Three vertical strips per slice -> three supervoxels per slice.
                    let strip = (x * 3) / 4;
                    data.push(base + strip as u64);
                    let _ = y;
                }
            }
        }
        InMemoryLabelVolume::new([3, 4, 4], data).unwrap()
    }

    #[test]
    fn builds_expected_slice_offsets() {
        let vol = s6_volume();
        let rag = StackedRag::build(&vol, StackedRagSettings::new()).unwrap();

        assert_eq!(rag.slice_meta(0).in_slice_offset, 0);
        let k0 = rag.slice_meta(0).in_slice_count;
        assert_eq!(rag.slice_meta(1).in_slice_offset, k0);
        let k1 = rag.slice_meta(1).in_slice_count;
        assert_eq!(rag.slice_meta(2).in_slice_offset, k0 + k1);

        let k2 = rag.slice_meta(2).in_slice_count;
        assert_eq!(rag.num_in_slice_edges(), k0 + k1 + k2);
        assert_eq!(rag.slice_meta(0).between_slice_offset, k0 + k1 + k2);
    }

    #[test]
    fn round_trips_through_serialize() {
        let vol = s6_volume();
        let rag = StackedRag::build(&vol, StackedRagSettings::new()).unwrap();
        let stream = rag.serialize();
        let back = StackedRag::deserialize(&stream).unwrap();

        assert_eq!(back.graph().number_of_nodes(), rag.graph().number_of_nodes());
        assert_eq!(back.graph().number_of_edges(), rag.graph().number_of_edges());
        assert_eq!(back.num_in_slice_edges(), rag.num_in_slice_edges());
        assert_eq!(back.num_between_slice_edges(), rag.num_between_slice_edges());
        for z in 0..rag.num_slices() {
            assert_eq!(back.slice_meta(z).in_slice_offset, rag.slice_meta(z).in_slice_offset);
        }
    }

    #[test]
    fn non_monotonic_supervoxels_are_rejected() {
        // shape (2,2,2): slice0 has labels {0,1}, slice1 restarts at {0,5} instead of
        // continuing the dense numbering the builder requires.
        let data = vec![0, 0, 1, 1, 0, 0, 5, 5];
        let vol = InMemoryLabelVolume::new([2, 2, 2], data).unwrap();
        let res = StackedRag::build(&vol, StackedRagSettings::new());
        assert!(res.is_err());
    }

    #[test]
    fn ignore_label_is_skipped() {
        // slice0: {0,1} with one ignored (255) voxel; slice1 continues the numbering {2,3}.
        let data = vec![0, 0, 255, 1, 2, 2, 3, 3];
        let vol = InMemoryLabelVolume::new([2, 2, 2], data).unwrap();
        let rag = StackedRag::build(&vol, StackedRagSettings::new().ignore_label(255)).unwrap();
        assert!(rag.graph().number_of_nodes() > 0);
    }
}
