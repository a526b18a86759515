//! Standalone mutex watershed segmentation — no contraction graph, no cluster policy, just
//! a union-find and a mutex-set walk over a sorted edge list (or, for the Prim variant, a
//! priority-queue expansion from a seed node). Ported line-for-line in spirit from
//! `nifty::segmentation::mutex_watershed`'s `compute_mws_clustering`,
//! `compute_mws_segmentation`, `compute_divisive_mws_segmentation`, and
//! `compute_mws_prim_segmentation`.
use std::collections::BinaryHeap;

use crate::error::{Error, Result};
use crate::mutex::MutexSets;
use crate::union_find::UnionFind;

/// Kruskal-style mutex watershed over an explicit attractive/repulsive edge list.
///
/// `uv_attractive`/`w_attractive` and `uv_mutex`/`w_mutex` must have matching lengths
/// pairwise. Edges are processed in descending weight order (ties broken by original
/// position, matching an argsort-stable convention); repulsive edges whose endpoints are
/// not yet mutex'd register a mutex instead of linking.
pub fn compute_mws_clustering(
    num_nodes: usize,
    uv_attractive: &[(usize, usize)],
    w_attractive: &[f64],
    uv_mutex: &[(usize, usize)],
    w_mutex: &[f64],
) -> Result<Vec<usize>> {
    if uv_attractive.len() != w_attractive.len() || uv_mutex.len() != w_mutex.len() {
        return Err(Error::PrecondViolation(
            "edge list and weight list lengths must match".to_string(),
        ));
    }

    let n_attractive = uv_attractive.len();
    let total = n_attractive + uv_mutex.len();

    let mut order: Vec<usize> = (0..total).collect();
    let weight_of = |i: usize| -> f64 {
        if i < n_attractive {
            w_attractive[i]
        } else {
            w_mutex[i - n_attractive]
        }
    };
    // Stable sort descending by weight; ties keep original relative order (lower original
    // index effectively wins), matching the reference's argsort-then-iterate behavior.
    order.sort_by(|&a, &b| weight_of(b).partial_cmp(&weight_of(a)).unwrap_or(std::cmp::Ordering::Equal));

    let mut uf = UnionFind::new(num_nodes);
    let mut mutexes = MutexSets::new(num_nodes);

    for i in order {
        let (u, v) = if i < n_attractive {
            uv_attractive[i]
        } else {
            uv_mutex[i - n_attractive]
        };
        let is_mutex = i >= n_attractive;

        let ru = uf.find(u);
        let rv = uf.find(v);
        if ru == rv {
            continue;
        }
        if mutexes.check_mutex(ru as u64, rv as u64) {
            continue;
        }
        if is_mutex {
            mutexes.insert_mutex(ru as u64, rv as u64);
        } else {
            let survivor = uf.link(ru, rv);
            let absorbed = if survivor == ru { rv } else { ru };
            mutexes.merge_mutexes(absorbed as u64, survivor as u64);
        }
    }

    Ok((0..num_nodes).map(|i| uf.find(i)).collect())
}

/// Builds a minimum spanning forest first (recording exactly which attractive edges
/// actually merged, never blocked by a mutex at the time they were processed), then
/// materializes final labels with a fresh union-find pass over only those edges.
pub fn compute_divisive_mws_clustering(
    num_nodes: usize,
    uv_attractive: &[(usize, usize)],
    w_attractive: &[f64],
    uv_mutex: &[(usize, usize)],
    w_mutex: &[f64],
) -> Result<Vec<usize>> {
    if uv_attractive.len() != w_attractive.len() || uv_mutex.len() != w_mutex.len() {
        return Err(Error::PrecondViolation(
            "edge list and weight list lengths must match".to_string(),
        ));
    }

    let n_attractive = uv_attractive.len();
    let total = n_attractive + uv_mutex.len();

    let mut order: Vec<usize> = (0..total).collect();
    let weight_of = |i: usize| -> f64 {
        if i < n_attractive {
            w_attractive[i]
        } else {
            w_mutex[i - n_attractive]
        }
    };
    order.sort_by(|&a, &b| weight_of(b).partial_cmp(&weight_of(a)).unwrap_or(std::cmp::Ordering::Equal));

    // Phase 1: build the minimum spanning forest, recording which attractive edges merged.
    let mut msf = vec![false; n_attractive];
    {
        let mut uf = UnionFind::new(num_nodes);
        let mut mutexes = MutexSets::new(num_nodes);
        for &i in &order {
            let (u, v) = if i < n_attractive {
                uv_attractive[i]
            } else {
                uv_mutex[i - n_attractive]
            };
            let is_mutex = i >= n_attractive;

            let ru = uf.find(u);
            let rv = uf.find(v);
            if ru == rv {
                continue;
            }
            if mutexes.check_mutex(ru as u64, rv as u64) {
                continue;
            }
            if is_mutex {
                mutexes.insert_mutex(ru as u64, rv as u64);
            } else {
                let survivor = uf.link(ru, rv);
                let absorbed = if survivor == ru { rv } else { ru };
                mutexes.merge_mutexes(absorbed as u64, survivor as u64);
                msf[i] = true;
            }
        }
    }

    // Phase 2: fresh union-find, only over edges the MSF recorded.
    let mut uf = UnionFind::new(num_nodes);
    for (i, &(u, v)) in uv_attractive.iter().enumerate() {
        if msf[i] {
            uf.link(u, v);
        }
    }
    Ok((0..num_nodes).map(|i| uf.find(i)).collect())
}

/// Computes `stride[d] = prod(shape[d+1..])` for a row-major `shape`.
fn array_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for d in (0..shape.len() - 1).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

/// Computes the flat node-to-node stride for each offset channel: `offset_stride[c] =
/// sum(offset[c][d] * array_stride[d])`.
fn offset_strides(shape: &[usize], offsets: &[Vec<i64>]) -> Vec<i64> {
    let strides = array_strides(shape);
    offsets
        .iter()
        .map(|off| off.iter().zip(&strides).map(|(o, &s)| o * s as i64).sum())
        .collect()
}

/// Grid-offset-based Kruskal segmentation. `edge_weights` is channel-major: edge id
/// `c * N + node` connects `node` to `node + offset_strides[c]`. The first
/// `n_attractive_channels` channels are attractive, the rest mutex. `valid_edges[edge_id]`
/// masks edges that would read out of bounds (e.g. on a volume boundary).
pub fn compute_mws_segmentation(
    shape: &[usize],
    offsets: &[Vec<i64>],
    n_attractive_channels: usize,
    edge_weights: &[f64],
    valid_edges: &[bool],
) -> Result<Vec<usize>> {
    let num_nodes: usize = shape.iter().product();
    let strides = offset_strides(shape, offsets);
    let num_edges = num_nodes * offsets.len();
    if edge_weights.len() != num_edges || valid_edges.len() != num_edges {
        return Err(Error::PrecondViolation(
            "edge_weights/valid_edges length must be num_nodes * num_channels".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..num_edges).filter(|&e| valid_edges[e]).collect();
    order.sort_by(|&a, &b| {
        edge_weights[b]
            .partial_cmp(&edge_weights[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut uf = UnionFind::new(num_nodes);
    let mut mutexes = MutexSets::new(num_nodes);

    for edge_id in order {
        let channel = edge_id / num_nodes;
        let u = edge_id % num_nodes;
        let v_signed = u as i64 + strides[channel];
        if v_signed < 0 || v_signed as usize >= num_nodes {
            continue;
        }
        let v = v_signed as usize;
        let is_mutex = channel >= n_attractive_channels;

        let ru = uf.find(u);
        let rv = uf.find(v);
        if ru == rv {
            continue;
        }
        if mutexes.check_mutex(ru as u64, rv as u64) {
            continue;
        }
        if is_mutex {
            mutexes.insert_mutex(ru as u64, rv as u64);
        } else {
            let survivor = uf.link(ru, rv);
            let absorbed = if survivor == ru { rv } else { ru };
            mutexes.merge_mutexes(absorbed as u64, survivor as u64);
        }
    }

    Ok((0..num_nodes).map(|i| uf.find(i)).collect())
}

#[derive(PartialEq)]
struct PqEntry {
    weight: f64,
    edge_id: usize,
}
impl Eq for PqEntry {}
impl PartialOrd for PqEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.weight.partial_cmp(&other.weight)
    }
}
impl Ord for PqEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.partial_cmp(other).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Prim-style mutex watershed: expands from node 0 via a max-weight priority queue instead
/// of a global sort. Each node is linked into the growing tree at most once, via whichever
/// forward offset edge reaches it with the highest weight.
pub fn compute_mws_prim_segmentation(
    shape: &[usize],
    offsets: &[Vec<i64>],
    n_attractive_channels: usize,
    edge_weights: &[f64],
    valid_edges: &[bool],
) -> Result<Vec<usize>> {
    let num_nodes: usize = shape.iter().product();
    let strides = offset_strides(shape, offsets);
    let num_channels = offsets.len();
    let num_edges = num_nodes * num_channels;
    if edge_weights.len() != num_edges || valid_edges.len() != num_edges {
        return Err(Error::PrecondViolation(
            "edge_weights/valid_edges length must be num_nodes * num_channels".to_string(),
        ));
    }

    let mut uf = UnionFind::new(num_nodes);
    let mut mutexes = MutexSets::new(num_nodes);
    let mut node_visited = vec![false; num_nodes];
    let mut pq: BinaryHeap<PqEntry> = BinaryHeap::new();

    // Pushes every neighbour of `node` reachable by a forward offset stride. Each directed
    // edge is keyed by `(channel, target)`, so re-expanding a node that was reached by more
    // than one path pushes duplicates; those are filtered on pop by `node_visited`, not by
    // a separate per-edge bitmap.
    let add_neighbours = |node: usize, pq: &mut BinaryHeap<PqEntry>| {
        for channel in 0..num_channels {
            let target = node as i64 + strides[channel];
            if target < 0 || target as usize >= num_nodes {
                continue;
            }
            if !valid_edges[channel * num_nodes + node] {
                continue;
            }
            let w = edge_weights[channel * num_nodes + node];
            pq.push(PqEntry {
                weight: w,
                edge_id: channel * num_nodes + target as usize,
            });
        }
    };

    node_visited[0] = true;
    add_neighbours(0, &mut pq);

    while let Some(PqEntry { edge_id, .. }) = pq.pop() {
        let channel = edge_id / num_nodes;
        let target = edge_id % num_nodes;
        if node_visited[target] {
            continue;
        }
        let is_mutex = channel >= n_attractive_channels;

        // `target`'s representative is itself (not yet merged); find the nearest already
        // visited node sharing this directed edge via its stride back-reference.
        let back = target as i64 - strides[channel];
        if back < 0 || back as usize >= num_nodes {
            continue;
        }
        let source = back as usize;
        let ru = uf.find(source);
        let rv = uf.find(target);

        node_visited[target] = true;
        add_neighbours(target, &mut pq);

        if ru == rv {
            continue;
        }
        if mutexes.check_mutex(ru as u64, rv as u64) {
            continue;
        }
        if is_mutex {
            mutexes.insert_mutex(ru as u64, rv as u64);
        } else {
            let survivor = uf.link(ru, rv);
            let absorbed = if survivor == ru { rv } else { ru };
            mutexes.merge_mutexes(absorbed as u64, survivor as u64);
        }
    }

    Ok((0..num_nodes).map(|i| uf.find(i)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutex_conflict_yields_expected_partition() {
        // S2: 4 nodes, attractive (0-1,0.9) (2-3,0.9) (1-2,0.8), mutex (1-2,1.0).
        let uv_attractive = vec![(0, 1), (2, 3), (1, 2)];
        let w_attractive = vec![0.9, 0.9, 0.8];
        let uv_mutex = vec![(1, 2)];
        let w_mutex = vec![1.0];

        let labels = compute_mws_clustering(4, &uv_attractive, &w_attractive, &uv_mutex, &w_mutex).unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn output_is_a_partition_respecting_every_mutex() {
        let uv_attractive = vec![(0, 1), (1, 2), (2, 3)];
        let w_attractive = vec![0.5, 0.6, 0.4];
        let uv_mutex = vec![(0, 3)];
        let w_mutex = vec![0.9];

        let labels = compute_mws_clustering(4, &uv_attractive, &w_attractive, &uv_mutex, &w_mutex).unwrap();
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn kruskal_and_divisive_agree_without_conflicts() {
        let uv_attractive = vec![(0, 1), (1, 2), (2, 3)];
        let w_attractive = vec![3.0, 2.0, 1.0];
        let uv_mutex: Vec<(usize, usize)> = vec![];
        let w_mutex: Vec<f64> = vec![];

        let a = compute_mws_clustering(4, &uv_attractive, &w_attractive, &uv_mutex, &w_mutex).unwrap();
        let b = compute_divisive_mws_clustering(4, &uv_attractive, &w_attractive, &uv_mutex, &w_mutex).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(a[i] == a[j], b[i] == b[j]);
            }
        }
    }
}
