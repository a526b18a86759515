//! Indexed priority queue over a dense integer id space, generalizing the ad hoc
//! `priority_queue::PriorityQueue<NodeIndex, Reverse<i32>>` the contraction loop used to
//! drive by hand into a reusable max/min-heap keyed on `f64` priorities.
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue as ExtPriorityQueue;
use std::cmp::Reverse;

use crate::error::{Error, Result};

/// Deterministic tie-break key: compares by priority first, then by the *reverse* of id so
/// that, for equal priorities, the lower id compares greater (and therefore wins ties in a
/// max-heap; `Mode::Min` flips the stored priority so the same key type serves both modes).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct TieBreak(OrderedFloat<f64>, Reverse<u64>);

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Max,
    Min,
}

/// A priority queue over ids `0..capacity`. Each id is either absent or present with a
/// priority; `push` on a present id updates its priority rather than duplicating it.
pub struct IndexedPriorityQueue {
    inner: ExtPriorityQueue<u64, TieBreak>,
    mode: Mode,
}

impl IndexedPriorityQueue {
    pub fn new(mode: Mode) -> Self {
        IndexedPriorityQueue {
            inner: ExtPriorityQueue::new(),
            mode,
        }
    }

    pub fn with_capacity(mode: Mode, capacity: usize) -> Self {
        IndexedPriorityQueue {
            inner: ExtPriorityQueue::with_capacity(capacity),
            mode,
        }
    }

    fn signed_priority(&self, priority: f64) -> Result<f64> {
        if priority.is_nan() {
            return Err(Error::PrecondViolation(
                "priority queue does not accept NaN priorities".to_string(),
            ));
        }
        Ok(match self.mode {
            Mode::Max => priority,
            Mode::Min => -priority,
        })
    }

    /// Inserts `id` with `priority`, or updates its priority if already present.
    pub fn push(&mut self, id: u64, priority: f64) -> Result<()> {
        let signed = self.signed_priority(priority)?;
        self.inner
            .push(id, TieBreak(OrderedFloat(signed), Reverse(id)));
        Ok(())
    }

    /// Returns the extremal `(id, priority)` without removing it.
    pub fn top(&self) -> Option<(u64, f64)> {
        self.inner.peek().map(|(id, TieBreak(p, _))| (*id, self.unsigned(p.0)))
    }

    pub fn top_priority(&self) -> Option<f64> {
        self.top().map(|(_, p)| p)
    }

    /// Removes and returns the extremal `(id, priority)`.
    pub fn pop(&mut self) -> Option<(u64, f64)> {
        self.inner
            .pop()
            .map(|(id, TieBreak(p, _))| (id, self.unsigned(p.0)))
    }

    /// Removes `id` from the queue if present, returning its priority.
    pub fn delete(&mut self, id: u64) -> Option<f64> {
        self.inner
            .remove(&id)
            .map(|(_, TieBreak(p, _))| self.unsigned(p.0))
    }

    pub fn contains(&self, id: u64) -> bool {
        self.inner.get(&id).is_some()
    }

    pub fn priority_of(&self, id: u64) -> Option<f64> {
        self.inner.get(&id).map(|(_, TieBreak(p, _))| self.unsigned(p.0))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    fn unsigned(&self, signed: f64) -> f64 {
        match self.mode {
            Mode::Max => signed,
            Mode::Min => -signed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_heap_returns_largest_priority() {
        let mut pq = IndexedPriorityQueue::new(Mode::Max);
        pq.push(0, 1.0).unwrap();
        pq.push(1, 5.0).unwrap();
        pq.push(2, 3.0).unwrap();
        assert_eq!(pq.top(), Some((1, 5.0)));
    }

    #[test]
    fn min_heap_returns_smallest_priority() {
        let mut pq = IndexedPriorityQueue::new(Mode::Min);
        pq.push(0, 1.0).unwrap();
        pq.push(1, 5.0).unwrap();
        pq.push(2, 3.0).unwrap();
        assert_eq!(pq.top(), Some((0, 1.0)));
    }

    #[test]
    fn ties_break_on_lower_id() {
        let mut pq = IndexedPriorityQueue::new(Mode::Max);
        pq.push(7, 2.0).unwrap();
        pq.push(3, 2.0).unwrap();
        assert_eq!(pq.top(), Some((3, 2.0)));
    }

    #[test]
    fn push_on_existing_id_updates_priority() {
        let mut pq = IndexedPriorityQueue::new(Mode::Max);
        pq.push(0, 1.0).unwrap();
        pq.push(0, 9.0).unwrap();
        assert_eq!(pq.len(), 1);
        assert_eq!(pq.top(), Some((0, 9.0)));
    }

    #[test]
    fn delete_removes_id() {
        let mut pq = IndexedPriorityQueue::new(Mode::Max);
        pq.push(0, 1.0).unwrap();
        pq.push(1, 2.0).unwrap();
        assert_eq!(pq.delete(1), Some(2.0));
        assert!(!pq.contains(1));
        assert_eq!(pq.top(), Some((0, 1.0)));
    }

    #[test]
    fn nan_priority_rejected() {
        let mut pq = IndexedPriorityQueue::new(Mode::Max);
        assert!(pq.push(0, f64::NAN).is_err());
    }

    #[test]
    fn pop_drains_in_order() {
        let mut pq = IndexedPriorityQueue::new(Mode::Max);
        for (id, p) in [(0, 3.0), (1, 1.0), (2, 2.0)] {
            pq.push(id, p).unwrap();
        }
        let mut popped = Vec::new();
        while let Some((id, _)) = pq.pop() {
            popped.push(id);
        }
        assert_eq!(popped, vec![0, 2, 1]);
    }
}
