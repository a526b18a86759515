//! Per-representative cannot-link ("mutex") bookkeeping, shared by the GASP/probabilistic
//! policy, the lifted-agglo policy, and the standalone mutex watershed. Grounded on the
//! reference's `check_mutex`/`insert_mutex`/`merge_mutexes` free functions.
use std::collections::BTreeSet;

#[derive(Clone)]
pub struct MutexSets {
    sets: Vec<BTreeSet<u64>>,
}

impl MutexSets {
    pub fn new(n: usize) -> Self {
        MutexSets {
            sets: vec![BTreeSet::new(); n],
        }
    }

    /// Tests whether `a` and `b` are mutually forbidden, walking the smaller of the two
    /// sets.
    pub fn check_mutex(&self, a: u64, b: u64) -> bool {
        let (small, other) = if self.sets[a as usize].len() <= self.sets[b as usize].len() {
            (a, b)
        } else {
            (b, a)
        };
        self.sets[small as usize].contains(&other)
    }

    /// Symmetrically forbids `a` and `b` from ever being linked.
    pub fn insert_mutex(&mut self, a: u64, b: u64) {
        self.sets[a as usize].insert(b);
        self.sets[b as usize].insert(a);
    }

    /// Unions `from`'s forbidden set into `to`'s, fixing up every back-reference, then
    /// clears `from`'s set. `from` and `to` must be distinct.
    pub fn merge_mutexes(&mut self, from: u64, to: u64) {
        debug_assert_ne!(from, to);
        let from_set = std::mem::take(&mut self.sets[from as usize]);
        for &other in &from_set {
            if other == to {
                continue;
            }
            self.sets[other as usize].remove(&from);
            self.sets[other as usize].insert(to);
            self.sets[to as usize].insert(other);
        }
        self.sets[to as usize].remove(&from);
    }

    pub fn forbidden(&self, a: u64) -> impl Iterator<Item = u64> + '_ {
        self.sets[a as usize].iter().copied()
    }

    pub fn len_of(&self, a: u64) -> usize {
        self.sets[a as usize].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_symmetric() {
        let mut m = MutexSets::new(4);
        m.insert_mutex(0, 1);
        assert!(m.check_mutex(0, 1));
        assert!(m.check_mutex(1, 0));
        assert!(!m.check_mutex(0, 2));
    }

    #[test]
    fn merge_preserves_union_and_fixes_back_references() {
        let mut m = MutexSets::new(5);
        m.insert_mutex(0, 2);
        m.insert_mutex(1, 3);
        m.merge_mutexes(0, 1);
        assert!(m.check_mutex(1, 2));
        assert!(m.check_mutex(2, 1));
        assert!(m.check_mutex(1, 3));
        assert_eq!(m.len_of(0), 0);
    }

    #[test]
    fn merge_drops_self_reference() {
        let mut m = MutexSets::new(3);
        m.insert_mutex(0, 1);
        m.merge_mutexes(0, 1);
        assert!(!m.check_mutex(1, 1));
    }
}
