//! Column locks: which columns are mid-animation, plus the "column became free" queue.

use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Clone, Default)]
pub struct ColumnLockTable {
    locked: BTreeSet<usize>,
    freed: VecDeque<usize>,
}

impl ColumnLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the column was not already locked.
    pub fn lock(&mut self, col: usize) -> bool {
        self.locked.insert(col)
    }

    /// Unlock and queue a free notification. Unlocking a free column does nothing.
    pub fn unlock(&mut self, col: usize) -> bool {
        let was_locked = self.locked.remove(&col);
        if was_locked {
            self.freed.push_back(col);
        }
        was_locked
    }

    /// Unlock without notifying; used when the caller continues with the column itself.
    pub fn release(&mut self, col: usize) -> bool {
        self.locked.remove(&col)
    }

    #[inline]
    pub fn is_locked(&self, col: usize) -> bool {
        self.locked.contains(&col)
    }

    pub fn locked(&self) -> impl Iterator<Item = usize> + '_ {
        self.locked.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.locked.is_empty()
    }

    /// Next column whose unlock has not been handled yet.
    pub fn pop_freed(&mut self) -> Option<usize> {
        self.freed.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_is_idempotent() {
        let mut t = ColumnLockTable::new();
        assert!(t.lock(2));
        assert!(!t.lock(2));
        assert!(t.is_locked(2));
        assert!(t.unlock(2));
        assert!(!t.unlock(2));
        assert_eq!(t.pop_freed(), Some(2));
        assert_eq!(t.pop_freed(), None);
    }

    #[test]
    fn test_release_is_silent() {
        let mut t = ColumnLockTable::new();
        t.lock(0);
        t.lock(1);
        assert!(t.release(0));
        assert!(t.unlock(1));
        assert_eq!(t.pop_freed(), Some(1));
        assert_eq!(t.pop_freed(), None);
        assert!(t.is_empty());
    }

    #[test]
    fn test_freed_order_follows_unlocks() {
        let mut t = ColumnLockTable::new();
        for col in [4, 1, 3] {
            t.lock(col);
        }
        t.unlock(3);
        t.unlock(4);
        assert_eq!(t.locked().collect::<Vec<_>>(), vec![1]);
        assert_eq!(t.pop_freed(), Some(3));
        assert_eq!(t.pop_freed(), Some(4));
    }
}
