use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Workspace-wide structural modification counter.
///
/// The host advances it on every structurally significant edit (anything
/// outside function bodies). It never decreases.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ModificationStamp(u64);

impl ModificationStamp {
    pub const INITIAL: ModificationStamp = ModificationStamp(0);

    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Thread-safe source of [`ModificationStamp`]s for hosts that don't already
/// track structural edits themselves.
#[derive(Debug, Default)]
pub struct ModificationTracker {
    counter: AtomicU64,
}

impl ModificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ModificationStamp {
        ModificationStamp(self.counter.load(Ordering::Acquire))
    }

    /// Records a structural edit and returns the new stamp.
    pub fn bump(&self) -> ModificationStamp {
        ModificationStamp(self.counter.fetch_add(1, Ordering::AcqRel).saturating_add(1))
    }
}

/// A value paired with the stamp that was current when it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamped<T> {
    value: T,
    stamp: ModificationStamp,
}

impl<T> Stamped<T> {
    pub fn new(value: T, stamp: ModificationStamp) -> Self {
        Self { value, stamp }
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    #[inline]
    pub fn stamp(&self) -> ModificationStamp {
        self.stamp
    }

    /// Stale iff the workspace has moved to any other stamp.
    #[inline]
    pub fn is_stale(&self, current: ModificationStamp) -> bool {
        self.stamp != current
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn bump_advances_current() {
        let tracker = ModificationTracker::new();
        assert_eq!(tracker.current(), ModificationStamp::INITIAL);
        let next = tracker.bump();
        assert_eq!(next, ModificationStamp::new(1));
        assert_eq!(tracker.current(), next);
    }

    #[test]
    fn stamped_is_fresh_only_at_its_own_stamp() {
        let entry = Stamped::new("ctx", ModificationStamp::new(3));
        assert!(!entry.is_stale(ModificationStamp::new(3)));
        assert!(entry.is_stale(ModificationStamp::new(4)));
        assert_eq!(*entry.value(), "ctx");
    }

    proptest! {
        #[test]
        fn tracker_is_monotonic(bumps in 0usize..64) {
            let tracker = ModificationTracker::new();
            let mut last = tracker.current();
            for _ in 0..bumps {
                let next = tracker.bump();
                prop_assert!(next > last);
                last = next;
            }
            prop_assert_eq!(tracker.current().get(), bumps as u64);
        }
    }
}
