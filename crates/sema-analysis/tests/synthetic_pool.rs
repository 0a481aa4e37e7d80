use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sema_analysis::{
    SyntheticFileCachePool, SyntheticPoolSnapshot, PROBATIONARY_CAPACITY, PROTECTED_CAPACITY,
};
use sema_test_utils::{fragment, RecordingFactory, TestHost};

fn pool() -> (Arc<RecordingFactory>, SyntheticFileCachePool<RecordingFactory>) {
    let factory = Arc::new(RecordingFactory::new());
    let pool = SyntheticFileCachePool::new(Arc::new(TestHost::new()), factory.clone());
    (factory, pool)
}

#[test]
fn capacities_bound_resident_entries_to_five() {
    assert_eq!(PROBATIONARY_CAPACITY + PROTECTED_CAPACITY, 5);
}

#[test]
fn first_accesses_stay_probationary() {
    let (_factory, pool) = pool();
    for raw in 1..=5 {
        pool.get(&fragment(raw));
    }

    // Without repeats nothing is promoted, so only the two newest survive.
    assert_eq!(
        pool.snapshot(),
        SyntheticPoolSnapshot {
            probationary: vec![fragment(4), fragment(5)],
            protected: vec![],
        }
    );
    assert_eq!(pool.stats().evictions, 3);
}

#[test]
fn sixth_file_evicts_probationary_lru_before_touching_protected() {
    let (factory, pool) = pool();

    // Fill protected with F1..F3 and probationary with F4, F5.
    for raw in 1..=3 {
        pool.get(&fragment(raw));
        pool.get(&fragment(raw));
    }
    pool.get(&fragment(4));
    pool.get(&fragment(5));
    assert_eq!(pool.len(), 5);
    assert_eq!(factory.live_caches(), 5);

    pool.get(&fragment(6));

    assert_eq!(
        pool.snapshot(),
        SyntheticPoolSnapshot {
            probationary: vec![fragment(5), fragment(6)],
            protected: vec![fragment(1), fragment(2), fragment(3)],
        }
    );
    assert_eq!(pool.len(), 5);
    assert_eq!(factory.live_caches(), 5);
    assert_eq!(pool.stats().evictions, 1);
}

#[test]
fn promotion_into_full_protected_evicts_protected_lru() {
    let (_factory, pool) = pool();
    for raw in 1..=3 {
        pool.get(&fragment(raw));
        pool.get(&fragment(raw));
    }
    pool.get(&fragment(4));
    pool.get(&fragment(4));

    let snapshot = pool.snapshot();
    assert_eq!(
        snapshot.protected,
        vec![fragment(2), fragment(3), fragment(4)]
    );
    assert!(snapshot.probationary.is_empty());
    assert!(!pool.contains(&fragment(1)));
}

#[test]
fn evicted_file_is_rebuilt_on_next_access() {
    let (factory, pool) = pool();
    let first = pool.get(&fragment(1)).id;
    pool.get(&fragment(2));
    pool.get(&fragment(3));
    assert!(!pool.contains(&fragment(1)));

    let again = pool.get(&fragment(1)).id;
    assert_ne!(first, again);
    assert_eq!(factory.single_file_builds(), 4);
}

#[test]
fn build_errors_follow_the_entry_until_eviction() {
    let (factory, pool) = pool();
    let broken = fragment(1);
    factory.fail_on(&broken);

    pool.get(&broken);
    pool.get(&broken);
    assert_eq!(pool.snapshot().protected, vec![broken.clone()]);
    assert_eq!(pool.build_errors(&broken).len(), 1);
    assert_eq!(pool.stats().hits, 1);

    for raw in 2..=4 {
        pool.get(&fragment(raw));
        pool.get(&fragment(raw));
    }
    assert!(!pool.contains(&broken));
    assert!(pool.build_errors(&broken).is_empty());
}

#[test]
fn clear_disposes_resident_caches() {
    let (factory, pool) = pool();
    pool.get(&fragment(1));
    pool.get(&fragment(2));
    pool.clear();

    assert!(pool.is_empty());
    assert_eq!(factory.live_caches(), 0);
}

proptest! {
    #[test]
    fn pool_never_exceeds_capacity(accesses in prop::collection::vec(0u32..10, 0..64)) {
        let (factory, pool) = pool();
        for raw in accesses {
            let file = fragment(raw);
            let cache = pool.get(&file);
            prop_assert_eq!(cache.request.scope.clone(), sema_analysis::BuildScope::SingleFile(file.clone()));
            drop(cache);

            let snapshot = pool.snapshot();
            prop_assert!(snapshot.probationary.len() <= PROBATIONARY_CAPACITY);
            prop_assert!(snapshot.protected.len() <= PROTECTED_CAPACITY);
            prop_assert!(pool.contains(&file));
            prop_assert_eq!(factory.live_caches(), pool.len());
        }
    }
}
