//! Bounded pool of single-file resolution caches for files outside the indexed scope.

use std::fmt;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use sema_core::SourceFileKey;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::host::WorkspaceHost;
use crate::resolution::{BuildRequest, BuildScope, ComputationContext, ResolutionCacheFactory};
use crate::stats::SyntheticStats;

/// Capacity of the segment that receives newly created entries.
pub const PROBATIONARY_CAPACITY: usize = 2;
/// Capacity of the segment holding entries that were accessed more than once.
pub const PROTECTED_CAPACITY: usize = 3;

/// Segment contents ordered from least to most recently used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticPoolSnapshot {
    pub probationary: Vec<SourceFileKey>,
    pub protected: Vec<SourceFileKey>,
}

impl SyntheticPoolSnapshot {
    pub fn len(&self) -> usize {
        self.probationary.len() + self.protected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct SyntheticEntry<C> {
    cache: Arc<C>,
    context: Arc<ComputationContext>,
}

struct Segments<C> {
    probationary: LruCache<SourceFileKey, SyntheticEntry<C>>,
    protected: LruCache<SourceFileKey, SyntheticEntry<C>>,
    hits: u64,
    misses: u64,
    promotions: u64,
    evictions: u64,
}

/// Segmented-LRU pool of single-file [`ResolutionCache`]s.
///
/// New entries land in the probationary segment; a second access promotes an
/// entry to the protected segment. Each segment evicts its own least recently
/// used entry when it overflows, and protected entries are never demoted, so
/// at most [`PROBATIONARY_CAPACITY`] + [`PROTECTED_CAPACITY`] caches are
/// resident at any time.
///
/// Lookup, promotion, construction and eviction all happen under one pool-wide
/// mutex. Building a cache can be slow and blocks other synthetic queries; it
/// also guarantees a file is never built twice by racing callers.
///
/// [`ResolutionCache`]: crate::ResolutionCache
pub struct SyntheticFileCachePool<F: ResolutionCacheFactory> {
    host: Arc<dyn WorkspaceHost>,
    factory: Arc<F>,
    segments: Mutex<Segments<F::Cache>>,
}

impl<F: ResolutionCacheFactory> SyntheticFileCachePool<F> {
    pub fn new(host: Arc<dyn WorkspaceHost>, factory: Arc<F>) -> Self {
        Self {
            host,
            factory,
            segments: Mutex::new(Segments {
                probationary: LruCache::unbounded(),
                protected: LruCache::unbounded(),
                hits: 0,
                misses: 0,
                promotions: 0,
                evictions: 0,
            }),
        }
    }

    /// Returns the cache for `file`, creating it on first use.
    pub fn get(&self, file: &SourceFileKey) -> Arc<F::Cache> {
        let mut segments = self.segments.lock();
        let segments = &mut *segments;

        if let Some(entry) = segments.protected.get(file) {
            let cache = entry.cache.clone();
            segments.hits += 1;
            return cache;
        }

        if let Some(entry) = segments.probationary.pop(file) {
            let cache = entry.cache.clone();
            segments.hits += 1;
            segments.promotions += 1;
            segments.protected.put(file.clone(), entry);
            segments.evictions +=
                evict_overflow(&mut segments.protected, PROTECTED_CAPACITY, "protected");
            tracing::trace!(target = "sema.analysis", file = %file, "promoted synthetic cache");
            return cache;
        }

        segments.misses += 1;
        let entry = self.build(file);
        let cache = entry.cache.clone();
        segments.probationary.put(file.clone(), entry);
        segments.evictions +=
            evict_overflow(&mut segments.probationary, PROBATIONARY_CAPACITY, "probationary");
        cache
    }

    /// Whether `file` is resident. Does not count as an access.
    pub fn contains(&self, file: &SourceFileKey) -> bool {
        let segments = self.segments.lock();
        segments.probationary.contains(file) || segments.protected.contains(file)
    }

    /// Errors reported while building the resident cache for `file`. Empty if
    /// `file` is not resident. Does not count as an access.
    pub fn build_errors(&self, file: &SourceFileKey) -> Vec<BuildError> {
        let segments = self.segments.lock();
        segments
            .protected
            .peek(file)
            .or_else(|| segments.probationary.peek(file))
            .map(|entry| entry.context.errors())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        let segments = self.segments.lock();
        segments.probationary.len() + segments.protected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> SyntheticPoolSnapshot {
        let segments = self.segments.lock();
        SyntheticPoolSnapshot {
            probationary: segments.probationary.iter().rev().map(|(k, _)| k.clone()).collect(),
            protected: segments.protected.iter().rev().map(|(k, _)| k.clone()).collect(),
        }
    }

    pub fn stats(&self) -> SyntheticStats {
        let segments = self.segments.lock();
        SyntheticStats {
            hits: segments.hits,
            misses: segments.misses,
            promotions: segments.promotions,
            evictions: segments.evictions,
            resident: segments.probationary.len() + segments.protected.len(),
        }
    }

    /// Drops every resident cache. Counters are kept.
    pub fn clear(&self) {
        let mut segments = self.segments.lock();
        segments.probationary.clear();
        segments.protected.clear();
    }

    fn build(&self, file: &SourceFileKey) -> SyntheticEntry<F::Cache> {
        let platform = self.host.platform_of(file);
        let stamp = self.host.modification_stamp();
        let context = Arc::new(ComputationContext::new());
        let request = BuildRequest {
            platform,
            stamp,
            scope: BuildScope::SingleFile(file.clone()),
            extra_files: Vec::new(),
        };

        let cache = self.factory.build(&context, &request);
        tracing::debug!(
            target = "sema.analysis",
            file = %file,
            platform = %platform,
            computation = context.id(),
            errors = context.error_count(),
            "built synthetic resolution cache"
        );
        SyntheticEntry {
            cache: Arc::new(cache),
            context,
        }
    }
}

fn evict_overflow<V>(
    segment: &mut LruCache<SourceFileKey, V>,
    capacity: usize,
    name: &'static str,
) -> u64 {
    let mut evicted = 0;
    while segment.len() > capacity {
        let Some((file, _entry)) = segment.pop_lru() else {
            break;
        };
        tracing::debug!(
            target = "sema.analysis",
            file = %file,
            segment = name,
            "evicted synthetic resolution cache"
        );
        evicted += 1;
    }
    evicted
}

impl<F: ResolutionCacheFactory> fmt::Debug for SyntheticFileCachePool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntheticFileCachePool")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
