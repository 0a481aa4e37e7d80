//! Interfaces of the resolution engine this layer manages but does not implement.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use sema_core::{ModificationStamp, ModuleDescriptor, SourceElement, SourceFileKey, TargetPlatform};

use crate::error::BuildError;

/// A built, immutable resolution cache for some set of files/modules.
///
/// Implementations compute lazily and internally; this layer only decides which
/// instance answers a query and when an instance is replaced.
pub trait ResolutionCache: Send + Sync + 'static {
    /// Per-file resolution session handed back to callers.
    type Context: Clone + Send + Sync + 'static;
    /// Batch analysis results. `Default` is the empty bundle.
    type Results: Default + Send + Sync + 'static;

    fn session_for(&self, file: &SourceFileKey) -> Self::Context;

    /// `None` if the cache does not track `module`.
    fn session_for_module(&self, module: &ModuleDescriptor) -> Option<Self::Context>;

    fn results_for(&self, elements: &[SourceElement]) -> Self::Results;
}

/// Builds [`ResolutionCache`]s. Performs the actual semantic analysis.
pub trait ResolutionCacheFactory: Send + Sync + 'static {
    type Cache: ResolutionCache;

    /// Builds a cache for `request`.
    ///
    /// Failures are reported into `ctx` and the factory still returns a
    /// (possibly partial) cache.
    fn build(&self, ctx: &ComputationContext, request: &BuildRequest) -> Self::Cache;
}

pub type ContextOf<F> =
    <<F as ResolutionCacheFactory>::Cache as ResolutionCache>::Context;
pub type ResultsOf<F> =
    <<F as ResolutionCacheFactory>::Cache as ResolutionCache>::Results;

/// What a build should cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildScope {
    /// The workspace's whole in-scope source set for one platform.
    Workspace {
        files: Vec<SourceFileKey>,
        modules: Vec<ModuleDescriptor>,
    },
    /// Exactly one file outside the indexed scope.
    SingleFile(SourceFileKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub platform: TargetPlatform,
    pub stamp: ModificationStamp,
    pub scope: BuildScope,
    /// Synthetic files analyzed as part of a workspace session.
    pub extra_files: Vec<SourceFileKey>,
}

/// Per-build context that collects errors raised while building a cache.
///
/// The errors are inspected collectively by the host after the fact; they are
/// never propagated to the query that happened to trigger the build.
#[derive(Debug)]
pub struct ComputationContext {
    id: u64,
    errors: Mutex<Vec<BuildError>>,
}

impl ComputationContext {
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            errors: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn report(&self, error: BuildError) {
        self.errors.lock().push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.lock().is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().len()
    }

    /// Snapshot of the errors reported so far, in report order.
    pub fn errors(&self) -> Vec<BuildError> {
        self.errors.lock().clone()
    }
}

impl Default for ComputationContext {
    fn default() -> Self {
        Self::new()
    }
}
