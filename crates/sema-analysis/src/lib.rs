//! Semantic-analysis cache coordination for Sema.
//!
//! This crate decides *which* resolution cache answers a query; computing the
//! answer is the job of a [`ResolutionCacheFactory`] supplied by the host.
//!
//! - [`GlobalPlatformCacheSet`]: one workspace-wide cache per [`TargetPlatform`],
//!   rebuilt lazily whenever the workspace [`ModificationStamp`] moves.
//! - [`SyntheticFileCachePool`]: a small segmented-LRU pool of single-file caches
//!   for files outside the indexed source scope (scratch buffers, fragments).
//! - [`CacheCoordinator`]: per-workspace owner of both tiers and the public
//!   query surface. Coordinators are built from an explicit [`WorkspaceContext`]
//!   and torn down with [`CacheCoordinator::close`].
//! - [`CoordinatorRegistry`]: host-owned map from workspace to coordinator.
//!
//! [`TargetPlatform`]: sema_core::TargetPlatform
//! [`ModificationStamp`]: sema_core::ModificationStamp

mod coordinator;
mod error;
#[cfg(test)]
mod fakes;
mod global;
mod host;
mod registry;
mod resolution;
mod scope;
mod stats;
mod synthetic;

pub use coordinator::{CacheCoordinator, CapabilityKey, ModuleAwareSession};
pub use error::{BuildError, CacheError, Result};
pub use global::GlobalPlatformCacheSet;
pub use host::{SearchScope, WorkspaceContext, WorkspaceHost, WorkspaceId};
pub use registry::CoordinatorRegistry;
pub use resolution::{
    BuildRequest, BuildScope, ComputationContext, ContextOf, ResolutionCache,
    ResolutionCacheFactory, ResultsOf,
};
pub use scope::{FileScope, ScopeClassifier};
pub use stats::{CacheStats, SyntheticStats};
pub use synthetic::{
    SyntheticFileCachePool, SyntheticPoolSnapshot, PROBATIONARY_CAPACITY, PROTECTED_CAPACITY,
};
