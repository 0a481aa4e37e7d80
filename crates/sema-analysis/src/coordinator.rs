use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use sema_core::{ModuleDescriptor, SourceElement, SourceFileKey, TargetPlatform};

use crate::error::{BuildError, CacheError, Result};
use crate::global::GlobalPlatformCacheSet;
use crate::host::{WorkspaceContext, WorkspaceId};
use crate::resolution::{ContextOf, ResolutionCache, ResolutionCacheFactory, ResultsOf};
use crate::scope::{FileScope, ScopeClassifier};
use crate::stats::CacheStats;
use crate::synthetic::SyntheticFileCachePool;

/// Typed key for a per-platform capability extension.
pub struct CapabilityKey<T: ?Sized> {
    name: &'static str,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> CapabilityKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: ?Sized> fmt::Debug for CapabilityKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapabilityKey").field(&self.name).finish()
    }
}

/// Session returned by [`CacheCoordinator::module_aware_session`] together with
/// the errors reported by its one-off build.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleAwareSession<T> {
    pub session: T,
    pub errors: Vec<BuildError>,
}

/// Per-workspace owner of the global and synthetic cache tiers.
///
/// Queries are routed by the containing file of the element: files in the
/// indexed source scope go to the global cache of their platform, everything
/// else (including every file without a durable identity) goes to the
/// synthetic pool.
pub struct CacheCoordinator<F: ResolutionCacheFactory> {
    workspace: WorkspaceContext,
    factory: Arc<F>,
    global: GlobalPlatformCacheSet<F>,
    synthetic: SyntheticFileCachePool<F>,
    empty_results: Arc<ResultsOf<F>>,
}

impl<F: ResolutionCacheFactory> CacheCoordinator<F> {
    pub fn new(workspace: WorkspaceContext, factory: Arc<F>) -> Self {
        let host = workspace.host().clone();
        tracing::info!(
            target = "sema.analysis",
            workspace = %workspace.id(),
            "opened analysis cache coordinator"
        );
        Self {
            global: GlobalPlatformCacheSet::new(host.clone(), factory.clone()),
            synthetic: SyntheticFileCachePool::new(host, factory.clone()),
            empty_results: Arc::default(),
            factory,
            workspace,
        }
    }

    pub fn workspace_id(&self) -> WorkspaceId {
        self.workspace.id()
    }

    /// Classifies `file` against the host's current indexed scope.
    pub fn classify(&self, file: &SourceFileKey) -> FileScope {
        let scope = self.workspace.host().indexed_source_scope();
        ScopeClassifier::classify(file, &scope)
    }

    /// Resolution session for the file containing `element`.
    pub fn resolution_context_for(&self, element: &SourceElement) -> ContextOf<F> {
        let file = element.containing_file();
        self.cache_for_file(file).session_for(file)
    }

    /// Batch analysis of `elements`.
    ///
    /// Routing is decided by the first element's file alone; the whole batch is
    /// handed to that cache. An empty batch returns a shared empty bundle
    /// without touching any cache.
    pub fn analysis_results(&self, elements: &[SourceElement]) -> Arc<ResultsOf<F>> {
        let Some(first) = elements.first() else {
            return self.empty_results.clone();
        };
        let cache = self.cache_for_file(first.containing_file());
        Arc::new(cache.results_for(elements))
    }

    /// Global-tier session for `file`, skipping the indexed-scope check.
    ///
    /// Files without a durable identity never key the global tier; they are
    /// served by the synthetic pool regardless of `platform`.
    pub fn global_resolution_context(
        &self,
        file: &SourceFileKey,
        platform: TargetPlatform,
    ) -> ContextOf<F> {
        if !file.has_durable_identity() {
            tracing::debug!(
                target = "sema.analysis",
                file = %file,
                platform = %platform,
                "fragment requested from global tier; serving from synthetic pool"
            );
            return self.synthetic.get(file).session_for(file);
        }
        self.global.session_for(file, platform)
    }

    /// Global-tier session for `module`, or `None` if the platform's global
    /// cache does not track it.
    pub fn global_module_context(
        &self,
        module: &ModuleDescriptor,
        platform: TargetPlatform,
    ) -> Option<ContextOf<F>> {
        self.global.session_for_module(module, platform)
    }

    /// Global session spanning several modules. Not wired up yet.
    pub fn global_session_for_modules(
        &self,
        modules: &[ModuleDescriptor],
        platform: TargetPlatform,
    ) -> Result<ContextOf<F>> {
        Err(CacheError::not_supported(format!(
            "global session for {} modules on {platform}",
            modules.len()
        )))
    }

    /// Per-platform capability lookup. No capabilities exist yet, so this
    /// always fails with [`CacheError::NotSupported`].
    pub fn capability<T: ?Sized>(
        &self,
        key: &CapabilityKey<T>,
        platform: TargetPlatform,
    ) -> Result<Arc<T>> {
        Err(CacheError::not_supported(format!(
            "capability `{}` for {platform}",
            key.name()
        )))
    }

    /// Analyzes a file outside the indexed scope as part of a full workspace
    /// session for its platform.
    ///
    /// The session is built on every call and not cached, so this costs a whole
    /// global build. Errors from that build come back with the session.
    pub fn module_aware_session(
        &self,
        file: &SourceFileKey,
    ) -> ModuleAwareSession<ContextOf<F>> {
        let host = self.workspace.host();
        let platform = host.platform_of(file);
        let caches = GlobalPlatformCacheSet::with_extra_files(
            host.clone(),
            self.factory.clone(),
            vec![file.clone()],
        );
        let session = caches.session_for(file, platform);
        ModuleAwareSession {
            session,
            errors: caches.build_errors(platform),
        }
    }

    /// Errors collected while building the current global cache for `platform`.
    pub fn build_errors(&self, platform: TargetPlatform) -> Vec<BuildError> {
        self.global.build_errors(platform)
    }

    /// Errors collected while building the resident synthetic cache for `file`.
    pub fn synthetic_build_errors(&self, file: &SourceFileKey) -> Vec<BuildError> {
        self.synthetic.build_errors(file)
    }

    pub fn global_caches(&self) -> &GlobalPlatformCacheSet<F> {
        &self.global
    }

    pub fn synthetic_pool(&self) -> &SyntheticFileCachePool<F> {
        &self.synthetic
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            global_builds: TargetPlatform::ALL
                .into_iter()
                .map(|platform| (platform, self.global.build_count(platform)))
                .collect(),
            synthetic: self.synthetic.stats(),
        }
    }

    /// Tears down both tiers. Later queries rebuild on demand.
    pub fn close(&self) {
        self.global.clear();
        self.synthetic.clear();
        tracing::info!(
            target = "sema.analysis",
            workspace = %self.workspace.id(),
            "closed analysis cache coordinator"
        );
    }

    fn cache_for_file(&self, file: &SourceFileKey) -> Arc<F::Cache> {
        match self.classify(file) {
            FileScope::InScope => {
                let platform = self.workspace.host().platform_of(file);
                self.global.cache_for(platform)
            }
            FileScope::Synthetic => self.synthetic.get(file),
        }
    }
}

impl<F: ResolutionCacheFactory> fmt::Debug for CacheCoordinator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheCoordinator")
            .field("workspace", &self.workspace)
            .field("global", &self.global)
            .field("synthetic", &self.synthetic)
            .finish_non_exhaustive()
    }
}
