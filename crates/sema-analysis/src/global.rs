//! Workspace-wide resolution caches, one per target platform.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use sema_core::{ModificationStamp, ModuleDescriptor, SourceFileKey, Stamped, TargetPlatform};

use crate::error::BuildError;
use crate::host::WorkspaceHost;
use crate::resolution::{
    BuildRequest, BuildScope, ComputationContext, ContextOf, ResolutionCache,
    ResolutionCacheFactory,
};

struct GlobalEntry<C> {
    cache: Stamped<Arc<C>>,
    context: Arc<ComputationContext>,
}

struct PlatformSlot<C> {
    current: RwLock<Option<GlobalEntry<C>>>,
    builds: AtomicU64,
}

impl<C> Default for PlatformSlot<C> {
    fn default() -> Self {
        Self {
            current: RwLock::new(None),
            builds: AtomicU64::new(0),
        }
    }
}

/// One lazily built [`ResolutionCache`] per [`TargetPlatform`] for the whole
/// in-scope source set.
///
/// Every access compares the slot's stamp with the host's current
/// [`ModificationStamp`] and rebuilds on mismatch. Since the stamp is shared by
/// all platforms, a structural edit invalidates every platform at once; each
/// platform is then rebuilt independently on its next access.
///
/// Builds run without holding any lock. Concurrent accessors that all observe a
/// stale slot may each build; the first result installed for a stamp wins and
/// later ones are dropped.
pub struct GlobalPlatformCacheSet<F: ResolutionCacheFactory> {
    host: Arc<dyn WorkspaceHost>,
    factory: Arc<F>,
    extra_files: Vec<SourceFileKey>,
    slots: [PlatformSlot<F::Cache>; TargetPlatform::COUNT],
}

impl<F: ResolutionCacheFactory> GlobalPlatformCacheSet<F> {
    pub fn new(host: Arc<dyn WorkspaceHost>, factory: Arc<F>) -> Self {
        Self::with_extra_files(host, factory, Vec::new())
    }

    /// Like [`GlobalPlatformCacheSet::new`], but every build also merges
    /// `extra_files` into the session, so out-of-scope files can be analyzed
    /// against the full module set.
    pub fn with_extra_files(
        host: Arc<dyn WorkspaceHost>,
        factory: Arc<F>,
        extra_files: Vec<SourceFileKey>,
    ) -> Self {
        Self {
            host,
            factory,
            extra_files,
            slots: Default::default(),
        }
    }

    /// Returns an up-to-date cache for `platform`, building it if missing or stale.
    pub fn cache_for(&self, platform: TargetPlatform) -> Arc<F::Cache> {
        let current = self.host.modification_stamp();
        let slot = &self.slots[platform.index()];

        if let Some(entry) = slot.current.read().as_ref() {
            if !entry.cache.is_stale(current) {
                return entry.cache.value().clone();
            }
        }

        let fresh = self.build(platform, current);

        let mut guard = slot.current.write();
        if let Some(existing) = guard.as_ref() {
            // Another accessor raced us to an equal or newer stamp.
            if existing.cache.stamp() >= fresh.cache.stamp() {
                return existing.cache.value().clone();
            }
        }
        let cache = fresh.cache.value().clone();
        *guard = Some(fresh);
        cache
    }

    pub fn session_for(&self, file: &SourceFileKey, platform: TargetPlatform) -> ContextOf<F> {
        self.cache_for(platform).session_for(file)
    }

    pub fn session_for_module(
        &self,
        module: &ModuleDescriptor,
        platform: TargetPlatform,
    ) -> Option<ContextOf<F>> {
        self.cache_for(platform).session_for_module(module)
    }

    /// The installed cache for `platform`, without staleness checks or builds.
    pub fn peek(&self, platform: TargetPlatform) -> Option<Arc<F::Cache>> {
        self.slots[platform.index()]
            .current
            .read()
            .as_ref()
            .map(|entry| entry.cache.value().clone())
    }

    /// Stamp of the installed cache for `platform`.
    pub fn installed_stamp(&self, platform: TargetPlatform) -> Option<ModificationStamp> {
        self.slots[platform.index()]
            .current
            .read()
            .as_ref()
            .map(|entry| entry.cache.stamp())
    }

    /// Errors collected while building the installed cache for `platform`.
    pub fn build_errors(&self, platform: TargetPlatform) -> Vec<BuildError> {
        self.slots[platform.index()]
            .current
            .read()
            .as_ref()
            .map(|entry| entry.context.errors())
            .unwrap_or_default()
    }

    /// Number of builds performed for `platform`, including racing duplicates.
    pub fn build_count(&self, platform: TargetPlatform) -> u64 {
        self.slots[platform.index()].builds.load(Ordering::Relaxed)
    }

    /// Drops every installed cache.
    pub fn clear(&self) {
        for slot in &self.slots {
            slot.current.write().take();
        }
    }

    fn build(&self, platform: TargetPlatform, stamp: ModificationStamp) -> GlobalEntry<F::Cache> {
        let context = Arc::new(ComputationContext::new());
        let request = BuildRequest {
            platform,
            stamp,
            scope: BuildScope::Workspace {
                files: self.host.in_scope_files(platform),
                modules: self.host.modules(platform),
            },
            extra_files: self.extra_files.clone(),
        };

        let cache = self.factory.build(&context, &request);
        self.slots[platform.index()]
            .builds
            .fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            target = "sema.analysis",
            platform = %platform,
            stamp = stamp.get(),
            computation = context.id(),
            extra_files = self.extra_files.len(),
            errors = context.error_count(),
            "built global resolution cache"
        );

        GlobalEntry {
            cache: Stamped::new(Arc::new(cache), stamp),
            context,
        }
    }
}

impl<F: ResolutionCacheFactory> fmt::Debug for GlobalPlatformCacheSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("GlobalPlatformCacheSet");
        for platform in TargetPlatform::ALL {
            dbg.field(platform.as_str(), &self.installed_stamp(platform));
        }
        dbg.field("extra_files", &self.extra_files).finish()
    }
}
