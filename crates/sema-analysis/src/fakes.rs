//! Minimal in-crate collaborators for unit tests. Integration tests use
//! `sema-test-utils` instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use sema_core::{
    ModificationStamp, ModificationTracker, ModuleDescriptor, SourceElement, SourceFileKey,
    TargetPlatform,
};

use crate::host::{SearchScope, WorkspaceHost};
use crate::resolution::{
    BuildRequest, BuildScope, ComputationContext, ResolutionCache, ResolutionCacheFactory,
};

#[derive(Default)]
pub(crate) struct FakeHost {
    pub(crate) tracker: ModificationTracker,
    pub(crate) scope: RwLock<Arc<SearchScope>>,
    pub(crate) platforms: RwLock<HashMap<SourceFileKey, TargetPlatform>>,
}

impl FakeHost {
    pub(crate) fn with_scope(files: impl IntoIterator<Item = SourceFileKey>) -> Self {
        let host = Self::default();
        *host.scope.write() = Arc::new(SearchScope::from_files(files));
        host
    }
}

impl WorkspaceHost for FakeHost {
    fn indexed_source_scope(&self) -> Arc<SearchScope> {
        self.scope.read().clone()
    }

    fn modification_stamp(&self) -> ModificationStamp {
        self.tracker.current()
    }

    fn platform_of(&self, file: &SourceFileKey) -> TargetPlatform {
        self.platforms
            .read()
            .get(file)
            .copied()
            .unwrap_or(TargetPlatform::Primary)
    }

    fn in_scope_files(&self, _platform: TargetPlatform) -> Vec<SourceFileKey> {
        self.scope.read().iter().cloned().collect()
    }

    fn modules(&self, platform: TargetPlatform) -> Vec<ModuleDescriptor> {
        vec![ModuleDescriptor::new("main", platform)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeContext {
    pub(crate) cache: u64,
    pub(crate) file: SourceFileKey,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FakeResults {
    pub(crate) cache: u64,
    pub(crate) elements: usize,
}

#[derive(Debug)]
pub(crate) struct FakeCache {
    pub(crate) id: u64,
    pub(crate) request: BuildRequest,
}

impl ResolutionCache for FakeCache {
    type Context = FakeContext;
    type Results = FakeResults;

    fn session_for(&self, file: &SourceFileKey) -> FakeContext {
        FakeContext {
            cache: self.id,
            file: file.clone(),
        }
    }

    fn session_for_module(&self, module: &ModuleDescriptor) -> Option<FakeContext> {
        match &self.request.scope {
            BuildScope::Workspace { modules, .. } if modules.contains(module) => Some(FakeContext {
                cache: self.id,
                file: SourceFileKey::local(format!("/modules/{}", module.name)),
            }),
            _ => None,
        }
    }

    fn results_for(&self, elements: &[SourceElement]) -> FakeResults {
        FakeResults {
            cache: self.id,
            elements: elements.len(),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeFactory {
    next_id: AtomicU64,
    requests: Mutex<Vec<BuildRequest>>,
}

impl FakeFactory {
    pub(crate) fn builds(&self) -> usize {
        self.requests.lock().len()
    }

    pub(crate) fn last_request(&self) -> Option<BuildRequest> {
        self.requests.lock().last().cloned()
    }
}

impl ResolutionCacheFactory for FakeFactory {
    type Cache = FakeCache;

    fn build(&self, _ctx: &ComputationContext, request: &BuildRequest) -> FakeCache {
        self.requests.lock().push(request.clone());
        FakeCache {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            request: request.clone(),
        }
    }
}

pub(crate) fn fragment(raw: u32) -> SourceFileKey {
    SourceFileKey::fragment(sema_core::FragmentId::from_raw(raw))
}
