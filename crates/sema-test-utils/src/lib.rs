//! Utilities shared by Sema tests.
//!
//! Provides an in-memory [`TestHost`] and a [`RecordingFactory`] whose caches
//! carry enough identity (build id, platform, stamp) for tests to tell builds
//! apart, and which count how many caches are still alive.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use sema_analysis::{
    BuildError, BuildRequest, BuildScope, ComputationContext, ResolutionCache,
    ResolutionCacheFactory, SearchScope, WorkspaceContext, WorkspaceHost, WorkspaceId,
};
use sema_core::{
    FragmentId, ModificationStamp, ModificationTracker, ModuleDescriptor, SourceElement,
    SourceFileKey, TargetPlatform, TextRange, TextSize,
};

/// In-memory workspace host.
///
/// Files default to [`TargetPlatform::Primary`] unless indexed or assigned
/// otherwise.
#[derive(Default)]
pub struct TestHost {
    tracker: ModificationTracker,
    indexed: RwLock<Vec<SourceFileKey>>,
    platforms: RwLock<HashMap<SourceFileKey, TargetPlatform>>,
    modules: RwLock<Vec<ModuleDescriptor>>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a durable file to the indexed scope.
    pub fn index_file(&self, path: &str, platform: TargetPlatform) -> SourceFileKey {
        let file = SourceFileKey::local(path);
        self.indexed.write().push(file.clone());
        self.platforms.write().insert(file.clone(), platform);
        file
    }

    pub fn set_platform(&self, file: &SourceFileKey, platform: TargetPlatform) {
        self.platforms.write().insert(file.clone(), platform);
    }

    pub fn add_module(&self, name: &str, platform: TargetPlatform) -> ModuleDescriptor {
        let module = ModuleDescriptor::new(name, platform);
        self.modules.write().push(module.clone());
        module
    }

    /// Simulates an edit outside of any function body.
    pub fn structural_edit(&self) -> ModificationStamp {
        self.tracker.bump()
    }

    pub fn stamp(&self) -> ModificationStamp {
        self.tracker.current()
    }
}

impl WorkspaceHost for TestHost {
    fn indexed_source_scope(&self) -> Arc<SearchScope> {
        Arc::new(SearchScope::from_files(self.indexed.read().iter().cloned()))
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

    fn in_scope_files(&self, platform: TargetPlatform) -> Vec<SourceFileKey> {
        let mut files: Vec<_> = self
            .indexed
            .read()
            .iter()
            .filter(|file| self.platform_of(file) == platform)
            .cloned()
            .collect();
        files.sort();
        files
    }

    fn modules(&self, platform: TargetPlatform) -> Vec<ModuleDescriptor> {
        self.modules
            .read()
            .iter()
            .filter(|module| module.platform == platform)
            .cloned()
            .collect()
    }
}

/// Session handed out by [`TestCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSession {
    pub cache: u64,
    pub platform: TargetPlatform,
    pub stamp: ModificationStamp,
    pub file: SourceFileKey,
    pub single_file: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestResults {
    pub cache: Option<u64>,
    pub elements: Vec<SourceElement>,
}

#[derive(Debug)]
pub struct TestCache {
    pub id: u64,
    pub request: BuildRequest,
    drops: Arc<AtomicUsize>,
}

impl ResolutionCache for TestCache {
    type Context = TestSession;
    type Results = TestResults;

    fn session_for(&self, file: &SourceFileKey) -> TestSession {
        TestSession {
            cache: self.id,
            platform: self.request.platform,
            stamp: self.request.stamp,
            file: file.clone(),
            single_file: matches!(self.request.scope, BuildScope::SingleFile(_)),
        }
    }

    fn session_for_module(&self, module: &ModuleDescriptor) -> Option<TestSession> {
        let BuildScope::Workspace { modules, .. } = &self.request.scope else {
            return None;
        };
        if !modules.contains(module) {
            return None;
        }
        Some(TestSession {
            cache: self.id,
            platform: self.request.platform,
            stamp: self.request.stamp,
            file: SourceFileKey::local(format!("/modules/{}", module.name)),
            single_file: false,
        })
    }

    fn results_for(&self, elements: &[SourceElement]) -> TestResults {
        TestResults {
            cache: Some(self.id),
            elements: elements.to_vec(),
        }
    }
}

impl Drop for TestCache {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::Relaxed);
    }
}

/// Factory that records every build request.
#[derive(Default)]
pub struct RecordingFactory {
    next_id: AtomicU64,
    requests: Mutex<Vec<BuildRequest>>,
    drops: Arc<AtomicUsize>,
    failing: Mutex<HashSet<SourceFileKey>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds covering `file` report a [`BuildError`] for it.
    pub fn fail_on(&self, file: &SourceFileKey) {
        self.failing.lock().insert(file.clone());
    }

    pub fn requests(&self) -> Vec<BuildRequest> {
        self.requests.lock().clone()
    }

    pub fn builds(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn workspace_builds(&self, platform: TargetPlatform) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.platform == platform && matches!(r.scope, BuildScope::Workspace { .. }))
            .count()
    }

    pub fn single_file_builds(&self) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| matches!(r.scope, BuildScope::SingleFile(_)))
            .count()
    }

    /// Caches built and not yet dropped.
    pub fn live_caches(&self) -> usize {
        self.builds()
            .saturating_sub(self.drops.load(Ordering::Relaxed))
    }
}

impl ResolutionCacheFactory for RecordingFactory {
    type Cache = TestCache;

    fn build(&self, ctx: &ComputationContext, request: &BuildRequest) -> TestCache {
        let covered: Vec<&SourceFileKey> = match &request.scope {
            BuildScope::Workspace { files, .. } => files.iter().collect(),
            BuildScope::SingleFile(file) => vec![file],
        };
        {
            let failing = self.failing.lock();
            for file in covered.into_iter().chain(&request.extra_files) {
                if failing.contains(file) {
                    ctx.report(BuildError::in_file(file.clone(), "injected build failure"));
                }
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(id, platform = %request.platform, "test factory build");
        self.requests.lock().push(request.clone());
        TestCache {
            id,
            request: request.clone(),
            drops: self.drops.clone(),
        }
    }
}

pub fn workspace(raw: u32, host: Arc<TestHost>) -> WorkspaceContext {
    WorkspaceContext::new(WorkspaceId::from_raw(raw), host)
}

pub fn fragment(raw: u32) -> SourceFileKey {
    SourceFileKey::fragment(FragmentId::from_raw(raw))
}

pub fn element(file: &SourceFileKey) -> SourceElement {
    SourceElement::new(
        file.clone(),
        TextRange::new(TextSize::from(0), TextSize::from(8)),
    )
}
