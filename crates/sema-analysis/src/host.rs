use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use sema_core::{ModificationStamp, ModuleDescriptor, SourceFileKey, TargetPlatform};
use serde::{Deserialize, Serialize};

/// Identity of an open workspace session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkspaceId(u32);

impl WorkspaceId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workspace#{}", self.0)
    }
}

/// The indexed, target-language source set of a workspace.
///
/// Only files with a durable identity can be members; fragments are dropped on
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchScope {
    files: HashSet<SourceFileKey>,
}

impl SearchScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files(files: impl IntoIterator<Item = SourceFileKey>) -> Self {
        Self {
            files: files
                .into_iter()
                .filter(SourceFileKey::has_durable_identity)
                .collect(),
        }
    }

    /// Narrows the scope, e.g. to drop library binaries or other-language files.
    pub fn filter(self, mut keep: impl FnMut(&SourceFileKey) -> bool) -> Self {
        Self {
            files: self.files.into_iter().filter(|file| keep(file)).collect(),
        }
    }

    pub fn contains(&self, file: &SourceFileKey) -> bool {
        self.files.contains(file)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFileKey> {
        self.files.iter()
    }
}

/// Everything the cache layer needs to know about the workspace it serves.
///
/// Implemented by the host environment (project model, index, VFS). All methods
/// are expected to be cheap snapshot reads; they may be called on every query.
pub trait WorkspaceHost: Send + Sync {
    /// The indexed target-language source scope, already filtered to exclude
    /// non-source files.
    fn indexed_source_scope(&self) -> Arc<SearchScope>;

    /// Current structural modification stamp.
    fn modification_stamp(&self) -> ModificationStamp;

    /// The platform a file compiles for.
    fn platform_of(&self, file: &SourceFileKey) -> TargetPlatform;

    /// In-scope files that participate in the global build for `platform`.
    fn in_scope_files(&self, platform: TargetPlatform) -> Vec<SourceFileKey>;

    /// Modules tracked for `platform`.
    fn modules(&self, platform: TargetPlatform) -> Vec<ModuleDescriptor>;
}

/// Explicit per-session workspace value handed to every component.
///
/// Created when a workspace session starts and dropped when it closes; there is
/// no ambient lookup.
#[derive(Clone)]
pub struct WorkspaceContext {
    id: WorkspaceId,
    host: Arc<dyn WorkspaceHost>,
}

impl WorkspaceContext {
    pub fn new(id: WorkspaceId, host: Arc<dyn WorkspaceHost>) -> Self {
        Self { id, host }
    }

    #[inline]
    pub fn id(&self) -> WorkspaceId {
        self.id
    }

    #[inline]
    pub fn host(&self) -> &Arc<dyn WorkspaceHost> {
        &self.host
    }
}

impl fmt::Debug for WorkspaceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceContext")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
