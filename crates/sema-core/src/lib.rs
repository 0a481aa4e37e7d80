//! Core shared types for Sema.
//!
//! This crate is intentionally small: it defines the vocabulary shared by the
//! analysis cache layer and its hosts (file identities, source elements,
//! target platforms and modification stamps) without depending on any of them.

mod file;
mod platform;
mod stamp;

pub use file::{normalize_local_path, FragmentId, SourceFileKey};
pub use platform::TargetPlatform;
pub use stamp::{ModificationStamp, ModificationTracker, Stamped};
pub use text_size::{TextRange, TextSize};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A syntactic unit of source code supplied to a query.
///
/// Elements only carry the identity of their containing file and their span in
/// it; the text itself is owned by whoever produced the element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceElement {
    pub file: SourceFileKey,
    pub range: TextRange,
}

impl SourceElement {
    #[inline]
    pub fn new(file: SourceFileKey, range: TextRange) -> Self {
        Self { file, range }
    }

    /// An element spanning the whole of `file` up to `len`.
    pub fn whole_file(file: SourceFileKey, len: u32) -> Self {
        Self {
            file,
            range: TextRange::up_to(TextSize::from(len)),
        }
    }

    #[inline]
    pub fn containing_file(&self) -> &SourceFileKey {
        &self.file
    }
}

/// A named module as tracked by the workspace for a single target platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: SmolStr,
    pub platform: TargetPlatform,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<SmolStr>, platform: TargetPlatform) -> Self {
        Self {
            name: name.into(),
            platform,
        }
    }
}
