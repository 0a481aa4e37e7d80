use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Identity of an in-memory source fragment (scratch buffers, console cells, ...).
///
/// Fragments have no backing storage, so their ids are only meaningful for the
/// lifetime of the process that allocated them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FragmentId(u32);

impl FragmentId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// Allocates a process-unique fragment id.
    pub fn fresh() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Stable identity of a source file, used as the key of every cache tier.
///
/// Only [`SourceFileKey::Local`] files have a durable identity. Fragments are
/// never keys into the workspace-wide (global) caches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFileKey {
    /// A file backed by storage, identified by its lexically normalized path.
    Local(PathBuf),
    /// A pure in-memory fragment.
    Fragment(FragmentId),
}

impl SourceFileKey {
    /// Key for a file on disk. The path is normalized with [`normalize_local_path`].
    pub fn local(path: impl AsRef<Path>) -> Self {
        Self::Local(normalize_local_path(path.as_ref()))
    }

    #[inline]
    pub fn fragment(id: FragmentId) -> Self {
        Self::Fragment(id)
    }

    /// Returns the durable backing path, if the file has one.
    pub fn durable_path(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path),
            Self::Fragment(_) => None,
        }
    }

    #[inline]
    pub fn has_durable_identity(&self) -> bool {
        self.durable_path().is_some()
    }

    /// File extension of durable files (`None` for fragments).
    pub fn extension(&self) -> Option<&str> {
        self.durable_path()?.extension()?.to_str()
    }
}

impl fmt::Display for SourceFileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Fragment(id) => write!(f, "fragment:{}", id.to_raw()),
        }
    }
}

/// Lexically normalizes a local filesystem path (`.` and `..` segments).
///
/// This does not hit the filesystem and does not resolve symlinks. Leading `..`
/// segments of relative paths are preserved; `..` above a root is dropped.
pub fn normalize_local_path(path: &Path) -> PathBuf {
    let mut prefix: Option<OsString> = None;
    let mut has_root = false;
    let mut stack: Vec<OsString> = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix_component) => {
                prefix = Some(prefix_component.as_os_str().to_owned());
            }
            Component::RootDir => has_root = true,
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(last) = stack.last() {
                    if last != ".." {
                        stack.pop();
                        continue;
                    }
                }
                if !has_root {
                    stack.push(OsString::from(".."));
                }
            }
            Component::Normal(segment) => stack.push(segment.to_owned()),
        }
    }

    let mut out = PathBuf::new();
    if let Some(prefix) = prefix {
        out.push(prefix);
    }
    if has_root {
        out.push(std::path::MAIN_SEPARATOR.to_string());
    }
    out.extend(stack);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_keys_are_normalized() {
        let a = SourceFileKey::local("/ws/src/./pkg/../Main.kt");
        let b = SourceFileKey::local("/ws/src/Main.kt");
        assert_eq!(a, b);
        assert_eq!(a.extension(), Some("kt"));
    }

    #[test]
    fn relative_parent_segments_are_kept() {
        assert_eq!(
            normalize_local_path(Path::new("../a/./b/../c")),
            PathBuf::from("../a/c")
        );
    }

    #[test]
    fn fragments_have_no_durable_identity() {
        let key = SourceFileKey::fragment(FragmentId::from_raw(7));
        assert!(!key.has_durable_identity());
        assert_eq!(key.durable_path(), None);
        assert_eq!(key.extension(), None);
        assert_eq!(key.to_string(), "fragment:7");
    }

    #[test]
    fn fresh_fragment_ids_are_distinct() {
        let a = FragmentId::fresh();
        let b = FragmentId::fresh();
        assert_ne!(a, b);
    }
}
