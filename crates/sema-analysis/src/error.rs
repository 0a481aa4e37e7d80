use sema_core::SourceFileKey;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors surfaced by the cache coordination layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The operation is a placeholder and is not wired up yet.
    ///
    /// Not a transient condition: retrying will fail the same way.
    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },
}

impl CacheError {
    pub(crate) fn not_supported(operation: impl Into<String>) -> Self {
        CacheError::NotSupported {
            operation: operation.into(),
        }
    }
}

/// A failure reported by a [`ResolutionCacheFactory`] while building a cache.
///
/// Build failures are collected on the [`ComputationContext`] of the build
/// rather than returned to the caller that triggered it.
///
/// [`ResolutionCacheFactory`]: crate::ResolutionCacheFactory
/// [`ComputationContext`]: crate::ComputationContext
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BuildError {
    pub file: Option<SourceFileKey>,
    pub message: String,
}

impl BuildError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            file: None,
            message: message.into(),
        }
    }

    pub fn in_file(file: SourceFileKey, message: impl Into<String>) -> Self {
        Self {
            file: Some(file),
            message: message.into(),
        }
    }
}
