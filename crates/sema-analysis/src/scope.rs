use sema_core::SourceFileKey;

use crate::host::SearchScope;

/// Which cache tier a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileScope {
    /// Part of the indexed workspace sources; served by the global tier.
    InScope,
    /// Ephemeral or out-of-index; served by the synthetic pool.
    Synthetic,
}

/// Classifies files against a workspace scope snapshot. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeClassifier;

impl ScopeClassifier {
    /// Files without a durable identity are never in scope.
    pub fn is_in_scope(file: &SourceFileKey, scope: &SearchScope) -> bool {
        file.has_durable_identity() && scope.contains(file)
    }

    pub fn classify(file: &SourceFileKey, scope: &SearchScope) -> FileScope {
        if Self::is_in_scope(file, scope) {
            FileScope::InScope
        } else {
            FileScope::Synthetic
        }
    }
}
