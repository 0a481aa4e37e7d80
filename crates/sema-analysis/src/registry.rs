use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::coordinator::CacheCoordinator;
use crate::host::{WorkspaceContext, WorkspaceId};
use crate::resolution::ResolutionCacheFactory;

/// Host-owned map from open workspace sessions to their coordinators.
///
/// The registry is an ordinary value: the host creates it once, hands it the
/// factory shared by all workspaces, and closes sessions explicitly.
pub struct CoordinatorRegistry<F: ResolutionCacheFactory> {
    factory: Arc<F>,
    coordinators: Mutex<HashMap<WorkspaceId, Arc<CacheCoordinator<F>>>>,
}

impl<F: ResolutionCacheFactory> CoordinatorRegistry<F> {
    pub fn new(factory: Arc<F>) -> Self {
        Self {
            factory,
            coordinators: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the coordinator of `workspace`, creating it on first use.
    pub fn get_or_create(&self, workspace: &WorkspaceContext) -> Arc<CacheCoordinator<F>> {
        self.coordinators
            .lock()
            .entry(workspace.id())
            .or_insert_with(|| {
                Arc::new(CacheCoordinator::new(
                    workspace.clone(),
                    self.factory.clone(),
                ))
            })
            .clone()
    }

    pub fn get(&self, id: WorkspaceId) -> Option<Arc<CacheCoordinator<F>>> {
        self.coordinators.lock().get(&id).cloned()
    }

    /// Removes and tears down the coordinator of `id`.
    ///
    /// Returns `false` if no session was open for `id`.
    pub fn close(&self, id: WorkspaceId) -> bool {
        let removed = self.coordinators.lock().remove(&id);
        match removed {
            Some(coordinator) => {
                coordinator.close();
                true
            }
            None => false,
        }
    }

    /// Tears down every open session.
    pub fn close_all(&self) {
        let drained: Vec<_> = self.coordinators.lock().drain().map(|(_, c)| c).collect();
        for coordinator in drained {
            coordinator.close();
        }
    }

    pub fn len(&self) -> usize {
        self.coordinators.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<F: ResolutionCacheFactory> fmt::Debug for CoordinatorRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.coordinators.lock().keys().copied().collect();
        ids.sort();
        f.debug_struct("CoordinatorRegistry")
            .field("workspaces", &ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fakes::{FakeFactory, FakeHost};

    fn workspace(raw: u32) -> WorkspaceContext {
        WorkspaceContext::new(WorkspaceId::from_raw(raw), Arc::new(FakeHost::default()))
    }

    #[test]
    fn get_or_create_returns_the_same_coordinator() {
        let registry = CoordinatorRegistry::new(Arc::new(FakeFactory::default()));
        let ws = workspace(1);
        let a = registry.get_or_create(&ws);
        let b = registry.get_or_create(&ws);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn workspaces_do_not_share_coordinators() {
        let registry = CoordinatorRegistry::new(Arc::new(FakeFactory::default()));
        let a = registry.get_or_create(&workspace(1));
        let b = registry.get_or_create(&workspace(2));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn close_removes_session() {
        let registry = CoordinatorRegistry::new(Arc::new(FakeFactory::default()));
        registry.get_or_create(&workspace(1));

        assert!(registry.close(WorkspaceId::from_raw(1)));
        assert!(!registry.close(WorkspaceId::from_raw(1)));
        assert!(registry.get(WorkspaceId::from_raw(1)).is_none());
        assert!(registry.is_empty());
    }
}
