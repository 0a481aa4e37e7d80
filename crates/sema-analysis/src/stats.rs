use std::collections::BTreeMap;

use sema_core::TargetPlatform;
use serde::{Deserialize, Serialize};

/// Counters of the synthetic pool since it was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticStats {
    pub hits: u64,
    pub misses: u64,
    pub promotions: u64,
    pub evictions: u64,
    pub resident: usize,
}

/// Point-in-time view of a coordinator's cache activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Global builds per platform, including duplicates from racing rebuilds.
    pub global_builds: BTreeMap<TargetPlatform, u64>,
    pub synthetic: SyntheticStats,
}

impl CacheStats {
    pub fn global_builds(&self, platform: TargetPlatform) -> u64 {
        self.global_builds.get(&platform).copied().unwrap_or(0)
    }

    pub fn total_global_builds(&self) -> u64 {
        self.global_builds.values().sum()
    }
}
