use std::fmt;

use serde::{Deserialize, Serialize};

/// Compilation backend flavor that requires its own analysis results.
///
/// Every source file belongs to exactly one platform. Which one is decided by
/// the host from file metadata; this crate only names the variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPlatform {
    Primary,
    Secondary,
}

impl TargetPlatform {
    pub const COUNT: usize = 2;

    /// All variants in a stable order.
    pub const ALL: [TargetPlatform; Self::COUNT] =
        [TargetPlatform::Primary, TargetPlatform::Secondary];

    /// Dense index suitable for per-platform arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            TargetPlatform::Primary => 0,
            TargetPlatform::Secondary => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TargetPlatform::Primary => "primary",
            TargetPlatform::Secondary => "secondary",
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
