use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing identifier assigned to every generated
/// configuration. Comparisons and ordering rely on the integer value, never
/// on wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct ConfigVersion(pub u64);

impl std::fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Hands out the next [`ConfigVersion`] for a single [`crate::config::engine::Engine`].
/// Not `Clone`: each engine owns exactly one counter.
#[derive(Debug, Default)]
pub struct VersionCounter {
    next: AtomicU64,
}

impl VersionCounter {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    pub fn next(&self) -> ConfigVersion {
        ConfigVersion(self.next.fetch_add(1, Ordering::SeqCst))
    }
}
