//! Atomic pool statistics for lock-free usage tracking.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of memory pool activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Number of successful block allocations.
    pub allocations: u64,
    /// Number of successful block releases.
    pub releases: u64,
    /// Number of allocations refused (pool exhausted or no size class).
    pub failures: u64,
    /// Number of times an existing pool was grown.
    pub grows: u64,
}

impl PoolStats {
    /// Blocks currently handed out according to the counters.
    #[must_use]
    pub fn outstanding(&self) -> u64 {
        self.allocations.saturating_sub(self.releases)
    }
}

/// Shape of one size class at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeClassInfo {
    /// Aligned block size in bytes.
    pub block_size: usize,
    /// Total number of blocks owned by the pool.
    pub block_count: usize,
    /// Blocks ready to be allocated.
    pub free: usize,
    /// Blocks currently handed out.
    pub used: usize,
    /// Number of heap segments backing the pool.
    pub segments: usize,
}

/// Atomic pool statistics for lock-free updates.
pub struct AtomicPoolStats {
    allocations: AtomicU64,
    releases: AtomicU64,
    failures: AtomicU64,
    grows: AtomicU64,
}

impl AtomicPoolStats {
    /// Create new zeroed stats.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocations: AtomicU64::new(0),
            releases: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            grows: AtomicU64::new(0),
        }
    }

    /// Take a snapshot of current stats.
    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            grows: self.grows.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.allocations.store(0, Ordering::Relaxed);
        self.releases.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.grows.store(0, Ordering::Relaxed);
    }

    /// Increment allocation counter.
    pub fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment release counter.
    pub fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment failure counter.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment growth counter.
    pub fn record_grow(&self) {
        self.grows.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for AtomicPoolStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AtomicPoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.snapshot().fmt(f)
    }
}
