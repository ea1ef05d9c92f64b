//! Counters for write-behind operations

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the flush queue and the drain worker
#[derive(Debug, Default)]
pub struct SyncMetrics {
    enqueued: AtomicU64,
    written: AtomicU64,
    stale: AtomicU64,
    retries: AtomicU64,
    overflowed: AtomicU64,
    durability_gaps: AtomicU64,
}

/// Point-in-time copy of [`SyncMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Entries handed to the queue
    pub enqueued: u64,
    /// Writes the durable store applied
    pub written: u64,
    /// Writes skipped because the store already held a newer version
    pub stale: u64,
    /// Failed attempts that were retried
    pub retries: u64,
    /// Entries parked in the overflow map because the channel was full
    pub overflowed: u64,
    /// Writes abandoned after exhausting retries
    pub durability_gaps: u64,
}

impl SyncMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_overflow(&self) {
        self.overflowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_durability_gap(&self) {
        self.durability_gaps.fetch_add(1, Ordering::Relaxed);
    }

    /// Writes abandoned so far
    pub fn durability_gaps(&self) -> u64 {
        self.durability_gaps.load(Ordering::Relaxed)
    }

    /// Copy every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            overflowed: self.overflowed.load(Ordering::Relaxed),
            durability_gaps: self.durability_gaps.load(Ordering::Relaxed),
        }
    }

    /// Generate a summary report of the counters
    pub fn summary(&self) -> String {
        let s = self.snapshot();
        let lines = [
            "Sync Metrics Summary".to_string(),
            "====================".to_string(),
            format!("Enqueued: {}", s.enqueued),
            format!("Written: {}", s.written),
            format!("Skipped (stale): {}", s.stale),
            format!("Retries: {}", s.retries),
            format!("Overflowed: {}", s.overflowed),
            format!("Durability gaps: {}", s.durability_gaps),
        ];
        lines.join("\n")
    }
}
