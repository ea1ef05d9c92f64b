//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the engine and infrastructure.
//! Implementations live in other crates (hackduel-store).

use crate::entry::Entry;
use crate::rating::RatingConfig;

/// Result of a versioned write to the durable store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The record was inserted or replaced
    Applied,
    /// The store already held an equal or newer version; nothing changed
    Stale,
}

/// Durable key-value view of entries, written behind the in-memory store
///
/// Implemented by the infrastructure layer (hackduel-store). Writes are
/// last-writer-wins by [`Entry::version`], never by arrival order.
pub trait DurableStore: Send + Sync {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load every stored entry
    fn load_all(&self) -> Result<Vec<Entry>, Self::Error>;

    /// Write an entry unless a record with an equal or higher version exists
    fn upsert(&self, entry: &Entry) -> Result<WriteOutcome, Self::Error>;

    /// Versioned write of many entries; returns how many were applied
    fn upsert_batch(&self, entries: &[Entry]) -> Result<usize, Self::Error>;

    /// Number of stored entries
    fn count(&self) -> Result<usize, Self::Error>;
}

/// A row the seed loader refused to turn into an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantinedRow {
    /// 1-based data row number (header excluded)
    pub row: usize,
    /// Why the row was rejected
    pub reason: String,
}

/// Validated entries from a seed dataset plus what was rejected
#[derive(Debug, Clone, Default)]
pub struct SeedBatch {
    /// Entries at the initial rating
    pub entries: Vec<Entry>,
    /// Malformed rows, kept out of the engine
    pub quarantined: Vec<QuarantinedRow>,
}

/// One-time source of initial entries
///
/// Implemented by the infrastructure layer (hackduel-store).
pub trait SeedSource {
    /// Error type for seed loading
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read and validate the dataset
    fn load(&self, config: &RatingConfig) -> Result<SeedBatch, Self::Error>;
}
