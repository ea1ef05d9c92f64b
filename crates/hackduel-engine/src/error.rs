//! Error types for engine operations

use hackduel_domain::EntryId;
use thiserror::Error;

/// Errors surfaced synchronously to engine callers
///
/// Persistence failures are not represented here: the sync worker retries
/// them and records durability gaps instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Unknown entry id
    #[error("Entry not found: {0}")]
    NotFound(EntryId),

    /// Entry cannot take part in the operation (archived, self-match, duplicate)
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// Fewer than two active entries in the requested scope
    #[error("Not enough active entries to form a pair")]
    EmptyPool,

    /// Compare-and-commit saw a different version than expected
    #[error("Version conflict on {id}: expected {expected}, found {actual}")]
    Conflict {
        /// Entry that was contended
        id: EntryId,
        /// Version the caller read
        expected: u64,
        /// Version currently committed
        actual: u64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
