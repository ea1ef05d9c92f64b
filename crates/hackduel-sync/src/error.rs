//! Error types for write-behind sync

use thiserror::Error;

/// Errors that can occur while propagating entries to the durable store
///
/// None of these reach a vote submitter: failed writes are retried and then
/// recorded as durability gaps.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Durable store rejected or could not take the write
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// The drain worker has shut down
    #[error("Flush queue closed")]
    QueueClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
