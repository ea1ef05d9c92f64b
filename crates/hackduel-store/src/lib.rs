//! HackDuel Storage Layer
//!
//! Implements the `DurableStore` and `SeedSource` traits from hackduel-domain.
//!
//! # Architecture
//!
//! - SQLite for the durable entry table, written behind the in-memory store
//! - An in-memory store with the same versioning rules, for tests and
//!   ephemeral deployments
//! - CSV seed ingestion that validates rows into entries and quarantines the
//!   rest
//!
//! # Examples
//!
//! ```no_run
//! use hackduel_store::SqliteStore;
//! use hackduel_domain::DurableStore;
//!
//! let store = SqliteStore::new("hackduel.db").unwrap();
//! assert_eq!(store.count().unwrap(), 0);
//! ```

#![warn(missing_docs)]

mod memory;
mod seed;
mod sqlite;

pub use memory::MemoryStore;
pub use seed::{parse_seed, CsvSeed, DEFAULT_CATEGORY};
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Seed dataset could not be read or parsed
    #[error("Seed dataset error: {0}")]
    Csv(#[from] csv::Error),

    /// Stored data does not form a valid entry
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Store is switched off or unreachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
