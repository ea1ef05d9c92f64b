//! HackDuel Sync
//!
//! Write-behind propagation of committed entries to a durable store.
//!
//! # Overview
//!
//! The in-memory entry store is authoritative for reads. Every commit is
//! handed to a [`FlushQueue`], which never blocks the caller, and a
//! [`SyncWorker`] drains it in the background:
//!
//! - **Bounded channel**: first stop for every flush
//! - **Overflow map**: absorbs bursts once the channel is full, keeping only
//!   the newest version of each entry
//! - **Versioned writes**: the durable store applies a write only when its
//!   stored version is lower, so out-of-order flushes converge
//! - **Retry accounting**: exponential backoff up to a bound, then a logged
//!   durability gap
//!
//! # Configuration
//!
//! ```toml
//! [sync]
//! queue_capacity = 1024
//! max_attempts = 5
//! initial_backoff_ms = 100
//! max_backoff_ms = 5000
//! ```
//!
//! # Metrics
//!
//! ```
//! use hackduel_sync::{FlushQueue, SyncConfig};
//!
//! let (queue, _receiver) = FlushQueue::channel(&SyncConfig::default());
//! println!("{}", queue.metrics().summary());
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod queue;
mod worker;

pub use config::SyncConfig;
pub use error::SyncError;
pub use metrics::{MetricsSnapshot, SyncMetrics};
pub use queue::{FlushQueue, FlushReceiver};
pub use worker::SyncWorker;
