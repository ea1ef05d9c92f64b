//! HackDuel Engine
//!
//! The rating and matchmaking core: an authoritative in-memory entry store,
//! active-learning pair selection, vote processing and write-behind hand-off.
//!
//! # Architecture
//!
//! - [`EntryStore`] owns every entry; one lock slot per entry, pairs locked in
//!   ascending id order
//! - [`PairSelector`] scores candidate pairs by match quality times combined
//!   variance and tracks per-session history
//! - [`Engine`] ties the two together with the rating update and pushes every
//!   committed change to a [`hackduel_sync::FlushQueue`]
//! - [`bootstrap`] fills the store from the durable store or a seed dataset
//!
//! # Examples
//!
//! ```
//! use hackduel_domain::{Entry, EntryId, EntryMetadata, MatchOutcome, RatingConfig};
//! use hackduel_engine::{Engine, EngineConfig, EntryStore};
//! use hackduel_sync::{FlushQueue, SyncConfig};
//! use std::sync::Arc;
//!
//! let config = EngineConfig::default();
//! let store = Arc::new(EntryStore::new());
//! store.insert_many(vec![
//!     Entry::new(EntryId::new("a"), "AI", EntryMetadata::titled("Rover"), &config.rating),
//!     Entry::new(EntryId::new("b"), "AI", EntryMetadata::titled("Lander"), &config.rating),
//! ]).unwrap();
//!
//! let (queue, _receiver) = FlushQueue::channel(&SyncConfig::default());
//! let engine = Engine::new(store, queue, config);
//!
//! let (first, second) = engine.next_pair(Some("AI"), None).unwrap();
//! let result = engine.vote(&MatchOutcome::now(first.id, second.id)).unwrap();
//! assert!(result.winner.rating.mu > result.loser.rating.mu);
//! ```

#![warn(missing_docs)]

mod bootstrap;
mod engine;
mod error;
mod selector;
mod store;

pub use bootstrap::{bootstrap, BootstrapReport, BootstrapSource, SEED_BATCH_SIZE};
pub use engine::{Engine, EngineConfig, Health, Leaderboard, VoteResult};
pub use error::EngineError;
pub use selector::{category_scope, PairSelector, PairingConfig, ALL_CATEGORIES};
pub use store::EntryStore;
