//! HackDuel Domain Layer
//!
//! This crate contains the core rating model and domain types for HackDuel.
//! It has no runtime dependencies (serde is an opt-in feature) and defines the
//! value objects, pure rating math and trait interfaces that the store, sync,
//! engine and router layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Entry**: A ranked project with a Gaussian skill belief `N(mu, sigma²)`
//! - **Rating update**: TrueSkill-style two-player, no-draw posterior update
//! - **Pair scoring**: Match quality weighted by combined uncertainty
//! - **Leaderboard**: Rank ordering and the convergence confidence metric
//! - **Status**: One-way lifecycle `Active → Archived`
//!
//! ## Architecture
//!
//! - Pure functions only, deterministic given their inputs
//! - Infrastructure implementations live in other crates
//! - Trait definitions for the durable store and seed dataset

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod gaussian;
pub mod leaderboard;
pub mod pairing;
pub mod rating;
pub mod status;
pub mod traits;

// Re-exports for convenience
pub use entry::{Entry, EntryId, EntryMetadata, MatchOutcome};
pub use leaderboard::{convergence_confidence, sort_by_rank};
pub use pairing::{best_pair, near_best_pairs, pair_score, PairKey};
pub use rating::{match_quality, rate_match, update, win_probability, Rating, RatingConfig, Winner};
pub use status::EntryStatus;
pub use traits::{DurableStore, QuarantinedRow, SeedBatch, SeedSource, WriteOutcome};
