//! Engine facade: the operations exposed to the HTTP layer

use crate::selector::category_scope;
use crate::{EngineError, EntryStore, PairSelector, PairingConfig};
use hackduel_domain::{
    convergence_confidence, rate_match, sort_by_rank, Entry, EntryId, EntryStatus, MatchOutcome, RatingConfig,
};
use hackduel_sync::FlushQueue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Rating and pairing settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Skill model constants
    pub rating: RatingConfig,
    /// Pair selection tuning
    pub pairing: PairingConfig,
}

impl EngineConfig {
    /// Check both sections
    pub fn validate(&self) -> Result<(), EngineError> {
        self.rating.validate().map_err(EngineError::Config)?;
        self.pairing.validate()
    }
}

/// Ranked snapshot of a category scope
#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    /// Active entries, best first
    pub entries: Vec<Entry>,
    /// Convergence of the scope in `[0, 100]`
    pub confidence: f64,
    /// Active entries in scope before `limit` was applied
    pub total: usize,
}

/// Both sides of a recorded vote after the update
#[derive(Debug, Clone, Serialize)]
pub struct VoteResult {
    /// Winner after the update
    pub winner: Entry,
    /// Loser after the update
    pub loser: Entry,
}

/// Process-level counters for the health endpoint
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Health {
    /// Entries in memory, any status
    pub project_count: usize,
    /// Entries in the active pool
    pub active_count: usize,
    /// Flushes not yet picked up by the sync worker
    pub pending_flushes: usize,
    /// Writes abandoned after retries
    pub durability_gaps: u64,
}

/// Rating and matchmaking engine
///
/// Reads and writes go to the [`EntryStore`]; every committed change is
/// handed to the [`FlushQueue`] afterwards.
pub struct Engine {
    store: Arc<EntryStore>,
    selector: PairSelector,
    queue: FlushQueue,
    rating: RatingConfig,
}

impl Engine {
    /// Create an engine over a populated store
    pub fn new(store: Arc<EntryStore>, queue: FlushQueue, config: EngineConfig) -> Self {
        Self {
            store,
            selector: PairSelector::new(config.pairing, config.rating.clone()),
            queue,
            rating: config.rating,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<EntryStore> {
        &self.store
    }

    fn flush(&self, entry: Entry) {
        if let Err(e) = self.queue.flush(entry) {
            tracing::debug!("Flush skipped: {}", e);
        }
    }

    /// Next pair to show a judge
    pub fn next_pair(&self, category: Option<&str>, session: Option<&str>) -> Result<(Entry, Entry), EngineError> {
        let scope = category_scope(category);
        let pool = self.store.list_active(scope);
        let (a, b) = self.selector.select(pool, session)?;
        tracing::debug!(category = ?scope, a = %a.id, b = %b.id, "Selected pair");
        Ok((a, b))
    }

    /// Apply a comparison result
    ///
    /// Both entries are updated under one exclusive scope, then flushed.
    pub fn vote(&self, outcome: &MatchOutcome) -> Result<VoteResult, EngineError> {
        if outcome.is_self_match() {
            return Err(EngineError::InvalidEntry(format!(
                "{} cannot be both winner and loser",
                outcome.winner_id
            )));
        }

        let (winner, loser) = self
            .store
            .update_pair(&outcome.winner_id, &outcome.loser_id, |winner, loser| {
                for entry in [winner, loser] {
                    if !entry.is_active() {
                        return Err(EngineError::InvalidEntry(format!("{} is archived", entry.id)));
                    }
                }
                Ok(rate_match(winner.rating, loser.rating, &self.rating))
            })?;

        tracing::info!(
            winner = %winner.id,
            loser = %loser.id,
            winner_mu = winner.rating.mu,
            loser_mu = loser.rating.mu,
            "Vote recorded"
        );

        self.flush(winner.clone());
        self.flush(loser.clone());
        Ok(VoteResult { winner, loser })
    }

    /// Ranked active entries, optionally truncated
    pub fn leaderboard(&self, category: Option<&str>, limit: Option<usize>) -> Leaderboard {
        let mut entries = self.store.list_active(category_scope(category));
        let confidence = convergence_confidence(&entries, &self.rating);
        let total = entries.len();

        sort_by_rank(&mut entries);
        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        Leaderboard {
            entries,
            confidence,
            total,
        }
    }

    /// Remove an entry from the active pool
    ///
    /// Archiving an archived entry is a no-op that still succeeds.
    pub fn archive(&self, id: &EntryId) -> Result<Entry, EngineError> {
        match self.store.set_status(id, EntryStatus::Archived)? {
            Some(entry) => {
                tracing::info!(entry_id = %id, "Entry archived");
                self.flush(entry.clone());
                Ok(entry)
            }
            None => self.store.get(id),
        }
    }

    /// Archived entries in the scope, ranked
    pub fn archived(&self, category: Option<&str>) -> Vec<Entry> {
        let mut entries = self.store.list_archived(category_scope(category));
        sort_by_rank(&mut entries);
        entries
    }

    /// One entry
    pub fn get(&self, id: &EntryId) -> Result<Entry, EngineError> {
        self.store.get(id)
    }

    /// Put every entry back at the initial rating
    ///
    /// Session histories are cleared as well, since every pair is fresh again.
    pub fn reset_ratings(&self) -> usize {
        let entries = self.store.reset_all(self.rating.initial_rating());
        self.selector.clear_sessions();

        let count = entries.len();
        for entry in entries {
            self.flush(entry);
        }
        tracing::warn!(count, "All ratings reset");
        count
    }

    /// Counters for the health endpoint
    pub fn health(&self) -> Health {
        Health {
            project_count: self.store.len(),
            active_count: self.store.list_active(None).len(),
            pending_flushes: self.queue.pending(),
            durability_gaps: self.queue.metrics().durability_gaps(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hackduel_domain::EntryMetadata;
    use hackduel_sync::{FlushReceiver, SyncConfig};

    fn engine_with(entries: Vec<Entry>) -> (Engine, FlushReceiver) {
        let store = Arc::new(EntryStore::new());
        store.insert_many(entries).unwrap();
        let (queue, receiver) = FlushQueue::channel(&SyncConfig::default());
        (Engine::new(store, queue, EngineConfig::default()), receiver)
    }

    fn entry(id: &str, category: &str) -> Entry {
        Entry::new(EntryId::new(id), category, EntryMetadata::titled(id), &RatingConfig::default())
    }

    fn vote(engine: &Engine, winner: &str, loser: &str) -> Result<VoteResult, EngineError> {
        engine.vote(&MatchOutcome::now(EntryId::new(winner), EntryId::new(loser)))
    }

    #[test]
    fn test_vote_updates_both_and_flushes() {
        let (engine, _receiver) = engine_with(vec![entry("a", "AI"), entry("b", "AI")]);
        let prior = RatingConfig::default().initial_rating();

        let result = vote(&engine, "a", "b").unwrap();
        assert!(result.winner.rating.mu > prior.mu);
        assert!(result.loser.rating.mu < prior.mu);
        assert!(result.winner.rating.sigma < prior.sigma);
        assert!(result.loser.rating.sigma < prior.sigma);
        assert_eq!(result.winner.version, 1);

        assert_eq!(engine.get(&EntryId::new("a")).unwrap(), result.winner);
        assert_eq!(engine.health().pending_flushes, 2);
    }

    #[test]
    fn test_vote_rejections() {
        let (engine, _receiver) = engine_with(vec![entry("a", "AI"), entry("b", "AI")]);

        assert!(matches!(vote(&engine, "a", "a"), Err(EngineError::InvalidEntry(_))));
        assert!(matches!(vote(&engine, "a", "zz"), Err(EngineError::NotFound(_))));

        engine.archive(&EntryId::new("b")).unwrap();
        assert!(matches!(vote(&engine, "a", "b"), Err(EngineError::InvalidEntry(_))));
        assert_eq!(engine.get(&EntryId::new("a")).unwrap().version, 0);
    }

    #[test]
    fn test_archive_is_idempotent_and_flushes_once() {
        let (engine, _receiver) = engine_with(vec![entry("a", "AI"), entry("b", "AI")]);
        let id = EntryId::new("b");

        let first = engine.archive(&id).unwrap();
        let second = engine.archive(&id).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.status, EntryStatus::Archived);
        assert_eq!(engine.health().pending_flushes, 1);

        assert!(matches!(engine.archive(&EntryId::new("zz")), Err(EngineError::NotFound(_))));
    }

    #[test]
    fn test_archived_entry_leaves_pool() {
        let (engine, _receiver) = engine_with(vec![entry("a", "AI"), entry("b", "AI")]);
        assert!(engine.next_pair(Some("AI"), None).is_ok());

        engine.archive(&EntryId::new("b")).unwrap();
        assert_eq!(engine.next_pair(Some("AI"), None), Err(EngineError::EmptyPool));
        assert!(engine.leaderboard(None, None).entries.iter().all(|e| e.id.as_str() != "b"));
        assert_eq!(engine.archived(Some("AI")).len(), 1);
    }

    #[test]
    fn test_leaderboard_sorted_and_limited() {
        let (engine, _receiver) = engine_with(vec![entry("a", "AI"), entry("b", "AI"), entry("c", "Health")]);
        vote(&engine, "b", "a").unwrap();

        let board = engine.leaderboard(Some("All"), Some(2));
        assert_eq!(board.total, 3);
        assert_eq!(board.entries.len(), 2);
        assert_eq!(board.entries[0].id.as_str(), "b");
        assert!(board.entries[0].rating.mu >= board.entries[1].rating.mu);
        assert!((0.0..=100.0).contains(&board.confidence));

        let ai = engine.leaderboard(Some("AI"), None);
        assert_eq!(ai.total, 2);
        assert_eq!(ai.entries[1].id.as_str(), "a");
    }

    #[test]
    fn test_empty_leaderboard_has_zero_confidence() {
        let (engine, _receiver) = engine_with(vec![]);
        let board = engine.leaderboard(None, None);
        assert!(board.entries.is_empty());
        assert_eq!(board.confidence, 0.0);
    }

    #[test]
    fn test_reset_ratings() {
        let (engine, _receiver) = engine_with(vec![entry("a", "AI"), entry("b", "AI")]);
        vote(&engine, "a", "b").unwrap();
        engine.archive(&EntryId::new("b")).unwrap();

        let before: Vec<u64> = ["a", "b"].iter().map(|id| engine.get(&EntryId::new(*id)).unwrap().version).collect();
        assert_eq!(engine.reset_ratings(), 2);

        let initial = RatingConfig::default().initial_rating();
        for (id, version) in ["a", "b"].iter().zip(before) {
            let e = engine.get(&EntryId::new(*id)).unwrap();
            assert_eq!(e.rating, initial);
            assert_eq!(e.version, version + 1);
        }
        // Archived entries stay archived
        assert_eq!(engine.get(&EntryId::new("b")).unwrap().status, EntryStatus::Archived);
    }

    #[test]
    fn test_health_counts() {
        let (engine, _receiver) = engine_with(vec![entry("a", "AI"), entry("b", "AI"), entry("c", "AI")]);
        engine.archive(&EntryId::new("c")).unwrap();

        let health = engine.health();
        assert_eq!(health.project_count, 3);
        assert_eq!(health.active_count, 2);
        assert_eq!(health.durability_gaps, 0);
    }

    #[test]
    fn test_closed_queue_does_not_fail_vote() {
        let (engine, receiver) = engine_with(vec![entry("a", "AI"), entry("b", "AI")]);
        drop(receiver);

        assert!(vote(&engine, "a", "b").is_ok());
        assert_eq!(engine.health().durability_gaps, 2);
        assert_eq!(engine.get(&EntryId::new("a")).unwrap().version, 1);
    }
}
