//! Background worker draining the flush queue into the durable store

use crate::queue::Shared;
use crate::{FlushReceiver, SyncConfig, SyncError};
use hackduel_domain::{DurableStore, Entry, EntryId, WriteOutcome};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Drains committed entries into a [`DurableStore`]
///
/// Store calls run on the blocking pool so a slow backend never stalls the
/// runtime. A failed write is retried with exponential backoff; once
/// `max_attempts` is spent the entry is logged and counted as a durability
/// gap. The in-memory store stays authoritative either way.
///
/// A stale outcome is expected when flushes of one entry arrive out of
/// order. When the durable store rejects a version newer than anything this
/// worker has written for the entry, the durable record came from elsewhere
/// (typically a pool seeded while the store was unreachable) and the two
/// have diverged; that is counted as a durability gap too.
///
/// # Examples
///
/// ```no_run
/// use hackduel_store::SqliteStore;
/// use hackduel_sync::{FlushQueue, SyncConfig, SyncWorker};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Arc::new(SqliteStore::new("hackduel.db")?);
///     let config = SyncConfig::default();
///     let (queue, receiver) = FlushQueue::channel(&config);
///     let handle = SyncWorker::new(store, config, receiver).spawn();
///
///     // ... hand entries to `queue` ...
///
///     drop(queue);
///     handle.await?;
///     Ok(())
/// }
/// ```
pub struct SyncWorker<S: DurableStore> {
    store: Arc<S>,
    config: SyncConfig,
    receiver: mpsc::Receiver<Entry>,
    shared: Arc<Shared>,
    written_versions: Mutex<HashMap<EntryId, u64>>,
}

impl<S: DurableStore + 'static> SyncWorker<S> {
    /// Create a worker for the given queue receiver
    pub fn new(store: Arc<S>, config: SyncConfig, receiver: FlushReceiver) -> Self {
        Self {
            store,
            config,
            receiver: receiver.receiver,
            shared: receiver.shared,
            written_versions: Mutex::new(HashMap::new()),
        }
    }

    /// Run the worker on the current runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drain until every queue handle is dropped, then write what is left
    pub async fn run(mut self) {
        tracing::info!(
            "Sync worker started (capacity: {}, max attempts: {})",
            self.config.queue_capacity,
            self.config.max_attempts
        );

        loop {
            tokio::select! {
                received = self.receiver.recv() => match received {
                    Some(entry) => self.write_with_retry(entry).await,
                    None => break,
                },
                _ = self.shared.notify.notified() => {
                    self.drain_overflow().await;
                }
            }
        }

        self.drain_overflow().await;
        tracing::info!("Sync worker stopped. Final metrics:\n{}", self.shared.metrics.summary());
    }

    async fn drain_overflow(&self) {
        for entry in self.shared.take_overflow() {
            self.write_with_retry(entry).await;
        }
    }

    fn record_written_version(&self, entry: &Entry) {
        let mut written = self.written_versions.lock();
        let highest = written.entry(entry.id.clone()).or_insert(entry.version);
        *highest = (*highest).max(entry.version);
    }

    fn wrote_at_least(&self, entry: &Entry) -> bool {
        self.written_versions
            .lock()
            .get(&entry.id)
            .is_some_and(|&highest| highest >= entry.version)
    }

    async fn write_once(&self, entry: &Entry) -> Result<WriteOutcome, SyncError> {
        let store = Arc::clone(&self.store);
        let entry = entry.clone();
        tokio::task::spawn_blocking(move || store.upsert(&entry))
            .await
            .map_err(|e| SyncError::PersistenceUnavailable(format!("write task failed: {}", e)))?
            .map_err(|e| SyncError::PersistenceUnavailable(e.to_string()))
    }

    async fn write_with_retry(&self, entry: Entry) {
        let metrics = &self.shared.metrics;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.write_once(&entry).await {
                Ok(WriteOutcome::Applied) => {
                    metrics.record_written();
                    self.record_written_version(&entry);
                    tracing::debug!(entry_id = %entry.id, version = entry.version, "Persisted entry");
                    return;
                }
                Ok(WriteOutcome::Stale) if self.wrote_at_least(&entry) => {
                    metrics.record_stale();
                    tracing::debug!(entry_id = %entry.id, version = entry.version, "Durable store already newer, skipped");
                    return;
                }
                Ok(WriteOutcome::Stale) => {
                    metrics.record_durability_gap();
                    tracing::warn!(
                        entry_id = %entry.id,
                        version = entry.version,
                        "Durability gap: durable store holds a version this process never wrote"
                    );
                    return;
                }
                Err(e) if attempt < self.config.max_attempts => {
                    metrics.record_retry();
                    let delay = self.config.backoff_delay(attempt);
                    tracing::debug!(
                        entry_id = %entry.id,
                        attempt,
                        "Write failed, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    metrics.record_durability_gap();
                    tracing::warn!(
                        entry_id = %entry.id,
                        version = entry.version,
                        attempts = attempt,
                        "Durability gap: giving up on entry: {}",
                        e
                    );
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlushQueue;
    use hackduel_domain::{EntryId, EntryMetadata, RatingConfig};
    use hackduel_store::MemoryStore;
    use std::time::Duration;

    fn entry(id: &str, version: u64) -> Entry {
        let mut e = Entry::new(EntryId::new(id), "AI", EntryMetadata::titled(id), &RatingConfig::default());
        e.version = version;
        e
    }

    fn fast_config(max_attempts: u32) -> SyncConfig {
        SyncConfig {
            queue_capacity: 8,
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 4,
        }
    }

    #[tokio::test]
    async fn test_drains_into_store() {
        let store = Arc::new(MemoryStore::new());
        let config = fast_config(3);
        let (queue, receiver) = FlushQueue::channel(&config);
        let handle = SyncWorker::new(Arc::clone(&store), config, receiver).spawn();

        queue.flush(entry("a", 1)).unwrap();
        queue.flush(entry("b", 1)).unwrap();
        let metrics = Arc::clone(queue.metrics());
        drop(queue);
        handle.await.unwrap();

        assert_eq!(store.get(&EntryId::new("a")).unwrap().version, 1);
        assert_eq!(store.get(&EntryId::new("b")).unwrap().version, 1);
        assert_eq!(metrics.snapshot().written, 2);
    }

    #[tokio::test]
    async fn test_out_of_order_flushes_converge_by_version() {
        let store = Arc::new(MemoryStore::new());
        let config = fast_config(3);
        let (queue, receiver) = FlushQueue::channel(&config);
        let handle = SyncWorker::new(Arc::clone(&store), config, receiver).spawn();

        queue.flush(entry("a", 3)).unwrap();
        queue.flush(entry("a", 2)).unwrap();
        let metrics = Arc::clone(queue.metrics());
        drop(queue);
        handle.await.unwrap();

        assert_eq!(store.get(&EntryId::new("a")).unwrap().version, 3);
        let s = metrics.snapshot();
        assert_eq!(s.written, 1);
        assert_eq!(s.stale, 1);
    }

    #[tokio::test]
    async fn test_foreign_newer_version_is_durability_gap() {
        // Durable store already held b at v10 while the pool restarted from v0
        let store = Arc::new(MemoryStore::new());
        let mut stored = entry("b", 10);
        stored.rating.mu = 10.0;
        store.upsert(&stored).unwrap();

        let config = fast_config(3);
        let (queue, receiver) = FlushQueue::channel(&config);
        let handle = SyncWorker::new(Arc::clone(&store), config, receiver).spawn();

        for version in 1..=3 {
            queue.flush(entry("b", version)).unwrap();
        }
        let metrics = Arc::clone(queue.metrics());
        drop(queue);
        handle.await.unwrap();

        let s = metrics.snapshot();
        assert_eq!(s.durability_gaps, 3);
        assert_eq!(s.stale, 0);
        assert_eq!(s.written, 0);
        assert_eq!(store.get(&EntryId::new("b")).unwrap().version, 10);
    }

    #[tokio::test]
    async fn test_unavailable_store_becomes_durability_gap() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);
        let config = fast_config(3);
        let (queue, receiver) = FlushQueue::channel(&config);
        let handle = SyncWorker::new(Arc::clone(&store), config, receiver).spawn();

        queue.flush(entry("a", 1)).unwrap();
        let metrics = Arc::clone(queue.metrics());
        drop(queue);
        handle.await.unwrap();

        let s = metrics.snapshot();
        assert_eq!(s.retries, 2);
        assert_eq!(s.durability_gaps, 1);
        assert_eq!(s.written, 0);
    }

    #[tokio::test]
    async fn test_retry_recovers_when_store_returns() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);
        let config = SyncConfig {
            max_attempts: 200,
            initial_backoff_ms: 5,
            max_backoff_ms: 5,
            ..fast_config(0)
        };
        let (queue, receiver) = FlushQueue::channel(&config);
        let handle = SyncWorker::new(Arc::clone(&store), config, receiver).spawn();

        queue.flush(entry("a", 1)).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        store.set_available(true);

        let metrics = Arc::clone(queue.metrics());
        drop(queue);
        handle.await.unwrap();

        assert!(store.get(&EntryId::new("a")).is_some());
        let s = metrics.snapshot();
        assert_eq!(s.written, 1);
        assert_eq!(s.durability_gaps, 0);
        assert!(s.retries >= 1);
    }

    #[tokio::test]
    async fn test_overflow_is_written_on_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let config = SyncConfig {
            queue_capacity: 1,
            ..fast_config(3)
        };
        let (queue, receiver) = FlushQueue::channel(&config);

        // Worker not running yet, so everything past the first entry overflows
        for i in 0..10 {
            queue.flush(entry(&i.to_string(), 1)).unwrap();
        }
        queue.flush(entry("3", 7)).unwrap();
        assert_eq!(queue.pending(), 10);

        let handle = SyncWorker::new(Arc::clone(&store), config, receiver).spawn();
        drop(queue);
        handle.await.unwrap();

        assert_eq!(store.count().unwrap(), 10);
        assert_eq!(store.get(&EntryId::new("3")).unwrap().version, 7);
    }
}
