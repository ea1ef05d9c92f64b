//! Non-blocking flush queue between request handlers and the drain worker

use crate::{SyncConfig, SyncError, SyncMetrics};
use hackduel_domain::{Entry, EntryId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify};

/// State shared by every queue handle and the worker
#[derive(Debug)]
pub(crate) struct Shared {
    /// Entries that did not fit in the channel, newest version per id
    pub(crate) overflow: Mutex<HashMap<EntryId, Entry>>,
    pub(crate) notify: Notify,
    pub(crate) metrics: Arc<SyncMetrics>,
}

impl Shared {
    pub(crate) fn take_overflow(&self) -> Vec<Entry> {
        let parked = std::mem::take(&mut *self.overflow.lock());
        let mut entries: Vec<Entry> = parked.into_values().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }
}

/// Receiving half, consumed by [`crate::SyncWorker`]
#[derive(Debug)]
pub struct FlushReceiver {
    pub(crate) receiver: mpsc::Receiver<Entry>,
    pub(crate) shared: Arc<Shared>,
}

/// Handle used to hand committed entries to the drain worker
///
/// Cloning is cheap; all clones feed the same worker. The worker stops once
/// every handle has been dropped and the backlog is written.
///
/// # Examples
///
/// ```
/// use hackduel_domain::{Entry, EntryId, EntryMetadata, RatingConfig};
/// use hackduel_sync::{FlushQueue, SyncConfig};
///
/// let (queue, _receiver) = FlushQueue::channel(&SyncConfig::default());
/// let entry = Entry::new(EntryId::new("1"), "AI", EntryMetadata::titled("Rover"), &RatingConfig::default());
///
/// queue.flush(entry).unwrap();
/// assert_eq!(queue.pending(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct FlushQueue {
    sender: mpsc::Sender<Entry>,
    shared: Arc<Shared>,
}

impl FlushQueue {
    /// Create a queue and the receiver its worker drains
    pub fn channel(config: &SyncConfig) -> (FlushQueue, FlushReceiver) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let shared = Arc::new(Shared {
            overflow: Mutex::new(HashMap::new()),
            notify: Notify::new(),
            metrics: Arc::new(SyncMetrics::new()),
        });

        (
            FlushQueue {
                sender,
                shared: Arc::clone(&shared),
            },
            FlushReceiver { receiver, shared },
        )
    }

    /// Enqueue an entry for durable write without blocking
    ///
    /// A full channel parks the entry in the overflow map instead of waiting.
    /// Only a stopped worker is an error; the entry then stays in memory only
    /// and is counted as a durability gap.
    pub fn flush(&self, entry: Entry) -> Result<(), SyncError> {
        self.shared.metrics.record_enqueued();

        match self.sender.try_send(entry) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(entry)) => {
                self.park(entry);
                Ok(())
            }
            Err(TrySendError::Closed(entry)) => {
                self.shared.metrics.record_durability_gap();
                tracing::warn!(
                    entry_id = %entry.id,
                    version = entry.version,
                    "Flush queue closed, entry will not be persisted"
                );
                Err(SyncError::QueueClosed)
            }
        }
    }

    fn park(&self, entry: Entry) {
        self.shared.metrics.record_overflow();
        {
            let mut overflow = self.shared.overflow.lock();
            let newer = overflow
                .get(&entry.id)
                .is_none_or(|parked| parked.version < entry.version);
            if newer {
                tracing::debug!(entry_id = %entry.id, version = entry.version, "Flush channel full, parked entry");
                overflow.insert(entry.id.clone(), entry);
            }
        }
        self.shared.notify.notify_one();
    }

    /// Entries waiting to be picked up by the worker
    pub fn pending(&self) -> usize {
        let queued = self.sender.max_capacity() - self.sender.capacity();
        queued + self.shared.overflow.lock().len()
    }

    /// Counters shared with the worker
    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.shared.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hackduel_domain::{EntryMetadata, RatingConfig};

    fn entry(id: &str, version: u64) -> Entry {
        let mut e = Entry::new(EntryId::new(id), "AI", EntryMetadata::titled(id), &RatingConfig::default());
        e.version = version;
        e
    }

    fn small_queue() -> (FlushQueue, FlushReceiver) {
        FlushQueue::channel(&SyncConfig {
            queue_capacity: 1,
            ..Default::default()
        })
    }

    #[test]
    fn test_full_channel_parks_newest_version() {
        let (queue, receiver) = small_queue();

        queue.flush(entry("a", 1)).unwrap();
        queue.flush(entry("b", 2)).unwrap();
        queue.flush(entry("b", 1)).unwrap();
        queue.flush(entry("b", 3)).unwrap();

        assert_eq!(queue.pending(), 2);
        let parked = receiver.shared.take_overflow();
        assert_eq!(parked.len(), 1);
        assert_eq!(parked[0].version, 3);

        let s = queue.metrics().snapshot();
        assert_eq!(s.enqueued, 4);
        assert_eq!(s.overflowed, 3);
    }

    #[test]
    fn test_flush_never_blocks_when_full() {
        let (queue, _receiver) = small_queue();
        for i in 0..100 {
            assert!(queue.flush(entry(&i.to_string(), 1)).is_ok());
        }
        assert_eq!(queue.pending(), 100);
    }

    #[test]
    fn test_closed_queue_counts_gap() {
        let (queue, receiver) = small_queue();
        drop(receiver);

        assert!(matches!(queue.flush(entry("a", 1)), Err(SyncError::QueueClosed)));
        assert_eq!(queue.metrics().durability_gaps(), 1);
    }
}
