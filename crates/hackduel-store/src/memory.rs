//! In-memory durable store (does not persist across restarts).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use hackduel_domain::{DurableStore, Entry, EntryId, WriteOutcome};
use parking_lot::RwLock;

use crate::StoreError;

/// In-memory store with the same last-writer-wins rule as [`crate::SqliteStore`]
///
/// Can be switched offline to simulate an unreachable backend.
pub struct MemoryStore {
    entries: RwLock<HashMap<EntryId, Entry>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty, reachable store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Mark the store reachable or unreachable
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Fetch one stored entry, regardless of availability
    pub fn get(&self, id: &EntryId) -> Option<Entry> {
        self.entries.read().get(id).cloned()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }

    fn write(map: &mut HashMap<EntryId, Entry>, entry: &Entry) -> WriteOutcome {
        match map.get(&entry.id) {
            Some(existing) if existing.version >= entry.version => WriteOutcome::Stale,
            _ => {
                map.insert(entry.id.clone(), entry.clone());
                WriteOutcome::Applied
            }
        }
    }
}

impl DurableStore for MemoryStore {
    type Error = StoreError;

    fn load_all(&self) -> Result<Vec<Entry>, Self::Error> {
        self.check_available()?;
        let mut entries: Vec<Entry> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    fn upsert(&self, entry: &Entry) -> Result<WriteOutcome, Self::Error> {
        self.check_available()?;
        Ok(Self::write(&mut self.entries.write(), entry))
    }

    fn upsert_batch(&self, entries: &[Entry]) -> Result<usize, Self::Error> {
        self.check_available()?;
        let mut map = self.entries.write();
        Ok(entries
            .iter()
            .filter(|e| Self::write(&mut map, e) == WriteOutcome::Applied)
            .count())
    }

    fn count(&self) -> Result<usize, Self::Error> {
        self.check_available()?;
        Ok(self.entries.read().len())
    }
}
