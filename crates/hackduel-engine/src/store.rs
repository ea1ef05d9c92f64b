//! Authoritative in-memory entry store
//!
//! Every entry lives in its own lock slot behind a shared index. Mutations
//! take the slot's write lock; a match locks both slots in ascending id
//! order so two votes sharing an entry can never deadlock or lose an update.

use crate::EngineError;
use hackduel_domain::{Entry, EntryId, EntryStatus, Rating};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

type Slot = Arc<RwLock<Entry>>;

/// Canonical record of every entry; the only writer of rating and status
#[derive(Debug, Default)]
pub struct EntryStore {
    slots: RwLock<HashMap<EntryId, Slot>>,
}

impl EntryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, active and archived
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Add entries at bootstrap
    ///
    /// Fails without inserting anything if an id is repeated or already
    /// present.
    pub fn insert_many(&self, entries: Vec<Entry>) -> Result<usize, EngineError> {
        let mut slots = self.slots.write();

        let mut incoming = std::collections::HashSet::with_capacity(entries.len());
        for entry in &entries {
            if slots.contains_key(&entry.id) || !incoming.insert(&entry.id) {
                return Err(EngineError::InvalidEntry(format!("duplicate id {}", entry.id)));
            }
        }

        let count = entries.len();
        for entry in entries {
            slots.insert(entry.id.clone(), Arc::new(RwLock::new(entry)));
        }
        Ok(count)
    }

    fn slot(&self, id: &EntryId) -> Result<Slot, EngineError> {
        self.slots
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(id.clone()))
    }

    /// Latest committed state of one entry
    pub fn get(&self, id: &EntryId) -> Result<Entry, EngineError> {
        let slot = self.slot(id)?;
        let entry = slot.read().clone();
        Ok(entry)
    }

    fn collect<F>(&self, keep: F) -> Vec<Entry>
    where
        F: Fn(&Entry) -> bool,
    {
        self.slots
            .read()
            .values()
            .filter_map(|slot| {
                let entry = slot.read();
                keep(&entry).then(|| entry.clone())
            })
            .collect()
    }

    /// Active entries in the category scope (`None` = every category)
    pub fn list_active(&self, category: Option<&str>) -> Vec<Entry> {
        self.collect(|e| e.is_active() && e.in_category(category))
    }

    /// Archived entries in the category scope
    pub fn list_archived(&self, category: Option<&str>) -> Vec<Entry> {
        self.collect(|e| !e.is_active() && e.in_category(category))
    }

    /// Every entry regardless of status
    pub fn list_all(&self) -> Vec<Entry> {
        self.collect(|_| true)
    }

    /// Compare-and-commit a new rating
    ///
    /// Succeeds only if the entry is still at `expected_version`; the
    /// committed copy carries the next version.
    pub fn commit(&self, id: &EntryId, expected_version: u64, rating: Rating) -> Result<Entry, EngineError> {
        let slot = self.slot(id)?;
        let mut entry = slot.write();

        if entry.version != expected_version {
            return Err(EngineError::Conflict {
                id: id.clone(),
                expected: expected_version,
                actual: entry.version,
            });
        }

        entry.rating = rating;
        entry.version += 1;
        Ok(entry.clone())
    }

    /// Move an entry along its lifecycle
    ///
    /// Returns the committed entry when the status changed and `None` when it
    /// already had that status. `Archived → Active` is refused.
    pub fn set_status(&self, id: &EntryId, status: EntryStatus) -> Result<Option<Entry>, EngineError> {
        let slot = self.slot(id)?;
        let mut entry = slot.write();

        if entry.status == status {
            return Ok(None);
        }
        if status.is_active() {
            return Err(EngineError::InvalidEntry(format!("{} is archived and cannot be reactivated", id)));
        }

        entry.status = status;
        entry.version += 1;
        Ok(Some(entry.clone()))
    }

    /// Read-modify-write two entries under both locks
    ///
    /// `f` sees `(a, b)` in the order given and returns their new ratings.
    /// Locks are taken in ascending id order regardless of argument order.
    pub fn update_pair<F>(&self, a: &EntryId, b: &EntryId, f: F) -> Result<(Entry, Entry), EngineError>
    where
        F: FnOnce(&Entry, &Entry) -> Result<(Rating, Rating), EngineError>,
    {
        if a == b {
            return Err(EngineError::InvalidEntry(format!("{} cannot be paired with itself", a)));
        }

        let slot_a = self.slot(a)?;
        let slot_b = self.slot(b)?;

        let (mut guard_a, mut guard_b) = if a < b {
            let guard_a = slot_a.write();
            (guard_a, slot_b.write())
        } else {
            let guard_b = slot_b.write();
            (slot_a.write(), guard_b)
        };

        let (rating_a, rating_b) = f(&guard_a, &guard_b)?;

        guard_a.rating = rating_a;
        guard_a.version += 1;
        guard_b.rating = rating_b;
        guard_b.version += 1;

        Ok((guard_a.clone(), guard_b.clone()))
    }

    /// Put every entry back at `rating`, bumping versions
    pub fn reset_all(&self, rating: Rating) -> Vec<Entry> {
        let slots = self.slots.read();
        slots
            .values()
            .map(|slot| {
                let mut entry = slot.write();
                entry.rating = rating;
                entry.version += 1;
                entry.clone()
            })
            .collect()
    }
}
