//! Startup population of the entry store

use crate::{EngineError, EntryStore};
use hackduel_domain::{DurableStore, RatingConfig, SeedSource};
use serde::Serialize;

/// Entries written per durable transaction when seeding
pub const SEED_BATCH_SIZE: usize = 400;

/// Where the starting pool came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapSource {
    /// Previously persisted entries
    Durable,
    /// One-time seed dataset
    Seed,
    /// Neither was available
    Empty,
}

/// Outcome of [`bootstrap`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    /// Source of the loaded entries
    pub source: BootstrapSource,
    /// Entries placed in the store
    pub loaded: usize,
    /// Seed rows rejected as malformed
    pub quarantined: usize,
    /// Seed entries written through to the durable store
    pub persisted: usize,
}

impl BootstrapReport {
    fn empty() -> Self {
        Self {
            source: BootstrapSource::Empty,
            loaded: 0,
            quarantined: 0,
            persisted: 0,
        }
    }
}

/// Populate `store` at startup
///
/// Prefers the durable store when it is reachable and non-empty, falls back
/// to the seed dataset (written through to the durable store when it is
/// reachable) and otherwise leaves the pool empty. Unavailability is logged
/// and reported, never papered over with invented entries.
pub fn bootstrap<D, S>(
    store: &EntryStore,
    durable: &D,
    seed: Option<&S>,
    config: &RatingConfig,
) -> Result<BootstrapReport, EngineError>
where
    D: DurableStore,
    S: SeedSource,
{
    let durable_reachable = match durable.load_all() {
        Ok(entries) if !entries.is_empty() => {
            let loaded = store.insert_many(entries)?;
            tracing::info!(loaded, "Loaded entries from durable store");
            return Ok(BootstrapReport {
                source: BootstrapSource::Durable,
                loaded,
                ..BootstrapReport::empty()
            });
        }
        Ok(_) => {
            tracing::info!("Durable store is empty");
            true
        }
        Err(e) => {
            tracing::warn!("Durable store unavailable at startup: {}", e);
            false
        }
    };

    let Some(seed) = seed else {
        tracing::error!("No durable data and no seed dataset configured, starting with an empty pool");
        return Ok(BootstrapReport::empty());
    };

    let batch = match seed.load(config) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!("Seed dataset unavailable, starting with an empty pool: {}", e);
            return Ok(BootstrapReport::empty());
        }
    };

    for row in &batch.quarantined {
        tracing::warn!(row = row.row, "Quarantined seed row: {}", row.reason);
    }
    let quarantined = batch.quarantined.len();

    if batch.entries.is_empty() {
        tracing::error!(quarantined, "Seed dataset has no usable rows, starting with an empty pool");
        return Ok(BootstrapReport {
            quarantined,
            ..BootstrapReport::empty()
        });
    }

    let persisted = if durable_reachable {
        write_through(durable, &batch.entries)
    } else {
        0
    };

    let loaded = store.insert_many(batch.entries)?;
    tracing::info!(loaded, quarantined, persisted, "Loaded entries from seed dataset");

    Ok(BootstrapReport {
        source: BootstrapSource::Seed,
        loaded,
        quarantined,
        persisted,
    })
}

fn write_through<D: DurableStore>(durable: &D, entries: &[hackduel_domain::Entry]) -> usize {
    let mut persisted = 0;
    for chunk in entries.chunks(SEED_BATCH_SIZE) {
        match durable.upsert_batch(chunk) {
            Ok(applied) => persisted += applied,
            Err(e) => {
                tracing::warn!(batch = chunk.len(), "Seed write-through failed: {}", e);
            }
        }
    }
    persisted
}
