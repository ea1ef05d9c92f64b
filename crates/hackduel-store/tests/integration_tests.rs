//! Integration tests for hackduel-store
//!
//! These tests verify durable round-trips and seed ingestion against real files.

use hackduel_domain::traits::{DurableStore, SeedSource, WriteOutcome};
use hackduel_domain::{rate_match, Entry, EntryId, EntryMetadata, EntryStatus, RatingConfig};
use hackduel_store::{CsvSeed, SqliteStore};
use std::io::Write;

fn sample_entry(id: &str, category: &str) -> Entry {
    Entry::new(
        EntryId::new(id),
        category,
        EntryMetadata {
            title: format!("Project {}", id),
            team_name: "Team".to_string(),
            ..Default::default()
        },
        &RatingConfig::default(),
    )
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_round_trip_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hackduel.db");
    let config = RatingConfig::default();

    let mut winner = sample_entry("a", "AI");
    let mut loser = sample_entry("b", "AI");
    let (w, l) = rate_match(winner.rating, loser.rating, &config);
    winner.rating = w;
    winner.version = 1;
    loser.rating = l;
    loser.status = EntryStatus::Archived;
    loser.version = 2;

    {
        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.upsert(&winner).unwrap(), WriteOutcome::Applied);
        assert_eq!(store.upsert(&loser).unwrap(), WriteOutcome::Applied);
    }

    // Reopen: simulates a restart
    let store = SqliteStore::new(&path).unwrap();
    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0], winner);
    assert_eq!(loaded[1], loser);
    assert_eq!(loaded[1].status, EntryStatus::Archived);
}

#[test]
fn test_upsert_batch_counts_applied() {
    let store = SqliteStore::new(":memory:").unwrap();
    let entries: Vec<Entry> = (0..5).map(|i| sample_entry(&i.to_string(), "Health")).collect();

    assert_eq!(store.upsert_batch(&entries).unwrap(), 5);
    // Same versions again: nothing applied
    assert_eq!(store.upsert_batch(&entries).unwrap(), 0);
    assert_eq!(store.count().unwrap(), 5);
}

#[test]
fn test_seed_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Id,Project_Title,Tracks,Extra").unwrap();
    writeln!(file, "10,Alpha,AI,ignored").unwrap();
    writeln!(file, "11,Beta,,ignored").unwrap();
    writeln!(file, "12,,AI,ignored").unwrap();

    let batch = CsvSeed::new(file.path()).load(&RatingConfig::default()).unwrap();

    assert_eq!(batch.entries.len(), 2);
    assert_eq!(batch.quarantined.len(), 1);
    assert_eq!(batch.quarantined[0].row, 3);
    assert_eq!(batch.entries[1].category, "Technology");
}
