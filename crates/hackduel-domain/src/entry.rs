//! Entry module - the ranked unit of HackDuel

use crate::rating::{Rating, RatingConfig};
use crate::status::EntryStatus;
use std::fmt;

/// Stable identifier of an entry, taken verbatim from the ingestion dataset
///
/// Identifiers are opaque non-empty strings. They are totally ordered so that
/// two entries can always be locked in the same order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntryId(String);

impl EntryId {
    /// Create an identifier without validation
    ///
    /// Prefer [`EntryId::parse`] at input boundaries.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parse an identifier, trimming whitespace and rejecting blanks
    ///
    /// # Examples
    ///
    /// ```
    /// use hackduel_domain::EntryId;
    ///
    /// let id = EntryId::parse(" 42 ").unwrap();
    /// assert_eq!(id.as_str(), "42");
    /// assert!(EntryId::parse("   ").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Entry id must not be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Descriptive fields carried through the engine untouched
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EntryMetadata {
    /// Project title
    pub title: String,
    /// One-line tagline
    pub subtitle: String,
    /// Free-text description
    pub description: String,
    /// Submitting team
    pub team_name: String,
    /// Link to the written submission
    pub writeup_url: String,
    /// First demo video link
    pub video_url: String,
    /// Any further project links, as submitted
    pub project_links: String,
}

impl EntryMetadata {
    /// Metadata with only a title set
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// An entry - one competing project and its skill belief
///
/// `version` is bumped by the entry store on every committed mutation and is
/// what the durable store uses to resolve out-of-order writes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    /// Unique identifier
    pub id: EntryId,

    /// Category (track) used to scope pairing and leaderboards
    pub category: String,

    /// Current skill belief
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub rating: Rating,

    /// Lifecycle state
    pub status: EntryStatus,

    /// Commit stamp, starts at 0
    pub version: u64,

    /// Opaque descriptive data
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub metadata: EntryMetadata,
}

impl Entry {
    /// Create a fresh entry at the initial rating `(μ₀, σ₀)`
    pub fn new(
        id: EntryId,
        category: impl Into<String>,
        metadata: EntryMetadata,
        config: &RatingConfig,
    ) -> Self {
        Self {
            id,
            category: category.into(),
            rating: config.initial_rating(),
            status: EntryStatus::Active,
            version: 0,
            metadata,
        }
    }

    /// Whether the entry is in the active pool
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Whether the entry belongs to the given category scope
    ///
    /// `None` is the unfiltered scope and matches every entry.
    pub fn in_category(&self, category: Option<&str>) -> bool {
        category.is_none_or(|c| self.category == c)
    }
}

/// A reported comparison result. Draws are not modeled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchOutcome {
    /// Entry judged better
    pub winner_id: EntryId,
    /// Entry judged worse
    pub loser_id: EntryId,
    /// When the vote was cast (milliseconds since Unix epoch)
    pub timestamp: u64,
}

impl MatchOutcome {
    /// Create an outcome stamped with the current time
    pub fn now(winner_id: EntryId, loser_id: EntryId) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            winner_id,
            loser_id,
            timestamp,
        }
    }

    /// A self-match cannot be rated
    pub fn is_self_match(&self) -> bool {
        self.winner_id == self.loser_id
    }
}
