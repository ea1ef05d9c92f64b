//! Status module - lifecycle state of an entry

/// Lifecycle state of an entry
///
/// Entries start `Active` and may be archived exactly once:
/// - Active: eligible for pairing, ranking and confidence computation
/// - Archived: retained for audit and listing, excluded everywhere else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EntryStatus {
    /// Participates in matchmaking and leaderboards
    #[default]
    Active,

    /// Removed from the active pool, never deleted
    Archived,
}

impl EntryStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Active => "active",
            EntryStatus::Archived => "archived",
        }
    }

    /// Parse a status from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(EntryStatus::Active),
            "archived" => Some(EntryStatus::Archived),
            _ => None,
        }
    }

    /// Whether the entry takes part in pairing and ranking
    pub fn is_active(&self) -> bool {
        matches!(self, EntryStatus::Active)
    }

    /// The state reached by archiving, if it differs from the current one
    ///
    /// Returns `None` for `Archived`: the transition is one-way and archiving
    /// again is a no-op.
    pub fn archive(&self) -> Option<Self> {
        match self {
            EntryStatus::Active => Some(EntryStatus::Archived),
            EntryStatus::Archived => None,
        }
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid entry status: {}", s))
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
