//! CSV seed dataset ingestion
//!
//! Expected columns: `Id, Project_Title, Project_Subtitle, Project_Description,
//! Team_Name, WriteUpUrl, Video_Links, Project_Links, Tracks`. Unknown columns
//! are ignored; missing optional columns read as empty.

use crate::StoreError;
use hackduel_domain::{Entry, EntryId, EntryMetadata, QuarantinedRow, RatingConfig, SeedBatch, SeedSource};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::PathBuf;

/// Category given to rows with an empty `Tracks` cell
pub const DEFAULT_CATEGORY: &str = "Technology";

#[derive(Debug, Deserialize)]
struct SeedRow {
    #[serde(rename = "Id", default)]
    id: Option<String>,
    #[serde(rename = "Project_Title", default)]
    title: Option<String>,
    #[serde(rename = "Project_Subtitle", default)]
    subtitle: Option<String>,
    #[serde(rename = "Project_Description", default)]
    description: Option<String>,
    #[serde(rename = "Team_Name", default)]
    team_name: Option<String>,
    #[serde(rename = "WriteUpUrl", default)]
    writeup_url: Option<String>,
    #[serde(rename = "Video_Links", default)]
    video_links: Option<String>,
    #[serde(rename = "Project_Links", default)]
    project_links: Option<String>,
    #[serde(rename = "Tracks", default)]
    tracks: Option<String>,
}

/// Exports leave `nan` where a cell was empty.
fn clean(cell: Option<String>) -> String {
    match cell {
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.eq_ignore_ascii_case("nan") {
                String::new()
            } else {
                trimmed.to_string()
            }
        }
        None => String::new(),
    }
}

fn first_link(links: &str) -> String {
    links.split(',').next().unwrap_or_default().trim().to_string()
}

impl SeedRow {
    fn into_entry(self, config: &RatingConfig) -> Result<Entry, String> {
        let id = EntryId::parse(&clean(self.id)).map_err(|_| "missing Id".to_string())?;

        let title = clean(self.title);
        if title.is_empty() {
            return Err(format!("entry {} has no Project_Title", id));
        }

        let mut category = clean(self.tracks);
        if category.is_empty() {
            category = DEFAULT_CATEGORY.to_string();
        }

        let metadata = EntryMetadata {
            title,
            subtitle: clean(self.subtitle),
            description: clean(self.description),
            team_name: clean(self.team_name),
            writeup_url: clean(self.writeup_url),
            video_url: first_link(&clean(self.video_links)),
            project_links: clean(self.project_links),
        };

        Ok(Entry::new(id, category, metadata, config))
    }
}

/// Parse a seed dataset into validated entries
///
/// Rows that cannot be decoded, lack an id or title, or repeat an id seen
/// earlier are quarantined instead of failing the whole load. Only an
/// unreadable header is an error.
pub fn parse_seed<R: Read>(reader: R, config: &RatingConfig) -> Result<SeedBatch, StoreError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    csv_reader.headers()?;

    let mut batch = SeedBatch::default();
    let mut seen = HashSet::new();

    for (index, record) in csv_reader.deserialize::<SeedRow>().enumerate() {
        let row = index + 1;
        let parsed = record
            .map_err(|e| e.to_string())
            .and_then(|r| r.into_entry(config));

        match parsed {
            Ok(entry) if !seen.insert(entry.id.clone()) => {
                batch.quarantined.push(QuarantinedRow {
                    row,
                    reason: format!("duplicate Id {}", entry.id),
                });
            }
            Ok(entry) => batch.entries.push(entry),
            Err(reason) => batch.quarantined.push(QuarantinedRow { row, reason }),
        }
    }

    Ok(batch)
}

/// Seed dataset stored as a CSV file on disk
#[derive(Debug, Clone)]
pub struct CsvSeed {
    path: PathBuf,
}

impl CsvSeed {
    /// Seed source reading from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the dataset
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SeedSource for CsvSeed {
    type Error = StoreError;

    fn load(&self, config: &RatingConfig) -> Result<SeedBatch, Self::Error> {
        let file = std::fs::File::open(&self.path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        parse_seed(file, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Id,Project_Title,Project_Subtitle,Project_Description,Team_Name,WriteUpUrl,Video_Links,Project_Links,Tracks\n";

    fn parse(body: &str) -> SeedBatch {
        let data = format!("{}{}", HEADER, body);
        parse_seed(data.as_bytes(), &RatingConfig::default()).unwrap()
    }

    #[test]
    fn test_valid_row() {
        let batch = parse("7,Rover,Mars bot,Drives,Team X,http://w,\"http://v1, http://v2\",http://p,Robotics\n");

        assert_eq!(batch.entries.len(), 1);
        assert!(batch.quarantined.is_empty());

        let entry = &batch.entries[0];
        assert_eq!(entry.id.as_str(), "7");
        assert_eq!(entry.category, "Robotics");
        assert_eq!(entry.metadata.video_url, "http://v1");
        assert_eq!(entry.rating, RatingConfig::default().initial_rating());
    }

    #[test]
    fn test_blank_track_gets_default_category() {
        let batch = parse("1,Title,,,,,,,\n");
        assert_eq!(batch.entries[0].category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_nan_cells_become_empty() {
        let batch = parse("1,Title,nan,NaN,nan,,nan,,AI\n");
        let m = &batch.entries[0].metadata;
        assert_eq!(m.subtitle, "");
        assert_eq!(m.description, "");
        assert_eq!(m.video_url, "");
    }

    #[test]
    fn test_malformed_rows_are_quarantined() {
        let batch = parse(",No id,,,,,,,AI\n2,,,,,,,,AI\n3,Good,,,,,,,AI\n3,Dup,,,,,,,AI\n");

        assert_eq!(batch.entries.len(), 1);
        let rows: Vec<usize> = batch.quarantined.iter().map(|q| q.row).collect();
        assert_eq!(rows, vec![1, 2, 4]);
        assert!(batch.quarantined[2].reason.contains("duplicate"));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let seed = CsvSeed::new("/definitely/not/here.csv");
        assert!(matches!(seed.load(&RatingConfig::default()), Err(StoreError::Unavailable(_))));
    }
}
