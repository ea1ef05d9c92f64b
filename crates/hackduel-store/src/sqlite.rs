//! SQLite-backed durable store

use crate::StoreError;
use hackduel_domain::{DurableStore, Entry, EntryId, EntryMetadata, EntryStatus, Rating, WriteOutcome};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};

const SELECT_COLUMNS: &str = "SELECT id, category, mu, sigma, status, version,
        title, subtitle, description, team_name, writeup_url, video_url, project_links
     FROM entries";

// Only replaces a row when the incoming version is strictly newer.
const UPSERT_SQL: &str = "INSERT INTO entries (id, category, mu, sigma, status, version,
        title, subtitle, description, team_name, writeup_url, video_url, project_links)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
     ON CONFLICT(id) DO UPDATE SET
        category = excluded.category,
        mu = excluded.mu,
        sigma = excluded.sigma,
        status = excluded.status,
        version = excluded.version,
        title = excluded.title,
        subtitle = excluded.subtitle,
        description = excluded.description,
        team_name = excluded.team_name,
        writeup_url = excluded.writeup_url,
        video_url = excluded.video_url,
        project_links = excluded.project_links
     WHERE excluded.version > entries.version";

/// SQLite implementation of [`DurableStore`]
///
/// The connection sits behind a mutex so one store can be shared between the
/// bootstrap path and the sync worker's blocking tasks. A store created with
/// [`SqliteStore::open_lazy`] may start without a connection; every
/// operation then retries the open and fails with the open error until it
/// succeeds.
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

fn open_connection(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.execute_batch(include_str!("schema.sql"))?;
    Ok(conn)
}

impl SqliteStore {
    /// Open (or create) a store at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = open_connection(&path)?;
        Ok(Self {
            path,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Open a store at `path`, deferring failure to the first operation
    ///
    /// Never fails: when the database cannot be opened now, the error is
    /// logged and each later call tries again.
    pub fn open_lazy<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let conn = match open_connection(&path) {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::error!(path = %path.display(), "Durable store unavailable, will retry on use: {}", e);
                None
            }
        };
        Self {
            path,
            conn: Mutex::new(conn),
        }
    }

    /// Whether a database connection is currently open
    pub fn is_connected(&self) -> bool {
        self.conn.lock().is_some()
    }

    /// Fetch one stored entry
    pub fn get(&self, id: &EntryId) -> Result<Option<Entry>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))?;
            let mut rows = stmt.query_map(params![id.as_str()], row_to_entry)?;
            let entry = rows.next().transpose()?;
            Ok(entry)
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            let conn = open_connection(&self.path)?;
            tracing::info!(path = %self.path.display(), "Durable store reopened");
            *guard = Some(conn);
        }
        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(StoreError::Unavailable(self.path.display().to_string())),
        }
    }

    fn write(conn: &Connection, entry: &Entry) -> Result<WriteOutcome, StoreError> {
        let m = &entry.metadata;
        let changed = conn.execute(
            UPSERT_SQL,
            params![
                entry.id.as_str(),
                &entry.category,
                entry.rating.mu,
                entry.rating.sigma,
                entry.status.as_str(),
                version_to_sql(entry.version)?,
                &m.title,
                &m.subtitle,
                &m.description,
                &m.team_name,
                &m.writeup_url,
                &m.video_url,
                &m.project_links,
            ],
        )?;
        Ok(if changed > 0 {
            WriteOutcome::Applied
        } else {
            WriteOutcome::Stale
        })
    }
}

fn version_to_sql(version: u64) -> Result<i64, StoreError> {
    i64::try_from(version).map_err(|_| StoreError::InvalidData(format!("Version {} exceeds i64", version)))
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(StoreError::InvalidData(message)),
    )
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<Entry> {
    let id: String = row.get(0)?;
    let status_str: String = row.get(4)?;
    let status = EntryStatus::parse(&status_str).ok_or_else(|| conversion_error(4, format!("Unknown status: {}", status_str)))?;
    let version: i64 = row.get(5)?;
    let rating = Rating::new(row.get(2)?, row.get(3)?);
    if !rating.is_valid() {
        return Err(conversion_error(3, format!("Invalid rating for {}", id)));
    }

    Ok(Entry {
        id: EntryId::new(id),
        category: row.get(1)?,
        rating,
        status,
        version: version.max(0) as u64,
        metadata: EntryMetadata {
            title: row.get(6)?,
            subtitle: row.get(7)?,
            description: row.get(8)?,
            team_name: row.get(9)?,
            writeup_url: row.get(10)?,
            video_url: row.get(11)?,
            project_links: row.get(12)?,
        },
    })
}

impl DurableStore for SqliteStore {
    type Error = StoreError;

    fn load_all(&self) -> Result<Vec<Entry>, Self::Error> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))?;
            let entries = stmt.query_map([], row_to_entry)?.collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
    }

    fn upsert(&self, entry: &Entry) -> Result<WriteOutcome, Self::Error> {
        self.with_conn(|conn| Self::write(conn, entry))
    }

    fn upsert_batch(&self, entries: &[Entry]) -> Result<usize, Self::Error> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut applied = 0;
            for entry in entries {
                if Self::write(&tx, entry)? == WriteOutcome::Applied {
                    applied += 1;
                }
            }
            tx.commit()?;
            Ok(applied)
        })
    }

    fn count(&self) -> Result<usize, Self::Error> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }
}
