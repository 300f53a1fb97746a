//! SQLite-based session log and statistics.
//!
//! The log is append-only, keeps insertion order, and holds at most
//! [`MAX_SESSIONS`] entries; recording past the cap evicts the oldest.
//! Statistics are derived by scanning the log on every call.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::{data_dir, CONFIG_FILE};
use crate::error::{DatabaseError, Result};
use crate::timer::{CompletedSession, SessionKind};

pub const MAX_SESSIONS: usize = 100;

/// A completed session as persisted, with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub kind: SessionKind,
    pub duration_secs: u64,
    pub completed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Calendar day of completion in local time.
    pub fn local_date(&self) -> NaiveDate {
        self.completed_at.with_timezone(&Local).date_naive()
    }
}

/// Session counts partitioned by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub sessions: u64,
    pub work_sessions: u64,
    pub break_sessions: u64,
}

impl KindCounts {
    fn tally<'a>(records: impl IntoIterator<Item = &'a SessionRecord>) -> Self {
        records.into_iter().fold(Self::default(), |mut acc, r| {
            acc.sessions += 1;
            match r.kind {
                SessionKind::Work => acc.work_sessions += 1,
                SessionKind::Break => acc.break_sessions += 1,
            }
            acc
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub today: KindCounts,
    pub total: KindCounts,
}

/// SQLite store for completed sessions.
///
/// Mutations take `&mut self`, so a store has exactly one writer at a time.
pub struct SessionStore {
    conn: Connection,
    /// Settings file removed alongside the log by `clear_all`.
    settings_path: Option<PathBuf>,
}

impl SessionStore {
    /// Open `<data dir>/pomotick.db`, paired with `<data dir>/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir()?;
        let store = Self::open_at(&dir.join("pomotick.db"))?;
        Ok(store.with_settings_path(dir.join(CONFIG_FILE)))
    }

    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self {
            conn,
            settings_path: None,
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            settings_path: None,
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                kind          TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                completed_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);",
        )?;
        Ok(())
    }

    /// Append a completed session, evicting the oldest entries past the cap.
    ///
    /// # Errors
    /// Returns an error if the write fails; the log is left unchanged.
    pub fn record(&mut self, session: &CompletedSession) -> Result<SessionRecord, DatabaseError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO sessions (kind, duration_secs, completed_at) VALUES (?1, ?2, ?3)",
            params![
                session.kind.as_str(),
                session.duration_secs as i64,
                session.completed_at.to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        let evicted = tx.execute(
            "DELETE FROM sessions
             WHERE id NOT IN (SELECT id FROM sessions ORDER BY id DESC LIMIT ?1)",
            params![MAX_SESSIONS as i64],
        )?;
        tx.commit()?;

        if evicted > 0 {
            tracing::debug!(evicted, "session log trimmed to cap");
        }
        Ok(SessionRecord {
            id,
            kind: session.kind,
            duration_secs: session.duration_secs,
            completed_at: session.completed_at,
        })
    }

    /// Every stored session, in insertion order.
    pub fn list_all(&self) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, duration_secs, completed_at FROM sessions ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, kind, duration_secs, completed_at) = row?;
            records.push(decode_row(id, &kind, duration_secs, &completed_at)?);
        }
        Ok(records)
    }

    /// Sessions whose local completion date is `date`, in insertion order.
    pub fn list_on(&self, date: NaiveDate) -> Result<Vec<SessionRecord>, DatabaseError> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|r| r.local_date() == date)
            .collect())
    }

    pub fn list_today(&self) -> Result<Vec<SessionRecord>, DatabaseError> {
        self.list_on(Local::now().date_naive())
    }

    /// Sessions completed at or after `since`, in insertion order.
    pub fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<SessionRecord>, DatabaseError> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|r| r.completed_at >= since)
            .collect())
    }

    /// Statistics with `today` meaning the local calendar day `date`.
    pub fn stats_on(&self, date: NaiveDate) -> Result<StatsSnapshot, DatabaseError> {
        let all = self.list_all()?;
        Ok(StatsSnapshot {
            today: KindCounts::tally(all.iter().filter(|r| r.local_date() == date)),
            total: KindCounts::tally(&all),
        })
    }

    pub fn stats(&self) -> Result<StatsSnapshot, DatabaseError> {
        self.stats_on(Local::now().date_naive())
    }

    pub fn len(&self) -> Result<usize, DatabaseError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, DatabaseError> {
        Ok(self.len()? == 0)
    }

    /// Delete every session and the paired settings file. Irreversible.
    ///
    /// # Errors
    /// Returns an error if the delete fails or the settings file exists but
    /// cannot be removed.
    pub fn clear_all(&mut self) -> Result<()> {
        self.conn
            .execute("DELETE FROM sessions", [])
            .map_err(DatabaseError::from)?;
        if let Some(path) = &self.settings_path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!("all sessions and settings cleared");
        Ok(())
    }
}

fn decode_row(
    id: i64,
    kind: &str,
    duration_secs: i64,
    completed_at: &str,
) -> Result<SessionRecord, DatabaseError> {
    let corrupt = |message: String| DatabaseError::CorruptRow { id, message };
    let kind = kind.parse::<SessionKind>().map_err(corrupt)?;
    let duration_secs = u64::try_from(duration_secs).map_err(|e| corrupt(e.to_string()))?;
    let completed_at = DateTime::parse_from_rfc3339(completed_at)
        .map_err(|e| corrupt(e.to_string()))?
        .with_timezone(&Utc);
    Ok(SessionRecord {
        id,
        kind,
        duration_secs,
        completed_at,
    })
}

#[cfg(test)]
impl SessionStore {
    /// Drop the sessions table so every later read and write fails.
    pub(crate) fn break_schema(&self) {
        self.conn.execute_batch("DROP TABLE sessions;").unwrap();
    }
}
