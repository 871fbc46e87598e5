/// Door status event store
///
/// Append-only log of observed status transitions, kept in SQLite.
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::door::{DoorStatus, StatusEvent};

/// How far back the history view reaches.
pub const HISTORY_DAYS: i64 = 365;

/// A persisted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredStatus {
    pub id: i64,
    pub status: DoorStatus,
    pub created_at: DateTime<Utc>,
}

impl StoredStatus {
    /// Present this row to a client that read it at `fetched_at`.
    pub fn to_event(&self, fetched_at: DateTime<Utc>) -> StatusEvent {
        StatusEvent::new(self.status, self.created_at, fetched_at)
    }
}

/// A status change recorded by [`DoorDb::record_if_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: DoorStatus,
    pub to: DoorStatus,
    pub at: DateTime<Utc>,
}

/// Database handle for door status operations
pub struct DoorDb {
    conn: Connection,
}

impl DoorDb {
    /// Initialize or open the status database inside `data_dir`
    pub fn init(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        let db_path = data_dir.join("door.sqlite");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        Self::with_connection(conn)
    }

    /// Throwaway database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS door_status (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )
        .context("Failed to create door_status table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS door_status_created_at ON door_status (created_at)",
            [],
        )
        .context("Failed to create door_status index")?;

        Ok(Self { conn })
    }

    /// Append a transition unconditionally
    pub fn append(&self, status: DoorStatus, at: DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO door_status (status, created_at) VALUES (?1, ?2)",
                params![status.as_str(), at.timestamp_millis()],
            )
            .with_context(|| format!("Failed to record door status '{}'", status))?;
        Ok(())
    }

    /// Most recent transition, if any
    pub fn latest(&self) -> Result<Option<StoredStatus>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, status, created_at FROM door_status
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, status, created_at)| stored_status(id, status, created_at))
            .transpose()
    }

    /// Record `observed` only if it differs from the latest stored status.
    ///
    /// An empty store counts as `Unknown`, so observing `Unknown` first records nothing.
    pub fn record_if_changed(
        &self,
        observed: DoorStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Transition>> {
        let previous = self
            .latest()?
            .map(|stored| stored.status)
            .unwrap_or(DoorStatus::Unknown);

        if previous == observed {
            return Ok(None);
        }

        self.append(observed, at)?;
        Ok(Some(Transition {
            from: previous,
            to: observed,
            at,
        }))
    }

    /// Transitions created at or after `from`, newest first
    pub fn history_since(&self, from: DateTime<Utc>) -> Result<Vec<StoredStatus>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, status, created_at FROM door_status
             WHERE created_at >= ?1
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt
            .query_map(params![from.timestamp_millis()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<(i64, String, i64)>, _>>()?;

        rows.into_iter()
            .map(|(id, status, created_at)| stored_status(id, status, created_at))
            .collect()
    }

    /// Get the number of stored transitions
    pub fn count(&self) -> Result<usize> {
        let count: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM door_status", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Current status as seen at `now`; `Unknown since now` when nothing was recorded yet.
    pub fn current_status(&self, now: DateTime<Utc>) -> Result<StatusEvent> {
        Ok(match self.latest()? {
            Some(stored) => stored.to_event(now),
            None => StatusEvent::new(DoorStatus::Unknown, now, now),
        })
    }

    /// The last [`HISTORY_DAYS`] of transitions as events, newest first.
    pub fn history_events(&self, now: DateTime<Utc>) -> Result<Vec<StatusEvent>> {
        let from = now - Duration::days(HISTORY_DAYS);
        Ok(self
            .history_since(from)?
            .iter()
            .map(|stored| stored.to_event(now))
            .collect())
    }
}

fn stored_status(id: i64, status: String, created_at: i64) -> Result<StoredStatus> {
    let status = status
        .parse::<DoorStatus>()
        .with_context(|| format!("Corrupt door_status row {}", id))?;
    let created_at = Utc
        .timestamp_millis_opt(created_at)
        .single()
        .with_context(|| format!("Corrupt created_at {} in door_status row {}", created_at, id))?;

    Ok(StoredStatus {
        id,
        status,
        created_at,
    })
}
