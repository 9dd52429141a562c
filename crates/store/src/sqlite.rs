//! SQLite-backed event store.
//!
//! Each operation opens its own connection on a blocking task, so no lock is
//! shared between requests; SQLite's own locking (WAL mode plus a busy
//! timeout) serialises concurrent writers. Insertion order is the `seq`
//! column.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    AuthorName, BranchName, Event, EventAction, EventStore, RecentQuery, RecordId, RequestId,
    StoreError, StoredEvent, Timestamp,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str =
    "record_id, request_id, author, action, from_branch, to_branch, timestamp";

/// Event store persisted in a single SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteEventStore {
    db_path: PathBuf,
}

impl SqliteEventStore {
    /// Opens (creating if needed) the database at `db_path` and applies the schema.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(unavailable)?;
            }
        }
        let conn = connect(&db_path)?;
        migrate(&conn)?;
        tracing::info!(path = %db_path.display(), "opened sqlite event store");
        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Runs `op` against a fresh connection on the blocking thread pool.
    async fn with_connection<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connect(&db_path)?;
            op(&conn)
        })
        .await
        .map_err(|err| StoreError::Unavailable(format!("storage task failed: {err}")))?
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn insert(&self, event: Event) -> Result<StoredEvent, StoreError> {
        let stored = StoredEvent::new(RecordId::new_random(), event);
        let row = stored.clone();
        self.with_connection(move |conn| {
            let event = &row.event;
            conn.execute(
                "INSERT INTO events
                   (record_id, request_id, author, action, from_branch, to_branch, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.id.to_string(),
                    event.request_id().as_str(),
                    event.author().as_str(),
                    event.action().as_str(),
                    event.from_branch().map(BranchName::as_str),
                    event.to_branch().as_str(),
                    event.timestamp().as_unix_seconds(),
                ],
            )
            .map_err(unavailable)?;
            Ok(())
        })
        .await?;
        tracing::debug!(record_id = %stored.id, "stored event in sqlite");
        Ok(stored)
    }

    async fn query_recent(&self, query: RecentQuery) -> Result<Vec<StoredEvent>, StoreError> {
        self.with_connection(move |conn| {
            let cutoff = query
                .cutoff()
                .map_or(i64::MIN, Timestamp::as_unix_seconds);
            let sql = match query.limit {
                Some(_) => format!(
                    "SELECT {SELECT_COLUMNS} FROM events WHERE timestamp >= ?1
                     ORDER BY timestamp DESC, seq DESC LIMIT ?2"
                ),
                None => format!(
                    "SELECT {SELECT_COLUMNS} FROM events WHERE timestamp >= ?1
                     ORDER BY timestamp ASC, seq ASC"
                ),
            };
            let mut stmt = conn.prepare(&sql).map_err(unavailable)?;
            let raw = match query.limit {
                Some(limit) => {
                    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
                    stmt.query_map(params![cutoff, limit], RawEvent::from_row)
                }
                None => stmt.query_map(params![cutoff], RawEvent::from_row),
            }
            .map_err(unavailable)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(unavailable)?;

            raw.into_iter().map(RawEvent::into_stored).collect()
        })
        .await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.with_connection(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
                .map_err(unavailable)?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
        .await
    }
}

fn connect(db_path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(db_path).map_err(unavailable)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
    Ok(conn)
}

fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;

        CREATE TABLE IF NOT EXISTS events (
          seq INTEGER PRIMARY KEY AUTOINCREMENT,
          record_id TEXT NOT NULL,
          request_id TEXT NOT NULL,
          author TEXT NOT NULL,
          action TEXT NOT NULL,
          from_branch TEXT,
          to_branch TEXT NOT NULL,
          timestamp INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS events_by_time ON events (timestamp, seq);
        "#,
    )
    .map_err(unavailable)
}

fn unavailable(err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// A row as stored, before it is checked against the event invariants.
struct RawEvent {
    record_id: String,
    request_id: String,
    author: String,
    action: String,
    from_branch: Option<String>,
    to_branch: String,
    timestamp: i64,
}

impl RawEvent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record_id: row.get(0)?,
            request_id: row.get(1)?,
            author: row.get(2)?,
            action: row.get(3)?,
            from_branch: row.get(4)?,
            to_branch: row.get(5)?,
            timestamp: row.get(6)?,
        })
    }

    fn into_stored(self) -> Result<StoredEvent, StoreError> {
        let corrupt = |field: &str| StoreError::Corrupt(format!("record {}: bad {field}", self.record_id));

        let id = Uuid::parse_str(&self.record_id).map_err(|_| corrupt("record_id"))?;
        let action = EventAction::parse(&self.action).ok_or_else(|| corrupt("action"))?;
        let from_branch = match self.from_branch.clone() {
            Some(name) => Some(BranchName::new(name).ok_or_else(|| corrupt("from_branch"))?),
            None => None,
        };
        let event = Event::from_parts(
            RequestId::new(self.request_id.clone()).ok_or_else(|| corrupt("request_id"))?,
            AuthorName::new(self.author.clone()).ok_or_else(|| corrupt("author"))?,
            action,
            from_branch,
            BranchName::new(self.to_branch.clone()).ok_or_else(|| corrupt("to_branch"))?,
            Timestamp::from_unix_seconds(self.timestamp),
        )
        .ok_or_else(|| corrupt("from_branch"))?;

        Ok(StoredEvent::new(RecordId::from_uuid(id), event))
    }
}
