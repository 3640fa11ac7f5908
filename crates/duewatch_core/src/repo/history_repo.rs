//! Reminder history store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist one `HistoryRecord` per task as a JSON document.
//! - Offer a per-task read-modify-write primitive for poller contexts.
//!
//! # Invariants
//! - `put_history` replaces the whole record; there is no field patching.
//! - `update_history` holds the SQLite write lock from read to write, so two
//!   contexts never interleave on one task's record.
//! - Missing records read as `HistoryRecord::default()`.

use crate::model::history::HistoryRecord;
use crate::model::task::TaskId;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::{
    params, Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior,
};

/// Outcome of a read-modify-write step.
#[derive(Debug)]
pub struct HistoryUpdate<T> {
    /// Record to store, or `None` to leave the stored record as it was.
    pub write: Option<HistoryRecord>,
    pub value: T,
}

impl<T> HistoryUpdate<T> {
    pub fn keep(value: T) -> Self {
        Self { write: None, value }
    }

    pub fn write(record: HistoryRecord, value: T) -> Self {
        Self {
            write: Some(record),
            value,
        }
    }
}

/// Persistence for reminder dedup records, keyed by task id.
pub trait HistoryStore {
    fn get_history(&self, task_id: TaskId) -> RepoResult<HistoryRecord>;
    fn put_history(&self, task_id: TaskId, record: &HistoryRecord) -> RepoResult<()>;

    /// Reads the record, lets `update` derive the next one, and writes it.
    ///
    /// The default implementation is a plain get followed by put.
    /// Implementations backed by a shared database should make the whole
    /// step atomic for `task_id`.
    fn update_history<T, E, F>(&self, task_id: TaskId, update: F) -> Result<T, E>
    where
        E: From<RepoError>,
        F: FnOnce(&HistoryRecord) -> Result<HistoryUpdate<T>, E>,
    {
        let current = self.get_history(task_id)?;
        let HistoryUpdate { write, value } = update(&current)?;
        if let Some(next) = write {
            self.put_history(task_id, &next)?;
        }
        Ok(value)
    }
}

/// SQLite-backed history store sharing the task database.
pub struct SqliteHistoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHistoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl HistoryStore for SqliteHistoryRepository<'_> {
    fn get_history(&self, task_id: TaskId) -> RepoResult<HistoryRecord> {
        read_history(self.conn, task_id)
    }

    fn put_history(&self, task_id: TaskId, record: &HistoryRecord) -> RepoResult<()> {
        write_history(self.conn, task_id, record)
    }

    fn update_history<T, E, F>(&self, task_id: TaskId, update: F) -> Result<T, E>
    where
        E: From<RepoError>,
        F: FnOnce(&HistoryRecord) -> Result<HistoryUpdate<T>, E>,
    {
        // IMMEDIATE takes the write lock up front; a deferred read-then-write
        // could fail to upgrade while the other context holds it.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;

        let current = read_history(&tx, task_id)?;
        // Dropping `tx` on an early return rolls back.
        let HistoryUpdate { write, value } = update(&current)?;
        if let Some(next) = write {
            write_history(&tx, task_id, &next)?;
        }

        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

fn read_history(conn: &Connection, task_id: TaskId) -> RepoResult<HistoryRecord> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT history FROM reminder_history WHERE task_id = ?1;",
            [task_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    let Some(json) = stored else {
        return Ok(HistoryRecord::default());
    };

    serde_json::from_str(&json).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid reminder_history.history for task {task_id}: {err}"
        ))
    })
}

fn write_history(conn: &Connection, task_id: TaskId, record: &HistoryRecord) -> RepoResult<()> {
    let json = serde_json::to_string(record).map_err(|err| {
        RepoError::InvalidData(format!("cannot encode history for task {task_id}: {err}"))
    })?;

    let result = conn.execute(
        "INSERT INTO reminder_history (task_id, history, updated_at)
         VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
         ON CONFLICT (task_id) DO UPDATE SET
            history = excluded.history,
            updated_at = excluded.updated_at;",
        params![task_id.to_string(), json],
    );

    match result {
        Ok(_) => Ok(()),
        // Foreign key miss: the owning task does not exist (or was deleted).
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            Err(RepoError::NotFound(task_id))
        }
        Err(err) => Err(err.into()),
    }
}
