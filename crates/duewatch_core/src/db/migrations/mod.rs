//! Ordered schema steps for the reminder database.
//!
//! # Responsibility
//! - Keep the schema steps in one ordered table.
//! - Bring a database up to the newest step in a single write transaction.
//!
//! # Invariants
//! - Step versions are contiguous and start at 1.
//! - The newest applied step is mirrored to `PRAGMA user_version`.
//! - Two poller contexts may open a fresh file at the same moment; the
//!   version is re-read under the write lock, so each step runs once.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// Schema steps, indexed by `version - 1`.
const STEPS: &[(u32, &str)] = &[
    (1, include_str!("0001_tasks.sql")),
    (2, include_str!("0002_reminder_history.sql")),
];

/// Newest schema version this build can read and write.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |(version, _)| *version)
}

/// Applies every step newer than the database's `user_version`.
///
/// # Errors
/// - [`DbError::UnsupportedSchemaVersion`] when the file was written by a
///   newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let latest = latest_version();
    if check_version(user_version(conn)?, latest)? {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from = user_version(&tx)?;
    if check_version(from, latest)? {
        // The other context finished first.
        return Ok(());
    }

    info!(
        "event=db_migrate module=db status=start from_version={} to_version={}",
        from, latest
    );
    for (version, sql) in STEPS.iter().filter(|(version, _)| *version > from) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;
    info!("event=db_migrate module=db status=ok version={}", latest);
    Ok(())
}

/// `Ok(true)` when nothing is left to apply.
fn check_version(current: u32, latest: u32) -> DbResult<bool> {
    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    Ok(current == latest)
}

fn user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}
