//! Snooze use-case service.
//!
//! # Invariants
//! - Snoozing only sets `snooze_until`; milestone flags and notification
//!   clocks are carried over untouched.
//! - The snooze deadline is shared by both poller contexts.

use crate::model::task::TaskId;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::history_repo::{HistoryStore, HistoryUpdate};
use log::info;

/// Suppresses reminder evaluation for a task until a deadline.
pub struct SnoozeService<H: HistoryStore> {
    store: H,
}

impl<H: HistoryStore> SnoozeService<H> {
    pub fn new(store: H) -> Self {
        Self { store }
    }

    /// Snoozes `task_id` until `now_ms + duration_ms`.
    ///
    /// Returns the stored deadline.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when the task does not exist.
    pub fn snooze(&self, task_id: TaskId, now_ms: i64, duration_ms: i64) -> RepoResult<i64> {
        let until_ms = now_ms.saturating_add(duration_ms.max(0));

        self.store
            .update_history(task_id, |current| -> Result<_, RepoError> {
                let mut next = current.clone();
                next.set_snooze_until(until_ms);
                Ok(HistoryUpdate::write(next, ()))
            })?;

        info!(
            "event=snooze_set module=snooze status=ok task_id={} until_ms={}",
            task_id, until_ms
        );
        Ok(until_ms)
    }
}
