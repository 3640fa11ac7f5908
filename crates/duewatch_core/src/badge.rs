//! Overdue-count badge.
//!
//! # Invariants
//! - The count reflects raw overdue state; snooze and dedup history are
//!   never consulted.
//! - Tasks whose due date cannot be parsed are not counted.

use crate::model::task::Task;
use crate::notify::ChannelError;
use log::{debug, warn};

/// Platform badge indicator.
pub trait BadgeSurface: Send + Sync {
    fn set_badge(&self, count: usize) -> Result<(), ChannelError>;
    fn clear_badge(&self) -> Result<(), ChannelError>;
}

/// Counts incomplete tasks whose deadline is strictly before `now_ms`.
pub fn compute_overdue_count(tasks: &[Task], now_ms: i64) -> usize {
    tasks
        .iter()
        .filter(|task| !task.completed)
        .filter(|task| matches!(task.due_epoch_ms(), Ok(Some(due)) if due < now_ms))
        .count()
}

/// Pushes the overdue count to a badge surface.
pub struct BadgeUpdater<'a, B: BadgeSurface + ?Sized> {
    surface: &'a B,
}

impl<'a, B: BadgeSurface + ?Sized> BadgeUpdater<'a, B> {
    pub fn new(surface: &'a B) -> Self {
        Self { surface }
    }

    /// Sets the badge to `count`, or clears it when zero.
    ///
    /// Surface failures are logged and swallowed.
    pub fn update(&self, count: usize) {
        let result = if count > 0 {
            self.surface.set_badge(count)
        } else {
            self.surface.clear_badge()
        };

        match result {
            Ok(()) => debug!("event=badge_update module=badge status=ok count={}", count),
            Err(err) => warn!(
                "event=badge_update module=badge status=error count={} error={}",
                count, err
            ),
        }
    }

    /// Computes the count over `tasks` and pushes it. Returns the count.
    pub fn refresh(&self, tasks: &[Task], now_ms: i64) -> usize {
        let count = compute_overdue_count(tasks, now_ms);
        self.update(count);
        count
    }
}
