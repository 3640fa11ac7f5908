//! Task domain model as seen by the reminder engine.
//!
//! # Responsibility
//! - Define the read-only task shape pulled from the task source.
//! - Resolve textual due dates into epoch milliseconds.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - Only incomplete tasks with a due date take part in reminder evaluation.
//! - Due date parsing failures are reported per task and never panic.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for tasks owned by the external task store.
pub type TaskId = Uuid;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Tracked work item with an optional deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Deadline in the textual form held by the task store.
    ///
    /// RFC 3339 with offset, or a naive local `YYYY-MM-DDTHH:MM[:SS]`.
    pub due_date: Option<String>,
    pub completed: bool,
}

/// Validation errors for task write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    NilId,
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
            Self::EmptyTitle => write!(f, "task title must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// Due date text that could not be resolved to a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueDateError {
    pub task_id: TaskId,
    pub raw: String,
}

impl Display for DueDateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "task {} has unparseable due date `{}`",
            self.task_id, self.raw
        )
    }
}

impl Error for DueDateError {}

impl Task {
    /// Creates an incomplete task without a deadline.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            due_date: None,
            completed: false,
        }
    }

    /// Sets the deadline from epoch milliseconds, stored as RFC 3339 UTC.
    ///
    /// Out-of-range values clear the deadline.
    pub fn with_due_epoch_ms(mut self, due_ms: i64) -> Self {
        self.due_date = Utc
            .timestamp_millis_opt(due_ms)
            .single()
            .map(|due| due.to_rfc3339());
        self
    }

    /// Sets the deadline from raw task-store text.
    pub fn with_due_text(mut self, due: impl Into<String>) -> Self {
        self.due_date = Some(due.into());
        self
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Returns whether reminder evaluation applies to this task.
    pub fn is_reminder_eligible(&self) -> bool {
        !self.completed && self.has_due_date()
    }

    fn has_due_date(&self) -> bool {
        self.due_date
            .as_deref()
            .is_some_and(|raw| !raw.trim().is_empty())
    }

    /// Resolves the deadline to epoch milliseconds.
    ///
    /// Returns `Ok(None)` when no deadline is set.
    ///
    /// # Errors
    /// - Returns `DueDateError` when the text matches no accepted format.
    pub fn due_epoch_ms(&self) -> Result<Option<i64>, DueDateError> {
        let Some(raw) = self.due_date.as_deref() else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        parse_due_text(trimmed)
            .map(Some)
            .ok_or_else(|| DueDateError {
                task_id: self.id,
                raw: raw.to_string(),
            })
    }
}

fn parse_due_text(text: &str) -> Option<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp_millis());
    }

    NAIVE_FORMATS.iter().find_map(|format| {
        let naive = NaiveDateTime::parse_from_str(text, format).ok()?;
        // DST gaps have no local mapping; folds take the earlier instant.
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.timestamp_millis())
    })
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskValidationError};
    use uuid::Uuid;

    #[test]
    fn rfc3339_due_dates_resolve_to_epoch_millis() {
        let task = Task::new("ship").with_due_text("2026-03-01T09:30:00Z");
        assert_eq!(task.due_epoch_ms().unwrap(), Some(1_772_357_400_000));

        let offset = Task::new("ship").with_due_text("2026-03-01T11:30:00+02:00");
        assert_eq!(offset.due_epoch_ms().unwrap(), Some(1_772_357_400_000));
    }

    #[test]
    fn epoch_constructor_round_trips() {
        let task = Task::new("ship").with_due_epoch_ms(1_700_000_000_000);
        assert_eq!(task.due_epoch_ms().unwrap(), Some(1_700_000_000_000));
    }

    #[test]
    fn naive_local_forms_are_accepted() {
        for raw in ["2026-03-01T09:30", "2026-03-01 09:30:15", "2026-03-01T09:30:15.250"] {
            let task = Task::new("local").with_due_text(raw);
            assert!(task.due_epoch_ms().unwrap().is_some(), "{raw} should parse");
        }
    }

    #[test]
    fn garbage_due_date_is_reported_with_task_id() {
        let task = Task::new("broken").with_due_text("next tuesday-ish");
        let err = task.due_epoch_ms().unwrap_err();
        assert_eq!(err.task_id, task.id);
        assert_eq!(err.raw, "next tuesday-ish");
    }

    #[test]
    fn eligibility_requires_open_task_with_deadline() {
        let open = Task::new("a").with_due_epoch_ms(0);
        assert!(open.is_reminder_eligible());

        let mut done = open.clone();
        done.completed = true;
        assert!(!done.is_reminder_eligible());

        assert!(!Task::new("no deadline").is_reminder_eligible());
        assert!(!Task::new("blank").with_due_text("  ").is_reminder_eligible());
    }

    #[test]
    fn validate_rejects_nil_id_and_blank_title() {
        let mut task = Task::new("ok");
        assert_eq!(task.validate(), Ok(()));

        task.title = "   ".to_string();
        assert_eq!(task.validate(), Err(TaskValidationError::EmptyTitle));

        task.id = Uuid::nil();
        assert_eq!(task.validate(), Err(TaskValidationError::NilId));
    }
}
