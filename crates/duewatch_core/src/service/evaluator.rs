//! Reminder decision function.
//!
//! # Responsibility
//! - Decide, for one task at one instant, whether a reminder fires and
//!   which message it carries.
//! - Produce the next dedup record for the evaluating context.
//!
//! # Invariants
//! - Pure: no I/O, no clock reads; identical inputs give identical output.
//! - At most one reminder per call.
//! - Feeding `next_history` back in at the same instant yields no reminder.
//! - An active snooze returns the input record untouched.
//! - Flags are only ever added, never removed.

use crate::model::history::{HistoryRecord, PollerContext};
use crate::model::milestone::{Reminder, MILESTONES, ONE_DAY_MS, RECURRING_DAILY};
use crate::model::task::{DueDateError, Task};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of evaluating one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub to_notify: Option<Reminder>,
    pub next_history: HistoryRecord,
    changed: bool,
}

impl Evaluation {
    fn unchanged(history: &HistoryRecord) -> Self {
        Self {
            to_notify: None,
            next_history: history.clone(),
            changed: false,
        }
    }

    /// Returns whether `next_history` differs from the input record.
    pub fn history_changed(&self) -> bool {
        self.changed
    }
}

/// Per-task evaluation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    DueDate(DueDateError),
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DueDate(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EvaluationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DueDate(err) => Some(err),
        }
    }
}

impl From<DueDateError> for EvaluationError {
    fn from(value: DueDateError) -> Self {
        Self::DueDate(value)
    }
}

/// Evaluates `task` at `now_ms` against `history` in `context`'s namespace.
///
/// Milestones are scanned in ascending offset order and the last crossed,
/// unflagged one wins, so a poll gap that crosses several milestones
/// dispatches only the most overdue message. Every crossed milestone is
/// then flagged, whether or not anything was dispatched.
///
/// Once a task is more than a day overdue, the recurring reminder replaces
/// the milestone candidate whenever a full day has passed since this
/// context last notified.
///
/// # Errors
/// - Returns `EvaluationError::DueDate` when the due date cannot be parsed.
pub fn evaluate(
    task: &Task,
    now_ms: i64,
    history: &HistoryRecord,
    context: PollerContext,
) -> Result<Evaluation, EvaluationError> {
    if task.completed {
        return Ok(Evaluation::unchanged(history));
    }
    let Some(due_ms) = task.due_epoch_ms()? else {
        return Ok(Evaluation::unchanged(history));
    };

    if history.is_snoozed_at(now_ms) {
        return Ok(Evaluation::unchanged(history));
    }

    let diff = now_ms.saturating_sub(due_ms);

    let mut candidate = None;
    for milestone in MILESTONES {
        if milestone.is_smart_skipped(diff) {
            continue;
        }
        if milestone.is_crossed(diff) && !history.is_flagged(&context.flag_key(milestone.id)) {
            candidate = Some(Reminder::Milestone(milestone));
        }
    }

    let last_notified = history.last_notified(context).unwrap_or(0);
    if diff > ONE_DAY_MS && now_ms.saturating_sub(last_notified) >= ONE_DAY_MS {
        candidate = Some(Reminder::Recurring(&RECURRING_DAILY));
    }

    let mut next_history = history.clone();
    let mut changed = false;
    for milestone in MILESTONES.iter().filter(|m| m.is_crossed(diff)) {
        let key = context.flag_key(milestone.id);
        if !next_history.is_flagged(&key) {
            next_history.set_flag(key.into_owned());
            changed = true;
        }
    }
    if candidate.is_some() {
        next_history.set_last_notified(context, now_ms);
        changed = true;
    }

    Ok(Evaluation {
        to_notify: candidate,
        next_history,
        changed,
    })
}
