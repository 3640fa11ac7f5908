//! One poller tick: evaluate every task and deliver decided reminders.
//!
//! # Responsibility
//! - Pull the full task set, evaluate each eligible task in one context.
//! - Dispatch decided reminders and persist updated dedup records.
//! - Refresh the overdue badge on background ticks.
//!
//! # Invariants
//! - Each task's read, evaluate, dispatch and write happen inside one
//!   `HistoryStore::update_history` step.
//! - A failing task is logged and skipped; the rest of the tick continues.
//!   A task row that cannot be read counts as a failing task.
//! - Failing to query the task table at all aborts the tick.

use crate::badge::{BadgeSurface, BadgeUpdater};
use crate::db::DbError;
use crate::model::history::PollerContext;
use crate::model::task::{Task, TaskId};
use crate::notify::{DispatchReport, Dispatcher};
use crate::repo::error::RepoError;
use crate::repo::history_repo::{HistoryStore, HistoryUpdate};
use crate::repo::task_repo::TaskSource;
use crate::service::evaluator::{evaluate, EvaluationError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Failure of a tick, or of one task within it.
#[derive(Debug)]
pub enum TickError {
    Repo(RepoError),
    Evaluation(EvaluationError),
}

impl Display for TickError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Evaluation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TickError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Evaluation(err) => Some(err),
        }
    }
}

impl From<RepoError> for TickError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for TickError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<EvaluationError> for TickError {
    fn from(value: EvaluationError) -> Self {
        Self::Evaluation(value)
    }
}

/// A reminder delivered during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredReminder {
    pub task_id: TaskId,
    pub reminder_id: &'static str,
    pub message: &'static str,
    pub dispatch: DispatchReport,
}

/// Summary of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub context: PollerContext,
    /// Eligible tasks that were evaluated, plus unreadable task rows.
    pub evaluated: usize,
    pub fired: Vec<FiredReminder>,
    pub failed: usize,
    /// Set on ticks that refreshed the badge.
    pub badge_count: Option<usize>,
}

/// Orchestrates a tick over a task source and a history store.
pub struct ReminderService<T: TaskSource, H: HistoryStore> {
    tasks: T,
    history: H,
}

impl<T: TaskSource, H: HistoryStore> ReminderService<T, H> {
    pub fn new(tasks: T, history: H) -> Self {
        Self { tasks, history }
    }

    /// Runs one tick for `context` at `now_ms`.
    ///
    /// `badge` is refreshed only for the background context.
    ///
    /// # Errors
    /// - Returns `TickError::Repo` when the task table cannot be queried.
    pub fn run_tick(
        &self,
        context: PollerContext,
        now_ms: i64,
        dispatcher: &Dispatcher,
        badge: Option<&dyn BadgeSurface>,
    ) -> Result<TickReport, TickError> {
        let started_at = Instant::now();
        let scanned = self.tasks.scan_all_tasks()?;
        let scanned_count = scanned.len();

        let mut report = TickReport {
            context,
            evaluated: 0,
            fired: Vec::new(),
            failed: 0,
            badge_count: None,
        };

        let mut tasks = Vec::with_capacity(scanned_count);
        for row in scanned {
            match row {
                Ok(task) => tasks.push(task),
                Err(err) => {
                    report.evaluated += 1;
                    report.failed += 1;
                    warn!(
                        "event=task_eval_failed module=reminder context={} task_id=unreadable error={}",
                        context, err
                    );
                }
            }
        }

        for task in tasks.iter().filter(|task| task.is_reminder_eligible()) {
            report.evaluated += 1;
            match self.evaluate_task(task, context, now_ms, dispatcher) {
                Ok(Some(fired)) => report.fired.push(fired),
                Ok(None) => {}
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        "event=task_eval_failed module=reminder context={} task_id={} error={}",
                        context, task.id, err
                    );
                }
            }
        }

        if context == PollerContext::Background {
            if let Some(surface) = badge {
                report.badge_count = Some(BadgeUpdater::new(surface).refresh(&tasks, now_ms));
            }
        }

        debug!(
            "event=reminder_tick module=reminder status=ok context={} tasks={} evaluated={} fired={} failed={} duration_ms={}",
            context,
            scanned_count,
            report.evaluated,
            report.fired.len(),
            report.failed,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Evaluates one task and, if a reminder is due, dispatches it.
    ///
    /// The history record is written only when evaluation changed it.
    pub fn evaluate_task(
        &self,
        task: &Task,
        context: PollerContext,
        now_ms: i64,
        dispatcher: &Dispatcher,
    ) -> Result<Option<FiredReminder>, TickError> {
        self.history
            .update_history(task.id, |current| -> Result<_, TickError> {
                let evaluation = evaluate(task, now_ms, current, context)?;

                let fired = evaluation.to_notify.map(|reminder| {
                    info!(
                        "event=reminder_fired module=reminder context={} task_id={} milestone={}",
                        context,
                        task.id,
                        reminder.id()
                    );
                    FiredReminder {
                        task_id: task.id,
                        reminder_id: reminder.id(),
                        message: reminder.message(),
                        dispatch: dispatcher.dispatch(task, reminder.message()),
                    }
                });

                if evaluation.history_changed() {
                    Ok(HistoryUpdate::write(evaluation.next_history, fired))
                } else {
                    Ok(HistoryUpdate::keep(fired))
                }
            })
    }
}
