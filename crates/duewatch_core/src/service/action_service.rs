//! Notification action routing.
//!
//! # Responsibility
//! - Route platform action events (complete, snooze, open) back into core.
//! - Tell live application views about out-of-band task changes.
//!
//! # Invariants
//! - Completion is broadcast only after the task store accepted it.
//! - Snoozing goes through `SnoozeService` and never touches flags.

use crate::model::task::TaskId;
use crate::notify::{ChannelError, NotificationAction, ViewHost, ViewMessage};
use crate::repo::error::RepoError;
use crate::repo::history_repo::HistoryStore;
use crate::repo::task_repo::TaskSource;
use crate::service::snooze_service::SnoozeService;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Action click emitted by the notification surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionEvent {
    pub action: NotificationAction,
    pub task_id: TaskId,
}

impl ActionEvent {
    /// Builds an event from the platform's raw action id.
    pub fn from_wire(action: Option<&str>, task_id: TaskId) -> Self {
        Self {
            action: NotificationAction::parse(action),
            task_id,
        }
    }
}

/// What handling an action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed { views_notified: usize },
    Snoozed { until_ms: i64 },
    Focused,
    Launched,
    /// The task no longer exists; nothing was changed.
    TaskMissing,
}

#[derive(Debug)]
pub enum ActionError {
    Repo(RepoError),
    Launch(ChannelError),
}

impl Display for ActionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Launch(err) => write!(f, "cannot launch application: {err}"),
        }
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Launch(err) => Some(err),
        }
    }
}

impl From<RepoError> for ActionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Handles notification actions against the task store and history.
pub struct ActionService<T: TaskSource, H: HistoryStore> {
    tasks: T,
    snooze: SnoozeService<H>,
    snooze_duration_ms: i64,
}

impl<T: TaskSource, H: HistoryStore> ActionService<T, H> {
    pub fn new(tasks: T, history: H, snooze_duration_ms: i64) -> Self {
        Self {
            tasks,
            snooze: SnoozeService::new(history),
            snooze_duration_ms,
        }
    }

    /// Applies `event` at `now_ms`, using `host` for view-side effects.
    ///
    /// # Errors
    /// - `ActionError::Repo` for storage failures other than a missing task.
    /// - `ActionError::Launch` when no view was open and launching failed.
    pub fn handle(
        &self,
        event: ActionEvent,
        now_ms: i64,
        host: &dyn ViewHost,
    ) -> Result<ActionOutcome, ActionError> {
        let outcome = match event.action {
            NotificationAction::Complete => self.complete(event.task_id, host)?,
            NotificationAction::Snooze => {
                match self
                    .snooze
                    .snooze(event.task_id, now_ms, self.snooze_duration_ms)
                {
                    Ok(until_ms) => ActionOutcome::Snoozed { until_ms },
                    Err(RepoError::NotFound(_)) => ActionOutcome::TaskMissing,
                    Err(err) => return Err(err.into()),
                }
            }
            NotificationAction::Open => {
                if host.focus_task(event.task_id) {
                    ActionOutcome::Focused
                } else {
                    host.launch(event.task_id).map_err(ActionError::Launch)?;
                    ActionOutcome::Launched
                }
            }
        };

        match outcome {
            ActionOutcome::TaskMissing => warn!(
                "event=notification_action module=action status=task_missing action={} task_id={}",
                event.action.as_wire(),
                event.task_id
            ),
            _ => info!(
                "event=notification_action module=action status=ok action={} task_id={}",
                event.action.as_wire(),
                event.task_id
            ),
        }
        Ok(outcome)
    }

    fn complete(&self, task_id: TaskId, host: &dyn ViewHost) -> Result<ActionOutcome, ActionError> {
        match self.tasks.mark_completed(task_id) {
            Ok(()) => {
                let views_notified = host.broadcast(&ViewMessage::TaskCompleted { task_id });
                Ok(ActionOutcome::Completed { views_notified })
            }
            Err(RepoError::NotFound(_)) => Ok(ActionOutcome::TaskMissing),
            Err(err) => Err(err.into()),
        }
    }
}
