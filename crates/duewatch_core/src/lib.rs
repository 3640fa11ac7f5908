//! Core reminder engine for Duewatch.
//! This crate is the single source of truth for reminder decisions and
//! their deduplication state.

pub mod badge;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod poller;
pub mod repo;
pub mod service;

pub use badge::{compute_overdue_count, BadgeSurface, BadgeUpdater};
pub use config::ReminderConfig;
pub use logging::{
    default_log_level, init_logging, init_logging_with_stderr, logging_status, LoggingError,
};
pub use model::history::{HistoryRecord, PollerContext};
pub use model::milestone::{Milestone, Reminder, MILESTONES, RECURRING_DAILY};
pub use model::task::{DueDateError, Task, TaskId, TaskValidationError};
pub use notify::{
    ChannelError, ChannelOutcome, DispatchReport, Dispatcher, NotificationAction,
    NotificationPermission, ViewHost, ViewMessage,
};
pub use poller::{now_epoch_ms, PollerDriver, ReminderTick};
pub use repo::error::{RepoError, RepoResult};
pub use repo::history_repo::{HistoryStore, HistoryUpdate, SqliteHistoryRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskSource};
pub use service::action_service::{ActionError, ActionEvent, ActionOutcome, ActionService};
pub use service::evaluator::{evaluate, Evaluation, EvaluationError};
pub use service::reminder_service::{FiredReminder, ReminderService, TickError, TickReport};
pub use service::snooze_service::SnoozeService;

/// Minimal health-check API for shell integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
