//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose reminder polling, action routing and snooze to Dart via FRB.
//! - Hand decided notifications back to the host, which renders them with
//!   the platform's own notification plugin.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported in the response envelope, never thrown.
//! - The calling host counts as one live application view.

use duewatch_core::db::open_db;
use duewatch_core::notify::memory::MemorySurface;
use duewatch_core::notify::{OsNotification, ToastAlert};
use duewatch_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, now_epoch_ms,
    ping as ping_inner, ActionEvent, ActionOutcome, ActionService, Dispatcher, PollerContext,
    ReminderConfig, ReminderService, RepoError, SnoozeService, SqliteHistoryRepository,
    SqliteTaskRepository, TaskId,
};
use log::warn;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

static REMINDER_CONFIG: OnceLock<ReminderConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// OS-level notification the host should post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotification {
    pub task_id: String,
    /// Milestone id, or `recurring_daily`.
    pub reminder_id: String,
    pub title: String,
    pub body: String,
    /// Replace-key; equals `task_id`.
    pub tag: String,
    pub renotify: bool,
    pub require_interaction: bool,
    /// Wire ids to attach as action buttons, in display order.
    pub actions: Vec<String>,
}

/// In-app alert the host should show while the app is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderToast {
    pub task_id: String,
    pub title: String,
    pub message: String,
    pub dismiss_after_ms: u64,
}

/// Result envelope for one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResponse {
    pub ok: bool,
    pub notifications: Vec<ReminderNotification>,
    /// Foreground polls only.
    pub toasts: Vec<ReminderToast>,
    /// Number of audio cues to play (foreground polls only).
    pub audio_cues: u32,
    /// Overdue count for the app badge; set on background polls.
    pub badge_count: Option<u32>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

impl PollResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            notifications: Vec::new(),
            toasts: Vec::new(),
            audio_cues: 0,
            badge_count: None,
            message: message.into(),
        }
    }
}

/// Result envelope for notification actions and snooze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// `completed|snoozed|focused|launched|task_missing`; empty on failure.
    pub outcome: String,
    pub snooze_until_ms: Option<i64>,
    /// JSON messages to post to every live view, e.g.
    /// `{"type":"TASK_COMPLETED","taskId":"..."}`.
    pub view_messages: Vec<String>,
    /// Set when the host should open the app at this URL.
    pub launch_url: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            outcome: String::new(),
            snooze_until_ms: None,
            view_messages: Vec::new(),
            launch_url: None,
            message: message.into(),
        }
    }
}

/// Runs one reminder tick and returns what the host should deliver.
///
/// Input semantics:
/// - `context`: `background` or `foreground` (`bg`/`fg` accepted). Each
///   context deduplicates independently.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Dedup state is persisted before returning; a returned notification
///   is never returned again for the same milestone and context.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_poll_once(context: String) -> PollResponse {
    let context = match context.parse::<PollerContext>() {
        Ok(context) => context,
        Err(err) => return PollResponse::failure(format!("reminder_poll_once failed: {err}")),
    };
    let config = reminder_config();
    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => return PollResponse::failure(format!("reminder_poll_once failed: {err}")),
    };

    let surface = Arc::new(MemorySurface::new());
    let dispatcher = match context {
        PollerContext::Background => Dispatcher::background(surface.clone()),
        PollerContext::Foreground => {
            Dispatcher::foreground(surface.clone(), surface.clone(), surface.clone())
        }
    }
    .with_toast_dismiss_after(config.toast_dismiss_after);

    let service = ReminderService::new(
        SqliteTaskRepository::new(&conn),
        SqliteHistoryRepository::new(&conn),
    );
    let report = match service.run_tick(
        context,
        now_epoch_ms(),
        &dispatcher,
        Some(surface.as_ref()),
    ) {
        Ok(report) => report,
        Err(err) => return PollResponse::failure(format!("reminder_poll_once failed: {err}")),
    };

    let os_notifications = surface.take_os_notifications();
    let notifications = report
        .fired
        .iter()
        .filter_map(|fired| {
            os_notifications
                .iter()
                .find(|notification| notification.task_id == fired.task_id)
                .map(|notification| to_reminder_notification(fired.reminder_id, notification))
        })
        .collect::<Vec<_>>();
    let toasts = surface
        .toasts()
        .iter()
        .map(to_reminder_toast)
        .collect::<Vec<_>>();

    let message = if report.fired.is_empty() {
        "No reminders due.".to_string()
    } else {
        format!("{} reminder(s) due.", report.fired.len())
    };

    PollResponse {
        ok: true,
        notifications,
        toasts,
        audio_cues: u32::try_from(surface.cues_played()).unwrap_or(u32::MAX),
        badge_count: report
            .badge_count
            .map(|count| u32::try_from(count).unwrap_or(u32::MAX)),
        message,
    }
}

/// Routes a notification action click back into core.
///
/// Input semantics:
/// - `action`: platform action id (`complete-task`, `snooze-task`,
///   `view-task`); `None` or unknown ids mean a plain click (open).
/// - `task_id`: UUID string carried by the notification.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Acting on a deleted task succeeds with outcome `task_missing`.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_handle_action(action: Option<String>, task_id: String) -> ActionResponse {
    let task_id = match parse_task_id(&task_id) {
        Ok(task_id) => task_id,
        Err(message) => return ActionResponse::failure(message),
    };
    let config = reminder_config();
    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            return ActionResponse::failure(format!("reminder_handle_action failed: {err}"))
        }
    };

    let host = MemorySurface::new().with_live_views(1);
    let service = ActionService::new(
        SqliteTaskRepository::new(&conn),
        SqliteHistoryRepository::new(&conn),
        config.snooze_duration_ms(),
    );
    let event = ActionEvent::from_wire(action.as_deref(), task_id);

    match service.handle(event, now_epoch_ms(), &host) {
        Ok(outcome) => action_response(outcome, &host),
        Err(err) => ActionResponse::failure(format!("reminder_handle_action failed: {err}")),
    }
}

/// Snoozes reminders for `task_id`.
///
/// Input semantics:
/// - `minutes`: snooze window; `None` or `0` uses the configured default.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_snooze(task_id: String, minutes: Option<u32>) -> ActionResponse {
    let task_id = match parse_task_id(&task_id) {
        Ok(task_id) => task_id,
        Err(message) => return ActionResponse::failure(message),
    };
    let config = reminder_config();
    let duration_ms = match minutes {
        Some(minutes) if minutes > 0 => i64::from(minutes) * 60 * 1000,
        _ => config.snooze_duration_ms(),
    };

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => return ActionResponse::failure(format!("reminder_snooze failed: {err}")),
    };
    let service = SnoozeService::new(SqliteHistoryRepository::new(&conn));

    let no_views = MemorySurface::new();
    match service.snooze(task_id, now_epoch_ms(), duration_ms) {
        Ok(until_ms) => action_response(ActionOutcome::Snoozed { until_ms }, &no_views),
        Err(RepoError::NotFound(_)) => action_response(ActionOutcome::TaskMissing, &no_views),
        Err(err) => ActionResponse::failure(format!("reminder_snooze failed: {err}")),
    }
}

fn reminder_config() -> &'static ReminderConfig {
    REMINDER_CONFIG.get_or_init(ReminderConfig::from_env)
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid task id `{}`", raw.trim()))
}

fn action_response(outcome: ActionOutcome, host: &MemorySurface) -> ActionResponse {
    let view_messages = host
        .broadcasts()
        .iter()
        .filter_map(|message| match serde_json::to_string(message) {
            Ok(json) => Some(json),
            Err(err) => {
                warn!("event=view_message_encode module=ffi status=error error={err}");
                None
            }
        })
        .collect::<Vec<_>>();
    let launch_url = host
        .launched()
        .first()
        .map(|task_id| format!("/?taskId={task_id}"));

    let (label, snooze_until_ms, message) = match outcome {
        ActionOutcome::Completed { .. } => ("completed", None, "Task completed.".to_string()),
        ActionOutcome::Snoozed { until_ms } => (
            "snoozed",
            Some(until_ms),
            "Reminders snoozed.".to_string(),
        ),
        ActionOutcome::Focused => ("focused", None, "Task opened.".to_string()),
        ActionOutcome::Launched => ("launched", None, "Opening app.".to_string()),
        ActionOutcome::TaskMissing => ("task_missing", None, "Task no longer exists.".to_string()),
    };

    ActionResponse {
        ok: true,
        outcome: label.to_string(),
        snooze_until_ms,
        view_messages,
        launch_url,
        message,
    }
}

fn to_reminder_notification(
    reminder_id: &str,
    notification: &OsNotification,
) -> ReminderNotification {
    ReminderNotification {
        task_id: notification.task_id.to_string(),
        reminder_id: reminder_id.to_string(),
        title: notification.title.clone(),
        body: notification.body.clone(),
        tag: notification.tag.clone(),
        renotify: notification.renotify,
        require_interaction: notification.require_interaction,
        actions: notification
            .actions
            .iter()
            .map(|action| action.as_wire().to_string())
            .collect(),
    }
}

fn to_reminder_toast(alert: &ToastAlert) -> ReminderToast {
    ReminderToast {
        task_id: alert.task_id.to_string(),
        title: alert.title.clone(),
        message: alert.message.clone(),
        dismiss_after_ms: u64::try_from(alert.dismiss_after.as_millis()).unwrap_or(u64::MAX),
    }
}
