//! Delivery channel contracts and payloads.

use crate::model::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const OS_TITLE_PREFIX: &str = "Duewatch";

/// Platform permission state for OS-level notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPermission {
    Granted,
    /// Not decided yet; the platform may still prompt the user.
    Default,
    Denied,
}

/// Failure of a single delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    PermissionDenied,
    /// Blocked by platform policy (e.g. autoplay rules for audio).
    Blocked(String),
    Failed(String),
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Blocked(reason) => write!(f, "blocked by platform: {reason}"),
            Self::Failed(reason) => write!(f, "channel failed: {reason}"),
        }
    }
}

impl Error for ChannelError {}

/// User action attached to an OS notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationAction {
    Complete,
    Snooze,
    /// Also the default click on the notification body.
    Open,
}

impl NotificationAction {
    pub const ALL: [NotificationAction; 3] = [Self::Complete, Self::Snooze, Self::Open];

    /// Wire identifier sent to and received from the platform.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Complete => "complete-task",
            Self::Snooze => "snooze-task",
            Self::Open => "view-task",
        }
    }

    /// Maps a platform action id to an action.
    ///
    /// Unknown or empty ids (a plain click) route to `Open`.
    pub fn parse(action: Option<&str>) -> Self {
        match action.map(str::trim) {
            Some("complete-task") | Some("complete") => Self::Complete,
            Some("snooze-task") | Some("snooze") => Self::Snooze,
            _ => Self::Open,
        }
    }
}

/// Ephemeral in-app alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastAlert {
    pub task_id: TaskId,
    pub title: String,
    pub message: String,
    pub dismiss_after: Duration,
}

/// OS-level notification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsNotification {
    pub title: String,
    pub body: String,
    /// De-duplication tag; equal to the task id.
    pub tag: String,
    /// Re-alert the user even when replacing a notification with the same tag.
    pub renotify: bool,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
    pub task_id: TaskId,
}

impl OsNotification {
    pub fn for_task(task: &Task, message: &str) -> Self {
        Self {
            title: format!("{OS_TITLE_PREFIX}: {}", task.title),
            body: message.to_string(),
            tag: task.id.to_string(),
            renotify: true,
            require_interaction: true,
            actions: NotificationAction::ALL.to_vec(),
            task_id: task.id,
        }
    }
}

/// In-app visual alert surface. Foreground only.
pub trait ToastChannel: Send + Sync {
    fn show(&self, alert: &ToastAlert) -> Result<(), ChannelError>;
}

/// Audible cue surface. Foreground only.
pub trait AudioChannel: Send + Sync {
    fn play_cue(&self) -> Result<(), ChannelError>;
}

/// OS notification surface.
pub trait OsNotificationChannel: Send + Sync {
    fn permission(&self) -> NotificationPermission;
    /// Asks the platform to prompt the user. The result applies to later
    /// deliveries.
    fn request_permission(&self) -> Result<NotificationPermission, ChannelError>;
    fn show(&self, notification: &OsNotification) -> Result<(), ChannelError>;
}
