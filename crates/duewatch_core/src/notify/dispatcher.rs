//! Best-effort fan-out of one reminder to the configured channels.

use super::channel::{
    AudioChannel, ChannelError, NotificationPermission, OsNotification, OsNotificationChannel,
    ToastAlert, ToastChannel,
};
use crate::model::task::Task;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TOAST_DISMISS_AFTER: Duration = Duration::from_secs(5);

/// What happened on one channel during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Delivered,
    /// The dispatcher has no such channel (background context).
    NotConfigured,
    /// Skipped by permission state; not an error.
    Suppressed,
    Failed(ChannelError),
}

impl ChannelOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Per-channel result of `Dispatcher::dispatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub toast: ChannelOutcome,
    pub audio: ChannelOutcome,
    pub os: ChannelOutcome,
}

impl DispatchReport {
    pub fn any_delivered(&self) -> bool {
        self.toast.is_delivered() || self.audio.is_delivered() || self.os.is_delivered()
    }
}

/// Delivers decided reminders through toast, audio and OS channels.
#[derive(Clone)]
pub struct Dispatcher {
    toast: Option<Arc<dyn ToastChannel>>,
    audio: Option<Arc<dyn AudioChannel>>,
    os: Arc<dyn OsNotificationChannel>,
    toast_dismiss_after: Duration,
}

impl Dispatcher {
    /// Dispatcher for the background context: OS notifications only.
    pub fn background(os: Arc<dyn OsNotificationChannel>) -> Self {
        Self {
            toast: None,
            audio: None,
            os,
            toast_dismiss_after: DEFAULT_TOAST_DISMISS_AFTER,
        }
    }

    /// Dispatcher for the foreground context: all channels.
    pub fn foreground(
        toast: Arc<dyn ToastChannel>,
        audio: Arc<dyn AudioChannel>,
        os: Arc<dyn OsNotificationChannel>,
    ) -> Self {
        Self {
            toast: Some(toast),
            audio: Some(audio),
            os,
            toast_dismiss_after: DEFAULT_TOAST_DISMISS_AFTER,
        }
    }

    pub fn with_toast_dismiss_after(mut self, dismiss_after: Duration) -> Self {
        self.toast_dismiss_after = dismiss_after;
        self
    }

    /// Delivers `message` for `task` on every configured channel.
    ///
    /// # Side effects
    /// - Shows a toast, plays a cue and posts an OS notification where
    ///   configured and permitted.
    /// - Channel failures are logged and reported, never raised.
    pub fn dispatch(&self, task: &Task, message: &str) -> DispatchReport {
        let toast = match &self.toast {
            Some(channel) => {
                let alert = ToastAlert {
                    task_id: task.id,
                    title: task.title.clone(),
                    message: message.to_string(),
                    dismiss_after: self.toast_dismiss_after,
                };
                outcome_of("toast", task, channel.show(&alert))
            }
            None => ChannelOutcome::NotConfigured,
        };

        let audio = match &self.audio {
            Some(channel) => match channel.play_cue() {
                Ok(()) => ChannelOutcome::Delivered,
                Err(ChannelError::Blocked(reason)) => {
                    debug!(
                        "event=dispatch_channel_blocked module=notify channel=audio task_id={} reason={}",
                        task.id, reason
                    );
                    ChannelOutcome::Failed(ChannelError::Blocked(reason))
                }
                Err(err) => outcome_of("audio", task, Err(err)),
            },
            None => ChannelOutcome::NotConfigured,
        };

        let os = self.dispatch_os(task, message);

        DispatchReport { toast, audio, os }
    }

    fn dispatch_os(&self, task: &Task, message: &str) -> ChannelOutcome {
        match self.os.permission() {
            NotificationPermission::Granted => {
                let notification = OsNotification::for_task(task, message);
                outcome_of("os", task, self.os.show(&notification))
            }
            NotificationPermission::Default => {
                if let Err(err) = self.os.request_permission() {
                    warn!(
                        "event=permission_request module=notify status=error task_id={} error={}",
                        task.id, err
                    );
                }
                ChannelOutcome::Suppressed
            }
            NotificationPermission::Denied => ChannelOutcome::Suppressed,
        }
    }
}

fn outcome_of(channel: &str, task: &Task, result: Result<(), ChannelError>) -> ChannelOutcome {
    match result {
        Ok(()) => ChannelOutcome::Delivered,
        Err(err) => {
            warn!(
                "event=dispatch_channel_failed module=notify channel={} task_id={} error={}",
                channel, task.id, err
            );
            ChannelOutcome::Failed(err)
        }
    }
}
