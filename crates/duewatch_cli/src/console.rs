//! Terminal rendering of reminder surfaces.

use duewatch_core::notify::{
    AudioChannel, ChannelError, NotificationPermission, OsNotification, OsNotificationChannel,
    ToastAlert, ToastChannel, ViewHost, ViewMessage,
};
use duewatch_core::{BadgeSurface, TaskId};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Badge value meaning "cleared".
const NO_BADGE: usize = 0;

/// Prints every delivery to stdout. There are no live views in a terminal.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    last_badge: AtomicUsize,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToastChannel for ConsoleSurface {
    fn show(&self, alert: &ToastAlert) -> Result<(), ChannelError> {
        println!("[alert] {} | {}", alert.title, alert.message);
        Ok(())
    }
}

impl AudioChannel for ConsoleSurface {
    fn play_cue(&self) -> Result<(), ChannelError> {
        print!("\x07");
        Ok(())
    }
}

impl OsNotificationChannel for ConsoleSurface {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn request_permission(&self) -> Result<NotificationPermission, ChannelError> {
        Ok(NotificationPermission::Granted)
    }

    fn show(&self, notification: &OsNotification) -> Result<(), ChannelError> {
        let actions = notification
            .actions
            .iter()
            .map(|action| action.as_wire())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "[notify] {} | {} (task {}; actions: {})",
            notification.title, notification.body, notification.task_id, actions
        );
        Ok(())
    }
}

impl ViewHost for ConsoleSurface {
    fn broadcast(&self, message: &ViewMessage) -> usize {
        if let ViewMessage::TaskCompleted { task_id } = message {
            println!("task {task_id} marked complete");
        }
        0
    }

    fn focus_task(&self, _task_id: TaskId) -> bool {
        false
    }

    fn launch(&self, task_id: TaskId) -> Result<(), ChannelError> {
        println!("open /?taskId={task_id}");
        Ok(())
    }
}

impl BadgeSurface for ConsoleSurface {
    fn set_badge(&self, count: usize) -> Result<(), ChannelError> {
        if self.last_badge.swap(count, Ordering::Relaxed) != count {
            println!("[badge] {count} overdue");
        }
        Ok(())
    }

    fn clear_badge(&self) -> Result<(), ChannelError> {
        if self.last_badge.swap(NO_BADGE, Ordering::Relaxed) != NO_BADGE {
            println!("[badge] cleared");
        }
        Ok(())
    }
}
