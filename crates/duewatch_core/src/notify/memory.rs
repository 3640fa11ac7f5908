//! In-memory surface that records every delivery and view directive.
//!
//! Used by hosts that render notifications themselves (the decisions are
//! collected here and handed over), and by tests.

use super::channel::{
    AudioChannel, ChannelError, NotificationPermission, OsNotification, OsNotificationChannel,
    ToastAlert, ToastChannel,
};
use super::view::{ViewHost, ViewMessage};
use crate::badge::BadgeSurface;
use crate::model::task::TaskId;
use parking_lot::Mutex;

#[derive(Debug)]
struct SurfaceState {
    permission: NotificationPermission,
    live_views: usize,
    audio_failure: Option<ChannelError>,
    os_failure: Option<ChannelError>,
    toasts: Vec<ToastAlert>,
    cues_played: usize,
    os_notifications: Vec<OsNotification>,
    permission_requests: usize,
    broadcasts: Vec<ViewMessage>,
    focused: Vec<TaskId>,
    launched: Vec<TaskId>,
    badge: Option<usize>,
    badge_clears: usize,
}

/// Recording implementation of every platform surface.
#[derive(Debug)]
pub struct MemorySurface {
    state: Mutex<SurfaceState>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    /// Permission granted, no live views, no injected failures.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SurfaceState {
                permission: NotificationPermission::Granted,
                live_views: 0,
                audio_failure: None,
                os_failure: None,
                toasts: Vec::new(),
                cues_played: 0,
                os_notifications: Vec::new(),
                permission_requests: 0,
                broadcasts: Vec::new(),
                focused: Vec::new(),
                launched: Vec::new(),
                badge: None,
                badge_clears: 0,
            }),
        }
    }

    pub fn with_permission(self, permission: NotificationPermission) -> Self {
        self.state.lock().permission = permission;
        self
    }

    pub fn with_live_views(self, live_views: usize) -> Self {
        self.state.lock().live_views = live_views;
        self
    }

    pub fn fail_audio_with(&self, error: ChannelError) {
        self.state.lock().audio_failure = Some(error);
    }

    pub fn fail_os_with(&self, error: ChannelError) {
        self.state.lock().os_failure = Some(error);
    }

    pub fn toasts(&self) -> Vec<ToastAlert> {
        self.state.lock().toasts.clone()
    }

    pub fn cues_played(&self) -> usize {
        self.state.lock().cues_played
    }

    pub fn os_notifications(&self) -> Vec<OsNotification> {
        self.state.lock().os_notifications.clone()
    }

    /// Drains recorded OS notifications.
    pub fn take_os_notifications(&self) -> Vec<OsNotification> {
        std::mem::take(&mut self.state.lock().os_notifications)
    }

    pub fn permission_requests(&self) -> usize {
        self.state.lock().permission_requests
    }

    pub fn broadcasts(&self) -> Vec<ViewMessage> {
        self.state.lock().broadcasts.clone()
    }

    pub fn focused(&self) -> Vec<TaskId> {
        self.state.lock().focused.clone()
    }

    pub fn launched(&self) -> Vec<TaskId> {
        self.state.lock().launched.clone()
    }

    /// Current badge value; `None` when cleared or never set.
    pub fn badge(&self) -> Option<usize> {
        self.state.lock().badge
    }

    pub fn badge_clears(&self) -> usize {
        self.state.lock().badge_clears
    }
}

impl ToastChannel for MemorySurface {
    fn show(&self, alert: &ToastAlert) -> Result<(), ChannelError> {
        self.state.lock().toasts.push(alert.clone());
        Ok(())
    }
}

impl AudioChannel for MemorySurface {
    fn play_cue(&self) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        if let Some(err) = state.audio_failure.clone() {
            return Err(err);
        }
        state.cues_played += 1;
        Ok(())
    }
}

impl OsNotificationChannel for MemorySurface {
    fn permission(&self) -> NotificationPermission {
        self.state.lock().permission
    }

    fn request_permission(&self) -> Result<NotificationPermission, ChannelError> {
        let mut state = self.state.lock();
        state.permission_requests += 1;
        Ok(state.permission)
    }

    fn show(&self, notification: &OsNotification) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        if let Some(err) = state.os_failure.clone() {
            return Err(err);
        }
        // Same tag replaces the previous notification.
        state
            .os_notifications
            .retain(|existing| existing.tag != notification.tag);
        state.os_notifications.push(notification.clone());
        Ok(())
    }
}

impl ViewHost for MemorySurface {
    fn broadcast(&self, message: &ViewMessage) -> usize {
        let mut state = self.state.lock();
        state.broadcasts.push(message.clone());
        state.live_views
    }

    fn focus_task(&self, task_id: TaskId) -> bool {
        let mut state = self.state.lock();
        if state.live_views == 0 {
            return false;
        }
        state.focused.push(task_id);
        state.broadcasts.push(ViewMessage::NavigateTask { task_id });
        true
    }

    fn launch(&self, task_id: TaskId) -> Result<(), ChannelError> {
        self.state.lock().launched.push(task_id);
        Ok(())
    }
}

impl BadgeSurface for MemorySurface {
    fn set_badge(&self, count: usize) -> Result<(), ChannelError> {
        self.state.lock().badge = Some(count);
        Ok(())
    }

    fn clear_badge(&self) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        state.badge = None;
        state.badge_clears += 1;
        Ok(())
    }
}
