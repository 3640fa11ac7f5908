//! Notification delivery and action routing surfaces.
//!
//! # Responsibility
//! - Define the platform channels a decided reminder is delivered through.
//! - Deliver one reminder through every configured channel, best-effort.
//! - Define the view-host surface that notification actions re-enter through.
//!
//! # Invariants
//! - A failing channel never blocks the remaining channels.
//! - OS notifications are tagged with the task id, so a re-delivery
//!   replaces the previous one instead of stacking.
//! - Permission denial and blocked audio are terminal for that channel only.

mod channel;
mod dispatcher;
pub mod memory;
mod view;

pub use channel::{
    AudioChannel, ChannelError, NotificationAction, NotificationPermission, OsNotification,
    OsNotificationChannel, ToastAlert, ToastChannel,
};
pub use dispatcher::{ChannelOutcome, DispatchReport, Dispatcher};
pub use view::{ViewHost, ViewMessage};
