//! Periodic reminder pollers.
//!
//! # Responsibility
//! - Run `ReminderService` ticks for one context on a fixed interval.
//! - Own the start/stop lifecycle of each poller.
//!
//! # Invariants
//! - A driver runs at most one loop; `start` on a running driver is a no-op.
//! - Ticks of one driver never overlap; a slow tick delays the next one.
//! - Each tick opens its own connection; the database is the only state
//!   carried across ticks and restarts.
//! - Tick failures are logged and retried on the next tick.

use crate::badge::BadgeSurface;
use crate::db::open_db;
use crate::model::history::PollerContext;
use crate::notify::Dispatcher;
use crate::repo::history_repo::SqliteHistoryRepository;
use crate::repo::task_repo::SqliteTaskRepository;
use crate::service::reminder_service::{ReminderService, TickError, TickReport};
use log::{error, info};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Everything one context needs to run a tick against a database file.
pub struct ReminderTick {
    db_path: PathBuf,
    context: PollerContext,
    dispatcher: Dispatcher,
    badge: Option<Arc<dyn BadgeSurface>>,
}

impl ReminderTick {
    /// Background tick: OS notifications plus the overdue badge.
    pub fn background(
        db_path: impl Into<PathBuf>,
        dispatcher: Dispatcher,
        badge: Arc<dyn BadgeSurface>,
    ) -> Self {
        Self {
            db_path: db_path.into(),
            context: PollerContext::Background,
            dispatcher,
            badge: Some(badge),
        }
    }

    /// Foreground tick: no badge.
    pub fn foreground(db_path: impl Into<PathBuf>, dispatcher: Dispatcher) -> Self {
        Self {
            db_path: db_path.into(),
            context: PollerContext::Foreground,
            dispatcher,
            badge: None,
        }
    }

    pub fn context(&self) -> PollerContext {
        self.context
    }

    /// Runs one blocking tick at `now_ms`.
    ///
    /// # Errors
    /// - Database open or task listing failures abort the whole tick.
    pub fn run_once(&self, now_ms: i64) -> Result<TickReport, TickError> {
        let conn = open_db(&self.db_path)?;
        let service = ReminderService::new(
            SqliteTaskRepository::new(&conn),
            SqliteHistoryRepository::new(&conn),
        );
        service.run_tick(
            self.context,
            now_ms,
            &self.dispatcher,
            self.badge.as_deref(),
        )
    }
}

/// Fixed-interval driver for one context.
pub struct PollerDriver {
    tick: Arc<ReminderTick>,
    interval: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollerDriver {
    pub fn new(tick: ReminderTick, interval: Duration) -> Self {
        Self {
            tick: Arc::new(tick),
            interval,
            handle: Mutex::new(None),
        }
    }

    pub fn context(&self) -> PollerContext {
        self.tick.context()
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Starts the loop on `runtime`. The first tick runs immediately.
    ///
    /// Returns `false` when this driver is already running.
    pub fn start(&self, runtime: &Handle) -> bool {
        let mut slot = self.handle.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let tick = Arc::clone(&self.tick);
        let period = self.interval;
        let context = tick.context();
        *slot = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let tick = Arc::clone(&tick);
                match tokio::task::spawn_blocking(move || tick.run_once(now_epoch_ms())).await {
                    Ok(Ok(_report)) => {}
                    Ok(Err(err)) => error!(
                        "event=reminder_tick module=poller status=error context={} error={}",
                        context, err
                    ),
                    Err(err) => error!(
                        "event=reminder_tick module=poller status=panicked context={} error={}",
                        context, err
                    ),
                }
            }
        }));

        info!(
            "event=poller_start module=poller status=ok context={} interval_ms={}",
            context,
            period.as_millis()
        );
        true
    }

    /// Stops the loop. Returns `false` when it was not running.
    pub fn stop(&self) -> bool {
        let Some(handle) = self.handle.lock().take() else {
            return false;
        };
        let was_running = !handle.is_finished();
        handle.abort();

        info!(
            "event=poller_stop module=poller status=ok context={}",
            self.context()
        );
        was_running
    }
}

impl Drop for PollerDriver {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}
