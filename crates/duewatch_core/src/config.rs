//! Runtime configuration for reminder polling.
//!
//! # Polling cadence
//!
//! - **Background**: every 5 seconds by default (`DUEWATCH_BACKGROUND_INTERVAL_SECS`)
//! - **Foreground**: every 3 seconds by default (`DUEWATCH_FOREGROUND_INTERVAL_SECS`)
//!
//! Milestones are minutes apart, so seconds-scale intervals only bound
//! detection latency; a slow tick delays detection to the next one.
//!
//! # Other knobs
//!
//! - `DUEWATCH_DB_PATH`: SQLite file shared by tasks and reminder history
//! - `DUEWATCH_SNOOZE_MINUTES`: snooze window applied by the snooze action (10)
//! - `DUEWATCH_TOAST_SECS`: in-app alert auto-dismiss delay (5)

use std::path::PathBuf;
use std::time::Duration;

/// Default background poll interval (5 seconds).
const DEFAULT_BACKGROUND_INTERVAL_SECS: u64 = 5;

/// Default foreground poll interval (3 seconds).
const DEFAULT_FOREGROUND_INTERVAL_SECS: u64 = 3;

/// Default snooze window (10 minutes).
const DEFAULT_SNOOZE_MINUTES: u64 = 10;

/// Default toast auto-dismiss delay (5 seconds).
const DEFAULT_TOAST_SECS: u64 = 5;

const DEFAULT_DB_FILE_NAME: &str = "duewatch.sqlite3";

/// Configuration for pollers, snooze and in-app alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderConfig {
    /// SQLite database holding tasks and reminder history.
    pub db_path: PathBuf,

    /// Interval between background poller ticks.
    pub background_interval: Duration,

    /// Interval between foreground poller ticks.
    pub foreground_interval: Duration,

    /// Window applied by the snooze action.
    pub snooze_duration: Duration,

    /// How long an in-app alert stays on screen.
    pub toast_dismiss_after: Duration,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReminderConfig {
    /// Creates a `ReminderConfig` with default values.
    pub fn new() -> Self {
        ReminderConfig {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            background_interval: Duration::from_secs(DEFAULT_BACKGROUND_INTERVAL_SECS),
            foreground_interval: Duration::from_secs(DEFAULT_FOREGROUND_INTERVAL_SECS),
            snooze_duration: Duration::from_secs(DEFAULT_SNOOZE_MINUTES * 60),
            toast_dismiss_after: Duration::from_secs(DEFAULT_TOAST_SECS),
        }
    }

    /// Creates a `ReminderConfig` from `DUEWATCH_*` environment variables.
    ///
    /// Missing, unparseable, zero or overflowing values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::new();
        let secs = |key: &str| {
            lookup(key)
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
        };

        let db_path = lookup("DUEWATCH_DB_PATH")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        ReminderConfig {
            db_path,
            background_interval: secs("DUEWATCH_BACKGROUND_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.background_interval),
            foreground_interval: secs("DUEWATCH_FOREGROUND_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.foreground_interval),
            snooze_duration: secs("DUEWATCH_SNOOZE_MINUTES")
                .and_then(|minutes| minutes.checked_mul(60))
                .map(Duration::from_secs)
                .unwrap_or(defaults.snooze_duration),
            toast_dismiss_after: secs("DUEWATCH_TOAST_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.toast_dismiss_after),
        }
    }

    /// Snooze window in milliseconds, as the history store records it.
    pub fn snooze_duration_ms(&self) -> i64 {
        i64::try_from(self.snooze_duration.as_millis()).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let config = ReminderConfig::new();

        assert_eq!(config.background_interval, Duration::from_secs(5));
        assert_eq!(config.foreground_interval, Duration::from_secs(3));
        assert_eq!(config.snooze_duration, Duration::from_secs(600));
        assert_eq!(config.snooze_duration_ms(), 600_000);
        assert_eq!(config.toast_dismiss_after, Duration::from_secs(5));
        assert!(config.db_path.ends_with("duewatch.sqlite3"));
    }

    #[test]
    fn environment_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DUEWATCH_DB_PATH", "/var/lib/duewatch/tasks.db"),
            ("DUEWATCH_BACKGROUND_INTERVAL_SECS", "30"),
            ("DUEWATCH_SNOOZE_MINUTES", "15"),
        ]);
        let config = ReminderConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.db_path, PathBuf::from("/var/lib/duewatch/tasks.db"));
        assert_eq!(config.background_interval, Duration::from_secs(30));
        assert_eq!(config.foreground_interval, Duration::from_secs(3));
        assert_eq!(config.snooze_duration, Duration::from_secs(900));
    }

    #[test]
    fn zero_and_garbage_fall_back_to_defaults() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DUEWATCH_FOREGROUND_INTERVAL_SECS", "0"),
            ("DUEWATCH_TOAST_SECS", "soon"),
            ("DUEWATCH_DB_PATH", "   "),
        ]);
        let config = ReminderConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config, ReminderConfig::new());
    }

    #[test]
    fn oversized_snooze_minutes_fall_back_to_default() {
        let huge = u64::MAX.to_string();
        let env: HashMap<&str, &str> = HashMap::from([("DUEWATCH_SNOOZE_MINUTES", huge.as_str())]);
        let config = ReminderConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.snooze_duration, Duration::from_secs(600));
        assert_eq!(config.snooze_duration_ms(), 600_000);
    }
}
