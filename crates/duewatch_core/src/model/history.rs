//! Per-task reminder dedup history.
//!
//! # Responsibility
//! - Hold "already notified" flags per milestone and per poller context.
//! - Carry the recurring-reminder clocks and the shared snooze deadline.
//!
//! # Invariants
//! - Flags are monotonic: there is no API that clears a flag.
//! - Foreground and background flag keys are disjoint, so one context's
//!   backfill never hides a milestone from the other.
//! - `snooze_until` is shared by both contexts.
//!
//! The serialized form is a flat JSON object, e.g.
//! `{"end":true,"end_fg":true,"last_notified":1700000000000}`.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const FOREGROUND_SUFFIX: &str = "_fg";

/// Execution context that evaluates reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollerContext {
    /// Runs even when no application view is open.
    Background,
    /// Runs only while an application view is open.
    Foreground,
}

impl PollerContext {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Foreground => "foreground",
        }
    }

    /// Returns the history key for `milestone_id` in this context's namespace.
    pub fn flag_key(self, milestone_id: &str) -> Cow<'_, str> {
        match self {
            Self::Background => Cow::Borrowed(milestone_id),
            Self::Foreground => Cow::Owned(format!("{milestone_id}{FOREGROUND_SUFFIX}")),
        }
    }
}

impl Display for PollerContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PollerContext {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "background" | "bg" => Ok(Self::Background),
            "foreground" | "fg" => Ok(Self::Foreground),
            other => Err(format!(
                "unsupported poller context `{other}`; expected foreground|background"
            )),
        }
    }
}

/// Dedup record for one task.
///
/// Treated as an immutable snapshot by readers: evaluation clones it and
/// returns the new value instead of mutating a shared reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_notified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_notified_fg: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    snooze_until: Option<i64>,
    #[serde(flatten)]
    flags: BTreeMap<String, bool>,
}

impl HistoryRecord {
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
            && self.last_notified.is_none()
            && self.last_notified_fg.is_none()
            && self.snooze_until.is_none()
    }

    /// Returns whether `key` has already been marked as notified.
    pub fn is_flagged(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    /// Marks `key` as notified. Never clears.
    pub fn set_flag(&mut self, key: impl Into<String>) {
        self.flags.insert(key.into(), true);
    }

    pub fn last_notified(&self, context: PollerContext) -> Option<i64> {
        match context {
            PollerContext::Background => self.last_notified,
            PollerContext::Foreground => self.last_notified_fg,
        }
    }

    pub fn set_last_notified(&mut self, context: PollerContext, at_ms: i64) {
        match context {
            PollerContext::Background => self.last_notified = Some(at_ms),
            PollerContext::Foreground => self.last_notified_fg = Some(at_ms),
        }
    }

    pub fn snooze_until(&self) -> Option<i64> {
        self.snooze_until
    }

    pub fn set_snooze_until(&mut self, until_ms: i64) {
        self.snooze_until = Some(until_ms);
    }

    /// Returns whether reminders are suppressed at `now_ms`.
    pub fn is_snoozed_at(&self, now_ms: i64) -> bool {
        self.snooze_until.is_some_and(|until| now_ms < until)
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryRecord, PollerContext};

    #[test]
    fn foreground_keys_are_suffixed() {
        assert_eq!(PollerContext::Background.flag_key("end"), "end");
        assert_eq!(PollerContext::Foreground.flag_key("end"), "end_fg");
    }

    #[test]
    fn serialized_shape_is_a_flat_object() {
        let mut record = HistoryRecord::default();
        record.set_flag("end");
        record.set_flag("end_fg");
        record.set_last_notified(PollerContext::Background, 1_000);
        record.set_snooze_until(2_000);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["end"], true);
        assert_eq!(json["end_fg"], true);
        assert_eq!(json["last_notified"], 1_000);
        assert_eq!(json["snooze_until"], 2_000);
        assert!(json.get("last_notified_fg").is_none());

        let decoded: HistoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn non_boolean_flag_values_are_rejected() {
        let result = serde_json::from_str::<HistoryRecord>(r#"{"end":"yes"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn snooze_window_is_half_open() {
        let mut record = HistoryRecord::default();
        assert!(!record.is_snoozed_at(0));

        record.set_snooze_until(100);
        assert!(record.is_snoozed_at(99));
        assert!(!record.is_snoozed_at(100));
    }

    #[test]
    fn context_parses_from_labels() {
        assert_eq!("FG".parse::<PollerContext>(), Ok(PollerContext::Foreground));
        assert_eq!(
            " background ".parse::<PollerContext>(),
            Ok(PollerContext::Background)
        );
        assert!("sideways".parse::<PollerContext>().is_err());
    }
}
