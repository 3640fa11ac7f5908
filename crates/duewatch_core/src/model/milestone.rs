//! Fixed reminder schedule relative to a task deadline.
//!
//! # Invariants
//! - `MILESTONES` is strictly ascending by `offset_ms`.
//! - The recurring reminder is not part of the table; it has no offset.

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

/// One day in milliseconds; recurring reminders use this cadence.
pub const ONE_DAY_MS: i64 = 24 * HOUR_MS;

/// Milestones at or before this offset are "pre-warnings".
pub const PRE_WARNING_MAX_OFFSET_MS: i64 = -10 * MINUTE_MS;

/// Pre-warnings are skipped once `diff` is past this point.
pub const SMART_SKIP_THRESHOLD_MS: i64 = -5 * MINUTE_MS;

/// Named point in time relative to a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub id: &'static str,
    /// Signed offset from the due date; negative means before it.
    pub offset_ms: i64,
    pub message: &'static str,
}

/// Synthetic daily reminder for tasks more than a day overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurringMilestone {
    pub id: &'static str,
    pub message: &'static str,
}

pub const MILESTONES: &[Milestone] = &[
    Milestone {
        id: "30m_before",
        offset_ms: -30 * MINUTE_MS,
        message: "Due in 30 minutes!",
    },
    Milestone {
        id: "15m_before",
        offset_ms: -15 * MINUTE_MS,
        message: "Due in 15 minutes!",
    },
    Milestone {
        id: "10m_before",
        offset_ms: -10 * MINUTE_MS,
        message: "Due in 10 minutes!",
    },
    Milestone {
        id: "end",
        offset_ms: 0,
        message: "Time is up! Task is due now.",
    },
    Milestone {
        id: "5m_after",
        offset_ms: 5 * MINUTE_MS,
        message: "Overdue by 5 minutes!",
    },
    Milestone {
        id: "15m_after",
        offset_ms: 15 * MINUTE_MS,
        message: "Overdue by 15 minutes!",
    },
    Milestone {
        id: "30m_after",
        offset_ms: 30 * MINUTE_MS,
        message: "Overdue by 30 minutes!",
    },
    Milestone {
        id: "1h_after",
        offset_ms: HOUR_MS,
        message: "Overdue by 1 hour!",
    },
    Milestone {
        id: "5h_after",
        offset_ms: 5 * HOUR_MS,
        message: "Overdue by 5 hours!",
    },
    Milestone {
        id: "12h_after",
        offset_ms: 12 * HOUR_MS,
        message: "Overdue by 12 hours!",
    },
    Milestone {
        id: "24h_after",
        offset_ms: ONE_DAY_MS,
        message: "Overdue by 1 day!",
    },
];

pub const RECURRING_DAILY: RecurringMilestone = RecurringMilestone {
    id: "recurring_daily",
    message: "Still Overdue! Please complete this task.",
};

impl Milestone {
    /// Returns whether this milestone is a "before due" warning.
    pub fn is_pre_warning(&self) -> bool {
        self.offset_ms <= PRE_WARNING_MAX_OFFSET_MS
    }

    /// Smart-skip: stale pre-warnings are dropped once less than five
    /// minutes remain, or the task is already due.
    pub fn is_smart_skipped(&self, diff_ms: i64) -> bool {
        diff_ms > SMART_SKIP_THRESHOLD_MS && self.is_pre_warning()
    }

    /// Returns whether `diff_ms` has reached this milestone.
    pub fn is_crossed(&self, diff_ms: i64) -> bool {
        diff_ms >= self.offset_ms
    }
}

/// Reminder chosen for dispatch in one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reminder {
    Milestone(&'static Milestone),
    Recurring(&'static RecurringMilestone),
}

impl Reminder {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Milestone(milestone) => milestone.id,
            Self::Recurring(recurring) => recurring.id,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Milestone(milestone) => milestone.message,
            Self::Recurring(recurring) => recurring.message,
        }
    }
}

/// Looks up a table milestone by id.
pub fn milestone_by_id(id: &str) -> Option<&'static Milestone> {
    MILESTONES.iter().find(|milestone| milestone.id == id)
}

#[cfg(test)]
mod tests {
    use super::{milestone_by_id, MILESTONES, MINUTE_MS};

    #[test]
    fn table_is_strictly_ascending() {
        for pair in MILESTONES.windows(2) {
            assert!(
                pair[0].offset_ms < pair[1].offset_ms,
                "{} must precede {}",
                pair[0].id,
                pair[1].id
            );
        }
    }

    #[test]
    fn only_ten_minutes_and_earlier_are_pre_warnings() {
        let pre: Vec<_> = MILESTONES
            .iter()
            .filter(|m| m.is_pre_warning())
            .map(|m| m.id)
            .collect();
        assert_eq!(pre, vec!["30m_before", "15m_before", "10m_before"]);
    }

    #[test]
    fn smart_skip_boundary_is_exclusive_at_five_minutes() {
        let ten_before = milestone_by_id("10m_before").unwrap();
        assert!(!ten_before.is_smart_skipped(-6 * MINUTE_MS));
        assert!(!ten_before.is_smart_skipped(-5 * MINUTE_MS));
        assert!(ten_before.is_smart_skipped(-5 * MINUTE_MS + 1));
        assert!(ten_before.is_smart_skipped(0));

        let end = milestone_by_id("end").unwrap();
        assert!(!end.is_smart_skipped(0));
    }
}
