//! Application view surface used when notification actions re-enter.

use super::channel::ChannelError;
use crate::model::task::TaskId;
use serde::{Deserialize, Serialize};

/// Message posted to live application views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ViewMessage {
    /// A task was completed out-of-band from a notification action.
    #[serde(rename = "TASK_COMPLETED")]
    TaskCompleted {
        #[serde(rename = "taskId")]
        task_id: TaskId,
    },
    /// A focused view should open this task.
    #[serde(rename = "navigate-task")]
    NavigateTask {
        #[serde(rename = "taskId")]
        task_id: TaskId,
    },
}

/// Host shell that owns application views.
pub trait ViewHost {
    /// Posts `message` to every live view; returns how many received it.
    fn broadcast(&self, message: &ViewMessage) -> usize;
    /// Focuses an existing view scoped to `task_id`.
    ///
    /// Returns `false` when no live view could take focus.
    fn focus_task(&self, task_id: TaskId) -> bool;
    /// Launches the application scoped to `task_id`.
    fn launch(&self, task_id: TaskId) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::ViewMessage;
    use uuid::Uuid;

    #[test]
    fn completion_message_uses_broadcast_wire_shape() {
        let task_id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
        let json = serde_json::to_value(ViewMessage::TaskCompleted { task_id }).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "TASK_COMPLETED",
                "taskId": "11111111-2222-4333-8444-555555555555",
            })
        );
    }
}
