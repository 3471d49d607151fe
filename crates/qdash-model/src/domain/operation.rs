use std::fmt;

use serde::{Deserialize, Serialize};

use super::TaskState;

/// State transition applied by an operator to one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOperation {
    Delete,
    /// Requeue to pending.
    Run,
    Archive,
    CancelProcessing,
}

impl TaskOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOperation::Delete => "delete",
            TaskOperation::Run => "run",
            TaskOperation::Archive => "archive",
            TaskOperation::CancelProcessing => "cancel",
        }
    }

    /// Whether the dashboard exposes this operation for tasks in `state`.
    pub fn allowed_in(&self, state: TaskState) -> bool {
        use TaskState::*;
        match self {
            TaskOperation::Delete => !matches!(state, Active),
            TaskOperation::Run => matches!(state, Scheduled | Retry | Archived),
            TaskOperation::Archive => matches!(state, Pending | Scheduled | Retry),
            TaskOperation::CancelProcessing => matches!(state, Active),
        }
    }
}

impl fmt::Display for TaskOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_matrix() {
        assert!(TaskOperation::Delete.allowed_in(TaskState::Completed));
        assert!(!TaskOperation::Delete.allowed_in(TaskState::Active));

        assert!(TaskOperation::Run.allowed_in(TaskState::Archived));
        assert!(!TaskOperation::Run.allowed_in(TaskState::Pending));

        assert!(TaskOperation::Archive.allowed_in(TaskState::Retry));
        assert!(!TaskOperation::Archive.allowed_in(TaskState::Archived));

        assert!(TaskOperation::CancelProcessing.allowed_in(TaskState::Active));
        assert!(!TaskOperation::CancelProcessing.allowed_in(TaskState::Pending));
    }
}
