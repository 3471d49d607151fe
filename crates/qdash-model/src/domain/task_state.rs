use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// State of a task as tracked by the task store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task is being processed by a worker.
    Active,
    /// Task is ready to be picked up.
    Pending,
    /// Task is waiting for its process-at time.
    Scheduled,
    /// Task failed and waits for its next attempt.
    Retry,
    /// Task exhausted its retries or was archived by an operator.
    Archived,
    /// Task finished and is retained for inspection.
    Completed,
}

impl TaskState {
    pub const ALL: [TaskState; 6] = [
        TaskState::Active,
        TaskState::Pending,
        TaskState::Scheduled,
        TaskState::Retry,
        TaskState::Archived,
        TaskState::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Active => "active",
            TaskState::Pending => "pending",
            TaskState::Scheduled => "scheduled",
            TaskState::Retry => "retry",
            TaskState::Archived => "archived",
            TaskState::Completed => "completed",
        }
    }

    /// Parses a collection path segment such as `pending_tasks`.
    pub fn from_collection(segment: &str) -> Option<Self> {
        let name = segment.strip_suffix("_tasks")?;
        name.parse().ok()
    }
}

impl FromStr for TaskState {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ModelError::UnknownState(s.to_string()))
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_states() {
        for state in TaskState::ALL {
            assert_eq!(state.as_str().parse::<TaskState>().unwrap(), state);
        }
        assert!("running".parse::<TaskState>().is_err());
    }

    #[test]
    fn from_collection_segment() {
        assert_eq!(
            TaskState::from_collection("pending_tasks"),
            Some(TaskState::Pending)
        );
        assert_eq!(
            TaskState::from_collection("active_tasks"),
            Some(TaskState::Active)
        );
        assert_eq!(TaskState::from_collection("pending"), None);
        assert_eq!(TaskState::from_collection("bogus_tasks"), None);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&TaskState::Scheduled).unwrap();
        assert_eq!(json, r#""scheduled""#);
    }
}
