use serde::{Deserialize, Serialize};

use super::{TaskId, TaskState};

/// Snapshot of one task as returned by the task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: TaskId,
    pub queue: String,
    /// Type name the task was enqueued with.
    pub kind: String,
    /// Raw payload bytes; rendered for display by a `PayloadFormatter`.
    pub payload: Vec<u8>,
    pub state: TaskState,
    pub max_retry: u32,
    pub retried: u32,
    pub last_error: Option<String>,
}

impl TaskInfo {
    pub fn new(id: impl Into<TaskId>, queue: impl Into<String>, state: TaskState) -> Self {
        Self {
            id: id.into(),
            queue: queue.into(),
            kind: String::new(),
            payload: Vec::new(),
            state,
            max_retry: 0,
            retried: 0,
            last_error: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }
}
