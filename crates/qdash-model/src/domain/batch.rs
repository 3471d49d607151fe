use serde::{Deserialize, Serialize};

use super::TaskId;

/// Body of every `*:batch_*` endpoint.
///
/// IDs are kept in request order and are not deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskBatchRequest {
    #[serde(default)]
    pub task_ids: Vec<TaskId>,
}

/// Partition of a batch into the IDs the store accepted and the ones it refused.
///
/// Both lists are always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskBatchResult {
    pub succeeded: Vec<TaskId>,
    pub failed: Vec<TaskId>,
}

impl TaskBatchResult {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            succeeded: Vec::with_capacity(n),
            failed: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_task_ids_is_empty_batch() {
        let req: TaskBatchRequest = serde_json::from_str("{}").unwrap();
        assert!(req.task_ids.is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res = serde_json::from_str::<TaskBatchRequest>(r#"{"task_ids":[],"force":true}"#);
        assert!(res.is_err());
    }

    #[test]
    fn duplicates_are_preserved() {
        let req: TaskBatchRequest = serde_json::from_str(r#"{"task_ids":["a","a","b"]}"#).unwrap();
        assert_eq!(req.task_ids.len(), 3);
    }
}
