use async_trait::async_trait;
use qdash_model::{PageOptions, QueueStats, TaskId, TaskInfo, TaskOperation, TaskState};
use thiserror::Error;

mod memory;
pub use memory::MemoryTaskStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("queue not found: {0}")]
    QueueNotFound(String),

    #[error("task not found: {queue}/{id}")]
    TaskNotFound { queue: String, id: TaskId },

    #[error("cannot {op} task {id}: task is {state}")]
    InvalidState {
        id: TaskId,
        state: TaskState,
        op: TaskOperation,
    },

    #[error("queue is not empty: {0}")]
    QueueNotEmpty(String),

    #[error("task store unavailable: {0}")]
    Unavailable(String),
}

/// System of record for queued tasks.
///
/// Every call stands alone: there are no transactions, so a sequence of calls
/// may partially succeed.
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    /// Names of all known queues, sorted.
    async fn queues(&self) -> Result<Vec<String>, StoreError>;

    async fn queue_stats(&self, queue: &str) -> Result<QueueStats, StoreError>;

    /// Stops workers from picking up the queue's pending tasks.
    async fn pause_queue(&self, queue: &str) -> Result<(), StoreError>;

    async fn resume_queue(&self, queue: &str) -> Result<(), StoreError>;

    /// Removes an empty queue; fails with [`StoreError::QueueNotEmpty`] otherwise.
    async fn delete_queue(&self, queue: &str) -> Result<(), StoreError>;

    async fn get_task(&self, queue: &str, id: &TaskId) -> Result<TaskInfo, StoreError>;

    /// One page of the tasks currently in `state`, oldest first.
    async fn list_tasks(
        &self,
        queue: &str,
        state: TaskState,
        page: PageOptions,
    ) -> Result<Vec<TaskInfo>, StoreError>;

    async fn delete_task(&self, queue: &str, id: &TaskId) -> Result<(), StoreError>;

    /// Moves the task back to pending.
    async fn run_task(&self, queue: &str, id: &TaskId) -> Result<(), StoreError>;

    async fn archive_task(&self, queue: &str, id: &TaskId) -> Result<(), StoreError>;

    /// Signals the worker processing the task to stop.
    async fn cancel_processing(&self, queue: &str, id: &TaskId) -> Result<(), StoreError>;

    /// Native "apply to every task in a state" primitive.
    ///
    /// Returns the number of affected tasks, or `None` when the store has no
    /// such primitive for `op` and the caller must iterate itself.
    async fn apply_all(
        &self,
        _queue: &str,
        _state: TaskState,
        _op: TaskOperation,
    ) -> Result<Option<usize>, StoreError> {
        Ok(None)
    }
}
