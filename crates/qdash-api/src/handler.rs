use async_trait::async_trait;
use qdash_core::AggregatedMetrics;
use qdash_model::{
    PageOptions, QueueFilter, QueueStats, TaskBatchResult, TaskId, TaskInfo, TaskOperation,
    TaskState, TimeWindow,
};

use crate::error::ApiError;

/// Dashboard API handler.
///
/// The HTTP layer only parses and validates; everything else goes through
/// this trait. [`CoreApiAdapter`](crate::CoreApiAdapter) is the provided
/// implementation.
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Every catalog metric for the window, or nothing.
    async fn metrics(
        &self,
        window: TimeWindow,
        filter: QueueFilter,
    ) -> Result<AggregatedMetrics, ApiError>;

    async fn list_queues(&self) -> Result<Vec<QueueStats>, ApiError>;

    async fn get_queue(&self, queue: &str) -> Result<QueueStats, ApiError>;

    async fn delete_queue(&self, queue: &str) -> Result<(), ApiError>;

    async fn pause_queue(&self, queue: &str) -> Result<(), ApiError>;

    async fn resume_queue(&self, queue: &str) -> Result<(), ApiError>;

    async fn get_task(&self, queue: &str, id: &TaskId) -> Result<TaskInfo, ApiError>;

    async fn list_tasks(
        &self,
        queue: &str,
        state: TaskState,
        page: PageOptions,
    ) -> Result<Vec<TaskInfo>, ApiError>;

    async fn apply(&self, queue: &str, id: &TaskId, op: TaskOperation) -> Result<(), ApiError>;

    /// Best effort per item; only fails if the batch could not be attempted at all.
    async fn apply_batch(
        &self,
        queue: &str,
        ids: &[TaskId],
        op: TaskOperation,
    ) -> Result<TaskBatchResult, ApiError>;

    /// Returns the number of tasks the operation succeeded on.
    async fn apply_all(
        &self,
        queue: &str,
        state: TaskState,
        op: TaskOperation,
    ) -> Result<usize, ApiError>;
}
