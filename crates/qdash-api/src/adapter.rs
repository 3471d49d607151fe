use std::sync::Arc;

use async_trait::async_trait;
use qdash_core::{AggregatedMetrics, BatchExecutor, CoreError, MetricsAggregator, StoreError};
use qdash_model::{
    PageOptions, QueueFilter, QueueStats, TaskBatchResult, TaskId, TaskInfo, TaskOperation,
    TaskState, TimeWindow,
};

use crate::error::ApiError;
use crate::handler::ApiHandler;

/// Adapter that bridges the core components to `ApiHandler`.
///
/// Without an aggregator the metrics endpoint reports
/// [`ApiError::MetricsUnavailable`]; task endpoints keep working.
pub struct CoreApiAdapter {
    aggregator: Option<Arc<MetricsAggregator>>,
    executor: Arc<BatchExecutor>,
}

impl CoreApiAdapter {
    pub fn new(executor: Arc<BatchExecutor>) -> Self {
        Self {
            aggregator: None,
            executor,
        }
    }

    pub fn with_aggregator(mut self, aggregator: Arc<MetricsAggregator>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }
}

#[async_trait]
impl ApiHandler for CoreApiAdapter {
    async fn metrics(
        &self,
        window: TimeWindow,
        filter: QueueFilter,
    ) -> Result<AggregatedMetrics, ApiError> {
        let aggregator = self
            .aggregator
            .as_ref()
            .ok_or(ApiError::MetricsUnavailable)?;
        aggregator
            .aggregate(&window, &filter)
            .await
            .map_err(ApiError::from)
    }

    async fn list_queues(&self) -> Result<Vec<QueueStats>, ApiError> {
        let store = self.executor.store();
        let names = store.queues().await.map_err(CoreError::from)?;

        let mut stats = Vec::with_capacity(names.len());
        for name in &names {
            stats.push(store.queue_stats(name).await.map_err(CoreError::from)?);
        }
        Ok(stats)
    }

    async fn get_queue(&self, queue: &str) -> Result<QueueStats, ApiError> {
        store_call(self.executor.store().queue_stats(queue).await)
    }

    async fn delete_queue(&self, queue: &str) -> Result<(), ApiError> {
        store_call(self.executor.store().delete_queue(queue).await)
    }

    async fn pause_queue(&self, queue: &str) -> Result<(), ApiError> {
        store_call(self.executor.store().pause_queue(queue).await)
    }

    async fn resume_queue(&self, queue: &str) -> Result<(), ApiError> {
        store_call(self.executor.store().resume_queue(queue).await)
    }

    async fn get_task(&self, queue: &str, id: &TaskId) -> Result<TaskInfo, ApiError> {
        store_call(self.executor.store().get_task(queue, id).await)
    }

    async fn list_tasks(
        &self,
        queue: &str,
        state: TaskState,
        page: PageOptions,
    ) -> Result<Vec<TaskInfo>, ApiError> {
        store_call(self.executor.store().list_tasks(queue, state, page).await)
    }

    async fn apply(&self, queue: &str, id: &TaskId, op: TaskOperation) -> Result<(), ApiError> {
        self.executor
            .execute_one(queue, id, op)
            .await
            .map_err(ApiError::from)
    }

    async fn apply_batch(
        &self,
        queue: &str,
        ids: &[TaskId],
        op: TaskOperation,
    ) -> Result<TaskBatchResult, ApiError> {
        Ok(self.executor.execute_batch(queue, ids, op).await)
    }

    async fn apply_all(
        &self,
        queue: &str,
        state: TaskState,
        op: TaskOperation,
    ) -> Result<usize, ApiError> {
        self.executor
            .execute_all(queue, state, op)
            .await
            .map_err(ApiError::from)
    }
}

fn store_call<T>(res: Result<T, StoreError>) -> Result<T, ApiError> {
    res.map_err(|e| ApiError::from(CoreError::from(e)))
}
