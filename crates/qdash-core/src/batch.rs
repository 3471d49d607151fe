//! Bulk task operation executor.

use std::sync::Arc;

use qdash_model::{PageOptions, TaskBatchResult, TaskId, TaskOperation, TaskState};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::CoreError,
    sink::{MetricsSink, NoopMetrics},
    store::{StoreError, TaskStore},
};

/// Page size used when walking every task of a state.
pub const ALL_TASKS_PAGE_SIZE: usize = 100;

/// Applies task operations against a [`TaskStore`], one item at a time.
pub struct BatchExecutor {
    store: Arc<dyn TaskStore>,
    sink: Arc<dyn MetricsSink>,
}

impl BatchExecutor {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            sink: Arc::new(NoopMetrics),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// Applies `op` to a single task.
    pub async fn execute_one(
        &self,
        queue: &str,
        id: &TaskId,
        op: TaskOperation,
    ) -> Result<(), CoreError> {
        let res = apply(self.store.as_ref(), queue, id, op).await;
        self.sink.record_batch_item(op, res.is_ok());
        res.map_err(CoreError::from)
    }

    /// Applies `op` to every ID, in input order.
    ///
    /// Never stops early: a failed item is logged, counted as failed and the
    /// loop moves on. Repeated IDs are attempted once per occurrence.
    #[instrument(level = "debug", skip(self, ids), fields(count = ids.len()))]
    pub async fn execute_batch(
        &self,
        queue: &str,
        ids: &[TaskId],
        op: TaskOperation,
    ) -> TaskBatchResult {
        let mut result = TaskBatchResult::with_capacity(ids.len());

        for id in ids {
            match apply(self.store.as_ref(), queue, id, op).await {
                Ok(()) => {
                    self.sink.record_batch_item(op, true);
                    result.succeeded.push(id.clone());
                }
                Err(e) => {
                    self.sink.record_batch_item(op, false);
                    warn!(%queue, task_id = %id, %op, error = %e, "could not apply task operation");
                    result.failed.push(id.clone());
                }
            }
        }

        debug!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "batch finished"
        );
        result
    }

    /// Applies `op` to every task currently in `state`.
    ///
    /// Prefers the store's own bulk primitive. Without one, the task IDs are
    /// collected page by page (a short page ends the walk) and then handed to
    /// [`execute_batch`](Self::execute_batch). Returns the number of tasks the
    /// operation succeeded on.
    #[instrument(level = "debug", skip(self))]
    pub async fn execute_all(
        &self,
        queue: &str,
        state: TaskState,
        op: TaskOperation,
    ) -> Result<usize, CoreError> {
        if let Some(n) = self.store.apply_all(queue, state, op).await? {
            info!(%queue, %state, %op, affected = n, "applied store bulk operation");
            return Ok(n);
        }

        let ids = self.collect_ids(queue, state).await?;
        let result = self.execute_batch(queue, &ids, op).await;
        if !result.failed.is_empty() {
            warn!(%queue, %state, %op, failed = result.failed.len(), "some tasks were not processed");
        }
        Ok(result.succeeded.len())
    }

    async fn collect_ids(&self, queue: &str, state: TaskState) -> Result<Vec<TaskId>, StoreError> {
        let mut ids = Vec::new();
        let mut page = PageOptions::new(1, ALL_TASKS_PAGE_SIZE);
        loop {
            let tasks = self.store.list_tasks(queue, state, page).await?;
            let short = tasks.len() < page.size;
            ids.extend(tasks.into_iter().map(|t| t.id));
            if short {
                return Ok(ids);
            }
            page = page.next();
        }
    }
}

async fn apply(
    store: &dyn TaskStore,
    queue: &str,
    id: &TaskId,
    op: TaskOperation,
) -> Result<(), StoreError> {
    match op {
        TaskOperation::Delete => store.delete_task(queue, id).await,
        TaskOperation::Run => store.run_task(queue, id).await,
        TaskOperation::Archive => store.archive_task(queue, id).await,
        TaskOperation::CancelProcessing => store.cancel_processing(queue, id).await,
    }
}
