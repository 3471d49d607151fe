use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use qdash_model::{PageOptions, QueueStats, TaskId, TaskInfo, TaskOperation, TaskState};

use super::{StoreError, TaskStore};

/// In-process [`TaskStore`].
///
/// Tasks keep insertion order inside their queue; a state change does not
/// move a task in that order.
#[derive(Clone, Default)]
pub struct MemoryTaskStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    queues: BTreeMap<String, QueueEntry>,
}

#[derive(Default)]
struct QueueEntry {
    tasks: Vec<TaskInfo>,
    paused: bool,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_queue(&self, queue: impl Into<String>) {
        self.write().queues.entry(queue.into()).or_default();
    }

    /// Adds a task, creating its queue on first use.
    pub fn insert(&self, task: TaskInfo) {
        self.write()
            .queues
            .entry(task.queue.clone())
            .or_default()
            .tasks
            .push(task);
    }

    pub fn get(&self, queue: &str, id: &TaskId) -> Option<TaskInfo> {
        self.read()
            .queues
            .get(queue)
            .and_then(|q| q.tasks.iter().find(|t| &t.id == id).cloned())
    }

    fn set_paused(&self, queue: &str, paused: bool) -> Result<(), StoreError> {
        let mut inner = self.write();
        let entry = inner
            .queues
            .get_mut(queue)
            .ok_or_else(|| StoreError::QueueNotFound(queue.to_string()))?;
        entry.paused = paused;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, queue: &str, id: &TaskId, op: TaskOperation) -> Result<(), StoreError> {
        use TaskState::*;

        let mut inner = self.write();
        let entry = inner
            .queues
            .get_mut(queue)
            .ok_or_else(|| StoreError::QueueNotFound(queue.to_string()))?;
        let pos = entry
            .tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| StoreError::TaskNotFound {
                queue: queue.to_string(),
                id: id.clone(),
            })?;

        let state = entry.tasks[pos].state;
        let next = match (op, state) {
            (TaskOperation::Delete, Active) => None,
            (TaskOperation::Delete, _) => {
                entry.tasks.remove(pos);
                return Ok(());
            }
            (TaskOperation::Run, Scheduled | Retry | Archived) => Some(Pending),
            (TaskOperation::Archive, Pending | Scheduled | Retry) => Some(Archived),
            (TaskOperation::CancelProcessing, Active) => Some(Retry),
            _ => None,
        };
        let Some(next) = next else {
            return Err(StoreError::InvalidState {
                id: id.clone(),
                state,
                op,
            });
        };

        let task = &mut entry.tasks[pos];
        task.state = next;
        if op == TaskOperation::CancelProcessing {
            task.last_error = Some("task canceled".to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn queues(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read().queues.keys().cloned().collect())
    }

    async fn queue_stats(&self, queue: &str) -> Result<QueueStats, StoreError> {
        let inner = self.read();
        let entry = inner
            .queues
            .get(queue)
            .ok_or_else(|| StoreError::QueueNotFound(queue.to_string()))?;

        let mut stats = QueueStats {
            queue: queue.to_string(),
            size: entry.tasks.len(),
            paused: entry.paused,
            ..Default::default()
        };
        for task in &entry.tasks {
            let counter = match task.state {
                TaskState::Active => &mut stats.active,
                TaskState::Pending => &mut stats.pending,
                TaskState::Scheduled => &mut stats.scheduled,
                TaskState::Retry => &mut stats.retry,
                TaskState::Archived => &mut stats.archived,
                TaskState::Completed => &mut stats.completed,
            };
            *counter += 1;
        }
        Ok(stats)
    }

    async fn pause_queue(&self, queue: &str) -> Result<(), StoreError> {
        self.set_paused(queue, true)
    }

    async fn resume_queue(&self, queue: &str) -> Result<(), StoreError> {
        self.set_paused(queue, false)
    }

    async fn delete_queue(&self, queue: &str) -> Result<(), StoreError> {
        let mut inner = self.write();
        let entry = inner
            .queues
            .get(queue)
            .ok_or_else(|| StoreError::QueueNotFound(queue.to_string()))?;
        if !entry.tasks.is_empty() {
            return Err(StoreError::QueueNotEmpty(queue.to_string()));
        }
        inner.queues.remove(queue);
        Ok(())
    }

    async fn get_task(&self, queue: &str, id: &TaskId) -> Result<TaskInfo, StoreError> {
        let inner = self.read();
        let entry = inner
            .queues
            .get(queue)
            .ok_or_else(|| StoreError::QueueNotFound(queue.to_string()))?;
        entry
            .tasks
            .iter()
            .find(|t| &t.id == id)
            .cloned()
            .ok_or_else(|| StoreError::TaskNotFound {
                queue: queue.to_string(),
                id: id.clone(),
            })
    }

    async fn list_tasks(
        &self,
        queue: &str,
        state: TaskState,
        page: PageOptions,
    ) -> Result<Vec<TaskInfo>, StoreError> {
        let inner = self.read();
        let entry = inner
            .queues
            .get(queue)
            .ok_or_else(|| StoreError::QueueNotFound(queue.to_string()))?;

        Ok(entry
            .tasks
            .iter()
            .filter(|t| t.state == state)
            .skip(page.offset())
            .take(page.size)
            .cloned()
            .collect())
    }

    async fn delete_task(&self, queue: &str, id: &TaskId) -> Result<(), StoreError> {
        self.transition(queue, id, TaskOperation::Delete)
    }

    async fn run_task(&self, queue: &str, id: &TaskId) -> Result<(), StoreError> {
        self.transition(queue, id, TaskOperation::Run)
    }

    async fn archive_task(&self, queue: &str, id: &TaskId) -> Result<(), StoreError> {
        self.transition(queue, id, TaskOperation::Archive)
    }

    async fn cancel_processing(&self, queue: &str, id: &TaskId) -> Result<(), StoreError> {
        self.transition(queue, id, TaskOperation::CancelProcessing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryTaskStore {
        let store = MemoryTaskStore::new();
        store.insert(TaskInfo::new("p1", "default", TaskState::Pending));
        store.insert(TaskInfo::new("p2", "default", TaskState::Pending));
        store.insert(TaskInfo::new("a1", "default", TaskState::Active));
        store.insert(TaskInfo::new("r1", "default", TaskState::Retry));
        store.insert(TaskInfo::new("x1", "default", TaskState::Archived));
        store.insert(TaskInfo::new("c1", "critical", TaskState::Completed));
        store
    }

    #[tokio::test]
    async fn queues_are_sorted() {
        let store = seeded();
        assert_eq!(store.queues().await.unwrap(), vec!["critical", "default"]);
    }

    #[tokio::test]
    async fn stats_count_every_state() {
        let stats = seeded().queue_stats("default").await.unwrap();
        assert_eq!(stats.size, 5);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.retry, 1);
        assert_eq!(stats.archived, 1);
        assert_eq!(stats.completed, 0);
        assert!(!stats.paused);
    }

    #[tokio::test]
    async fn list_pages_within_state() {
        let store = seeded();
        let first = store
            .list_tasks("default", TaskState::Pending, PageOptions::new(1, 1))
            .await
            .unwrap();
        let second = store
            .list_tasks("default", TaskState::Pending, PageOptions::new(2, 1))
            .await
            .unwrap();
        let third = store
            .list_tasks("default", TaskState::Pending, PageOptions::new(3, 1))
            .await
            .unwrap();

        assert_eq!(first[0].id.as_str(), "p1");
        assert_eq!(second[0].id.as_str(), "p2");
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn unknown_queue_is_an_error() {
        let err = seeded().queue_stats("missing").await.unwrap_err();
        assert_eq!(err, StoreError::QueueNotFound("missing".into()));
    }

    #[tokio::test]
    async fn run_requeues_retry_and_archived() {
        let store = seeded();
        store.run_task("default", &"r1".into()).await.unwrap();
        store.run_task("default", &"x1".into()).await.unwrap();
        assert_eq!(store.get("default", &"r1".into()).unwrap().state, TaskState::Pending);
        assert_eq!(store.get("default", &"x1".into()).unwrap().state, TaskState::Pending);
    }

    #[tokio::test]
    async fn invalid_transitions_are_refused() {
        let store = seeded();

        let err = store.run_task("default", &"p1".into()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidState { state: TaskState::Pending, .. }));

        let err = store.delete_task("default", &"a1".into()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidState { state: TaskState::Active, .. }));

        let err = store.archive_task("default", &"x1".into()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidState { op: TaskOperation::Archive, .. }));
    }

    #[tokio::test]
    async fn delete_removes_task() {
        let store = seeded();
        store.delete_task("default", &"p1".into()).await.unwrap();
        assert!(store.get("default", &"p1".into()).is_none());

        let err = store.delete_task("default", &"p1".into()).await.unwrap_err();
        assert!(matches!(err, StoreError::TaskNotFound { .. }));
    }

    #[tokio::test]
    async fn cancel_moves_active_task_to_retry() {
        let store = seeded();
        store.cancel_processing("default", &"a1".into()).await.unwrap();

        let task = store.get("default", &"a1".into()).unwrap();
        assert_eq!(task.state, TaskState::Retry);
        assert_eq!(task.last_error.as_deref(), Some("task canceled"));
    }

    #[tokio::test]
    async fn pause_and_resume_show_in_stats() {
        let store = seeded();
        store.pause_queue("default").await.unwrap();
        assert!(store.queue_stats("default").await.unwrap().paused);

        store.resume_queue("default").await.unwrap();
        assert!(!store.queue_stats("default").await.unwrap().paused);

        let err = store.pause_queue("missing").await.unwrap_err();
        assert_eq!(err, StoreError::QueueNotFound("missing".into()));
    }

    #[tokio::test]
    async fn only_empty_queues_can_be_deleted() {
        let store = seeded();
        store.create_queue("idle");

        let err = store.delete_queue("default").await.unwrap_err();
        assert_eq!(err, StoreError::QueueNotEmpty("default".into()));

        store.delete_queue("idle").await.unwrap();
        assert_eq!(store.queues().await.unwrap(), vec!["critical", "default"]);

        let err = store.delete_queue("idle").await.unwrap_err();
        assert_eq!(err, StoreError::QueueNotFound("idle".into()));
    }

    #[tokio::test]
    async fn get_task_finds_by_queue_and_id() {
        let store = seeded();
        let task = store.get_task("critical", &"c1".into()).await.unwrap();
        assert_eq!(task.state, TaskState::Completed);

        let err = store.get_task("default", &"c1".into()).await.unwrap_err();
        assert!(matches!(err, StoreError::TaskNotFound { .. }));
    }

    #[tokio::test]
    async fn no_native_bulk_primitive() {
        let res = seeded()
            .apply_all("default", TaskState::Pending, TaskOperation::Delete)
            .await
            .unwrap();
        assert_eq!(res, None);
    }
}
