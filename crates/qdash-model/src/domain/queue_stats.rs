use serde::{Deserialize, Serialize};

/// Point-in-time counters for a single queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub queue: String,
    /// Total number of tasks in the queue, all states included.
    pub size: usize,
    pub active: usize,
    pub pending: usize,
    pub scheduled: usize,
    pub retry: usize,
    pub archived: usize,
    pub completed: usize,
    pub paused: bool,
}
