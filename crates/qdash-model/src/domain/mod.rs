mod task_id;
pub use task_id::TaskId;

mod task_state;
pub use task_state::TaskState;

mod task_info;
pub use task_info::TaskInfo;

mod queue_stats;
pub use queue_stats::QueueStats;

mod page;
pub use page::PageOptions;

mod window;
pub use window::TimeWindow;

mod queue_filter;
pub use queue_filter::QueueFilter;

mod operation;
pub use operation::TaskOperation;

mod batch;
pub use batch::{TaskBatchRequest, TaskBatchResult};
