pub mod error;
pub use error::{CoreError, FetchError};

pub mod window;
pub use window::{resolve_window, step};

pub mod query;
pub use query::{QUEUE_FILTER, RangeQuery, build_query, build_request_url};

pub mod catalog;
pub use catalog::{MetricCatalog, MetricKind, MetricQuery};

pub mod backend;
pub use backend::{MetricsBackend, PrometheusBackend};

pub mod aggregator;
pub use aggregator::{AggregatedMetrics, AggregatorConfig, MetricsAggregator};

pub mod store;
pub use store::{MemoryTaskStore, StoreError, TaskStore};

pub mod batch;
pub use batch::{ALL_TASKS_PAGE_SIZE, BatchExecutor};

mod sink;
pub use sink::{MetricsSink, NoopMetrics};
