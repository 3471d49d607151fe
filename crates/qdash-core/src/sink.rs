use std::time::Duration;

use qdash_model::TaskOperation;

use crate::catalog::MetricKind;

/// Receiver of the dashboard's own operational counters.
///
/// Implemented by `qdash_prometheus::PrometheusMetrics`; [`NoopMetrics`] discards everything.
pub trait MetricsSink: Send + Sync + 'static {
    /// One batch item attempted against the task store.
    fn record_batch_item(&self, op: TaskOperation, succeeded: bool);

    /// One sub-query of an aggregate failed.
    fn record_fetch_failure(&self, metric: MetricKind);

    /// One aggregate finished, successfully or not.
    fn observe_aggregate(&self, elapsed: Duration, succeeded: bool);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_batch_item(&self, _op: TaskOperation, _succeeded: bool) {}
    fn record_fetch_failure(&self, _metric: MetricKind) {}
    fn observe_aggregate(&self, _elapsed: Duration, _succeeded: bool) {}
}
