use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};
use qdash_core::{MetricKind, MetricsSink};
use qdash_model::TaskOperation;

const AGGREGATE_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

fn outcome(succeeded: bool) -> &'static str {
    if succeeded { "ok" } else { "error" }
}

/// Cheap to clone; all clones share one registry.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    batch_items: IntCounterVec,
    fetch_failures: IntCounterVec,
    aggregate_duration: HistogramVec,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let batch_items = IntCounterVec::new(
            Opts::new(
                "qdash_batch_items_total",
                "Task operations attempted through the dashboard",
            ),
            &["operation", "outcome"],
        )?;
        let fetch_failures = IntCounterVec::new(
            Opts::new(
                "qdash_metrics_fetch_failures_total",
                "Failed time-series sub-queries",
            ),
            &["metric"],
        )?;
        let aggregate_duration = HistogramVec::new(
            HistogramOpts::new(
                "qdash_metrics_aggregate_duration_seconds",
                "Wall time of one metrics aggregate",
            )
            .buckets(AGGREGATE_BUCKETS.to_vec()),
            &["outcome"],
        )?;

        registry.register(Box::new(batch_items.clone()))?;
        registry.register(Box::new(fetch_failures.clone()))?;
        registry.register(Box::new(aggregate_duration.clone()))?;

        Ok(Self {
            registry,
            batch_items,
            fetch_failures,
            aggregate_duration,
        })
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Renders the registry in the text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record_batch_item(&self, op: TaskOperation, succeeded: bool) {
        self.batch_items
            .with_label_values(&[op.as_str(), outcome(succeeded)])
            .inc();
    }

    fn record_fetch_failure(&self, metric: MetricKind) {
        self.fetch_failures
            .with_label_values(&[metric.as_str()])
            .inc();
    }

    fn observe_aggregate(&self, elapsed: Duration, succeeded: bool) {
        self.aggregate_duration
            .with_label_values(&[outcome(succeeded)])
            .observe(elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_items_are_labelled() {
        let m = PrometheusMetrics::new().unwrap();
        m.record_batch_item(TaskOperation::Delete, true);
        m.record_batch_item(TaskOperation::Delete, true);
        m.record_batch_item(TaskOperation::Run, false);

        let ok = m.batch_items.with_label_values(&["delete", "ok"]).get();
        let failed = m.batch_items.with_label_values(&["run", "error"]).get();
        assert_eq!(ok, 2);
        assert_eq!(failed, 1);
    }

    #[test]
    fn text_exposition_contains_every_family() {
        let m = PrometheusMetrics::new().unwrap();
        m.record_batch_item(TaskOperation::Archive, true);
        m.record_fetch_failure(MetricKind::QueueSize);
        m.observe_aggregate(Duration::from_millis(30), true);

        let text = m.encode_text().unwrap();
        assert!(text.contains("qdash_batch_items_total{operation=\"archive\",outcome=\"ok\"} 1"));
        assert!(text.contains("qdash_metrics_fetch_failures_total{metric=\"queue_size\"} 1"));
        assert!(text.contains("qdash_metrics_aggregate_duration_seconds_count{outcome=\"ok\"} 1"));
    }

    #[test]
    fn clones_share_registry() {
        let m = PrometheusMetrics::new().unwrap();
        let c = m.clone();
        c.record_fetch_failure(MetricKind::PendingTasksByQueue);
        assert_eq!(
            m.fetch_failures
                .with_label_values(&["pending_tasks_by_queue"])
                .get(),
            1
        );
    }
}
