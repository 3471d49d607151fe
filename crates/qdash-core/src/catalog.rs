use std::fmt;

use crate::error::CoreError;

/// Logical slot of the aggregated metrics response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    QueueSize,
    QueueLatency,
    QueueMemoryUsage,
    TasksProcessedPerSecond,
    TasksFailedPerSecond,
    ErrorRate,
    PendingTasksByQueue,
    RetryTasksByQueue,
    ArchivedTasksByQueue,
}

impl MetricKind {
    pub const ALL: [MetricKind; 9] = [
        MetricKind::QueueSize,
        MetricKind::QueueLatency,
        MetricKind::QueueMemoryUsage,
        MetricKind::TasksProcessedPerSecond,
        MetricKind::TasksFailedPerSecond,
        MetricKind::ErrorRate,
        MetricKind::PendingTasksByQueue,
        MetricKind::RetryTasksByQueue,
        MetricKind::ArchivedTasksByQueue,
    ];

    /// Field name in the response document.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::QueueSize => "queue_size",
            MetricKind::QueueLatency => "queue_latency_seconds",
            MetricKind::QueueMemoryUsage => "queue_memory_usage_approx_bytes",
            MetricKind::TasksProcessedPerSecond => "tasks_processed_per_second",
            MetricKind::TasksFailedPerSecond => "tasks_failed_per_second",
            MetricKind::ErrorRate => "error_rate",
            MetricKind::PendingTasksByQueue => "pending_tasks_by_queue",
            MetricKind::RetryTasksByQueue => "retry_tasks_by_queue",
            MetricKind::ArchivedTasksByQueue => "archived_tasks_by_queue",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A templated backend query filling one response slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    pub kind: MetricKind,
    pub template: String,
}

impl MetricQuery {
    pub fn new(kind: MetricKind, template: impl Into<String>) -> Self {
        Self {
            kind,
            template: template.into(),
        }
    }
}

/// The fixed set of queries behind one dashboard metrics request.
///
/// Holds exactly one query per [`MetricKind`].
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    queries: Vec<MetricQuery>,
}

impl MetricCatalog {
    pub fn new(queries: Vec<MetricQuery>) -> Result<Self, CoreError> {
        for (i, q) in queries.iter().enumerate() {
            if queries[..i].iter().any(|prev| prev.kind == q.kind) {
                return Err(CoreError::DuplicateMetric(q.kind));
            }
        }
        if let Some(kind) = MetricKind::ALL
            .into_iter()
            .find(|kind| !queries.iter().any(|q| q.kind == *kind))
        {
            return Err(CoreError::MissingMetric(kind));
        }
        Ok(Self { queries })
    }

    /// Queries over the asynq Prometheus exporter's series.
    pub fn standard() -> Result<Self, CoreError> {
        use MetricKind::*;
        Self::new(vec![
            MetricQuery::new(QueueSize, "asynq_queue_size{QUEUE_FILTER}"),
            MetricQuery::new(QueueLatency, "asynq_queue_latency_seconds{QUEUE_FILTER}"),
            MetricQuery::new(
                QueueMemoryUsage,
                "asynq_queue_memory_usage_approx_bytes{QUEUE_FILTER}",
            ),
            MetricQuery::new(
                TasksProcessedPerSecond,
                "rate(asynq_tasks_processed_total{QUEUE_FILTER}[5m])",
            ),
            MetricQuery::new(
                TasksFailedPerSecond,
                "rate(asynq_tasks_failed_total{QUEUE_FILTER}[5m])",
            ),
            MetricQuery::new(
                ErrorRate,
                "rate(asynq_tasks_failed_total{QUEUE_FILTER}[5m]) / rate(asynq_tasks_processed_total{QUEUE_FILTER}[5m])",
            ),
            MetricQuery::new(
                PendingTasksByQueue,
                r#"asynq_tasks_enqueued_total{state="pending",QUEUE_FILTER}"#,
            ),
            MetricQuery::new(
                RetryTasksByQueue,
                r#"asynq_tasks_enqueued_total{state="retry",QUEUE_FILTER}"#,
            ),
            MetricQuery::new(
                ArchivedTasksByQueue,
                r#"asynq_tasks_enqueued_total{state="archived",QUEUE_FILTER}"#,
            ),
        ])
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricQuery> {
        self.queries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QUEUE_FILTER;

    #[test]
    fn standard_catalog_covers_every_slot_once() {
        let catalog = MetricCatalog::standard().unwrap();
        assert_eq!(catalog.len(), MetricKind::ALL.len());
        for q in catalog.iter() {
            assert!(q.template.contains(QUEUE_FILTER), "{} has no placeholder", q.kind);
        }
    }

    #[test]
    fn duplicate_kind_is_rejected() {
        let mut queries: Vec<MetricQuery> = MetricKind::ALL
            .into_iter()
            .map(|k| MetricQuery::new(k, "m{QUEUE_FILTER}"))
            .collect();
        queries.push(MetricQuery::new(MetricKind::ErrorRate, "other{QUEUE_FILTER}"));

        let err = MetricCatalog::new(queries).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateMetric(MetricKind::ErrorRate)));
    }

    #[test]
    fn missing_kind_is_rejected() {
        let queries = MetricKind::ALL
            .into_iter()
            .filter(|k| *k != MetricKind::QueueLatency)
            .map(|k| MetricQuery::new(k, "m{QUEUE_FILTER}"))
            .collect();

        let err = MetricCatalog::new(queries).unwrap_err();
        assert!(matches!(err, CoreError::MissingMetric(MetricKind::QueueLatency)));
    }

    #[test]
    fn field_names_are_distinct() {
        let mut names: Vec<&str> = MetricKind::ALL.iter().map(MetricKind::as_str).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 9);
    }
}
