//! Metrics aggregator: fans one dashboard request out to the whole catalog.

use std::{collections::HashMap, sync::Arc, time::Duration};

use qdash_model::{QueueFilter, TimeWindow};
use serde::Serialize;
use serde_json::value::RawValue;
use tokio::{task::JoinSet, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use crate::{
    backend::MetricsBackend,
    catalog::{MetricCatalog, MetricKind},
    error::{CoreError, FetchError},
    query::{RangeQuery, build_query},
    sink::{MetricsSink, NoopMetrics},
    window,
};

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Upper bound for a single backend fetch.
    pub fetch_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Raw backend answers, one per logical metric.
///
/// Only ever built with every slot populated.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedMetrics {
    pub queue_size: Box<RawValue>,
    pub queue_latency_seconds: Box<RawValue>,
    pub queue_memory_usage_approx_bytes: Box<RawValue>,
    pub tasks_processed_per_second: Box<RawValue>,
    pub tasks_failed_per_second: Box<RawValue>,
    pub error_rate: Box<RawValue>,
    pub pending_tasks_by_queue: Box<RawValue>,
    pub retry_tasks_by_queue: Box<RawValue>,
    pub archived_tasks_by_queue: Box<RawValue>,
}

impl AggregatedMetrics {
    fn from_slots(mut slots: HashMap<MetricKind, Box<RawValue>>) -> Result<Self, CoreError> {
        let mut take = |kind: MetricKind| slots.remove(&kind).ok_or(CoreError::MissingMetric(kind));
        Ok(Self {
            queue_size: take(MetricKind::QueueSize)?,
            queue_latency_seconds: take(MetricKind::QueueLatency)?,
            queue_memory_usage_approx_bytes: take(MetricKind::QueueMemoryUsage)?,
            tasks_processed_per_second: take(MetricKind::TasksProcessedPerSecond)?,
            tasks_failed_per_second: take(MetricKind::TasksFailedPerSecond)?,
            error_rate: take(MetricKind::ErrorRate)?,
            pending_tasks_by_queue: take(MetricKind::PendingTasksByQueue)?,
            retry_tasks_by_queue: take(MetricKind::RetryTasksByQueue)?,
            archived_tasks_by_queue: take(MetricKind::ArchivedTasksByQueue)?,
        })
    }

    pub fn get(&self, kind: MetricKind) -> &RawValue {
        match kind {
            MetricKind::QueueSize => &self.queue_size,
            MetricKind::QueueLatency => &self.queue_latency_seconds,
            MetricKind::QueueMemoryUsage => &self.queue_memory_usage_approx_bytes,
            MetricKind::TasksProcessedPerSecond => &self.tasks_processed_per_second,
            MetricKind::TasksFailedPerSecond => &self.tasks_failed_per_second,
            MetricKind::ErrorRate => &self.error_rate,
            MetricKind::PendingTasksByQueue => &self.pending_tasks_by_queue,
            MetricKind::RetryTasksByQueue => &self.retry_tasks_by_queue,
            MetricKind::ArchivedTasksByQueue => &self.archived_tasks_by_queue,
        }
    }
}

pub struct MetricsAggregator {
    backend: Arc<dyn MetricsBackend>,
    catalog: MetricCatalog,
    config: AggregatorConfig,
    sink: Arc<dyn MetricsSink>,
    shutdown: CancellationToken,
}

impl MetricsAggregator {
    pub fn new(backend: Arc<dyn MetricsBackend>, catalog: MetricCatalog) -> Self {
        Self {
            backend,
            catalog,
            config: AggregatorConfig::default(),
            sink: Arc::new(NoopMetrics),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// In-flight fetches of every aggregate stop when `token` is cancelled.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    /// Runs every catalog query for `window` and `filter` concurrently.
    ///
    /// All-or-nothing: the first failing query cancels the rest and its error
    /// is returned; no partial response is ever produced.
    #[instrument(level = "debug", skip(self, window, filter), fields(
        duration_secs = window.duration().as_secs(),
        end = window.end_unix(),
        queues = filter.names().len(),
    ))]
    pub async fn aggregate(
        &self,
        window: &TimeWindow,
        filter: &QueueFilter,
    ) -> Result<AggregatedMetrics, CoreError> {
        let started = Instant::now();
        let result = self.fan_out(window, filter).await;
        let elapsed = started.elapsed();

        self.sink.observe_aggregate(elapsed, result.is_ok());
        debug!(?elapsed, ok = result.is_ok(), "aggregate finished");
        result
    }

    async fn fan_out(
        &self,
        window: &TimeWindow,
        filter: &QueueFilter,
    ) -> Result<AggregatedMetrics, CoreError> {
        let step = window::step(window.duration());
        let cancel = self.shutdown.child_token();
        let timeout = self.config.fetch_timeout;

        let mut inflight = JoinSet::new();
        for q in self.catalog.iter() {
            let range = RangeQuery::new(build_query(&q.template, filter), window, step);
            let backend = Arc::clone(&self.backend);
            let cancel = cancel.clone();
            let kind = q.kind;

            inflight.spawn(async move {
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(FetchError::Cancelled),
                    res = tokio::time::timeout(timeout, backend.query_range(&range)) => {
                        res.unwrap_or(Err(FetchError::Timeout(timeout)))
                    }
                };
                (kind, outcome)
            });
        }

        let mut slots = HashMap::with_capacity(self.catalog.len());
        while let Some(joined) = inflight.join_next().await {
            let (kind, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    cancel.cancel();
                    inflight.abort_all();
                    error!(error = %e, "metrics fetch task did not complete");
                    return Err(CoreError::Internal(format!("fetch task failed: {e}")));
                }
            };

            match outcome {
                Ok(payload) => {
                    slots.insert(kind, payload);
                }
                Err(source) => {
                    cancel.cancel();
                    inflight.abort_all();
                    self.sink.record_fetch_failure(kind);
                    warn!(metric = %kind, error = %source, "metrics fetch failed");
                    error!(metric = %kind, "aborting aggregate after first failure");
                    return Err(CoreError::BackendFetch {
                        metric: kind,
                        source,
                    });
                }
            }
        }

        AggregatedMetrics::from_slots(slots)
    }
}
