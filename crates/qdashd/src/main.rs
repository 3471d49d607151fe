//! qdashd - task queue dashboard backend
//!
//! The task store is a [`MemoryTaskStore`] that starts empty. It is a
//! placeholder until a broker-backed `TaskStore` exists.
//!
//! Run with: cargo run -p qdashd -- --help

mod config;
mod exporter;

use std::sync::Arc;

use clap::Parser;
use qdash_api::{CoreApiAdapter, HttpApi};
use qdash_core::{
    BatchExecutor, MemoryTaskStore, MetricCatalog, MetricsAggregator, MetricsSink, NoopMetrics,
    PrometheusBackend,
};
use qdash_observe::logger_init;
use qdash_prometheus::PrometheusMetrics;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{Args, DashboardConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Configuration
    let config = DashboardConfig::try_from(Args::parse())?;
    config.validate()?;

    // 2) Logger
    logger_init(&config.logger)?;
    info!(format = %config.logger.format, "logger initialized");

    // 3) Self-metrics
    let exporter = if config.enable_metrics_exporter {
        Some(PrometheusMetrics::new()?)
    } else {
        None
    };
    let sink: Arc<dyn MetricsSink> = match &exporter {
        Some(metrics) => Arc::new(metrics.clone()),
        None => Arc::new(NoopMetrics),
    };

    // 4) Task store + batch executor
    let store = Arc::new(MemoryTaskStore::new());
    warn!("task store is in-memory and starts empty, tasks are lost on exit");
    let executor = Arc::new(BatchExecutor::new(store).with_sink(Arc::clone(&sink)));
    let mut adapter = CoreApiAdapter::new(executor);

    // 5) Metrics aggregator
    let shutdown = CancellationToken::new();
    match &config.prometheus_addr {
        Some(addr) => {
            let backend = PrometheusBackend::new(addr.as_str(), config.fetch_timeout)?;
            let aggregator = MetricsAggregator::new(Arc::new(backend), MetricCatalog::standard()?)
                .with_config(config.aggregator())
                .with_sink(sink)
                .with_shutdown(shutdown.clone());
            adapter = adapter.with_aggregator(Arc::new(aggregator));
            info!(%addr, timeout = ?config.fetch_timeout, "metrics backend configured");
        }
        None => warn!("no metrics backend configured, /api/metrics will answer 503"),
    }

    // 6) Router
    let mut router = HttpApi::new(Arc::new(adapter))
        .with_config(config.http())
        .router();
    if let Some(metrics) = exporter {
        router = router.merge(exporter::router(metrics));
        info!("self-metrics exposed on /metrics");
    }
    let router = router.layer(TraceLayer::new_for_http());

    // 7) Serve until Ctrl+C
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, read_only = config.read_only, "dashboard listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("dashboard stopped");
    Ok(())
}

/// Resolves on Ctrl+C and cancels in-flight metrics fetches.
async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down...");
    token.cancel();
}
