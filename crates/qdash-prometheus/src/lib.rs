//! Prometheus exporter for the dashboard's own operational counters.
//!
//! This crate provides a [`PrometheusMetrics`] implementation of [`qdash_core::MetricsSink`]
//! backed by a private `prometheus::Registry`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use qdash_core::{BatchExecutor, MemoryTaskStore};
//! use qdash_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let executor = BatchExecutor::new(Arc::new(MemoryTaskStore::new()))
//!     .with_sink(Arc::new(metrics.clone()));
//!
//! let text = metrics.encode_text()?;
//! # let _ = (executor, text);
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `qdash_batch_items_total{operation, outcome}` - Counter
//! - `qdash_metrics_fetch_failures_total{metric}` - Counter
//! - `qdash_metrics_aggregate_duration_seconds{outcome}` - Histogram

mod sink;
pub use sink::PrometheusMetrics;

pub use prometheus::{Encoder, TextEncoder};
