use async_trait::async_trait;
use serde_json::value::RawValue;

use crate::{error::FetchError, query::RangeQuery};

mod prometheus;
pub use prometheus::PrometheusBackend;

/// Time-series store answering range queries.
///
/// The answer is returned verbatim; the dashboard never interprets it.
#[async_trait]
pub trait MetricsBackend: Send + Sync + 'static {
    async fn query_range(&self, query: &RangeQuery) -> Result<Box<RawValue>, FetchError>;
}
