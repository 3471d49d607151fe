use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::value::RawValue;
use tracing::trace;

use crate::{
    backend::MetricsBackend,
    error::{CoreError, FetchError},
    query::{RangeQuery, build_request_url},
};

/// [`MetricsBackend`] over the Prometheus HTTP range-query API.
#[derive(Debug, Clone)]
pub struct PrometheusBackend {
    client: Client,
    base: String,
}

impl PrometheusBackend {
    /// `base` is the server address, e.g. `http://localhost:9090`.
    ///
    /// `timeout` bounds each request, body included.
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        let base = base.into();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CoreError::InvalidAddress(base));
        }
        // Fail at startup rather than on the first request.
        build_request_url(
            &base,
            &RangeQuery {
                query: String::new(),
                start: 0,
                end: 0,
                step_secs: 0,
            },
        )?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Internal(format!("http client: {e}")))?;

        Ok(Self { client, base })
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

#[async_trait]
impl MetricsBackend for PrometheusBackend {
    async fn query_range(&self, query: &RangeQuery) -> Result<Box<RawValue>, FetchError> {
        let url = build_request_url(&self.base, query)
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
        trace!(%url, "sending range query");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let payload: Box<RawValue> = serde_json::from_slice(&body)?;
        Ok(payload)
    }
}
