use std::time::Duration;

use thiserror::Error;

use crate::{catalog::MetricKind, store::StoreError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid query parameter: {0}")]
    InvalidParameter(#[from] qdash_model::ModelError),

    #[error("failed to fetch \"{metric}\": {source}")]
    BackendFetch {
        metric: MetricKind,
        #[source]
        source: FetchError,
    },

    #[error("metric {0} is listed more than once in the catalog")]
    DuplicateMetric(MetricKind),

    #[error("metric {0} is missing from the catalog")]
    MissingMetric(MetricKind),

    #[error("invalid metrics backend address: {0}")]
    InvalidAddress(String),

    #[error("task store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure of a single range query against the metrics backend.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend answered with status {status}")]
    Status { status: u16 },

    #[error("backend returned a non-JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("could not build request: {0}")]
    InvalidRequest(String),

    #[error("no answer within {0:?}")]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,
}
