use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use qdash_core::{CoreError, StoreError};
use qdash_model::ModelError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidParameter(#[from] ModelError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request body too large (limit {limit} bytes)")]
    RequestTooLarge { limit: usize },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("the dashboard is in read-only mode")]
    ReadOnly,

    #[error("metrics backend is not configured")]
    MetricsUnavailable,

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidParameter(_)
            | ApiError::InvalidRequest(_)
            | ApiError::RequestTooLarge { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ReadOnly => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MetricsUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Core(e) => match e {
                CoreError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
                CoreError::Store(StoreError::QueueNotFound(_))
                | CoreError::Store(StoreError::TaskNotFound { .. }) => StatusCode::NOT_FOUND,
                CoreError::Store(StoreError::InvalidState { .. })
                | CoreError::Store(StoreError::QueueNotEmpty(_)) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use qdash_core::{FetchError, MetricKind};
    use qdash_model::TaskState;

    use super::*;

    #[test]
    fn invalid_parameter_names_the_parameter() {
        let err = ApiError::from(ModelError::InvalidParameter {
            param: "duration",
            value: "abc".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("duration"));
    }

    #[test]
    fn backend_fetch_is_a_server_error_naming_the_query() {
        let err = ApiError::from(CoreError::BackendFetch {
            metric: MetricKind::ErrorRate,
            source: FetchError::Status { status: 502 },
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("error_rate"));
    }

    #[test]
    fn store_errors_map_by_kind() {
        let not_found = ApiError::from(CoreError::Store(StoreError::TaskNotFound {
            queue: "default".into(),
            id: "x".into(),
        }));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let wrong_state = ApiError::from(CoreError::Store(StoreError::InvalidState {
            id: "x".into(),
            state: TaskState::Active,
            op: qdash_model::TaskOperation::Delete,
        }));
        assert_eq!(wrong_state.status(), StatusCode::BAD_REQUEST);

        let busy = ApiError::from(CoreError::Store(StoreError::QueueNotEmpty("default".into())));
        assert_eq!(busy.status(), StatusCode::BAD_REQUEST);

        let down = ApiError::from(CoreError::Store(StoreError::Unavailable("redis".into())));
        assert_eq!(down.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn operational_states() {
        assert_eq!(ApiError::ReadOnly.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ApiError::MetricsUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::RequestTooLarge { limit: 10 }.status(),
            StatusCode::BAD_REQUEST
        );
    }
}
