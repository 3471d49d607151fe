use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use qdash_prometheus::{Encoder, PrometheusMetrics, TextEncoder};
use tracing::error;

/// `GET /metrics` in the Prometheus text format.
pub fn router(metrics: PrometheusMetrics) -> Router {
    Router::new()
        .route("/metrics", get(render))
        .with_state(metrics)
}

async fn render(State(metrics): State<PrometheusMetrics>) -> Response {
    match metrics.encode_text() {
        Ok(body) => {
            let content_type = TextEncoder::new().format_type().to_string();
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
