use std::{error::Error as _, sync::Arc};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use http_body_util::LengthLimitError;
use qdash_core::resolve_window;
use qdash_model::{
    DefaultFormatter, PageOptions, PayloadFormatter, QueueFilter, QueueStats, TaskBatchRequest,
    TaskBatchResult, TaskInfo, TaskOperation, TaskState,
};
use serde::{Deserialize, Serialize, ser::SerializeMap};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    error::ApiError,
    handler::ApiHandler,
    route::{
        QueueAction, Scope, not_found, parse_collection, parse_queue_action, parse_task_action,
        parse_task_id,
    },
};

/// Default cap for batch request bodies.
pub const MAX_REQUEST_BODY_BYTES: usize = 1_000_000;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Only GET requests are served; everything else gets 405.
    pub read_only: bool,
    pub max_request_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            max_request_body_bytes: MAX_REQUEST_BODY_BYTES,
        }
    }
}

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
    formatter: Arc<dyn PayloadFormatter>,
    config: HttpConfig,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    /// Create new HTTP API with the given handler.
    pub fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            formatter: Arc::new(DefaultFormatter),
            config: HttpConfig::default(),
        }
    }

    /// Replace the formatter used to render task payloads.
    pub fn with_formatter(mut self, formatter: Arc<dyn PayloadFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_config(mut self, config: HttpConfig) -> Self {
        self.config = config;
        self
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - GET /api/metrics - Aggregated time-series metrics
    /// - GET /api/queues - Queue statistics
    /// - GET /api/queues/{qname} - One queue's statistics
    /// - DELETE /api/queues/{qname} - Delete an empty queue
    /// - POST /api/queues/{qname}:{pause|resume} - Pause or resume a queue
    /// - GET /api/queues/{qname}/tasks/{id} - One task, in any state
    /// - GET /api/queues/{qname}/{state}_tasks - List tasks in a state
    /// - POST /api/queues/{qname}/{state}_tasks:batch_{op} - Apply op to listed IDs
    /// - POST /api/queues/{qname}/{state}_tasks:{op}_all - Apply op to every task in the state
    /// - DELETE /api/queues/{qname}/{state}_tasks:delete_all - Delete every task in the state
    /// - POST /api/queues/{qname}/{state}_tasks/{id}:{op} - Run, archive or cancel one task
    /// - DELETE /api/queues/{qname}/{state}_tasks/{id} - Delete one task
    pub fn router(self) -> Router {
        let state = ApiState {
            handler: self.handler,
            formatter: self.formatter,
            max_body: self.config.max_request_body_bytes,
        };

        let router = Router::new()
            .route("/api/metrics", get(get_metrics::<H>))
            .route("/api/queues", get(list_queues::<H>))
            .route(
                "/api/queues/{qname}",
                get(get_queue::<H>)
                    .post(queue_action::<H>)
                    .delete(delete_queue::<H>),
            )
            .route(
                "/api/queues/{qname}/{collection}",
                get(list_tasks::<H>)
                    .post(collection_action::<H>)
                    .delete(delete_collection::<H>),
            )
            .route(
                "/api/queues/{qname}/{collection}/{item}",
                get(get_task::<H>)
                    .post(task_action::<H>)
                    .delete(delete_task::<H>),
            )
            .with_state(state);

        if self.config.read_only {
            router.layer(middleware::from_fn(reject_writes))
        } else {
            router
        }
    }
}

struct ApiState<H> {
    handler: Arc<H>,
    formatter: Arc<dyn PayloadFormatter>,
    max_body: usize,
}

impl<H> Clone for ApiState<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            formatter: Arc::clone(&self.formatter),
            max_body: self.max_body,
        }
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct MetricsParams {
    /// Window length in seconds (default 3600).
    duration: Option<String>,
    /// Window end as Unix seconds (default now).
    #[serde(alias = "end_time")]
    endtime: Option<String>,
    /// Comma-separated queue names (default all queues).
    queues: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    page: Option<usize>,
    size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ListQueuesResponse {
    queues: Vec<QueueStats>,
}

#[derive(Debug, Serialize)]
struct GetQueueResponse {
    current: QueueStats,
}

#[derive(Debug, Serialize)]
struct TaskView {
    id: String,
    queue: String,
    #[serde(rename = "type")]
    kind: String,
    payload: String,
    state: TaskState,
    max_retry: u32,
    retried: u32,
    error_message: String,
}

impl TaskView {
    fn new(info: TaskInfo, formatter: &dyn PayloadFormatter) -> Self {
        let payload = formatter.format(&info.kind, &info.payload);
        Self {
            id: info.id.to_string(),
            queue: info.queue,
            kind: info.kind,
            payload,
            state: info.state,
            max_retry: info.max_retry,
            retried: info.retried,
            error_message: info.last_error.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ListTasksResponse {
    tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
struct DeleteAllResponse {
    deleted: usize,
}

/// Batch outcome with the field names of the operation, e.g.
/// `{"deleted_ids": [...], "failed_ids": [...]}`. Both lists are always present.
struct BatchResponse {
    op: TaskOperation,
    result: TaskBatchResult,
}

fn batch_field_names(op: TaskOperation) -> (&'static str, &'static str) {
    match op {
        TaskOperation::Delete => ("deleted_ids", "failed_ids"),
        TaskOperation::Run => ("pending_ids", "error_ids"),
        TaskOperation::Archive => ("archived_ids", "error_ids"),
        TaskOperation::CancelProcessing => ("canceled_ids", "error_ids"),
    }
}

impl Serialize for BatchResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let (succeeded, failed) = batch_field_names(self.op);
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(succeeded, &self.result.succeeded)?;
        map.serialize_entry(failed, &self.result.failed)?;
        map.end()
    }
}

async fn read_batch_request(body: Body, limit: usize) -> Result<TaskBatchRequest, ApiError> {
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| body_error(e, limit))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::InvalidRequest(format!("malformed request body: {e}")))
}

fn body_error(err: axum::Error, limit: usize) -> ApiError {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return ApiError::RequestTooLarge { limit };
        }
        source = cause.source();
    }
    ApiError::InvalidRequest(format!("could not read request body: {err}"))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/metrics
async fn get_metrics<H>(
    State(state): State<ApiState<H>>,
    Query(params): Query<MetricsParams>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let window = resolve_window(
        params.duration.as_deref(),
        params.endtime.as_deref(),
        OffsetDateTime::now_utc(),
    )?;
    let filter = match params.queues.as_deref() {
        Some(raw) => QueueFilter::parse(raw)?,
        None => QueueFilter::all(),
    };

    debug!(
        start = window.start_unix(),
        end = window.end_unix(),
        queues = ?filter.names(),
        "aggregating metrics"
    );
    let metrics = state.handler.metrics(window, filter).await?;
    Ok(Json(metrics))
}

/// GET /api/queues
async fn list_queues<H>(State(state): State<ApiState<H>>) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let queues = state.handler.list_queues().await?;
    debug!(count = queues.len(), "queues listed");
    Ok(Json(ListQueuesResponse { queues }))
}

/// GET /api/queues/{qname}
async fn get_queue<H>(
    State(state): State<ApiState<H>>,
    Path(qname): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let current = state.handler.get_queue(&qname).await?;
    Ok(Json(GetQueueResponse { current }))
}

/// DELETE /api/queues/{qname}
async fn delete_queue<H>(
    State(state): State<ApiState<H>>,
    Path(qname): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    state.handler.delete_queue(&qname).await?;
    info!(queue = %qname, "queue deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/queues/{qname}:{pause|resume}
async fn queue_action<H>(
    State(state): State<ApiState<H>>,
    Path(segment): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let (queue, action) = parse_queue_action(&segment)?;
    match action {
        QueueAction::Pause => state.handler.pause_queue(queue).await?,
        QueueAction::Resume => state.handler.resume_queue(queue).await?,
    }
    info!(%queue, ?action, "queue state changed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/queues/{qname}/tasks/{id}
async fn get_task<H>(
    State(state): State<ApiState<H>>,
    Path((qname, collection, item)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    if collection != "tasks" {
        return Err(not_found(&collection));
    }
    let id = parse_task_id(&item)?;
    let info = state.handler.get_task(&qname, &id).await?;
    Ok(Json(TaskView::new(info, state.formatter.as_ref())))
}

/// GET /api/queues/{qname}/{state}_tasks
///
/// Query params: `?page=1&size=20`.
async fn list_tasks<H>(
    State(state): State<ApiState<H>>,
    Path((qname, collection)): Path<(String, String)>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let target = parse_collection(&collection)?;
    if target.action.is_some() {
        return Err(not_found(&collection));
    }

    let defaults = PageOptions::default();
    let page = PageOptions::new(
        params.page.unwrap_or(defaults.page),
        params.size.unwrap_or(defaults.size),
    );

    let tasks = state
        .handler
        .list_tasks(&qname, target.state, page)
        .await?
        .into_iter()
        .map(|info| TaskView::new(info, state.formatter.as_ref()))
        .collect::<Vec<_>>();
    debug!(queue = %qname, state = %target.state, count = tasks.len(), "tasks listed");

    Ok(Json(ListTasksResponse { tasks }))
}

/// POST /api/queues/{qname}/{state}_tasks:{verb}
async fn collection_action<H>(
    State(state): State<ApiState<H>>,
    Path((qname, collection)): Path<(String, String)>,
    body: Body,
) -> Result<Response, ApiError>
where
    H: ApiHandler,
{
    let target = parse_collection(&collection)?;

    match target.action {
        Some((op, Scope::Batch)) => {
            let req = read_batch_request(body, state.max_body).await?;
            let result = state.handler.apply_batch(&qname, &req.task_ids, op).await?;
            debug!(
                queue = %qname,
                %op,
                succeeded = result.succeeded.len(),
                failed = result.failed.len(),
                "batch applied"
            );
            Ok(Json(BatchResponse { op, result }).into_response())
        }
        Some((op, Scope::All)) if op != TaskOperation::Delete => {
            let affected = state.handler.apply_all(&qname, target.state, op).await?;
            info!(queue = %qname, state = %target.state, %op, affected, "applied to all tasks");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        _ => Err(not_found(&collection)),
    }
}

/// DELETE /api/queues/{qname}/{state}_tasks:delete_all
async fn delete_collection<H>(
    State(state): State<ApiState<H>>,
    Path((qname, collection)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let target = parse_collection(&collection)?;
    if target.action != Some((TaskOperation::Delete, Scope::All)) {
        return Err(not_found(&collection));
    }

    let deleted = state
        .handler
        .apply_all(&qname, target.state, TaskOperation::Delete)
        .await?;
    info!(queue = %qname, state = %target.state, deleted, "deleted all tasks");
    Ok(Json(DeleteAllResponse { deleted }))
}

/// POST /api/queues/{qname}/{state}_tasks/{id}:{run|archive|cancel}
async fn task_action<H>(
    State(state): State<ApiState<H>>,
    Path((qname, collection, item)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let target = parse_collection(&collection)?;
    if target.action.is_some() {
        return Err(not_found(&collection));
    }

    let (id, op) = parse_task_action(target.state, &item)?;
    state.handler.apply(&qname, &id, op).await?;
    debug!(queue = %qname, task_id = %id, %op, "task operation applied");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/queues/{qname}/{state}_tasks/{id}
async fn delete_task<H>(
    State(state): State<ApiState<H>>,
    Path((qname, collection, item)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let target = parse_collection(&collection)?;
    if target.action.is_some() || !TaskOperation::Delete.allowed_in(target.state) {
        return Err(not_found(&collection));
    }

    let id = parse_task_id(&item)?;
    state.handler.apply(&qname, &id, TaskOperation::Delete).await?;
    debug!(queue = %qname, task_id = %id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn reject_writes(req: Request, next: Next) -> Response {
    if req.method() != Method::GET {
        warn!(method = %req.method(), path = %req.uri().path(), "write rejected in read-only mode");
        return ApiError::ReadOnly.into_response();
    }
    next.run(req).await
}
