//! Task lifecycle handlers: creation, listing, claiming, progress, and
//! completion.

use crate::coordination::ClaimOutcome;
use crate::models::task::{CreateTaskRequest, Task, TaskFilter, TaskPage};
use crate::state_machine::TaskStatus;
use crate::store::CompletionOutcome;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CreateTaskBody {
    #[serde(rename = "type")]
    pub task_type: String,
    pub params: Value,
    pub priority: Option<i32>,
}

/// Task payload plus the dedup marker the create endpoint returns.
#[derive(Debug, Serialize)]
pub struct TaskCreationResponse {
    #[serde(flatten)]
    pub task: Task,
    pub deduplicated: bool,
}

/// Create a task: POST /v1/tasks
///
/// Returns 201 for a fresh task, 200 when an equivalent in-flight task
/// absorbed the request.
pub async fn create_task(
    State(state): State<AppState>,
    Json(body): Json<CreateTaskBody>,
) -> ApiResult<(StatusCode, Json<TaskCreationResponse>)> {
    info!(type_name = %body.task_type, "creating task");
    let request = CreateTaskRequest {
        type_name: body.task_type,
        params: body.params,
        priority: body.priority,
        max_attempts: None,
    };
    let outcome = state.store.create_task(request).await?;
    let status = if outcome.deduplicated {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(TaskCreationResponse {
            task: outcome.task,
            deduplicated: outcome.deduplicated,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// List tasks: GET /v1/tasks?status=&type=&limit=&offset=
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<TaskPage>> {
    let status = query
        .status
        .as_deref()
        .map(|status| status.parse::<TaskStatus>())
        .transpose()
        .map_err(ApiError::bad_request)?;
    let filter = TaskFilter {
        status,
        type_name: query.task_type,
        limit: Some(
            query
                .limit
                .unwrap_or(crate::store::DEFAULT_PAGE_SIZE)
                .min(state.config.max_page_size),
        ),
        offset: query.offset,
    };
    Ok(Json(state.store.list_tasks(filter).await?))
}

/// Get a task by id: GET /v1/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.store.get_task(task_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ClaimTaskBody {
    pub task_type_id: i64,
    pub worker_id: String,
}

/// Claim a pending task: POST /v1/tasks/claim
pub async fn claim_task(
    State(state): State<AppState>,
    Json(body): Json<ClaimTaskBody>,
) -> ApiResult<Response> {
    let task_type = state.registry.get_by_id(body.task_type_id)?;
    let outcome = state
        .claim_coordinator
        .claim(&task_type.name, &body.worker_id, None)
        .await?;
    match outcome {
        ClaimOutcome::Claimed(task) => Ok(Json(task).into_response()),
        ClaimOutcome::NoneAvailable => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no tasks available" })),
        )
            .into_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProgressBody {
    pub worker_id: String,
    pub progress: i32,
}

/// Report progress on a claimed task: POST /v1/tasks/{id}/progress
pub async fn update_progress(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(body): Json<UpdateProgressBody>,
) -> ApiResult<Json<Task>> {
    let task = state
        .progress_tracker
        .update_progress(task_id, &body.worker_id, body.progress)
        .await?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct CompleteTaskBody {
    pub worker_id: String,
    pub success: bool,
    pub result: Option<Value>,
    pub error_message: Option<String>,
}

/// Report completion of a claimed task: POST /v1/tasks/{id}/complete
pub async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(body): Json<CompleteTaskBody>,
) -> ApiResult<Json<Task>> {
    let outcome = if body.success {
        CompletionOutcome::Success {
            result: body.result,
        }
    } else {
        CompletionOutcome::Failure {
            error_message: body
                .error_message
                .unwrap_or_else(|| "task failed".to_string()),
        }
    };
    let task = state
        .store
        .complete_task(task_id, &body.worker_id, outcome)
        .await?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct DeadLetterQuery {
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// List dead-lettered tasks: GET /v1/dead-letters
pub async fn list_dead_letters(
    State(state): State<AppState>,
    Query(query): Query<DeadLetterQuery>,
) -> ApiResult<Json<TaskPage>> {
    let limit = query
        .limit
        .unwrap_or(crate::store::DEFAULT_PAGE_SIZE)
        .min(state.config.max_page_size);
    Ok(Json(
        state
            .dead_letters
            .list(query.task_type, Some(limit), query.offset)
            .await?,
    ))
}
