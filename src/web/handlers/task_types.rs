//! Task type registration and lookup handlers.

use crate::models::task_type::{TaskType, TaskTypeRegistration};
use crate::web::errors::ApiResult;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

/// Register or update a task type: POST /v1/task-types
pub async fn register_task_type(
    State(state): State<AppState>,
    Json(registration): Json<TaskTypeRegistration>,
) -> ApiResult<(StatusCode, Json<TaskType>)> {
    info!(
        name = %registration.name,
        version = %registration.version,
        "registering task type"
    );
    let task_type = state.registry.register(registration)?;
    Ok((StatusCode::CREATED, Json(task_type)))
}

/// Get a task type by name: GET /v1/task-types/{name}
///
/// Explicit lookup: deactivated types are returned with `active=false`.
pub async fn get_task_type(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<TaskType>> {
    Ok(Json(state.registry.lookup(&name)?))
}

#[derive(Debug, Deserialize)]
pub struct TaskTypeListQuery {
    pub active: Option<bool>,
}

/// List task types: GET /v1/task-types?active=true
pub async fn list_task_types(
    State(state): State<AppState>,
    Query(query): Query<TaskTypeListQuery>,
) -> Json<Vec<TaskType>> {
    Json(state.registry.list(query.active.unwrap_or(false)))
}

/// Deactivate a task type: DELETE /v1/task-types/{name}
///
/// Types are never hard-deleted; in-flight tasks keep draining while new
/// creations are rejected.
pub async fn deactivate_task_type(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<TaskType>> {
    Ok(Json(state.registry.deactivate(&name)?))
}
