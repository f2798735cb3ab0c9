//! Handlers for `/tasks`.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::models::{
    parse_task_id, CreateTaskInput, ListParams, Task, TaskQuery, UpdateTaskInput,
};

/// Body returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// List live tasks. Query parameters are read as raw pairs so repeated or
/// unexpected keys never reject the request.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let query = TaskQuery::from_params(&ListParams::from_pairs(pairs));
    let tasks = state.db.list_tasks(&query).map_err(|err| {
        tracing::error!("Error fetching tasks: {}", err);
        ApiError::internal(format!("Failed to fetch tasks: {}", err))
    })?;

    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id).map_err(|e| ApiError::task("fetch", e))?;
    let task = state.db.get_task(id).map_err(|e| ApiError::task("fetch", e))?;

    Ok(Json(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(input) = payload?;
    let task = state
        .db
        .create_task(input)
        .map_err(|e| ApiError::task("create", e))?;

    tracing::info!(task_id = task.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// Partial update: fields missing from the body keep their values.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskInput>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id).map_err(|e| ApiError::task("update", e))?;
    let Json(input) = payload?;
    let task = state
        .db
        .update_task(id, input)
        .map_err(|e| ApiError::task("update", e))?;

    tracing::info!(task_id = id, "Task updated");
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_task_id(&id).map_err(|e| ApiError::task("delete", e))?;
    state
        .db
        .delete_task(id)
        .map_err(|e| ApiError::task("delete", e))?;

    tracing::info!(task_id = id, "Task deleted");
    Ok(Json(DeleteResponse {
        success: true,
        message: "Task deleted successfully".to_string(),
    }))
}
