// --------------------------------------------------
// Handles API endpoints related to task CRUD operations.
//
// Responsibilities:
// - List / create / edit / delete tasks
// - Toggle whether a task's checklist is tracked
// - Replace a task's checklist (targets) or its checked state (progress)
// -------------------------------------------------

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::TaskView;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub tasks: Vec<TaskView>,
}

// -----------------------------
// GET /api/tasks
// Returns all tasks, newest first, with completion fields
// -----------------------------
pub async fn get_tasks(State(state): State<AppState>) -> AppResult<Json<TasksResponse>> {
    let tasks = state.store.list_tasks()?;
    Ok(Json(TasksResponse { tasks }))
}

// -----------------------------
// GET /api/tasks/:id
// -----------------------------
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TaskView>> {
    Ok(Json(state.store.get_task(id)?))
}

#[derive(Debug, Deserialize)]
pub struct TaskInfoInput {
    pub content: String,
    #[serde(default)]
    pub remark: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

// -----------------------------
// POST /api/tasks
// Creates a task seeded with the current account template
// -----------------------------
pub async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<TaskInfoInput>,
) -> AppResult<Json<CreatedResponse>> {
    let id = state.store.create_task(&input.content, &input.remark)?;
    Ok(Json(CreatedResponse { id }))
}

// -----------------------------
// PUT /api/tasks/:id
// Replaces content and remark
// -----------------------------
pub async fn edit_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<TaskInfoInput>,
) -> AppResult<Json<TaskView>> {
    let updated = state
        .store
        .edit_task_info(id, &input.content, &input.remark)?;
    Ok(Json(updated))
}

// -----------------------------
// DELETE /api/tasks/:id
// Removes a task permanently; unknown ids are fine
// -----------------------------
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let removed = state.store.delete_task(id)?;
    Ok(Json(serde_json::json!({ "ok": true, "removed": removed })))
}

// -----------------------------
// POST /api/tasks/:id/toggle
// Flips stats_enabled
// -----------------------------
pub async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TaskView>> {
    state.store.toggle_stats(id)?;
    Ok(Json(state.store.get_task(id)?))
}

#[derive(Debug, Deserialize)]
pub struct TargetsInput {
    pub text: String, // comma separated, ASCII or full-width commas
}

// -----------------------------
// PUT /api/tasks/:id/targets
// Replaces the checklist wholesale
// -----------------------------
pub async fn replace_targets(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<TargetsInput>,
) -> AppResult<Json<TaskView>> {
    Ok(Json(state.store.replace_target_accounts(id, &input.text)?))
}

#[derive(Debug, Deserialize)]
pub struct ProgressInput {
    #[serde(default)]
    pub checked: Vec<String>,
}

// -----------------------------
// PUT /api/tasks/:id/progress
// Replaces the checked accounts with exactly the submitted set
// -----------------------------
pub async fn replace_progress(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ProgressInput>,
) -> AppResult<Json<TaskView>> {
    Ok(Json(state.store.replace_done_accounts(id, input.checked)?))
}
