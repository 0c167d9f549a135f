/// Task endpoints
///
/// All routes require a bearer token. Responses embed the owner's public
/// record as `user`.
///
/// # Endpoints
///
/// - `POST   /api/v1/tasks` - Create a task
/// - `GET    /api/v1/tasks` - List visible tasks
/// - `GET    /api/v1/tasks/:id` - Get one task
/// - `PUT    /api/v1/tasks/:id` - Partially update a task
/// - `DELETE /api/v1/tasks/:id` - Delete a task (admin)

use crate::{
    app::AppState,
    error::ApiResult,
    extractors::{IdPath, ValidatedJson},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    auth::middleware::AuthContext,
    models::task::{CreateTask, TaskWithOwner, UpdateTask},
};

/// Delete response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Create a task
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/tasks
/// Authorization: Bearer <token>
///
/// {
///   "title": "Write report",
///   "description": "Quarterly numbers",
///   "status": "todo",
///   "priority": "High",
///   "userId": 3
/// }
/// ```
///
/// Only `title` is required. `userId` is only honored for admins.
///
/// # Errors
///
/// - `400 Bad Request`: Empty title or unknown owner
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateTask>,
) -> ApiResult<(StatusCode, Json<TaskWithOwner>)> {
    let task = state.tasks.create(&auth, req).await?;
    let task = state.tasks.with_owner(task).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List tasks
///
/// Admins see every task, everyone else their own, ordered by id.
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<TaskWithOwner>>> {
    let tasks = state.tasks.list_for_actor(&auth).await?;
    let tasks = state.tasks.with_owners(tasks).await?;

    Ok(Json(tasks))
}

/// Get one task
///
/// # Errors
///
/// - `404 Not Found`: No such task
/// - `403 Forbidden`: The caller neither owns the task nor is an admin
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    IdPath(id): IdPath,
) -> ApiResult<Json<TaskWithOwner>> {
    let task = state.tasks.get_one(id, &auth).await?;
    let task = state.tasks.with_owner(task).await?;

    Ok(Json(task))
}

/// Partially update a task
///
/// Absent fields and empty strings keep their stored value. `userId` is
/// only honored for admins.
///
/// # Errors
///
/// - `404 Not Found`: No such task
/// - `403 Forbidden`: The caller neither owns the task nor is an admin
/// - `400 Bad Request`: Reassignment to an unknown user
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    IdPath(id): IdPath,
    ValidatedJson(req): ValidatedJson<UpdateTask>,
) -> ApiResult<Json<TaskWithOwner>> {
    let task = state.tasks.update(id, &auth, req).await?;
    let task = state.tasks.with_owner(task).await?;

    Ok(Json(task))
}

/// Delete a task
///
/// # Response
///
/// ```json
/// { "message": "Deleted" }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: The caller is not an admin
/// - `404 Not Found`: No such task
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    IdPath(id): IdPath,
) -> ApiResult<Json<DeleteResponse>> {
    let message = state.tasks.remove(id, &auth).await?;

    Ok(Json(DeleteResponse {
        message: message.to_string(),
    }))
}
