/// User directory endpoint
///
/// `GET /api/v1/users` lists every account (admins only), so a client can
/// offer the assignee choices for a task.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use taskdesk_shared::{auth::middleware::AuthContext, models::user::PublicUser};

/// List users
///
/// # Errors
///
/// - `403 Forbidden`: The caller is not an admin
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<PublicUser>>> {
    let users = state.tasks.list_users(&auth).await?;

    Ok(Json(users))
}
