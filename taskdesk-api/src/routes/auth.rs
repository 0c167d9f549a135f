/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - Register new user
/// - `POST /api/v1/auth/login` - Login and get a session token

use crate::{
    app::AppState,
    error::ApiResult,
    extractors::ValidatedJson,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskdesk_shared::{models::user::PublicUser, services::auth::Registration};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,

    /// The signed-in user
    pub user: PublicUser,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ana",
///   "email": "ana@example.com",
///   "password": "pw12345",
///   "role": "user"
/// }
/// ```
///
/// `role` is optional and only honored while self-assigned roles are
/// enabled.
///
/// # Response
///
/// `201 Created` with the public user record.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<Registration>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    let user = state.auth.register(req).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "ana@example.com",
///   "password": "pw12345"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "eyJ...",
///   "user": { "id": 1, "name": "Ana", "email": "ana@example.com", "role": "user" }
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: `"Invalid credentials"` for an unknown email or a
///   wrong password
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (token, user) = state.auth.sign_in(&req.email, &req.password).await?;

    Ok(Json(LoginResponse { token, user }))
}
