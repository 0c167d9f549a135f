/// Bearer-token authentication middleware for Axum
///
/// The middleware reads `Authorization: Bearer <token>`, verifies the token
/// with the shared [`TokenIssuer`] and inserts an [`AuthContext`] into the
/// request extensions. Requests without a valid token are rejected with
/// `401` before any handler runs.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Router};
/// use chrono::Duration;
/// use taskdesk_shared::auth::jwt::TokenIssuer;
/// use taskdesk_shared::auth::middleware::{jwt_auth_middleware, AuthContext};
///
/// async fn whoami(auth: AuthContext) -> String {
///     format!("user {} ({})", auth.user_id, auth.role)
/// }
///
/// let issuer = Arc::new(TokenIssuer::new("a-secret-that-is-at-least-32-bytes!", Duration::hours(1)));
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn_with_state(issuer, jwt_auth_middleware));
/// ```

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::jwt::{Claims, JwtError, TokenIssuer};
use crate::models::user::Role;

/// The authenticated actor of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn from_claims(claims: &Claims) -> Self {
        Self::new(claims.sub, claims.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Error type for authentication middleware
///
/// Every variant answers `401 Unauthorized`.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Header present but not a bearer token
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            _ => AuthError::InvalidToken("Invalid token".to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "unauthorized",
            "message": self.to_string(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Resolves the actor from request headers
pub fn authenticate_headers(issuer: &TokenIssuer, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = issuer.verify(token).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        AuthError::from(e)
    })?;

    Ok(AuthContext::from_claims(&claims))
}

/// JWT authentication middleware
///
/// Use with `axum::middleware::from_fn_with_state`, passing the shared
/// token issuer as state.
pub async fn jwt_auth_middleware(
    State(issuer): State<Arc<TokenIssuer>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_context = authenticate_headers(&issuer, req.headers())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Handlers behind [`jwt_auth_middleware`] take `AuthContext` directly
#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}
