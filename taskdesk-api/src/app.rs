/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdesk_api::{app::AppState, config::Config};
/// use taskdesk_shared::db::memory::MemoryStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(config, Arc::new(MemoryStore::new()))?;
/// let app = taskdesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use taskdesk_shared::{
    auth::{jwt::TokenIssuer, middleware::jwt_auth_middleware, password::PasswordHasher},
    db::store::{Store, UserStore},
    services::{auth::AuthService, tasks::TaskService},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Storage provider behind both services
    pub store: Arc<dyn Store>,

    /// Session token signer/verifier
    pub tokens: Arc<TokenIssuer>,

    pub auth: Arc<AuthService>,

    pub tasks: Arc<TaskService>,
}

impl AppState {
    /// Wires the services over `store`
    ///
    /// # Errors
    ///
    /// Returns an error if the password hashing parameters are unusable.
    pub fn new<S>(config: Config, store: Arc<S>) -> anyhow::Result<Self>
    where
        S: Store + 'static,
    {
        let tokens = Arc::new(TokenIssuer::new(&config.jwt.secret, config.jwt.expires_in()));
        let hasher = PasswordHasher::new(config.auth.password_hashing)?;

        let users: Arc<dyn UserStore> = store.clone();
        let auth = AuthService::new(
            users.clone(),
            tokens.clone(),
            hasher,
            config.auth.allow_self_assigned_role,
        );
        let tasks = TaskService::new(store.clone(), users);

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            auth: Arc::new(auth),
            tasks: Arc::new(tasks),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Health check (public)
/// └── /api/v1/
///     ├── /auth/                # Authentication endpoints (public)
///     │   ├── POST /register
///     │   └── POST /login
///     ├── /tasks/               # Task endpoints (authenticated)
///     │   ├── POST   /
///     │   ├── GET    /
///     │   ├── GET    /:id
///     │   ├── PUT    /:id
///     │   └── DELETE /:id
///     └── /users/               # User directory (authenticated, admin)
///         └── GET    /
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (task and user routes)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", axum::routing::post(routes::auth::register))
        .route("/login", axum::routing::post(routes::auth::login));

    // Task routes (require JWT authentication)
    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.tokens.clone(),
            jwt_auth_middleware,
        ));

    // User directory (require JWT authentication, admin checked by the service)
    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .layer(axum::middleware::from_fn_with_state(
            state.tokens.clone(),
            jwt_auth_middleware,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .nest("/users", user_routes);

    let cors = cors_layer(&state.config.api.cors_origins);

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
