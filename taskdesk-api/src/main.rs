//! # Taskdesk API Server
//!
//! REST backend for a multi-user task tracker: registration and login with
//! bearer tokens, and task CRUD under per-user ownership rules.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p taskdesk-api
//! ```
//!
//! Without `DATABASE_URL` the server keeps everything in memory.

use std::sync::Arc;

use anyhow::Context;
use taskdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskdesk_shared::db::{
    memory::MemoryStore,
    migrations::{ensure_database_exists, run_migrations},
    pool::{close_pool, create_pool, DatabaseConfig},
    postgres::PgStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taskdesk_api=debug,taskdesk_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskdesk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("Failed to load configuration")?;
    let bind_address = config.bind_address();

    let (state, pool) = match config.database.url.clone() {
        Some(url) => {
            ensure_database_exists(&url)
                .await
                .context("Failed to ensure database exists")?;

            let pool = create_pool(DatabaseConfig {
                url,
                max_connections: config.database.max_connections,
                ..Default::default()
            })
            .await
            .context("Failed to connect to database")?;

            run_migrations(&pool).await.context("Failed to run migrations")?;

            let store = Arc::new(PgStore::new(pool.clone()));
            (AppState::new(config, store)?, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage; data is lost on exit");
            (AppState::new(config, Arc::new(MemoryStore::new()))?, None)
        }
    };

    if let Some(admin) = state.config.admin.clone() {
        state
            .auth
            .ensure_admin(&admin.name, &admin.email, &admin.password)
            .await
            .context("Failed to seed admin account")?;
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(pool) = pool {
        close_pool(&pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
