/// PostgreSQL store
///
/// Implements the store traits with plain `sqlx` queries over a `PgPool`.
/// The schema is created by the embedded migrations (see
/// [`super::migrations::run_migrations`]).
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskdesk_shared::db::postgres::PgStore;
/// use taskdesk_shared::db::store::UserStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let store = PgStore::new(pool);
/// let admin = store.find_user_by_email("admin@example.com").await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::PgPool;

use super::store::{StoreError, StoreHealth, TaskStore, UserStore};
use crate::models::task::{NewTask, Task};
use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, user_id, created_at, updated_at";

/// PostgreSQL-backed store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC");

        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let query = format!(
            "INSERT INTO tasks (title, description, status, priority, user_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {TASK_COLUMNS}"
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task.title)
            .bind(task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(task)
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id ASC");

        let tasks = sqlx::query_as::<_, Task>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    async fn list_tasks_by_owner(&self, owner_id: i64) -> Result<Vec<Task>, StoreError> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY id ASC");

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    async fn update_task(&self, task: &Task) -> Result<Option<Task>, StoreError> {
        let query = format!(
            "UPDATE tasks \
             SET title = $2, description = $3, status = $4, priority = $5, \
                 user_id = $6, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn delete_task(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        super::pool::health_check(&self.pool).await?;
        Ok(())
    }
}
