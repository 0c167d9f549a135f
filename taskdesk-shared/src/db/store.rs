/// Storage traits
///
/// The services only talk to storage through [`UserStore`] and [`TaskStore`].
/// Two providers implement both: [`super::postgres::PgStore`] for production
/// and [`super::memory::MemoryStore`] for development and tests.
///
/// Providers guarantee:
/// - ids are assigned by the store and never reused
/// - user emails are unique (`StoreError::UniqueViolation` otherwise)
/// - single-record operations are atomic
/// - listings are ordered by id ascending

use async_trait::async_trait;

use crate::models::task::{NewTask, Task};
use crate::models::user::{NewUser, User};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint was violated (e.g. duplicate email)
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced record does not exist
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(constraint);
            }
        }

        StoreError::Database(err.to_string())
    }
}

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user, failing with `UniqueViolation` on a taken email
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
}

/// Task store
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a task, failing with `ForeignKeyViolation` if the owner is unknown
    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError>;

    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError>;

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    async fn list_tasks_by_owner(&self, owner_id: i64) -> Result<Vec<Task>, StoreError>;

    /// Overwrites the mutable fields of `task.id`, refreshing `updated_at`.
    /// Returns `None` if the task no longer exists.
    async fn update_task(&self, task: &Task) -> Result<Option<Task>, StoreError>;

    /// Returns whether a task was deleted
    async fn delete_task(&self, id: i64) -> Result<bool, StoreError>;
}

/// Liveness check used by the health endpoint
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Short backend name ("postgres", "memory")
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Everything the API needs from one storage provider
pub trait Store: UserStore + TaskStore + StoreHealth {}

impl<T> Store for T where T: UserStore + TaskStore + StoreHealth {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::UniqueViolation("users_email_key".to_string());
        assert!(err.to_string().contains("users_email_key"));

        let err = StoreError::Database("connection reset".to_string());
        assert_eq!(err.to_string(), "Database error: connection reset");
    }

    #[test]
    fn test_row_not_found_maps_to_database_error() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
