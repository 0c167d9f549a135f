/// In-process store
///
/// Keeps users and tasks in ordered maps behind a single `RwLock`, so every
/// operation is atomic and listings come back in id order. Used when no
/// `DATABASE_URL` is configured and throughout the test suites.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::store::{StoreError, StoreHealth, TaskStore, UserStore};
use crate::models::task::{NewTask, Task};
use crate::models::user::{NewUser, User};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, Task>,
    next_user_id: i64,
    next_task_id: i64,
}

/// Memory-backed implementation of every store trait
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        tables.next_user_id += 1;
        let record = User {
            id: tables.next_user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&task.owner_id) {
            return Err(StoreError::ForeignKeyViolation("tasks_user_id_fkey".to_string()));
        }

        tables.next_task_id += 1;
        let now = Utc::now();
        let record = Task {
            id: tables.next_task_id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            owner_id: task.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tables.read().await.tasks.values().cloned().collect())
    }

    async fn list_tasks_by_owner(&self, owner_id: i64) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_task(&self, task: &Task) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&task.owner_id) {
            return Err(StoreError::ForeignKeyViolation("tasks_user_id_fkey".to_string()));
        }

        let Some(stored) = tables.tasks.get_mut(&task.id) else {
            return Ok(None);
        };

        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.status = task.status;
        stored.priority = task.priority;
        stored.owner_id = task.owner_id;
        stored.updated_at = Utc::now();

        Ok(Some(stored.clone()))
    }

    async fn delete_task(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.tasks.remove(&id).is_some())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
