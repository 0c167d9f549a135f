/// Task model
///
/// A task is a unit of work owned by exactly one user. Ownership decides who
/// may read and edit it (see [`crate::auth::authorization`]).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in-progress', 'done');
/// CREATE TYPE task_priority AS ENUM ('Low', 'Medium', 'High');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(255) NOT NULL CHECK (title <> ''),
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'Low',
///     user_id BIGINT NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Wire format
///
/// Tasks serialize in camelCase and expose the owner as `userId`, which is
/// also the field clients send when an admin assigns a task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::PublicUser;

/// Task progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "todo")]
    #[sqlx(rename = "todo")]
    Todo,

    #[serde(rename = "in-progress")]
    #[sqlx(rename = "in-progress")]
    InProgress,

    #[serde(rename = "done")]
    #[sqlx(rename = "done")]
    Done,
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    #[default]
    Low,
    Medium,
    High,
}

/// Stored task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned id
    pub id: i64,

    /// Non-empty title
    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// Owning user
    #[serde(rename = "userId")]
    #[sqlx(rename = "user_id")]
    pub owner_id: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Task plus its owner's public record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskWithOwner {
    #[serde(flatten)]
    pub task: Task,

    /// `None` only if the owner could not be resolved
    pub user: Option<PublicUser>,
}

/// Input for inserting a task, after ownership has been resolved
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub owner_id: i64,
}

/// Create request body
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: String,

    pub description: Option<String>,

    /// Requested owner; only honored for admins
    pub user_id: Option<i64>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,
}

/// Update request body
///
/// Every field is optional. Absent fields, empty strings and a zero
/// `userId` all leave the stored value untouched, so an update can never
/// clear a field.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    /// Requested new owner; only honored for admins
    pub user_id: Option<i64>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl UpdateTask {
    /// Owner requested by the patch, ignoring the zero id
    pub fn requested_owner(&self) -> Option<i64> {
        self.user_id.filter(|id| *id != 0)
    }

    /// Merges the patch over `current`, with `owner_id` already resolved by
    /// the caller.
    pub fn apply(&self, current: &Task, owner_id: i64) -> Task {
        Task {
            id: current.id,
            title: non_empty(&self.title)
                .map(str::to_string)
                .unwrap_or_else(|| current.title.clone()),
            description: non_empty(&self.description)
                .map(str::to_string)
                .or_else(|| current.description.clone()),
            status: self.status.unwrap_or(current.status),
            priority: self.priority.unwrap_or(current.priority),
            owner_id,
            created_at: current.created_at,
            updated_at: current.updated_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        non_empty(&self.title).is_none()
            && non_empty(&self.description).is_none()
            && self.requested_owner().is_none()
            && self.status.is_none()
            && self.priority.is_none()
    }
}

impl CreateTask {
    /// Owner requested by the payload, ignoring the zero id
    pub fn requested_owner(&self) -> Option<i64> {
        self.user_id.filter(|id| *id != 0)
    }

    pub fn into_new_task(self, owner_id: i64) -> NewTask {
        NewTask {
            title: self.title,
            description: self.description.filter(|d| !d.is_empty()),
            status: self.status.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            owner_id,
        }
    }
}
