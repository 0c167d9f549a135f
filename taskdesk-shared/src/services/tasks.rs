/// Task operations under the ownership rules
///
/// Every operation takes the acting user as an [`AuthContext`] and consults
/// [`crate::auth::authorization`] before touching the store. Lookups report
/// `NotFound` before `AccessDenied`, except `remove`, which refuses
/// non-admins before looking anything up.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use validator::Validate;

use super::{ServiceError, ServiceResult};
use crate::auth::authorization::{self, Action, ListScope};
use crate::auth::middleware::AuthContext;
use crate::db::store::{StoreError, TaskStore, UserStore};
use crate::models::task::{CreateTask, Task, TaskWithOwner, UpdateTask};
use crate::models::user::PublicUser;

/// Body of a successful delete
pub const DELETED_MESSAGE: &str = "Deleted";

/// Task CRUD and the user directory
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>, users: Arc<dyn UserStore>) -> Self {
        Self { tasks, users }
    }

    /// Creates a task
    ///
    /// Admins may assign it to any existing user through `userId`; everyone
    /// else owns what they create.
    ///
    /// # Errors
    ///
    /// - `ServiceError::InvalidInput` for an empty title
    /// - `ServiceError::Validation` if the owner does not exist
    pub async fn create(&self, actor: &AuthContext, payload: CreateTask) -> ServiceResult<Task> {
        payload.validate()?;

        if !authorization::can_access(actor, Action::Create, None) {
            return Err(denied(Action::Create));
        }

        if payload.requested_owner().is_some() && !actor.is_admin() {
            debug!(user_id = actor.user_id, "Ignoring owner requested by non-admin");
        }
        let owner_id = authorization::resolve_create_owner(actor, payload.requested_owner());
        self.require_user(owner_id).await?;

        let task = self
            .tasks
            .insert_task(payload.into_new_task(owner_id))
            .await
            .map_err(owner_violation)?;

        info!(task_id = task.id, owner_id, actor = actor.user_id, "Task created");
        Ok(task)
    }

    /// All tasks for admins, own tasks for everyone else, in id order
    pub async fn list_for_actor(&self, actor: &AuthContext) -> ServiceResult<Vec<Task>> {
        let tasks = match authorization::list_scope(actor) {
            ListScope::All => self.tasks.list_tasks().await?,
            ListScope::OwnedBy(owner_id) => self.tasks.list_tasks_by_owner(owner_id).await?,
        };

        debug!(actor = actor.user_id, count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    /// Fetches one task
    ///
    /// # Errors
    ///
    /// `NotFound` if it does not exist, then `AccessDenied` if `actor` may
    /// not read it.
    pub async fn get_one(&self, id: i64, actor: &AuthContext) -> ServiceResult<Task> {
        let task = self.find(id).await?;

        if !authorization::can_access(actor, Action::Read, Some(&task)) {
            warn!(task_id = id, actor = actor.user_id, "Read denied");
            return Err(denied(Action::Read));
        }

        Ok(task)
    }

    /// Applies a partial update
    ///
    /// Absent fields, empty strings and a zero `userId` keep the stored
    /// value. Only admins may reassign; a non-admin's `userId` is ignored.
    pub async fn update(&self, id: i64, actor: &AuthContext, patch: UpdateTask) -> ServiceResult<Task> {
        patch.validate()?;

        let current = self.find(id).await?;

        if !authorization::can_access(actor, Action::Update, Some(&current)) {
            warn!(task_id = id, actor = actor.user_id, "Update denied");
            return Err(denied(Action::Update));
        }

        if patch.is_empty() {
            debug!(task_id = id, "Empty patch, nothing to update");
            return Ok(current);
        }

        let owner_id = authorization::resolve_update_owner(actor, &current, patch.requested_owner());
        if owner_id != current.owner_id {
            self.require_user(owner_id).await?;
        }

        let updated = self
            .tasks
            .update_task(&patch.apply(&current, owner_id))
            .await
            .map_err(owner_violation)?
            .ok_or_else(|| not_found(id))?;

        info!(task_id = id, actor = actor.user_id, "Task updated");
        Ok(updated)
    }

    /// Deletes a task; admins only
    ///
    /// # Errors
    ///
    /// `AccessDenied` for non-admins whether or not the task exists, then
    /// `NotFound`.
    pub async fn remove(&self, id: i64, actor: &AuthContext) -> ServiceResult<&'static str> {
        if !authorization::can_access(actor, Action::Delete, None) {
            warn!(task_id = id, actor = actor.user_id, "Delete denied");
            return Err(denied(Action::Delete));
        }

        if !self.tasks.delete_task(id).await? {
            return Err(not_found(id));
        }

        info!(task_id = id, actor = actor.user_id, "Task deleted");
        Ok(DELETED_MESSAGE)
    }

    /// Pairs each task with its owner's public record
    pub async fn with_owners(&self, tasks: Vec<Task>) -> ServiceResult<Vec<TaskWithOwner>> {
        let mut owners: HashMap<i64, Option<PublicUser>> = HashMap::new();

        let mut result = Vec::with_capacity(tasks.len());
        for task in tasks {
            if !owners.contains_key(&task.owner_id) {
                let owner = self.users.find_user_by_id(task.owner_id).await?;
                owners.insert(task.owner_id, owner.map(PublicUser::from));
            }

            let user = owners.get(&task.owner_id).cloned().flatten();
            result.push(TaskWithOwner { task, user });
        }

        Ok(result)
    }

    /// Convenience for a single task
    pub async fn with_owner(&self, task: Task) -> ServiceResult<TaskWithOwner> {
        let user = self.users.find_user_by_id(task.owner_id).await?;
        Ok(TaskWithOwner {
            task,
            user: user.map(PublicUser::from),
        })
    }

    /// Every user, sanitized; admins only
    pub async fn list_users(&self, actor: &AuthContext) -> ServiceResult<Vec<PublicUser>> {
        if !authorization::can_list_users(actor) {
            warn!(actor = actor.user_id, "User listing denied");
            return Err(ServiceError::AccessDenied("Admin role required".to_string()));
        }

        let users = self.users.list_users().await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    async fn find(&self, id: i64) -> ServiceResult<Task> {
        self.tasks.find_task(id).await?.ok_or_else(|| not_found(id))
    }

    async fn require_user(&self, user_id: i64) -> ServiceResult<()> {
        match self.users.find_user_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(unknown_owner(user_id)),
        }
    }
}

fn not_found(id: i64) -> ServiceError {
    debug!(task_id = id, "Task not found");
    ServiceError::NotFound("Task not found".to_string())
}

fn denied(action: Action) -> ServiceError {
    ServiceError::AccessDenied(format!("Not allowed to {} this task", action.as_str()))
}

fn unknown_owner(user_id: i64) -> ServiceError {
    ServiceError::Validation(format!("User {} does not exist", user_id))
}

// The owner can disappear between the existence check and the write
fn owner_violation(err: StoreError) -> ServiceError {
    match err {
        StoreError::ForeignKeyViolation(_) => {
            ServiceError::Validation("Assigned user does not exist".to_string())
        }
        other => ServiceError::Store(other),
    }
}
