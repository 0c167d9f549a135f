/// Authorization policy for tasks
///
/// Pure decision functions over the actor and the target task. Nothing here
/// touches storage; [`crate::services::tasks::TaskService`] loads the task,
/// asks the policy and maps a denial to `AccessDenied`.
///
/// # Permission Model
///
/// | Action | admin | owner | other |
/// |--------|-------|-------|-------|
/// | Create | any owner | owner forced to self | - |
/// | Read | all tasks | own tasks | denied |
/// | Update | may reassign | owner unchanged | denied |
/// | Delete | allowed | denied | denied |
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::authorization::{can_access, Action};
/// use taskdesk_shared::auth::middleware::AuthContext;
/// use taskdesk_shared::models::user::Role;
///
/// let admin = AuthContext::new(1, Role::Admin);
/// assert!(can_access(&admin, Action::Delete, None));
///
/// let user = AuthContext::new(2, Role::User);
/// assert!(!can_access(&user, Action::Delete, None));
/// ```

use super::middleware::AuthContext;
use crate::models::task::Task;

/// Operations on tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Which tasks a listing may include
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    OwnedBy(i64),
}

/// Decides whether `actor` may perform `action` on `target`
///
/// `target` is `None` for creation and for collection-level checks. Admins
/// may do everything. Other users may create, and may read or update tasks
/// they own; they may never delete.
pub fn can_access(actor: &AuthContext, action: Action, target: Option<&Task>) -> bool {
    if actor.is_admin() {
        return true;
    }

    match action {
        Action::Create => true,
        Action::Read | Action::Update => match target {
            Some(task) => task.owner_id == actor.user_id,
            // Collection reads are narrowed by `list_scope`
            None => action == Action::Read,
        },
        Action::Delete => false,
    }
}

/// Scope of `GET /tasks` for `actor`
pub fn list_scope(actor: &AuthContext) -> ListScope {
    if actor.is_admin() {
        ListScope::All
    } else {
        ListScope::OwnedBy(actor.user_id)
    }
}

/// Owner of a new task
///
/// Admins may assign any user; everyone else always owns what they create.
/// A zero id counts as absent.
pub fn resolve_create_owner(actor: &AuthContext, requested: Option<i64>) -> i64 {
    match requested.filter(|id| *id != 0) {
        Some(owner_id) if actor.is_admin() => owner_id,
        _ => actor.user_id,
    }
}

/// Owner of a task after an update
///
/// A non-admin's requested owner is ignored.
pub fn resolve_update_owner(actor: &AuthContext, current: &Task, requested: Option<i64>) -> i64 {
    match requested.filter(|id| *id != 0) {
        Some(owner_id) if actor.is_admin() => owner_id,
        _ => current.owner_id,
    }
}

/// Only admins may browse the user directory
pub fn can_list_users(actor: &AuthContext) -> bool {
    actor.is_admin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use crate::models::user::Role;
    use chrono::Utc;

    const ADMIN: AuthContext = AuthContext { user_id: 1, role: Role::Admin };
    const OWNER: AuthContext = AuthContext { user_id: 2, role: Role::User };
    const OTHER: AuthContext = AuthContext { user_id: 3, role: Role::User };

    fn task_owned_by(owner_id: i64) -> Task {
        let now = Utc::now();
        Task {
            id: 10,
            title: "Task".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Low,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_admin_may_do_everything() {
        let task = task_owned_by(OWNER.user_id);
        for action in [Action::Create, Action::Read, Action::Update, Action::Delete] {
            assert!(can_access(&ADMIN, action, Some(&task)), "admin {}", action.as_str());
            assert!(can_access(&ADMIN, action, None), "admin {}", action.as_str());
        }
    }

    #[test]
    fn test_owner_permissions() {
        let task = task_owned_by(OWNER.user_id);

        assert!(can_access(&OWNER, Action::Create, None));
        assert!(can_access(&OWNER, Action::Read, Some(&task)));
        assert!(can_access(&OWNER, Action::Update, Some(&task)));
        assert!(!can_access(&OWNER, Action::Delete, Some(&task)));
    }

    #[test]
    fn test_non_owner_is_denied() {
        let task = task_owned_by(OWNER.user_id);

        assert!(!can_access(&OTHER, Action::Read, Some(&task)));
        assert!(!can_access(&OTHER, Action::Update, Some(&task)));
        assert!(!can_access(&OTHER, Action::Delete, Some(&task)));
    }

    #[test]
    fn test_update_without_target_is_denied() {
        assert!(!can_access(&OWNER, Action::Update, None));
        assert!(can_access(&OWNER, Action::Read, None));
    }

    #[test]
    fn test_list_scope() {
        assert_eq!(list_scope(&ADMIN), ListScope::All);
        assert_eq!(list_scope(&OWNER), ListScope::OwnedBy(2));
    }

    #[test]
    fn test_resolve_create_owner() {
        assert_eq!(resolve_create_owner(&ADMIN, Some(7)), 7);
        assert_eq!(resolve_create_owner(&ADMIN, None), ADMIN.user_id);
        assert_eq!(resolve_create_owner(&ADMIN, Some(0)), ADMIN.user_id);

        // Non-admins cannot assign
        assert_eq!(resolve_create_owner(&OWNER, Some(7)), OWNER.user_id);
    }

    #[test]
    fn test_resolve_update_owner() {
        let task = task_owned_by(OWNER.user_id);

        assert_eq!(resolve_update_owner(&ADMIN, &task, Some(3)), 3);
        assert_eq!(resolve_update_owner(&ADMIN, &task, None), OWNER.user_id);
        assert_eq!(resolve_update_owner(&OWNER, &task, Some(3)), OWNER.user_id);
        assert_eq!(resolve_update_owner(&OWNER, &task, Some(0)), OWNER.user_id);
    }

    #[test]
    fn test_can_list_users() {
        assert!(can_list_users(&ADMIN));
        assert!(!can_list_users(&OWNER));
    }
}
