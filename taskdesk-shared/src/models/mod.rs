/// Domain models for Taskdesk
///
/// - `user`: user accounts, roles and the sanitized [`user::PublicUser`]
/// - `task`: tasks, their enums, and the create/update request bodies
///
/// Persistence lives in [`crate::db`]; these types are storage-agnostic
/// apart from the `sqlx` derives used by the PostgreSQL store.

pub mod task;
pub mod user;
