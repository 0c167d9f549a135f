/// Business logic for accounts and tasks
///
/// Services are composed explicitly from their dependencies at startup and
/// shared behind an `Arc`. They take already-deserialized input, apply the
/// authorization policy and talk to storage through the store traits.
///
/// # Modules
///
/// - `auth`: registration, credential checks, token issuance, admin seeding
/// - `tasks`: task CRUD under the ownership rules, user directory

pub mod auth;
pub mod tasks;

use crate::auth::{jwt::JwtError, password::PasswordError};
use crate::db::store::StoreError;

/// Error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input rejected by a business rule
    #[error("{0}")]
    Validation(String),

    /// Input rejected by field validation
    #[error("Validation failed")]
    InvalidInput(#[from] validator::ValidationErrors),

    /// Registration with an email that is already taken
    #[error("Email already registered")]
    DuplicateEmail,

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The policy denied the action
    #[error("{0}")]
    AccessDenied(String),

    /// The target does not exist
    #[error("{0}")]
    NotFound(String),

    /// Password hashing failure
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Token signing failure
    #[error(transparent)]
    Token(#[from] JwtError),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
