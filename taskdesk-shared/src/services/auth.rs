/// Account registration and sign-in
///
/// # Flow
///
/// 1. `register` checks the email, hashes the password and stores the user
/// 2. `authenticate` checks an email/password pair
/// 3. `login` issues a session token for an authenticated user
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chrono::Duration;
/// use taskdesk_shared::auth::jwt::TokenIssuer;
/// use taskdesk_shared::auth::password::{HashingParams, PasswordHasher};
/// use taskdesk_shared::db::memory::MemoryStore;
/// use taskdesk_shared::services::auth::{AuthService, Registration};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = AuthService::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(TokenIssuer::new("a-secret-that-is-at-least-32-bytes!", Duration::hours(1))),
///     PasswordHasher::new(HashingParams::default())?,
///     false,
/// );
///
/// service.register(Registration::new("Ana", "ana@example.com", "pw12345")).await?;
/// let user = service.authenticate("ana@example.com", "pw12345").await?.expect("valid credentials");
/// let token = service.login(user.id, user.role)?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};
use validator::Validate;

use super::{ServiceError, ServiceResult};
use crate::auth::jwt::TokenIssuer;
use crate::auth::password::PasswordHasher;
use crate::db::store::{StoreError, UserStore};
use crate::models::user::{NewUser, PublicUser, Role};

/// Password verified against when the email is unknown
const DUMMY_PASSWORD: &str = "taskdesk-unknown-account";

/// Registration input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, max = 255, message = "Name must not be empty"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be between 6 and 128 characters"))]
    pub password: String,

    /// Requested role, honored only when self-assigned roles are allowed
    pub role: Option<Role>,
}

impl Registration {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

/// Registration, authentication and token issuance
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenIssuer>,
    hasher: PasswordHasher,
    allow_self_assigned_role: bool,
    // Digest verified against when the email is unknown
    dummy_hash: Option<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<TokenIssuer>,
        hasher: PasswordHasher,
        allow_self_assigned_role: bool,
    ) -> Self {
        let dummy_hash = match hasher.hash(DUMMY_PASSWORD) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(error = %e, "Failed to prepare dummy password digest");
                None
            }
        };

        Self {
            users,
            tokens,
            hasher,
            allow_self_assigned_role,
            dummy_hash,
        }
    }

    pub fn allows_self_assigned_role(&self) -> bool {
        self.allow_self_assigned_role
    }

    /// Creates an account
    ///
    /// # Errors
    ///
    /// - `ServiceError::InvalidInput` if a field fails validation
    /// - `ServiceError::DuplicateEmail` if the email is taken; the existing
    ///   record is left untouched
    pub async fn register(&self, registration: Registration) -> ServiceResult<PublicUser> {
        registration.validate()?;

        if self.users.find_user_by_email(&registration.email).await?.is_some() {
            debug!(email = %registration.email, "Registration rejected: email taken");
            return Err(ServiceError::DuplicateEmail);
        }

        let role = match registration.role {
            Some(requested) if self.allow_self_assigned_role => requested,
            Some(requested) => {
                if requested.is_admin() {
                    warn!(email = %registration.email, "Ignoring self-assigned admin role");
                }
                Role::User
            }
            None => Role::User,
        };

        let password_hash = self.hasher.hash(&registration.password)?;

        let user = self
            .users
            .insert_user(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                // Lost a race against a concurrent registration
                StoreError::UniqueViolation(_) => ServiceError::DuplicateEmail,
                other => ServiceError::Store(other),
            })?;

        info!(user_id = user.id, role = %user.role, "User registered");
        Ok(user.into())
    }

    /// Checks credentials
    ///
    /// Returns `None` for an unknown email and for a wrong password alike.
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<Option<PublicUser>> {
        let Some(user) = self.users.find_user_by_email(email).await? else {
            self.burn_verification(password);
            debug!("Authentication failed");
            return Ok(None);
        };

        if self.hasher.verify(password, &user.password_hash)? {
            Ok(Some(user.into()))
        } else {
            debug!("Authentication failed");
            Ok(None)
        }
    }

    /// Issues a session token
    pub fn login(&self, user_id: i64, role: Role) -> ServiceResult<String> {
        let token = self.tokens.issue(user_id, role)?;
        info!(user_id, "Session token issued");
        Ok(token)
    }

    /// Authenticates and issues a token in one step
    ///
    /// # Errors
    ///
    /// `ServiceError::InvalidCredentials` when `authenticate` yields nothing.
    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<(String, PublicUser)> {
        let user = self
            .authenticate(email, password)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let token = self.login(user.id, user.role)?;
        Ok((token, user))
    }

    /// Makes sure an admin account exists for `email`
    ///
    /// An existing account is returned unchanged, whatever its role.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> ServiceResult<PublicUser> {
        if let Some(existing) = self.users.find_user_by_email(email).await? {
            if !existing.role.is_admin() {
                warn!(user_id = existing.id, "Seed admin email belongs to a non-admin account");
            } else {
                debug!(user_id = existing.id, "Admin account already present");
            }
            return Ok(existing.into());
        }

        let registration = Registration::new(name, email, password);
        registration.validate()?;

        let password_hash = self.hasher.hash(password)?;
        let result = self
            .users
            .insert_user(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash,
                role: Role::Admin,
            })
            .await;

        let admin = match result {
            Ok(user) => user,
            Err(StoreError::UniqueViolation(_)) => self
                .users
                .find_user_by_email(email)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Admin account vanished".to_string()))?,
            Err(e) => return Err(e.into()),
        };

        info!(user_id = admin.id, "Admin account ready");
        Ok(admin.into())
    }

    // Spends the same work as a real verification
    fn burn_verification(&self, password: &str) {
        if let Some(hash) = &self.dummy_hash {
            let _ = self.hasher.verify(password, hash);
        }
    }
}
