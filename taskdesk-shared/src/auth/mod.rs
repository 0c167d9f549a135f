/// Authentication and authorization
///
/// # Modules
///
/// - `password`: Argon2id password hashing
/// - `jwt`: session token issuance and verification
/// - `middleware`: Axum bearer-token middleware and [`middleware::AuthContext`]
/// - `authorization`: task access policy

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
