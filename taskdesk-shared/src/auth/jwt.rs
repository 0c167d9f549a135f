/// JWT token issuance and verification
///
/// Session tokens are stateless: a signed claim carrying the user id and
/// role, valid until its `exp` timestamp. There is no refresh flow; an
/// expired token means logging in again.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: configurable, default 1 hour, no leeway
/// - **Validation**: signature, expiration, not-before and issuer
/// - **Secret**: fixed for the lifetime of the process
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use taskdesk_shared::auth::jwt::TokenIssuer;
/// use taskdesk_shared::models::user::Role;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = TokenIssuer::new("a-secret-that-is-at-least-32-bytes!", Duration::hours(1));
///
/// let token = issuer.issue(42, Role::User)?;
/// let claims = issuer.verify(&token)?;
/// assert_eq!(claims.sub, 42);
/// assert_eq!(claims.role, Role::User);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::user::Role;

/// Issuer name embedded in and required from every token
pub const ISSUER: &str = "taskdesk";

/// Default token lifetime
pub fn default_expiration() -> Duration {
    Duration::hours(1)
}

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature mismatch, wrong issuer or malformed token
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// JWT claims
///
/// `sub` is the user id and `role` the role at login time. A role change
/// only takes effect once the user logs in again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id, encoded as a string on the wire
    #[serde(with = "subject_id")]
    pub sub: i64,

    /// Role at issuance
    pub role: Role,

    /// Issuer - always "taskdesk"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims expiring `expires_in` from now
    ///
    /// # Errors
    ///
    /// Returns `JwtError::CreateError` if the expiry is past the representable range.
    pub fn with_expiration(user_id: i64, role: Role, expires_in: Duration) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = now.checked_add_signed(expires_in).ok_or_else(|| {
            JwtError::CreateError(format!("Token lifetime {} is out of range", expires_in))
        })?;

        Ok(Self {
            sub: user_id,
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: exp.timestamp(),
        })
    }
}

mod subject_id {
    use super::*;

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Signs and verifies session tokens with a process-wide secret
///
/// Built once at startup from configuration and shared behind an `Arc`.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, expires_in: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expires_in,
        }
    }

    /// Configured token lifetime
    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Issues a token for `user_id` with the configured lifetime
    pub fn issue(&self, user_id: i64, role: Role) -> Result<String, JwtError> {
        self.sign(&Claims::with_expiration(user_id, role, self.expires_in)?)
    }

    /// Signs arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token and returns its claims
    ///
    /// # Errors
    ///
    /// - `JwtError::Expired` once `exp` has passed
    /// - `JwtError::Invalid` for a bad signature, foreign issuer or malformed token
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, default_expiration())
    }

    #[test]
    fn test_default_expiration_is_one_hour() {
        assert_eq!(default_expiration(), Duration::hours(1));
        assert_eq!(issuer().expires_in(), Duration::hours(1));
    }

    #[test]
    fn test_claims_with_expiration() {
        let claims = Claims::with_expiration(5, Role::Admin, Duration::minutes(10)).unwrap();

        assert_eq!(claims.sub, 5);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "taskdesk");
        assert_eq!(claims.exp - claims.iat, 600);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let lifetime = Duration::days(100_000_000);
        assert!(matches!(
            Claims::with_expiration(1, Role::User, lifetime),
            Err(JwtError::CreateError(_))
        ));

        let issuer = TokenIssuer::new(SECRET, lifetime);
        assert!(matches!(issuer.issue(1, Role::User), Err(JwtError::CreateError(_))));
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();

        let token = issuer.issue(11, Role::User).expect("Should issue token");
        let claims = issuer.verify(&token).expect("Fresh token should verify");

        assert_eq!(claims.sub, 11);
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let token = issuer().issue(1, Role::User).unwrap();
        let other = TokenIssuer::new("another-secret-key-at-least-32-bytes", default_expiration());

        assert!(matches!(other.verify(&token), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_verify_expired_token() {
        let issuer = issuer();
        let claims = Claims::with_expiration(1, Role::User, Duration::seconds(-30)).unwrap();
        assert!(claims.exp < Utc::now().timestamp());

        let token = issuer.sign(&claims).unwrap();
        assert!(matches!(issuer.verify(&token), Err(JwtError::Expired)));
    }

    #[tokio::test]
    async fn test_token_expires_after_lifetime() {
        let issuer = TokenIssuer::new(SECRET, Duration::seconds(1));
        let token = issuer.issue(1, Role::User).unwrap();
        assert!(issuer.verify(&token).is_ok());

        tokio::time::sleep(std::time::Duration::from_millis(2100)).await;
        assert!(matches!(issuer.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_subject_encoded_as_string() {
        let claims = Claims::with_expiration(42, Role::User, Duration::hours(1)).unwrap();
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["sub"], "42");
        assert_eq!(json["role"], "user");
        let back: Claims = serde_json::from_value(json).unwrap();
        assert_eq!(back.sub, 42);
    }

    #[test]
    fn test_verify_rejects_foreign_issuer() {
        let issuer = issuer();
        let mut claims = Claims::with_expiration(1, Role::Admin, Duration::hours(1)).unwrap();
        claims.iss = "someone-else".to_string();

        let token = issuer.sign(&claims).unwrap();
        assert!(matches!(issuer.verify(&token), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(matches!(issuer().verify("not.a.token"), Err(JwtError::Invalid(_))));
        assert!(matches!(issuer().verify(""), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_tampered_role_is_rejected() {
        let issuer = issuer();
        let token = issuer.issue(3, Role::User).unwrap();

        let admin_token = issuer.issue(3, Role::Admin).unwrap();
        let forged = format!(
            "{}.{}",
            admin_token.rsplit_once('.').unwrap().0,
            token.rsplit_once('.').unwrap().1
        );

        assert!(issuer.verify(&forged).is_err());
    }
}
