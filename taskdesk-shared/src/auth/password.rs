/// Password hashing using Argon2id
///
/// Every hash gets a fresh random salt; salt and cost parameters are stored
/// in the PHC string, so verification needs nothing but the digest.
///
/// # Cost
///
/// The cost is a configurable constant ([`HashingParams`]). The default is
/// 64 MiB of memory, 3 iterations and 4 lanes. Changing it only affects new
/// hashes; existing digests keep verifying with the parameters they carry.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::password::{HashingParams, PasswordHasher};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = PasswordHasher::new(HashingParams::default())?;
/// let hash = hasher.hash("super_secret_password_123")?;
///
/// assert!(hasher.verify("super_secret_password_123", &hash)?);
/// assert!(!hasher.verify("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2, Params, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl HashingParams {
    fn build(&self) -> Result<Params, PasswordError> {
        ParamsBuilder::new()
            .m_cost(self.memory_kib)
            .t_cost(self.iterations)
            .p_cost(self.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))
    }
}

/// One-way password hasher with a fixed cost
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    params: HashingParams,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", &self.params)
            .finish()
    }
}

impl PasswordHasher {
    /// Creates a hasher, rejecting parameters Argon2 cannot use
    pub fn new(params: HashingParams) -> Result<Self, PasswordError> {
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params.build()?);

        Ok(Self { argon2, params })
    }

    pub fn params(&self) -> HashingParams {
        self.params
    }

    /// Hashes `password` with a fresh random salt
    ///
    /// Returns a PHC string such as
    /// `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    /// Verifies `password` against a stored digest
    ///
    /// Uses the salt and parameters embedded in `hash`; the final comparison
    /// is constant-time.
    ///
    /// # Errors
    ///
    /// Only for a malformed digest. A wrong password is `Ok(false)`.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cheap parameters keep the suite fast
    fn hasher() -> PasswordHasher {
        PasswordHasher::new(HashingParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_default_params() {
        let params = HashingParams::default();
        assert_eq!(params.memory_kib, 65536);
        assert_eq!(params.iterations, 3);
        assert_eq!(params.parallelism, 4);
    }

    #[test]
    fn test_hash_embeds_parameters() {
        let hash = hasher().hash("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=1024"));
        assert!(hash.contains("t=1"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_hash_produces_different_salts() {
        let hasher = hasher();

        let hash1 = hasher.hash("same_password").unwrap();
        let hash2 = hasher.hash("same_password").unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hasher = hasher();
        let hash = hasher.hash("pw12345").unwrap();

        assert!(hasher.verify("pw12345", &hash).unwrap());
        assert!(!hasher.verify("pw123456", &hash).unwrap());
        assert!(!hasher.verify("", &hash).unwrap());
    }

    #[test]
    fn test_verify_uses_params_from_digest() {
        let cheap = hasher();
        let other = PasswordHasher::new(HashingParams {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();

        let hash = cheap.hash("password").unwrap();
        assert!(other.verify("password", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = hasher();
        assert!(hasher.verify("password", "invalid_hash").is_err());
        assert!(hasher.verify("password", "$argon2id$invalid").is_err());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PasswordHasher::new(HashingParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 0,
        });
        assert!(matches!(result, Err(PasswordError::HashError(_))));
    }

    #[test]
    fn test_unicode_passwords() {
        let hasher = hasher();
        for password in ["with spaces", "unicode-密码-パスワード", "!@#$%^&*()"] {
            let hash = hasher.hash(password).unwrap();
            assert!(hasher.verify(password, &hash).unwrap(), "'{}' should verify", password);
        }
    }
}
