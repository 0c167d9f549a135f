/// Configuration management for the API server
///
/// Configuration is read once at startup into an immutable [`Config`] and
/// shared through `AppState`.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 3000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `DATABASE_URL`: PostgreSQL connection string; unset selects the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 characters)
/// - `JWT_EXPIRES_IN`: Token lifetime such as `90`, `90s`, `15m`, `1h`, `7d` (default: 1h,
///   at most 365d)
/// - `ALLOW_SELF_ASSIGNED_ROLE`: Honor `role` on registration (default: true)
/// - `PASSWORD_HASH_MEMORY_KIB`, `PASSWORD_HASH_ITERATIONS`, `PASSWORD_HASH_PARALLELISM`:
///   Argon2 cost (default: 65536, 3, 4)
/// - `ADMIN_EMAIL`, `ADMIN_PASSWORD`, `ADMIN_NAME`: Admin account seeded at startup
///   when both email and password are set (name defaults to "Admin")
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use std::env;
use taskdesk_shared::auth::{jwt, password::HashingParams};

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted `JWT_EXPIRES_IN`, in seconds (365 days)
pub const MAX_JWT_EXPIRES_IN_SECONDS: i64 = 365 * 86_400;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,

    /// Admin account to seed, if configured
    pub admin: Option<AdminSeed>,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; `None` selects the in-memory store
    pub url: Option<String>,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in seconds
    pub expires_in_seconds: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expires_in_seconds", &self.expires_in_seconds)
            .finish()
    }
}

impl JwtConfig {
    pub fn expires_in(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.expires_in_seconds)
    }
}

/// Account and credential settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Whether registration honors a caller-supplied role
    pub allow_self_assigned_role: bool,

    /// Argon2 cost for new password hashes
    pub password_hashing: HashingParams,
}

/// Admin account created at startup
#[derive(Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - A variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = parse_or(&var, "API_PORT", 3000u16)?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let max_connections = parse_or(&var, "DATABASE_MAX_CONNECTIONS", 10u32)?;

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LEN);
        }

        let expires_in_seconds = match var("JWT_EXPIRES_IN") {
            Some(raw) => parse_duration(&raw).context("Invalid JWT_EXPIRES_IN")?,
            None => jwt::default_expiration().num_seconds(),
        };

        if expires_in_seconds > MAX_JWT_EXPIRES_IN_SECONDS {
            anyhow::bail!(
                "JWT_EXPIRES_IN must be at most {} seconds (365d)",
                MAX_JWT_EXPIRES_IN_SECONDS
            );
        }

        let allow_self_assigned_role = match var("ALLOW_SELF_ASSIGNED_ROLE") {
            Some(raw) => parse_bool(&raw).context("Invalid ALLOW_SELF_ASSIGNED_ROLE")?,
            None => true,
        };

        let defaults = HashingParams::default();
        let password_hashing = HashingParams {
            memory_kib: parse_or(&var, "PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&var, "PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&var, "PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: var("ADMIN_NAME").unwrap_or_else(|| "Admin".to_string()),
                email,
                password,
            }),
            (None, None) => None,
            _ => anyhow::bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL"),
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_in_seconds,
            },
            auth: AuthConfig {
                allow_self_assigned_role,
                password_hashing,
            },
            admin,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

/// Parses a lifetime like `90`, `90s`, `15m`, `1h` or `7d` into seconds
pub fn parse_duration(raw: &str) -> anyhow::Result<i64> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => raw.split_at(idx),
        None => (raw, "s"),
    };

    let value: i64 = digits
        .parse()
        .with_context(|| format!("Expected a number in {:?}", raw))?;

    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        other => anyhow::bail!("Unknown duration unit {:?}", other),
    };

    if value <= 0 {
        anyhow::bail!("Duration must be positive");
    }

    value
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Duration {:?} is too large", raw))
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Expected a boolean, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert!(config.database.url.is_none());
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.expires_in_seconds, 3600);
        assert_eq!(config.jwt.expires_in(), chrono::Duration::hours(1));
        assert!(config.auth.allow_self_assigned_role);
        assert_eq!(config.auth.password_hashing, HashingParams::default());
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "8080"),
            ("CORS_ORIGINS", "http://localhost:5173, https://app.example.com"),
            ("DATABASE_URL", "postgresql://localhost/taskdesk"),
            ("JWT_EXPIRES_IN", "15m"),
            ("ALLOW_SELF_ASSIGNED_ROLE", "false"),
            ("PASSWORD_HASH_ITERATIONS", "2"),
            ("ADMIN_EMAIL", "admin@example.com"),
            ("ADMIN_PASSWORD", "admin-pw"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.api.cors_origins.len(), 2);
        assert_eq!(config.api.cors_origins[1], "https://app.example.com");
        assert_eq!(config.database.url.as_deref(), Some("postgresql://localhost/taskdesk"));
        assert_eq!(config.jwt.expires_in_seconds, 900);
        assert!(!config.auth.allow_self_assigned_role);
        assert_eq!(config.auth.password_hashing.iterations, 2);

        let admin = config.admin.unwrap();
        assert_eq!(admin.name, "Admin");
        assert_eq!(admin.email, "admin@example.com");
    }

    #[test]
    fn test_jwt_secret_required_and_long_enough() {
        assert!(load(&[]).is_err());
        assert!(load(&[("JWT_SECRET", "short")]).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("JWT_SECRET", SECRET), ("API_PORT", "http")]).is_err());
        assert!(load(&[("JWT_SECRET", SECRET), ("ALLOW_SELF_ASSIGNED_ROLE", "maybe")]).is_err());
        assert!(load(&[("JWT_SECRET", SECRET), ("ADMIN_EMAIL", "admin@example.com")]).is_err());
    }

    #[test]
    fn test_jwt_lifetime_upper_bound() {
        let config = load(&[("JWT_SECRET", SECRET), ("JWT_EXPIRES_IN", "365d")]).unwrap();
        assert_eq!(config.jwt.expires_in_seconds, MAX_JWT_EXPIRES_IN_SECONDS);

        assert!(load(&[("JWT_SECRET", SECRET), ("JWT_EXPIRES_IN", "366d")]).is_err());
        assert!(load(&[("JWT_SECRET", SECRET), ("JWT_EXPIRES_IN", "100000000d")]).is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90").unwrap(), 90);
        assert_eq!(parse_duration("90s").unwrap(), 90);
        assert_eq!(parse_duration("15m").unwrap(), 900);
        assert_eq!(parse_duration("1h").unwrap(), 3600);
        assert_eq!(parse_duration("7d").unwrap(), 604_800);

        assert!(parse_duration("").is_err());
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("1w").is_err());
        assert!(parse_duration("h").is_err());
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();
        assert!(!format!("{:?}", config).contains(SECRET));
    }
}
