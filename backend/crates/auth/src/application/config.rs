//! Application Configuration
//!
//! Configuration for the Auth application layer. Values come from code or
//! from environment variables; no configuration files are read here.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use platform::crypto::from_base64;
use platform::password::{PasswordAlgorithm, PasswordCodec, PasswordHashError};
use thiserror::Error;

use crate::domain::repository::{UserPredicate, UserProperty};

pub const ENV_TOKEN_SECRET: &str = "AUTH_TOKEN_SECRET";
pub const ENV_SESSION_TTL_SECS: &str = "AUTH_SESSION_TTL_SECS";
pub const ENV_PASSWORD_ALGORITHM: &str = "AUTH_PASSWORD_ALGORITHM";
pub const ENV_BCRYPT_COST: &str = "AUTH_BCRYPT_COST";
pub const ENV_PASSWORD_PEPPER: &str = "AUTH_PASSWORD_PEPPER";
pub const ENV_LOGIN_LOOKUP: &str = "AUTH_LOGIN_LOOKUP";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error(transparent)]
    Codec(#[from] PasswordHashError),
}

/// How a login identifier is resolved against the user store
#[derive(Clone)]
pub enum LoginLookup {
    /// Exact match on one property
    Property(UserProperty),
    /// Build a custom predicate from the identifier
    Predicate(Arc<dyn Fn(&str) -> UserPredicate + Send + Sync>),
}

impl LoginLookup {
    pub fn username_or_email() -> Self {
        Self::Predicate(Arc::new(UserPredicate::username_or_email))
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "username_or_email" => Some(Self::username_or_email()),
            other => UserProperty::from_name(other).map(Self::Property),
        }
    }
}

impl Default for LoginLookup {
    fn default() -> Self {
        Self::Property(UserProperty::Username)
    }
}

impl fmt::Debug for LoginLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(property) => f.debug_tuple("Property").field(property).finish(),
            Self::Predicate(_) => f.debug_tuple("Predicate").field(&"<fn>").finish(),
        }
    }
}

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC key signing identity tokens (32 bytes)
    pub token_secret: [u8; 32],
    /// Session lifetime; also the idle timeout between refreshes
    pub session_ttl: Duration,
    /// Codec used for new hashes and for verification
    pub password_algorithm: PasswordAlgorithm,
    /// Optional application-wide secret appended to every password
    pub password_pepper: Option<Vec<u8>>,
    pub login_lookup: LoginLookup,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            session_ttl: Duration::from_secs(12 * 3600), // 12 hours
            password_algorithm: PasswordAlgorithm::default(),
            password_pepper: None,
            login_lookup: LoginLookup::default(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[REDACTED]")
            .field("session_ttl", &self.session_ttl)
            .field("password_algorithm", &self.password_algorithm)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("login_lookup", &self.login_lookup)
            .finish()
    }
}

impl AuthConfig {
    /// Create config with a random token secret
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&platform::crypto::random_bytes(32));
        Self {
            token_secret: secret,
            ..Default::default()
        }
    }

    /// Random secret and a cheap Argon2id cost (local development and tests)
    pub fn development() -> Self {
        Self {
            password_algorithm: PasswordAlgorithm::Argon2id {
                memory_kib: 4096,
                iterations: 1,
                parallelism: 1,
            },
            ..Self::with_random_secret()
        }
    }

    /// Read configuration from the environment.
    ///
    /// `AUTH_TOKEN_SECRET` (base64, 32 bytes) is required; everything else
    /// falls back to [`AuthConfig::default`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let secret_b64 = var(ENV_TOKEN_SECRET).ok_or(ConfigError::Missing {
            name: ENV_TOKEN_SECRET,
        })?;
        let secret_bytes = from_base64(secret_b64.trim()).map_err(|e| ConfigError::Invalid {
            name: ENV_TOKEN_SECRET,
            reason: e.to_string(),
        })?;
        let secret_len = secret_bytes.len();
        config.token_secret = secret_bytes
            .try_into()
            .map_err(|_| ConfigError::Invalid {
                name: ENV_TOKEN_SECRET,
                reason: format!("expected 32 bytes, got {secret_len}"),
            })?;

        if let Some(ttl) = var(ENV_SESSION_TTL_SECS) {
            let secs: u64 = ttl.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ENV_SESSION_TTL_SECS,
                reason: format!("not a number of seconds: {ttl:?}"),
            })?;
            config.session_ttl = Duration::from_secs(secs);
        }

        if let Some(name) = var(ENV_PASSWORD_ALGORITHM) {
            config.password_algorithm =
                PasswordAlgorithm::from_name(name.trim()).ok_or_else(|| ConfigError::Invalid {
                    name: ENV_PASSWORD_ALGORITHM,
                    reason: format!("unknown algorithm {name:?}"),
                })?;
        }

        if let Some(cost) = var(ENV_BCRYPT_COST) {
            let cost: u32 = cost.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ENV_BCRYPT_COST,
                reason: format!("not a number: {cost:?}"),
            })?;
            if let PasswordAlgorithm::Bcrypt { .. } = config.password_algorithm {
                config.password_algorithm = PasswordAlgorithm::Bcrypt { cost };
            }
        }

        config.password_pepper = var(ENV_PASSWORD_PEPPER).map(String::into_bytes);

        if let Some(lookup) = var(ENV_LOGIN_LOOKUP) {
            config.login_lookup =
                LoginLookup::from_name(lookup.trim()).ok_or_else(|| ConfigError::Invalid {
                    name: ENV_LOGIN_LOOKUP,
                    reason: format!("unknown lookup {lookup:?}"),
                })?;
        }

        // Fail at startup rather than on the first login
        config.password_codec()?;

        Ok(config)
    }

    /// Build the configured password codec
    pub fn password_codec(&self) -> Result<Arc<dyn PasswordCodec>, PasswordHashError> {
        self.password_algorithm.codec(self.password_pepper.as_deref())
    }
}
