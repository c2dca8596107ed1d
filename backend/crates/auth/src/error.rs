//! Auth Error Types
//!
//! Internal error taxonomy of the auth core plus its mapping onto the
//! caller-facing `kernel::error::AppError`.

use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::PasswordHashError;
use thiserror::Error;

use crate::domain::entity::identity_token::TokenError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
///
/// `UnknownIdentity` and `BadCredentials` stay distinct for logs but share a
/// single public message (see [`AuthError::to_app_error`]).
#[derive(Debug, Error)]
pub enum AuthError {
    /// No user matches the identifier
    #[error("Unknown identity")]
    UnknownIdentity,

    /// Password does not match
    #[error("Bad credentials")]
    BadCredentials,

    #[error("Account has expired")]
    AccountExpired,

    #[error("Account is locked")]
    AccountLocked,

    #[error("Credentials have expired")]
    CredentialsExpired,

    #[error("Account is disabled")]
    AccountDisabled,

    /// Session payload could not be decoded or verified
    #[error("Malformed identity token: {0}")]
    MalformedToken(#[from] TokenError),

    /// Token refers to a user id the store no longer knows
    #[error("User no longer exists")]
    UserVanished,

    /// Fresh record no longer matches the session's snapshot
    #[error("Session identity drifted from the user record")]
    DriftDetected,

    /// Password input rejected before hashing
    #[error("Password rejected: {0}")]
    PasswordPolicy(#[from] platform::password::PasswordPolicyError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordHashError),

    /// Non-database store failure (e.g. a remote session cache)
    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UnknownIdentity
            | AuthError::BadCredentials
            | AuthError::PasswordPolicy(_)
            | AuthError::MalformedToken(_)
            | AuthError::UserVanished
            | AuthError::DriftDetected => ErrorKind::Unauthorized,
            AuthError::AccountExpired
            | AuthError::AccountLocked
            | AuthError::CredentialsExpired
            | AuthError::AccountDisabled => ErrorKind::Forbidden,
            AuthError::Store(_) | AuthError::Database(_) => ErrorKind::ServiceUnavailable,
            AuthError::PasswordHash(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Wrong identifier or wrong password (indistinguishable to callers)
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(
            self,
            AuthError::UnknownIdentity | AuthError::BadCredentials | AuthError::PasswordPolicy(_)
        )
    }

    /// Account status gate failure
    pub fn is_status_failure(&self) -> bool {
        matches!(
            self,
            AuthError::AccountExpired
                | AuthError::AccountLocked
                | AuthError::CredentialsExpired
                | AuthError::AccountDisabled
        )
    }

    /// Convert to the caller-facing error.
    ///
    /// Internal detail never leaks: identity and password failures collapse
    /// into one message, store failures into a generic one.
    pub fn to_app_error(&self) -> AppError {
        self.log();
        match self {
            _ if self.is_invalid_credentials() => AppError::unauthorized("Invalid credentials")
                .with_action("Check your user name and password"),
            AuthError::AccountExpired => AppError::forbidden("Account has expired")
                .with_action("Contact an administrator"),
            AuthError::AccountLocked => AppError::forbidden("Account is locked")
                .with_action("Contact an administrator"),
            AuthError::CredentialsExpired => AppError::forbidden("Credentials have expired")
                .with_action("Reset your password"),
            AuthError::AccountDisabled => AppError::forbidden("Account is disabled")
                .with_action("Contact an administrator"),
            AuthError::MalformedToken(_) | AuthError::UserVanished | AuthError::DriftDetected => {
                AppError::unauthorized("Authentication required").with_action("Please sign in again")
            }
            AuthError::Store(_) | AuthError::Database(_) => {
                AppError::service_unavailable("Authentication service unavailable")
            }
            _ => AppError::internal("Authentication failed"),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Store(msg) => {
                tracing::error!(message = %msg, "Auth store error");
            }
            AuthError::PasswordHash(e) => {
                tracing::error!(error = %e, "Password codec error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::UnknownIdentity | AuthError::BadCredentials => {
                tracing::warn!(reason = %self, "Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        err.to_app_error()
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Internal(format!("Password worker failed: {err}"))
    }
}
