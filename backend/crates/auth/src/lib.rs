//! Auth (Authentication) Core
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, store traits, status gate, drift check
//! - `application/` - Configuration, credential verification, session identity
//! - `infra/` - In-memory and PostgreSQL store implementations
//!
//! ## Features
//! - Login by username, email or any custom `UserPredicate`
//! - Pluggable password codecs (Argon2id, bcrypt, legacy salted SHA-256)
//! - Account status gate (expired, locked, credentials expired, disabled)
//! - Session identity re-validated against the user store on every request
//!
//! ## Security Model
//! - Unknown user and wrong password are indistinguishable to callers
//! - Account status is disclosed only after a correct password
//! - Session tokens are HMAC-signed and carry fingerprints, never hashes
//! - Any security-relevant change to the user record ends the session

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::{
    AuthConfig, CredentialVerifier, LoginLookup, RejectionReason, SessionIdentityManager,
    SessionState,
};
pub use domain::{
    EqualityStrategy, FieldEquality, IdentityToken, SessionStore, StatusViolation, UserPredicate,
    UserProperty, UserRecord, UserStore,
};
pub use error::{AuthError, AuthResult};
pub use infra::memory::{InMemorySessionStore, InMemoryUserStore};
pub use infra::postgres::{PgSessionStore, PgUserStore};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}
