//! Application Layer
//!
//! Credential verification and session identity management.

pub mod config;
pub mod credential_verifier;
pub mod session_identity;

// Re-exports
pub use config::{AuthConfig, ConfigError, LoginLookup};
pub use credential_verifier::CredentialVerifier;
pub use session_identity::{RejectionReason, SessionIdentityManager, SessionState};
