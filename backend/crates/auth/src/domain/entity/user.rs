//! User Record Entity
//!
//! Snapshot of a principal's identity and security fields as returned by a
//! user store. Records are values: a component that fetched one owns it, and
//! a newer fetch produces a new record rather than updating an old one.

use std::fmt;

use crate::domain::status_gate::{AccountStatusGate, StatusViolation};
use crate::domain::value_object::{
    user_id::UserId, user_role::Roles, user_status::StatusFlags,
};

/// Authenticated principal snapshot
///
/// Only `id` is stable across fetches; every other field may change in the
/// backing store between two requests.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    /// Unique among active records
    pub username: String,
    /// Unique among active records
    pub email: String,
    /// Codec output; never logged
    pub password_hash: String,
    /// Explicit salt for codecs that do not embed one
    pub salt: Option<String>,
    pub status_flags: StatusFlags,
    pub roles: Roles,
}

impl UserRecord {
    /// Active record holding `{ROLE_USER}` and no explicit salt
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            salt: None,
            status_flags: StatusFlags::default(),
            roles: Roles::default(),
        }
    }

    pub fn with_roles(self, roles: Roles) -> Self {
        Self { roles, ..self }
    }

    pub fn with_status(self, status_flags: StatusFlags) -> Self {
        Self {
            status_flags,
            ..self
        }
    }

    pub fn with_salt(self, salt: impl Into<String>) -> Self {
        Self {
            salt: Some(salt.into()),
            ..self
        }
    }

    /// Run the account status gate over this record's flags
    pub fn check_status(&self) -> Result<(), StatusViolation> {
        AccountStatusGate::evaluate(&self.status_flags)
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains(name)
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[HASH]")
            .field("salt", &self.salt.as_ref().map(|_| "[SALT]"))
            .field("status_flags", &self.status_flags)
            .field("roles", &self.roles)
            .finish()
    }
}
