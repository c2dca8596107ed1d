//! Store Traits
//!
//! Narrow interfaces to the two external collaborators: the user store (the
//! source of truth for user records) and the session store (opaque bytes
//! keyed by session id). Implementations live in the infrastructure layer.

use std::fmt;
use std::time::Duration;

use crate::domain::entity::user::UserRecord;
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthResult;

/// Identifying properties a user can be looked up by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserProperty {
    Username,
    Email,
}

impl UserProperty {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "username" => Some(Self::Username),
            "email" => Some(Self::Email),
            _ => None,
        }
    }

    pub fn value_of<'a>(&self, user: &'a UserRecord) -> &'a str {
        match self {
            Self::Username => &user.username,
            Self::Email => &user.email,
        }
    }
}

impl fmt::Display for UserProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lookup condition evaluated by the user store.
///
/// Kept as data rather than a closure so SQL-backed stores can translate it
/// into a query and in-memory stores can evaluate it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserPredicate {
    /// Exact match
    Eq(UserProperty, String),
    /// ASCII case-insensitive match
    EqIgnoreCase(UserProperty, String),
    /// At least one holds; empty is false
    Any(Vec<UserPredicate>),
    /// All hold; empty is true
    All(Vec<UserPredicate>),
}

impl UserPredicate {
    pub fn eq(property: UserProperty, value: impl Into<String>) -> Self {
        Self::Eq(property, value.into())
    }

    pub fn eq_ignore_case(property: UserProperty, value: impl Into<String>) -> Self {
        Self::EqIgnoreCase(property, value.into())
    }

    /// `username = identifier OR email = identifier`
    pub fn username_or_email(identifier: &str) -> Self {
        Self::Any(vec![
            Self::eq(UserProperty::Username, identifier),
            Self::eq(UserProperty::Email, identifier),
        ])
    }

    pub fn matches(&self, user: &UserRecord) -> bool {
        match self {
            Self::Eq(property, value) => property.value_of(user) == value,
            Self::EqIgnoreCase(property, value) => {
                property.value_of(user).eq_ignore_ascii_case(value)
            }
            Self::Any(predicates) => predicates.iter().any(|p| p.matches(user)),
            Self::All(predicates) => predicates.iter().all(|p| p.matches(user)),
        }
    }
}

/// User store contract. "Not found" is `Ok(None)`, never an error.
/// If several records match, the store returns one of them.
#[trait_variant::make(UserStore: Send)]
pub trait LocalUserStore {
    /// Single-property exact match
    async fn find_by_property(
        &self,
        property: UserProperty,
        value: &str,
    ) -> AuthResult<Option<UserRecord>>;

    /// Custom lookup (e.g. username OR email)
    async fn find_by_predicate(&self, predicate: &UserPredicate)
    -> AuthResult<Option<UserRecord>>;

    /// Lookup by the stable id
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<UserRecord>>;
}

/// Session store contract: opaque payloads keyed by session id.
///
/// `put` replaces any previous payload (last writer wins). `delete` of an
/// unknown id succeeds.
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    async fn get(&self, session_id: &str) -> AuthResult<Option<Vec<u8>>>;

    async fn put(&self, session_id: &str, payload: Vec<u8>, ttl: Duration) -> AuthResult<()>;

    async fn delete(&self, session_id: &str) -> AuthResult<()>;
}
