use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("Role name cannot be empty")]
    EmptyName,

    #[error("Role name cannot contain whitespace: {0:?}")]
    Whitespace(String),

    #[error("A user must hold at least one role")]
    NoRoles,
}

/// Role identifier such as `ROLE_USER` or `ROLE_ADMIN`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    pub const USER: &'static str = "ROLE_USER";

    pub fn new(name: impl Into<String>) -> Result<Self, RoleError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RoleError::EmptyName);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(RoleError::Whitespace(name));
        }
        Ok(Self(name))
    }

    pub fn user() -> Self {
        Self(Self::USER.to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Role {
    type Error = RoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty, ordered set of roles. Defaults to `{ROLE_USER}`.
///
/// Ordering is deterministic so two snapshots of the same set always
/// serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Role>", into = "Vec<Role>")]
pub struct Roles(BTreeSet<Role>);

impl Roles {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Result<Self, RoleError> {
        let set: BTreeSet<Role> = roles.into_iter().collect();
        if set.is_empty() {
            return Err(RoleError::NoRoles);
        }
        Ok(Self(set))
    }

    /// Parse role names, e.g. from a database column
    pub fn from_names<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self, RoleError> {
        let roles = names
            .into_iter()
            .map(Role::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(roles)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|r| r.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|r| r.0.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Roles {
    fn default() -> Self {
        Self(BTreeSet::from([Role::user()]))
    }
}

impl TryFrom<Vec<Role>> for Roles {
    type Error = RoleError;

    fn try_from(value: Vec<Role>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Roles> for Vec<Role> {
    fn from(roles: Roles) -> Self {
        roles.0.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_validation() {
        assert_eq!(Role::new(""), Err(RoleError::EmptyName));
        assert!(matches!(Role::new("ROLE ADMIN"), Err(RoleError::Whitespace(_))));
        assert_eq!(Role::new("ROLE_ADMIN").unwrap().as_str(), "ROLE_ADMIN");
    }

    #[test]
    fn test_default_roles() {
        let roles = Roles::default();
        assert_eq!(roles.len(), 1);
        assert!(roles.contains("ROLE_USER"));
    }

    #[test]
    fn test_empty_role_set_rejected() {
        assert_eq!(Roles::new(Vec::new()), Err(RoleError::NoRoles));
        assert_eq!(
            Roles::from_names(Vec::<String>::new()),
            Err(RoleError::NoRoles)
        );
    }

    #[test]
    fn test_ordering_and_dedup() {
        let roles = Roles::from_names(["ROLE_USER", "ROLE_ADMIN", "ROLE_USER"]).unwrap();
        assert_eq!(roles.names(), vec!["ROLE_ADMIN", "ROLE_USER"]);
    }

    #[test]
    fn test_serde_rejects_empty() {
        let ok: Roles = serde_json::from_str(r#"["ROLE_USER"]"#).unwrap();
        assert_eq!(ok, Roles::default());
        assert!(serde_json::from_str::<Roles>("[]").is_err());
    }
}
