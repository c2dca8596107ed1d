//! Drift Check Strategies
//!
//! An [`EqualityStrategy`] decides which parts of a user record are captured
//! in the session token and whether a freshly fetched record still matches
//! that capture. [`FieldEquality`] is the default; consuming systems plug in
//! their own implementation to widen or narrow what counts as drift.

use platform::crypto::{sha256, to_base64url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entity::user::UserRecord;
use crate::domain::value_object::{user_role::Roles, user_status::StatusFlags};

/// Capture and compare the security-relevant part of a user record.
///
/// `snapshot` output is stored inside the signed session token. `matches`
/// must return false (never panic) on payloads it cannot interpret, so
/// tokens written by an older strategy force a re-login.
pub trait EqualityStrategy: Send + Sync {
    fn snapshot(&self, user: &UserRecord) -> Result<Value, serde_json::Error>;

    fn matches(&self, snapshot: &Value, fresh: &UserRecord) -> bool;
}

/// SHA-256 fingerprint of a secret, so tokens never carry the secret itself
pub fn fingerprint(secret: &str) -> String {
    to_base64url(&sha256(secret.as_bytes()))
}

/// Fields compared by [`FieldEquality`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonFields {
    pub username: String,
    pub password: String,
    pub salt: Option<String>,
    pub status: StatusFlags,
    pub roles: Roles,
}

impl ComparisonFields {
    pub fn of(user: &UserRecord) -> Self {
        Self {
            username: user.username.clone(),
            password: fingerprint(&user.password_hash),
            salt: user.salt.as_deref().map(fingerprint),
            status: user.status_flags,
            roles: user.roles.clone(),
        }
    }
}

/// Field-by-field comparison of username, password hash, salt, status flags
/// and roles
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldEquality;

impl EqualityStrategy for FieldEquality {
    fn snapshot(&self, user: &UserRecord) -> Result<Value, serde_json::Error> {
        serde_json::to_value(ComparisonFields::of(user))
    }

    fn matches(&self, snapshot: &Value, fresh: &UserRecord) -> bool {
        match ComparisonFields::deserialize(snapshot) {
            Ok(stored) => stored == ComparisonFields::of(fresh),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_id::UserId;

    fn record() -> UserRecord {
        UserRecord::new(
            UserId::from_uuid(uuid::Uuid::from_u128(7)),
            "alice",
            "alice@example.com",
            "hash-v1",
        )
    }

    #[test]
    fn test_snapshot_hides_password_hash() {
        let snapshot = FieldEquality.snapshot(&record()).unwrap();
        let text = snapshot.to_string();
        assert!(!text.contains("hash-v1"));
        assert_eq!(snapshot["username"], "alice");
        assert_eq!(snapshot["password"], fingerprint("hash-v1"));
    }

    #[test]
    fn test_unchanged_record_matches() {
        let user = record();
        let snapshot = FieldEquality.snapshot(&user).unwrap();
        assert!(FieldEquality.matches(&snapshot, &user));
    }

    #[test]
    fn test_email_change_is_not_drift() {
        let user = record();
        let snapshot = FieldEquality.snapshot(&user).unwrap();
        let fresh = UserRecord {
            email: "new@example.com".into(),
            ..user
        };
        assert!(FieldEquality.matches(&snapshot, &fresh));
    }

    #[test]
    fn test_each_compared_field_detects_drift() {
        let user = record();
        let snapshot = FieldEquality.snapshot(&user).unwrap();

        let renamed = UserRecord {
            username: "alice2".into(),
            ..user.clone()
        };
        let new_password = UserRecord {
            password_hash: "hash-v2".into(),
            ..user.clone()
        };
        let salted = user.clone().with_salt("s");
        let locked = user
            .clone()
            .with_status(StatusFlags::ACTIVE.with_account_non_locked(false));
        let promoted = user
            .clone()
            .with_roles(Roles::from_names(["ROLE_USER", "ROLE_ADMIN"]).unwrap());

        for fresh in [renamed, new_password, salted, locked, promoted] {
            assert!(!FieldEquality.matches(&snapshot, &fresh), "{fresh:?}");
        }
    }

    #[test]
    fn test_unreadable_snapshot_is_drift() {
        let user = record();
        assert!(!FieldEquality.matches(&Value::Null, &user));

        let mut partial = FieldEquality.snapshot(&user).unwrap();
        partial.as_object_mut().unwrap().remove("roles");
        assert!(!FieldEquality.matches(&partial, &user));

        let mut extra = FieldEquality.snapshot(&user).unwrap();
        extra
            .as_object_mut()
            .unwrap()
            .insert("added_later".into(), Value::Bool(true));
        assert!(!FieldEquality.matches(&extra, &user));
    }
}
