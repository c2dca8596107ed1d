//! Account Status Gate
//!
//! Pure evaluation of [`StatusFlags`]. Checks run in a fixed order
//! (expired, locked, credentials expired, disabled) and the first failure
//! wins, so the same record always produces the same message.

use std::fmt;

use crate::domain::value_object::user_status::StatusFlags;
use crate::error::AuthError;

/// Which status check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusViolation {
    AccountExpired,
    AccountLocked,
    CredentialsExpired,
    AccountDisabled,
}

impl StatusViolation {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AccountExpired => "account_expired",
            Self::AccountLocked => "account_locked",
            Self::CredentialsExpired => "credentials_expired",
            Self::AccountDisabled => "account_disabled",
        }
    }
}

impl fmt::Display for StatusViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<StatusViolation> for AuthError {
    fn from(violation: StatusViolation) -> Self {
        match violation {
            StatusViolation::AccountExpired => AuthError::AccountExpired,
            StatusViolation::AccountLocked => AuthError::AccountLocked,
            StatusViolation::CredentialsExpired => AuthError::CredentialsExpired,
            StatusViolation::AccountDisabled => AuthError::AccountDisabled,
        }
    }
}

type Check = fn(&StatusFlags) -> bool;

/// Evaluation order. New gates are added here and nowhere else.
const CHECKS: [(Check, StatusViolation); 4] = [
    (|f| f.account_non_expired, StatusViolation::AccountExpired),
    (|f| f.account_non_locked, StatusViolation::AccountLocked),
    (|f| f.credentials_non_expired, StatusViolation::CredentialsExpired),
    (|f| f.enabled, StatusViolation::AccountDisabled),
];

pub struct AccountStatusGate;

impl AccountStatusGate {
    /// First failing check, if any
    pub fn evaluate(flags: &StatusFlags) -> Result<(), StatusViolation> {
        match CHECKS.iter().find(|(passes, _)| !passes(flags)) {
            Some((_, violation)) => Err(*violation),
            None => Ok(()),
        }
    }
}
