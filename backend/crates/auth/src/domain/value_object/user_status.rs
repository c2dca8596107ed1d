//! Account Status Flags
//!
//! Four independent booleans describing whether an account may be used.
//! They are plain data; evaluation lives in [`crate::domain::status_gate`].

use serde::{Deserialize, Serialize};

/// Account status flags. Every flag is phrased positively, so an account in
/// good standing has all four set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusFlags {
    pub account_non_expired: bool,
    pub account_non_locked: bool,
    pub credentials_non_expired: bool,
    pub enabled: bool,
}

impl StatusFlags {
    /// All checks pass
    pub const ACTIVE: Self = Self {
        account_non_expired: true,
        account_non_locked: true,
        credentials_non_expired: true,
        enabled: true,
    };

    pub fn with_enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }

    pub fn with_account_non_locked(self, account_non_locked: bool) -> Self {
        Self {
            account_non_locked,
            ..self
        }
    }

    pub fn with_account_non_expired(self, account_non_expired: bool) -> Self {
        Self {
            account_non_expired,
            ..self
        }
    }

    pub fn with_credentials_non_expired(self, credentials_non_expired: bool) -> Self {
        Self {
            credentials_non_expired,
            ..self
        }
    }
}

impl Default for StatusFlags {
    fn default() -> Self {
        Self::ACTIVE
    }
}
