//! Identity Token Entity
//!
//! Minimal, signed projection of a [`UserRecord`] kept in the session store.
//!
//! ## Wire format
//! `base64url(payload) "." base64url(HMAC-SHA256(secret, base64url(payload)))`
//!
//! `payload` is a JSON array `[format_version, user_id, refreshed_at_ms, comparison]`.
//! Only the first two positions are guaranteed across versions. A token with
//! an older version still decodes (so its user can be looked up) but never
//! passes the drift check.

use std::time::Duration;

use platform::crypto::{from_base64url, hmac_sha256, hmac_sha256_verify, to_base64url};
use serde_json::Value;
use thiserror::Error;

use crate::domain::entity::user::UserRecord;
use crate::domain::equality::EqualityStrategy;
use crate::domain::value_object::user_id::UserId;

/// Version written by this build
pub const TOKEN_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token is not valid UTF-8")]
    Encoding,

    #[error("Token is not in payload.signature form")]
    Layout,

    #[error("Token signature mismatch")]
    Signature,

    #[error("Token payload invalid: {0}")]
    Payload(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityToken {
    pub format_version: u16,
    pub user_id: UserId,
    /// When the token was last derived from a fresh record (Unix ms).
    /// Absent in payloads from older layouts.
    pub refreshed_at_ms: Option<i64>,
    /// Strategy-specific capture of the record
    pub comparison: Value,
}

impl IdentityToken {
    /// Derive a token from a verified or freshly fetched record
    pub fn mint(
        user: &UserRecord,
        strategy: &dyn EqualityStrategy,
        now_ms: i64,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            format_version: TOKEN_FORMAT_VERSION,
            user_id: user.id,
            refreshed_at_ms: Some(now_ms),
            comparison: strategy.snapshot(user)?,
        })
    }

    pub fn is_current_format(&self) -> bool {
        self.format_version == TOKEN_FORMAT_VERSION
    }

    /// Idle expiry: no refresh within `ttl`
    pub fn is_expired(&self, ttl: Duration, now_ms: i64) -> bool {
        match self.refreshed_at_ms {
            Some(refreshed) => {
                let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
                now_ms.saturating_sub(refreshed) > ttl_ms
            }
            None => false,
        }
    }

    /// Does `fresh` still match what this token captured?
    pub fn matches(&self, fresh: &UserRecord, strategy: &dyn EqualityStrategy) -> bool {
        self.is_current_format()
            && self.user_id == fresh.id
            && strategy.matches(&self.comparison, fresh)
    }

    /// Serialize and sign
    pub fn encode(&self, secret: &[u8]) -> Result<Vec<u8>, TokenError> {
        let payload = serde_json::to_vec(&(
            self.format_version,
            self.user_id,
            self.refreshed_at_ms,
            &self.comparison,
        ))
        .map_err(|e| TokenError::Payload(e.to_string()))?;

        let body = to_base64url(&payload);
        let signature = to_base64url(&hmac_sha256(secret, body.as_bytes()));

        Ok(format!("{body}.{signature}").into_bytes())
    }

    /// Verify signature and parse
    pub fn decode(bytes: &[u8], secret: &[u8]) -> Result<Self, TokenError> {
        let text = std::str::from_utf8(bytes).map_err(|_| TokenError::Encoding)?;
        let (body, signature_b64) = text.split_once('.').ok_or(TokenError::Layout)?;

        let signature = from_base64url(signature_b64).map_err(|_| TokenError::Layout)?;
        if !hmac_sha256_verify(secret, body.as_bytes(), &signature) {
            return Err(TokenError::Signature);
        }

        let payload = from_base64url(body).map_err(|_| TokenError::Layout)?;
        let fields: Vec<Value> =
            serde_json::from_slice(&payload).map_err(|e| TokenError::Payload(e.to_string()))?;

        let mut fields = fields.into_iter();
        let format_version = fields
            .next()
            .and_then(|v| v.as_u64())
            .and_then(|v| u16::try_from(v).ok())
            .ok_or_else(|| TokenError::Payload("missing format version".to_string()))?;
        let user_id = fields
            .next()
            .and_then(|v| v.as_str().and_then(|s| s.parse::<UserId>().ok()))
            .ok_or_else(|| TokenError::Payload("missing user id".to_string()))?;
        let refreshed_at_ms = fields.next().and_then(|v| v.as_i64());
        let comparison = fields.next().unwrap_or(Value::Null);

        Ok(Self {
            format_version,
            user_id,
            refreshed_at_ms,
            comparison,
        })
    }
}
