//! Legacy iterated SHA-256 digest with an explicit per-user salt
//!
//! Kept for stores migrated from systems that persisted a separate salt
//! column. The salt is merged as `password{salt}`, hashed once, then
//! `iterations - 1` more times as `H(digest || merged)`. Output is base64.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::{ClearTextPassword, PasswordCodec, PasswordHashError, peppered};
use crate::crypto::{constant_time_eq, from_base64, to_base64};

pub struct DigestCodec {
    iterations: u32,
    pepper: Option<Vec<u8>>,
}

impl DigestCodec {
    pub fn new(iterations: u32, pepper: Option<Vec<u8>>) -> Result<Self, PasswordHashError> {
        if iterations == 0 {
            return Err(PasswordHashError::InvalidParameters(
                "digest iterations must be at least 1".to_string(),
            ));
        }
        Ok(Self { iterations, pepper })
    }

    fn merge(
        &self,
        password: &ClearTextPassword,
        salt: Option<&str>,
    ) -> Result<Zeroizing<Vec<u8>>, PasswordHashError> {
        let salt = salt.ok_or(PasswordHashError::MissingSalt {
            codec: "sha256_digest",
        })?;
        if salt.contains('{') || salt.contains('}') {
            return Err(PasswordHashError::InvalidSalt);
        }

        let mut merged = peppered(password, self.pepper.as_deref());
        if !salt.is_empty() {
            merged.push(b'{');
            merged.extend_from_slice(salt.as_bytes());
            merged.push(b'}');
        }
        Ok(merged)
    }

    fn digest(&self, merged: &[u8]) -> [u8; 32] {
        let mut digest: [u8; 32] = Sha256::digest(merged).into();
        for _ in 1..self.iterations {
            let mut hasher = Sha256::new();
            hasher.update(digest);
            hasher.update(merged);
            digest = hasher.finalize().into();
        }
        digest
    }
}

impl PasswordCodec for DigestCodec {
    fn name(&self) -> &'static str {
        "sha256_digest"
    }

    fn embeds_salt(&self) -> bool {
        false
    }

    fn encode(
        &self,
        password: &ClearTextPassword,
        salt: Option<&str>,
    ) -> Result<String, PasswordHashError> {
        let merged = self.merge(password, salt)?;
        Ok(to_base64(&self.digest(&merged)))
    }

    fn verify(
        &self,
        password: &ClearTextPassword,
        encoded: &str,
        salt: Option<&str>,
    ) -> Result<bool, PasswordHashError> {
        let merged = self.merge(password, salt)?;
        let Ok(stored) = from_base64(encoded) else {
            return Ok(false);
        };
        Ok(constant_time_eq(&stored, &self.digest(&merged)))
    }

    /// Always true: the digest carries no cost parameters to compare, and any
    /// modern codec is preferable.
    fn needs_rehash(&self, _encoded: &str) -> bool {
        true
    }
}
