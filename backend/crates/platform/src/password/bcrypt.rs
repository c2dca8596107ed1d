//! bcrypt codec (`$2b$<cost>$<salt><hash>`)

use super::{ClearTextPassword, PasswordCodec, PasswordHashError, peppered};

/// bcrypt with a configurable cost factor (log2 rounds).
///
/// bcrypt only looks at the first 72 bytes of input; longer plaintexts
/// (including the pepper) are truncated by the algorithm.
pub struct BcryptCodec {
    cost: u32,
    pepper: Option<Vec<u8>>,
}

impl BcryptCodec {
    pub const MIN_COST: u32 = 4;
    pub const MAX_COST: u32 = 31;

    pub fn new(cost: u32, pepper: Option<Vec<u8>>) -> Result<Self, PasswordHashError> {
        if !(Self::MIN_COST..=Self::MAX_COST).contains(&cost) {
            return Err(PasswordHashError::InvalidParameters(format!(
                "bcrypt cost must be between {} and {} (got {cost})",
                Self::MIN_COST,
                Self::MAX_COST
            )));
        }
        Ok(Self { cost, pepper })
    }

    /// Cost embedded in a modular-crypt bcrypt string
    fn stored_cost(encoded: &str) -> Option<u32> {
        let mut parts = encoded.split('$');
        // leading empty segment, then the variant
        if !parts.next()?.is_empty() {
            return None;
        }
        match parts.next()? {
            "2a" | "2b" | "2x" | "2y" => {}
            _ => return None,
        }
        parts.next()?.parse().ok()
    }
}

impl PasswordCodec for BcryptCodec {
    fn name(&self) -> &'static str {
        "bcrypt"
    }

    fn encode(
        &self,
        password: &ClearTextPassword,
        _salt: Option<&str>,
    ) -> Result<String, PasswordHashError> {
        let secret = peppered(password, self.pepper.as_deref());
        ::bcrypt::hash(secret.as_slice(), self.cost)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))
    }

    fn verify(
        &self,
        password: &ClearTextPassword,
        encoded: &str,
        _salt: Option<&str>,
    ) -> Result<bool, PasswordHashError> {
        if Self::stored_cost(encoded).is_none() {
            return Ok(false);
        }
        let secret = peppered(password, self.pepper.as_deref());
        Ok(::bcrypt::verify(secret.as_slice(), encoded).unwrap_or(false))
    }

    fn needs_rehash(&self, encoded: &str) -> bool {
        Self::stored_cost(encoded).is_none_or(|cost| cost < self.cost)
    }
}
