//! Argon2id codec (PHC string format)

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;

use super::{ClearTextPassword, PasswordCodec, PasswordHashError, peppered};

/// Argon2id with configurable memory, iterations and parallelism.
///
/// The PHC output carries algorithm, version, parameters and a fresh 128-bit
/// salt, so verification needs nothing but the stored string.
pub struct Argon2Codec {
    params: Params,
    pepper: Option<Vec<u8>>,
}

impl Argon2Codec {
    pub fn new(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
        pepper: Option<Vec<u8>>,
    ) -> Result<Self, PasswordHashError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordHashError::InvalidParameters(e.to_string()))?;
        Ok(Self { params, pepper })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordCodec for Argon2Codec {
    fn name(&self) -> &'static str {
        "argon2id"
    }

    fn encode(
        &self,
        password: &ClearTextPassword,
        _salt: Option<&str>,
    ) -> Result<String, PasswordHashError> {
        let secret = peppered(password, self.pepper.as_deref());
        let salt = SaltString::generate(OsRng);

        let hash = self
            .hasher()
            .hash_password(secret.as_slice(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn verify(
        &self,
        password: &ClearTextPassword,
        encoded: &str,
        _salt: Option<&str>,
    ) -> Result<bool, PasswordHashError> {
        let parsed = match PasswordHash::new(encoded) {
            Ok(h) => h,
            Err(_) => return Ok(false),
        };
        let secret = peppered(password, self.pepper.as_deref());

        // Parameters come from the stored hash, not from self.params
        Ok(Argon2::default().verify_password(secret.as_slice(), &parsed).is_ok())
    }

    fn needs_rehash(&self, encoded: &str) -> bool {
        let parsed = match PasswordHash::new(encoded) {
            Ok(h) => h,
            Err(_) => return true,
        };

        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() < self.params.m_cost()
                    || stored.t_cost() < self.params.t_cost()
                    || stored.p_cost() < self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}
