//! Password Codecs
//!
//! Pluggable one-way password encoding:
//! - [`Argon2Codec`]: Argon2id, PHC string with embedded salt and parameters
//! - [`BcryptCodec`]: bcrypt (`$2b$`), embedded salt and cost
//! - [`DigestCodec`]: legacy iterated SHA-256 that needs an explicit per-user salt
//!
//! Every codec takes the plaintext as a [`ClearTextPassword`], which is
//! zeroized on drop and redacted in `Debug`. An optional application-wide
//! pepper is appended to the plaintext before hashing.

mod argon;
mod bcrypt;
mod digest;

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

pub use self::argon::Argon2Codec;
pub use self::bcrypt::BcryptCodec;
pub use self::digest::DigestCodec;

/// Upper bound on plaintext length; longer input is rejected before hashing
pub const MAX_PASSWORD_LENGTH: usize = 4096;

// ============================================================================
// Error Types
// ============================================================================

/// Rejected plaintext input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password cannot be empty")]
    Empty,

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Invalid codec parameters: {0}")]
    InvalidParameters(String),

    /// The codec does not embed salt and none was supplied
    #[error("Codec {codec} requires an explicit salt")]
    MissingSalt { codec: &'static str },

    #[error("Salt contains reserved characters '{{' or '}}'")]
    InvalidSalt,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Does not implement `Clone`; whoever owns it is the only holder of the
/// plaintext, and dropping it wipes the buffer.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Wrap raw user input.
    ///
    /// Input is NFKC-normalized so visually identical passwords hash the same.
    /// No strength policy is applied: this type is used for login attempts,
    /// where any stored password must still be accepted.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let mut raw = raw;
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();

        if normalized.is_empty() {
            return Err(PasswordPolicyError::Empty);
        }

        let char_count = normalized.chars().count();
        if char_count > MAX_PASSWORD_LENGTH {
            let mut normalized = normalized;
            normalized.zeroize();
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        Ok(Self(normalized))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

/// Plaintext bytes with the pepper appended, wiped on drop
pub(crate) fn peppered(password: &ClearTextPassword, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
    let mut combined = Zeroizing::new(password.as_bytes().to_vec());
    if let Some(p) = pepper {
        combined.extend_from_slice(p);
    }
    combined
}

// ============================================================================
// Codec trait
// ============================================================================

/// One-way password encoding.
///
/// Salt-embedding codecs ignore the `salt` argument. Codecs that do not embed
/// salt require it and fail with [`PasswordHashError::MissingSalt`] otherwise.
pub trait PasswordCodec: Send + Sync {
    /// Short algorithm name for logs
    fn name(&self) -> &'static str;

    /// Whether `encode` embeds a fresh salt into its output
    fn embeds_salt(&self) -> bool {
        true
    }

    /// Hash `password` with the configured cost
    fn encode(
        &self,
        password: &ClearTextPassword,
        salt: Option<&str>,
    ) -> Result<String, PasswordHashError>;

    /// Check `password` against a stored encoding.
    ///
    /// An unparseable stored encoding never matches.
    fn verify(
        &self,
        password: &ClearTextPassword,
        encoded: &str,
        salt: Option<&str>,
    ) -> Result<bool, PasswordHashError>;

    /// Whether `encoded` was produced with another algorithm or weaker parameters
    fn needs_rehash(&self, encoded: &str) -> bool;
}

// ============================================================================
// Algorithm selection
// ============================================================================

/// Codec choice plus its cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum PasswordAlgorithm {
    Argon2id {
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    },
    Bcrypt {
        cost: u32,
    },
    Sha256Digest {
        iterations: u32,
    },
}

impl PasswordAlgorithm {
    /// OWASP baseline for Argon2id: m=19456 (19 MiB), t=2, p=1
    pub const ARGON2ID_DEFAULT: Self = Self::Argon2id {
        memory_kib: 19_456,
        iterations: 2,
        parallelism: 1,
    };

    pub const BCRYPT_DEFAULT: Self = Self::Bcrypt { cost: 12 };

    pub const SHA256_DIGEST_DEFAULT: Self = Self::Sha256Digest { iterations: 5000 };

    /// Parse an algorithm name, using default cost parameters
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "argon2" | "argon2id" => Some(Self::ARGON2ID_DEFAULT),
            "bcrypt" => Some(Self::BCRYPT_DEFAULT),
            "sha256" | "sha256_digest" => Some(Self::SHA256_DIGEST_DEFAULT),
            _ => None,
        }
    }

    /// Build the codec for this algorithm
    pub fn codec(&self, pepper: Option<&[u8]>) -> Result<Arc<dyn PasswordCodec>, PasswordHashError> {
        let pepper = pepper.map(<[u8]>::to_vec);
        let codec: Arc<dyn PasswordCodec> = match *self {
            Self::Argon2id {
                memory_kib,
                iterations,
                parallelism,
            } => Arc::new(Argon2Codec::new(memory_kib, iterations, parallelism, pepper)?),
            Self::Bcrypt { cost } => Arc::new(BcryptCodec::new(cost, pepper)?),
            Self::Sha256Digest { iterations } => Arc::new(DigestCodec::new(iterations, pepper)?),
        };
        Ok(codec)
    }
}

impl Default for PasswordAlgorithm {
    fn default() -> Self {
        Self::ARGON2ID_DEFAULT
    }
}

// ============================================================================
// Tests
// ============================================================================
