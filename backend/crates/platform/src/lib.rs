//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain knowledge:
//! - Cryptographic utilities (SHA-256, HMAC-SHA256, Base64)
//! - Password codecs (Argon2id, bcrypt, legacy salted digest)

pub mod crypto;
pub mod password;
