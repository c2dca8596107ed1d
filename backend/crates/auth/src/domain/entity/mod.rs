//! Entity Module

pub mod identity_token;
pub mod user;

pub use identity_token::{IdentityToken, TOKEN_FORMAT_VERSION, TokenError};
pub use user::UserRecord;
