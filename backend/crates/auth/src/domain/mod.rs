//! Domain Layer
//!
//! Entities, value objects, store traits, the account status gate and the
//! drift-check strategies.

pub mod entity;
pub mod equality;
pub mod repository;
pub mod status_gate;
pub mod value_object;

// Re-exports
pub use entity::{identity_token::IdentityToken, user::UserRecord};
pub use equality::{EqualityStrategy, FieldEquality};
pub use repository::{SessionStore, UserPredicate, UserProperty, UserStore};
pub use status_gate::{AccountStatusGate, StatusViolation};
