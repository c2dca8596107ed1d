//! Value Object Module

pub mod user_id;
pub mod user_role;
pub mod user_status;

pub use user_id::{UserId, UserMarker};
pub use user_role::{Role, RoleError, Roles};
pub use user_status::StatusFlags;
