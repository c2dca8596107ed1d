//! Shared Kernel
//!
//! Vocabulary shared by every crate in the workspace:
//! - Error classification and the unified [`error::app_error::AppError`]
//! - Typed identifiers ([`id::Id`])
//!
//! Only things whose meaning does not change between crates belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
