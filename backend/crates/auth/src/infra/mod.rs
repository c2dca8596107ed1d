//! Infrastructure Layer
//!
//! Store implementations.

pub mod memory;
pub mod postgres;

pub use memory::{InMemorySessionStore, InMemoryUserStore};
pub use postgres::{PgSessionStore, PgUserStore};
