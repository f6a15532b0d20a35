//! Data models
//!
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! IDs are UUID v4.

pub mod customer;
pub mod reservation;
pub mod restaurant;
pub mod slot;

// Re-exports
pub use customer::*;
pub use reservation::*;
pub use restaurant::*;
pub use slot::*;
