//! Shared types for the booking workspace
//!
//! Domain models, request payloads and the unified error system used by
//! `booking-engine` and `booking-cloud`.

pub mod error;
pub mod models;
pub mod request;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
