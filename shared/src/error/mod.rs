//! Unified error system for the booking workspace
//!
//! - [`ErrorCode`]: Standardized numeric error codes
//! - [`ErrorCategory`]: Classification of errors by code range
//! - [`AppError`]: Error with code, message, and details
//! - [`ApiResponse`]: Unified API response format
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Reservation errors
//! - 2xxx: Capacity / availability errors
//! - 3xxx: Management-link errors
//! - 5xxx: Payment errors
//! - 6xxx: Notification errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::validation("Invalid input")
//!     .with_detail("email", "must be a valid email");
//! assert_eq!(err.code, ErrorCode::ValidationFailed);
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(2));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
