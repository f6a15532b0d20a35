//! Unified error codes for the booking workspace
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Reservation errors
//! - 2xxx: Capacity / availability errors
//! - 3xxx: Management-link security errors
//! - 5xxx: Payment errors
//! - 6xxx: Notification errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a bare `u16` so HTTP clients can switch on the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Caller is not authorized for this entrypoint
    Unauthorized = 9,

    // ==================== 1xxx: Reservation ====================
    /// Reservation not found (also used for link mismatches)
    ReservationNotFound = 1001,
    /// Restaurant not found
    RestaurantNotFound = 1002,
    /// Reservation is cancelled or completed
    ReservationTerminal = 1003,
    /// Requested date is outside the booking window
    OutsideBookingWindow = 1004,
    /// Modification is not allowed inside the cancellation window
    ModificationLocked = 1005,
    /// Confirmation code generation exhausted its retries
    ConfirmationCodeExhausted = 1006,
    /// Deposit is required but no payment reference was supplied
    DepositRequired = 1007,
    /// Reservation changed between read and write
    ReservationChanged = 1008,

    // ==================== 2xxx: Capacity ====================
    /// Restaurant has no tables configured for the date
    NoTablesConfigured = 2001,
    /// No table is large enough for the party
    NoSuitableTable = 2002,
    /// Slot is not available (or was taken concurrently)
    SlotUnavailable = 2003,
    /// Slot is not one of the generated slots for the date
    SlotNotOffered = 2004,

    // ==================== 3xxx: Link ====================
    /// Management-link signature mismatch (never surfaced directly)
    LinkSignatureInvalid = 3001,
    /// Management-link could not be signed
    LinkSigningFailed = 3002,

    // ==================== 5xxx: Payment ====================
    /// Payment gateway failure
    PaymentFailed = 5001,
    /// Deposit amount is below the gateway minimum
    PaymentAmountTooSmall = 5002,
    /// Currency is not supported
    PaymentCurrencyUnsupported = 5003,
    /// Deposit hold is no longer active
    PaymentHoldInactive = 5004,
    /// Deposit capture failed
    PaymentCaptureFailed = 5005,

    // ==================== 6xxx: Notification ====================
    /// Notification could not be delivered
    NotificationFailed = 6001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Timeout error
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            // General
            Self::Success => "Operation completed successfully",
            Self::Unknown => "An unknown error occurred",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::InvalidFormat => "Invalid format",
            Self::RequiredField => "Required field is missing",
            Self::ValueOutOfRange => "Value is out of range",
            Self::Unauthorized => "Unauthorized",

            // Reservation
            Self::ReservationNotFound => "Reservation not found",
            Self::RestaurantNotFound => "Restaurant not found",
            Self::ReservationTerminal => "Reservation can no longer be changed",
            Self::OutsideBookingWindow => "Date is outside the booking window",
            Self::ModificationLocked => {
                "Reservation can no longer be modified, please contact the restaurant"
            }
            Self::ConfirmationCodeExhausted => "Could not allocate a confirmation code",
            Self::DepositRequired => "A deposit is required for this reservation",
            Self::ReservationChanged => {
                "Reservation was changed by another request, please reload and try again"
            }

            // Capacity
            Self::NoTablesConfigured => "No tables configured",
            Self::NoSuitableTable => "No table can seat this party",
            Self::SlotUnavailable => "Time slot is no longer available",
            Self::SlotNotOffered => "Time slot is not offered on this date",

            // Link
            Self::LinkSignatureInvalid => "Reservation link is invalid",
            Self::LinkSigningFailed => "Could not create reservation link",

            // Payment
            Self::PaymentFailed => "Payment failed",
            Self::PaymentAmountTooSmall => {
                "The deposit amount is too low for our payment processor to handle. \
                 Please contact the restaurant directly to make your reservation."
            }
            Self::PaymentCurrencyUnsupported => "Currency is not supported",
            Self::PaymentHoldInactive => "Deposit hold is no longer active",
            Self::PaymentCaptureFailed => "Deposit capture failed",

            // Notification
            Self::NotificationFailed => "Notification could not be sent",

            // System
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::NetworkError => "Network error",
            Self::TimeoutError => "Operation timed out",
            Self::ConfigError => "Configuration error",
        }
    }

    /// Get the category for this error code
    pub fn category(&self) -> super::category::ErrorCategory {
        super::category::ErrorCategory::from_code(self.code())
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown `u16` into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            6 => Self::InvalidFormat,
            7 => Self::RequiredField,
            8 => Self::ValueOutOfRange,
            9 => Self::Unauthorized,

            1001 => Self::ReservationNotFound,
            1002 => Self::RestaurantNotFound,
            1003 => Self::ReservationTerminal,
            1004 => Self::OutsideBookingWindow,
            1005 => Self::ModificationLocked,
            1006 => Self::ConfirmationCodeExhausted,
            1007 => Self::DepositRequired,
            1008 => Self::ReservationChanged,

            2001 => Self::NoTablesConfigured,
            2002 => Self::NoSuitableTable,
            2003 => Self::SlotUnavailable,
            2004 => Self::SlotNotOffered,

            3001 => Self::LinkSignatureInvalid,
            3002 => Self::LinkSigningFailed,

            5001 => Self::PaymentFailed,
            5002 => Self::PaymentAmountTooSmall,
            5003 => Self::PaymentCurrencyUnsupported,
            5004 => Self::PaymentHoldInactive,
            5005 => Self::PaymentCaptureFailed,

            6001 => Self::NotificationFailed,

            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::NetworkError,
            9004 => Self::TimeoutError,
            9005 => Self::ConfigError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
