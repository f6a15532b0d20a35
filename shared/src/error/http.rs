//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found (link mismatches share this status)
            Self::NotFound
            | Self::ReservationNotFound
            | Self::RestaurantNotFound
            | Self::LinkSignatureInvalid => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::ReservationTerminal
            | Self::SlotUnavailable
            | Self::ModificationLocked
            | Self::ReservationChanged => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::Unauthorized => StatusCode::UNAUTHORIZED,

            // 402 Payment Required
            Self::DepositRequired
            | Self::PaymentFailed
            | Self::PaymentAmountTooSmall
            | Self::PaymentHoldInactive
            | Self::PaymentCaptureFailed => StatusCode::PAYMENT_REQUIRED,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError | Self::ConfirmationCodeExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::LinkSigningFailed
            | Self::NotificationFailed => StatusCode::INTERNAL_SERVER_ERROR,

            // 422 for capacity outcomes the caller can act on
            Self::NoTablesConfigured | Self::NoSuitableTable | Self::SlotNotOffered => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            // 400 Bad Request (validation and format errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
