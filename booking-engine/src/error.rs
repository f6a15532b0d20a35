//! Engine error type and its mapping onto [`AppError`]

use crate::capacity::CapacityError;
use crate::link::LinkError;
use crate::payment::PaymentError;
use crate::reminders::UnknownReminderKind;
use crate::repository::RepoError;
use crate::time::TimeError;
use chrono::{DateTime, Utc};
use shared::error::{AppError, ErrorCode};
use shared::models::ReservationStatus;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(Uuid),

    #[error("Reservation not found")]
    ReservationNotFound,

    /// Link signature mismatch. Reported exactly like an unknown code.
    #[error("Reservation link rejected")]
    Security,

    #[error("Reservation is {0}")]
    Terminal(ReservationStatus),

    #[error("Requested start is outside the booking window ({earliest} .. {latest})")]
    OutsideBookingWindow {
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    },

    #[error("Reservation is inside the cancellation window and can no longer be modified")]
    ModificationLocked,

    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error("Time slot {0} is not offered on this date")]
    SlotNotOffered(String),

    #[error("Time slot {0} is no longer available")]
    SlotUnavailable(String),

    #[error("Reservation was changed by a concurrent request")]
    ConcurrentUpdate,

    #[error("Confirmation code allocation failed after {attempts} attempts")]
    CodeExhausted { attempts: u32 },

    #[error("A deposit is required for this reservation")]
    DepositRequired,

    #[error("Deposit hold is no longer active")]
    HoldInactive,

    #[error("Restaurant {0} does not take deposits")]
    NoDepositPolicy(Uuid),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("Restaurant configuration error: {0}")]
    Time(#[from] TimeError),

    #[error(transparent)]
    ReminderKind(#[from] UnknownReminderKind),

    #[error("Persistence failure: {0}")]
    Persistence(RepoError),
}

impl From<RepoError> for BookingError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::SlotTaken => Self::SlotUnavailable(String::new()),
            RepoError::Stale(_) => Self::ConcurrentUpdate,
            other => Self::Persistence(other),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::Validation(errors) => errors.into(),
            BookingError::RestaurantNotFound(id) => {
                AppError::new(ErrorCode::RestaurantNotFound).with_detail("restaurant_id", id.to_string())
            }
            BookingError::ReservationNotFound | BookingError::Security => {
                AppError::reservation_not_found()
            }
            BookingError::Terminal(status) => {
                AppError::new(ErrorCode::ReservationTerminal).with_detail("status", status.as_str())
            }
            BookingError::OutsideBookingWindow { earliest, latest } => {
                AppError::new(ErrorCode::OutsideBookingWindow)
                    .with_detail("date", "outside booking window")
                    .with_detail("earliest", earliest.to_rfc3339())
                    .with_detail("latest", latest.to_rfc3339())
            }
            BookingError::ModificationLocked => AppError::new(ErrorCode::ModificationLocked),
            BookingError::Capacity(CapacityError::NoTablesConfigured) => {
                AppError::new(ErrorCode::NoTablesConfigured)
            }
            BookingError::Capacity(CapacityError::NoSuitableTable { max_capacity }) => {
                AppError::new(ErrorCode::NoSuitableTable).with_detail("max_capacity", max_capacity)
            }
            BookingError::SlotNotOffered(slot) => {
                AppError::new(ErrorCode::SlotNotOffered).with_detail("time_slot_start", slot)
            }
            BookingError::SlotUnavailable(slot) if slot.is_empty() => {
                AppError::new(ErrorCode::SlotUnavailable)
            }
            BookingError::SlotUnavailable(slot) => {
                AppError::new(ErrorCode::SlotUnavailable).with_detail("time_slot_start", slot)
            }
            BookingError::ConcurrentUpdate => AppError::new(ErrorCode::ReservationChanged),
            BookingError::CodeExhausted { .. } => AppError::new(ErrorCode::ConfirmationCodeExhausted),
            BookingError::DepositRequired => AppError::new(ErrorCode::DepositRequired),
            BookingError::HoldInactive => AppError::new(ErrorCode::PaymentHoldInactive),
            BookingError::NoDepositPolicy(id) => {
                AppError::with_message(ErrorCode::InvalidRequest, "This restaurant does not take deposits")
                    .with_detail("restaurant_id", id.to_string())
            }
            BookingError::Payment(p) => payment_error(p),
            BookingError::Link(_) => AppError::new(ErrorCode::LinkSigningFailed),
            BookingError::Time(t) => AppError::with_message(ErrorCode::ConfigError, t.to_string()),
            BookingError::ReminderKind(k) => {
                AppError::with_message(ErrorCode::ValidationFailed, k.to_string())
                    .with_detail("type", k.0)
            }
            BookingError::Persistence(e) => {
                tracing::error!(error = %e, "Persistence failure");
                AppError::database("Database error")
            }
        }
    }
}

fn payment_error(e: PaymentError) -> AppError {
    match e {
        PaymentError::UnsupportedCurrency(c) => {
            AppError::new(ErrorCode::PaymentCurrencyUnsupported).with_detail("currency", c)
        }
        PaymentError::InvalidAmount => {
            AppError::with_message(ErrorCode::ValueOutOfRange, e.to_string())
        }
        PaymentError::AmountTooSmall => AppError::new(ErrorCode::PaymentAmountTooSmall),
        PaymentError::InvalidIntent(id) => {
            AppError::with_message(ErrorCode::ValidationFailed, "Invalid payment intent id")
                .with_detail("payment_intent_id", id)
        }
        PaymentError::Capture(_) => AppError::with_message(ErrorCode::PaymentCaptureFailed, e.to_string()),
        PaymentError::Authorize(_) | PaymentError::Void(_) | PaymentError::Verify(_) => {
            AppError::with_message(ErrorCode::PaymentFailed, e.to_string())
        }
    }
}
