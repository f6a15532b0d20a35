//! Deposit holds
//!
//! [`DepositGateway`] is the payment processor seam (authorize with manual
//! capture, capture, void, retrieve). [`DepositProtocol`] wraps it with the
//! currency allow-list, amount conversion and retry policy: only status
//! reads are retried, never capture or void.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Shown to diners instead of the processor's "amount too small" error
pub const AMOUNT_TOO_SMALL_MESSAGE: &str = "The deposit amount is too low for our payment \
     processor to handle. Please contact the restaurant directly to make your reservation.";

/// Payment intent status as reported by the processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

impl IntentStatus {
    pub fn parse(value: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(value.to_string()))
            .unwrap_or(Self::Unknown)
    }

    /// A hold is active until it is captured or canceled. Statuses the
    /// processor reports that we do not recognise are not trusted.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::RequiresPaymentMethod
                | Self::RequiresConfirmation
                | Self::RequiresAction
                | Self::Processing
                | Self::RequiresCapture
        )
    }
}

const INTENT_PREFIX: &str = "pi_";
const MAX_INTENT_ID_LEN: usize = 255;

/// Guest-supplied intent ids end up in processor URLs, so only the
/// `pi_` + ASCII alphanumeric/underscore shape is accepted.
pub fn is_valid_intent_id(id: &str) -> bool {
    id.len() <= MAX_INTENT_ID_LEN
        && id.strip_prefix(INTENT_PREFIX).is_some_and(|rest| {
            !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
        })
}

/// Errors reported by a [`DepositGateway`] implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Amount is below the processor minimum")]
    AmountTooSmall,

    #[error("Payment intent not found: {0}")]
    NotFound(String),

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Gateway request failed: {0}")]
    Request(String),

    #[error("Gateway unreachable: {0}")]
    Network(String),

    #[error("Gateway timeout")]
    Timeout,
}

impl GatewayError {
    /// Worth retrying for idempotent reads
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}

/// Hold placement request, amount in minor units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    pub amount_minor: i64,
    /// ISO 4217, uppercase
    pub currency: String,
    pub restaurant_id: Uuid,
    pub customer_email: String,
}

/// An authorized, uncaptured hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositHold {
    pub intent_id: String,
    /// Handed to the browser to finish 3-D Secure confirmation
    pub client_secret: String,
    pub status: IntentStatus,
}

#[async_trait]
pub trait DepositGateway: Send + Sync {
    /// Place a manual-capture hold
    async fn authorize(&self, req: &AuthorizeRequest) -> Result<DepositHold, GatewayError>;

    async fn capture(&self, intent_id: &str) -> Result<IntentStatus, GatewayError>;

    async fn void(&self, intent_id: &str) -> Result<IntentStatus, GatewayError>;

    async fn retrieve_status(&self, intent_id: &str) -> Result<IntentStatus, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Currency {0} is not supported")]
    UnsupportedCurrency(String),

    #[error("Deposit amount must be positive")]
    InvalidAmount,

    #[error("{}", AMOUNT_TOO_SMALL_MESSAGE)]
    AmountTooSmall,

    #[error("Malformed payment intent id: {0}")]
    InvalidIntent(String),

    #[error("Could not place deposit hold: {0}")]
    Authorize(GatewayError),

    #[error("Could not capture deposit: {0}")]
    Capture(GatewayError),

    #[error("Could not release deposit hold: {0}")]
    Void(GatewayError),

    #[error("Could not check deposit hold: {0}")]
    Verify(GatewayError),
}

/// Amount → minor units. Every allowed currency has two decimal places.
pub fn to_minor_units(amount: Decimal) -> Result<i64, PaymentError> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::InvalidAmount);
    }
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or(PaymentError::InvalidAmount)
}

/// Deposit operations used by the lifecycle manager
#[derive(Clone)]
pub struct DepositProtocol {
    gateway: Arc<dyn DepositGateway>,
    allowed_currencies: Vec<String>,
    verify_retries: u32,
    retry_backoff: Duration,
}

impl DepositProtocol {
    pub fn new(
        gateway: Arc<dyn DepositGateway>,
        allowed_currencies: Vec<String>,
        verify_retries: u32,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            gateway,
            allowed_currencies: allowed_currencies
                .into_iter()
                .map(|c| c.to_ascii_uppercase())
                .collect(),
            verify_retries,
            retry_backoff,
        }
    }

    pub fn supports_currency(&self, currency: &str) -> bool {
        let currency = currency.to_ascii_uppercase();
        self.allowed_currencies.iter().any(|c| *c == currency)
    }

    /// Place a hold. Unsupported currencies are rejected before the
    /// processor is contacted.
    pub async fn authorize(
        &self,
        amount: Decimal,
        currency: &str,
        restaurant_id: Uuid,
        customer_email: &str,
    ) -> Result<DepositHold, PaymentError> {
        if !self.supports_currency(currency) {
            return Err(PaymentError::UnsupportedCurrency(currency.to_string()));
        }
        let req = AuthorizeRequest {
            amount_minor: to_minor_units(amount)?,
            currency: currency.to_ascii_uppercase(),
            restaurant_id,
            customer_email: customer_email.to_string(),
        };

        match self.gateway.authorize(&req).await {
            Ok(hold) => {
                tracing::info!(
                    intent_id = %hold.intent_id,
                    %restaurant_id,
                    amount_minor = req.amount_minor,
                    currency = %req.currency,
                    "Deposit hold placed"
                );
                Ok(hold)
            }
            Err(GatewayError::AmountTooSmall) => Err(PaymentError::AmountTooSmall),
            Err(e) => Err(PaymentError::Authorize(e)),
        }
    }

    /// Settle a hold. Not retried.
    pub async fn capture(&self, intent_id: &str) -> Result<IntentStatus, PaymentError> {
        check_intent_id(intent_id)?;
        let status = self
            .gateway
            .capture(intent_id)
            .await
            .map_err(PaymentError::Capture)?;
        tracing::info!(%intent_id, ?status, "Deposit captured");
        Ok(status)
    }

    /// Release a hold without charging. Not retried.
    pub async fn void(&self, intent_id: &str) -> Result<IntentStatus, PaymentError> {
        check_intent_id(intent_id)?;
        let status = self
            .gateway
            .void(intent_id)
            .await
            .map_err(PaymentError::Void)?;
        tracing::info!(%intent_id, ?status, "Deposit hold released");
        Ok(status)
    }

    /// Whether the hold is still active. Transient failures are retried.
    pub async fn verify(&self, intent_id: &str) -> Result<bool, PaymentError> {
        check_intent_id(intent_id)?;
        let mut attempt = 0;
        loop {
            match self.gateway.retrieve_status(intent_id).await {
                Ok(status) => return Ok(status.is_active()),
                Err(e) if e.is_transient() && attempt < self.verify_retries => {
                    attempt += 1;
                    tracing::warn!(%intent_id, attempt, error = %e, "Retrying deposit status check");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => return Err(PaymentError::Verify(e)),
            }
        }
    }
}

fn check_intent_id(intent_id: &str) -> Result<(), PaymentError> {
    if is_valid_intent_id(intent_id) {
        Ok(())
    } else {
        tracing::warn!(%intent_id, "Rejected malformed payment intent id");
        Err(PaymentError::InvalidIntent(intent_id.to_string()))
    }
}
