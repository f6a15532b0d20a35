//! Stripe deposit holds via REST API (no SDK dependency)
//!
//! Holds are PaymentIntents with `capture_method=manual`: authorized when the
//! guest books, captured on a late cancellation, canceled otherwise.

use async_trait::async_trait;
use booking_engine::payment::AuthorizeRequest;
use booking_engine::{DepositGateway, DepositHold, GatewayError, IntentStatus, is_valid_intent_id};
use serde_json::Value;
use std::time::Duration;
use zeroize::Zeroizing;

const API_BASE: &str = "https://api.stripe.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: Zeroizing<String>,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Result<Self, reqwest::Error> {
        Self::with_base_url(secret_key, API_BASE)
    }

    pub fn with_base_url(
        secret_key: String,
        base_url: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            secret_key: Zeroizing::new(secret_key),
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// POST a form and decode the intent it returns
    async fn post_intent(
        &self,
        path: &str,
        form: &[(&str, String)],
        idempotency_key: Option<String>,
    ) -> Result<Value, GatewayError> {
        let mut req = self
            .client
            .post(self.url(path))
            .basic_auth(self.secret_key.as_str(), None::<&str>)
            .form(form);
        if let Some(key) = idempotency_key {
            req = req.header("Idempotency-Key", key);
        }
        decode(req.send().await.map_err(transport_error)?).await
    }
}

async fn decode(resp: reqwest::Response) -> Result<Value, GatewayError> {
    let status = resp.status();
    let body: Value = resp.json().await.map_err(transport_error)?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(api_error(status.as_u16(), &body))
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Network(e.to_string())
    }
}

/// Stripe error body → gateway error
fn api_error(status: u16, body: &Value) -> GatewayError {
    let err = &body["error"];
    let code = err["code"].as_str().unwrap_or_default();
    let kind = err["type"].as_str().unwrap_or_default();
    let message = err["message"]
        .as_str()
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {status}"));

    if code == "amount_too_small" {
        GatewayError::AmountTooSmall
    } else if status == 404 || code == "resource_missing" {
        GatewayError::NotFound(message)
    } else if kind == "card_error" {
        GatewayError::Declined(message)
    } else {
        GatewayError::Request(message)
    }
}

/// `payment_intents/{id}[/{action}]`, refusing ids that could leave the
/// payment_intents resource
fn intent_path(intent_id: &str, action: Option<&str>) -> Result<String, GatewayError> {
    if !is_valid_intent_id(intent_id) {
        return Err(GatewayError::NotFound(format!(
            "Malformed payment intent id: {intent_id}"
        )));
    }
    Ok(match action {
        Some(action) => format!("payment_intents/{intent_id}/{action}"),
        None => format!("payment_intents/{intent_id}"),
    })
}

/// Only PaymentIntent objects are accepted as responses
fn payment_intent(body: Value) -> Result<Value, GatewayError> {
    if body["object"] == "payment_intent" {
        Ok(body)
    } else {
        Err(GatewayError::Request(format!(
            "Unexpected Stripe object: {}",
            body["object"]
        )))
    }
}

fn intent_status(body: &Value) -> IntentStatus {
    body["status"]
        .as_str()
        .map(IntentStatus::parse)
        .unwrap_or(IntentStatus::Unknown)
}

#[async_trait]
impl DepositGateway for StripeGateway {
    async fn authorize(&self, req: &AuthorizeRequest) -> Result<DepositHold, GatewayError> {
        let form = [
            ("amount", req.amount_minor.to_string()),
            ("currency", req.currency.to_ascii_lowercase()),
            ("capture_method", "manual".to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("receipt_email", req.customer_email.clone()),
            ("metadata[restaurant_id]", req.restaurant_id.to_string()),
            ("metadata[customer_email]", req.customer_email.clone()),
        ];
        let body = payment_intent(self.post_intent("payment_intents", &form, None).await?)?;

        let intent_id = body["id"]
            .as_str()
            .filter(|id| is_valid_intent_id(id))
            .ok_or_else(|| GatewayError::Request(format!("Stripe authorize failed: {body}")))?;
        Ok(DepositHold {
            intent_id: intent_id.to_string(),
            client_secret: body["client_secret"].as_str().unwrap_or_default().to_string(),
            status: intent_status(&body),
        })
    }

    async fn capture(&self, intent_id: &str) -> Result<IntentStatus, GatewayError> {
        let path = intent_path(intent_id, Some("capture"))?;
        let body = self
            .post_intent(&path, &[], Some(format!("capture-{intent_id}")))
            .await?;
        Ok(intent_status(&payment_intent(body)?))
    }

    async fn void(&self, intent_id: &str) -> Result<IntentStatus, GatewayError> {
        let path = intent_path(intent_id, Some("cancel"))?;
        let body = self
            .post_intent(
                &path,
                &[("cancellation_reason", "requested_by_customer".to_string())],
                Some(format!("cancel-{intent_id}")),
            )
            .await?;
        Ok(intent_status(&payment_intent(body)?))
    }

    async fn retrieve_status(&self, intent_id: &str) -> Result<IntentStatus, GatewayError> {
        let path = intent_path(intent_id, None)?;
        let resp = self
            .client
            .get(self.url(&path))
            .basic_auth(self.secret_key.as_str(), None::<&str>)
            .send()
            .await
            .map_err(transport_error)?;
        let body = payment_intent(decode(resp).await?)?;
        Ok(intent_status(&body))
    }
}
