//! Request payloads
//!
//! Every payload is validated once at the boundary with `validator`; the
//! resulting `ValidationErrors` converts into an [`AppError`] carrying one
//! detail entry per failing field.

use crate::error::{AppError, ErrorCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Accepts "HH:MM" (24-hour) or "H:MM AM|PM"
fn validate_wall_clock(value: &str) -> Result<(), ValidationError> {
    let v = value.trim();
    let (clock, twelve_hour) = match v.rsplit_once(' ') {
        Some((clock, suffix)) if matches!(suffix.to_ascii_uppercase().as_str(), "AM" | "PM") => {
            (clock, true)
        }
        _ => (v, false),
    };
    let valid = clock.split_once(':').is_some_and(|(h, m)| {
        let max_hour = if twelve_hour { 12 } else { 23 };
        let min_hour = if twelve_hour { 1 } else { 0 };
        m.len() == 2
            && matches!(h.parse::<u32>(), Ok(h) if (min_hour..=max_hour).contains(&h))
            && matches!(m.parse::<u32>(), Ok(m) if m < 60)
    });
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("time_format");
        err.message = Some("Time must look like 19:30 or 7:30 PM".into());
        Err(err)
    }
}

const MIN_PHONE_LEN: usize = 8;

/// Checked on the trimmed value, which is what gets stored
fn validate_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Name is required".into());
        return Err(err);
    }
    Ok(())
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if value.trim().chars().count() < MIN_PHONE_LEN {
        let mut err = ValidationError::new("length");
        err.message = Some("Invalid phone number".into());
        return Err(err);
    }
    Ok(())
}

/// `GET /api/restaurants/{id}/availability`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    #[validate(range(min = 1, message = "Party size must be at least 1"))]
    pub party_size: i32,
}

/// Create a reservation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReservationRequest {
    pub restaurant_id: Uuid,
    pub date: NaiveDate,
    #[validate(custom(function = "validate_wall_clock"))]
    pub time_slot_start: String,
    #[validate(range(min = 1, message = "Party size must be at least 1"))]
    pub party_size: i32,
    #[validate(custom(function = "validate_name"))]
    pub customer_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub customer_email: String,
    #[validate(custom(function = "validate_phone"))]
    pub customer_phone: String,
    pub dietary_restrictions: Option<String>,
    pub other_dietary_restrictions: Option<String>,
    pub special_occasion: Option<String>,
    pub other_special_occasion: Option<String>,
    pub special_requests: Option<String>,
    /// Deposit hold obtained through `POST /api/payments/holds`
    pub payment_intent_id: Option<String>,
}

/// Normalized guest preferences as stored on the reservation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestPreferences {
    pub dietary_restrictions: Option<String>,
    pub special_occasion: Option<String>,
    pub special_requests: Option<String>,
}

/// "other" takes the free-text companion, "none" and blanks become absent
fn pick_choice(choice: Option<&str>, other: Option<&str>) -> Option<String> {
    let choice = choice.map(str::trim).filter(|c| !c.is_empty())?;
    match choice {
        "none" => None,
        "other" => other
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string),
        c => Some(c.to_string()),
    }
}

impl CreateReservationRequest {
    pub fn preferences(&self) -> GuestPreferences {
        GuestPreferences {
            dietary_restrictions: pick_choice(
                self.dietary_restrictions.as_deref(),
                self.other_dietary_restrictions.as_deref(),
            ),
            special_occasion: pick_choice(
                self.special_occasion.as_deref(),
                self.other_special_occasion.as_deref(),
            ),
            special_requests: self
                .special_requests
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Modify an existing reservation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ModifyReservationRequest {
    pub date: NaiveDate,
    #[validate(custom(function = "validate_wall_clock"))]
    pub time_slot_start: String,
    #[validate(range(min = 1, message = "Party size must be at least 1"))]
    pub party_size: i32,
    /// Replaces the stored deposit reference when present
    pub payment_intent_id: Option<String>,
}

/// Authorize a deposit hold for a restaurant
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HoldRequest {
    pub restaurant_id: Uuid,
    #[validate(email(message = "Invalid email address"))]
    pub customer_email: String,
}

/// `GET /api/cron/reminders?type=...`
#[derive(Debug, Clone, Deserialize)]
pub struct ReminderQuery {
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let mut err = AppError::new(ErrorCode::ValidationFailed);
        for (field, field_errors) in fields {
            let messages: Vec<Value> = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .map(Value::from)
                .collect();
            err = err.with_detail(field.to_string(), Value::Array(messages));
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateReservationRequest {
        CreateReservationRequest {
            restaurant_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            time_slot_start: "19:00".to_string(),
            party_size: 2,
            customer_name: "Ann".to_string(),
            customer_email: "ann@example.com".to_string(),
            customer_phone: "+15550100".to_string(),
            dietary_restrictions: None,
            other_dietary_restrictions: None,
            special_occasion: None,
            other_special_occasion: None,
            special_requests: None,
            payment_intent_id: None,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn test_each_invalid_field_is_reported() {
        let mut req = create_request();
        req.customer_name = String::new();
        req.customer_email = "not-an-email".to_string();
        req.customer_phone = "123".to_string();
        req.party_size = 0;

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("customer_name"));
        assert!(fields.contains_key("customer_email"));
        assert!(fields.contains_key("customer_phone"));
        assert!(fields.contains_key("party_size"));
    }

    #[test]
    fn test_whitespace_only_name_is_rejected() {
        for blank in ["   ", "\t", " \n "] {
            let mut req = create_request();
            req.customer_name = blank.to_string();
            let errors = req.validate().unwrap_err();
            let fields = errors.field_errors();
            assert_eq!(
                fields["customer_name"][0].message.as_deref(),
                Some("Name is required")
            );
        }

        let mut req = create_request();
        req.customer_name = "  Ann  ".to_string();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_phone_length_ignores_padding() {
        let mut req = create_request();
        req.customer_phone = "   1234   ".to_string();
        assert!(req.validate().unwrap_err().field_errors().contains_key("customer_phone"));

        req.customer_phone = " 12345678 ".to_string();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_wall_clock_formats() {
        assert!(validate_wall_clock("19:30").is_ok());
        assert!(validate_wall_clock("7:30 PM").is_ok());
        assert!(validate_wall_clock("12:00 am").is_ok());
        assert!(validate_wall_clock("24:00").is_err());
        assert!(validate_wall_clock("13:00 PM").is_err());
        assert!(validate_wall_clock("7pm").is_err());
    }

    #[test]
    fn test_preferences_normalization() {
        let mut req = create_request();
        req.dietary_restrictions = Some("other".to_string());
        req.other_dietary_restrictions = Some("No shellfish".to_string());
        req.special_occasion = Some("none".to_string());
        req.special_requests = Some("  ".to_string());

        let prefs = req.preferences();
        assert_eq!(prefs.dietary_restrictions.as_deref(), Some("No shellfish"));
        assert_eq!(prefs.special_occasion, None);
        assert_eq!(prefs.special_requests, None);

        req.special_occasion = Some("birthday".to_string());
        assert_eq!(req.preferences().special_occasion.as_deref(), Some("birthday"));
    }

    #[test]
    fn test_validation_errors_become_details() {
        let mut req = create_request();
        req.customer_email = "nope".to_string();
        let err: AppError = req.validate().unwrap_err().into();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(
            details.get("customer_email").unwrap(),
            &serde_json::json!(["Invalid email address"])
        );
    }
}
