//! Reservation Model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Reservation status
///
/// `Cancelled` and `Completed` are terminal. Everything except cancel is
/// driven by the restaurant's floor staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationStatus {
    New,
    Confirmed,
    Seated,
    ArrivingSoon,
    Late,
    NoShow,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 8] = [
        Self::New,
        Self::Confirmed,
        Self::Seated,
        Self::ArrivingSoon,
        Self::Late,
        Self::NoShow,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Confirmed => "confirmed",
            Self::Seated => "seated",
            Self::ArrivingSoon => "arriving-soon",
            Self::Late => "late",
            Self::NoShow => "no-show",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// No further mutation is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Still holds a table for availability purposes
    pub fn occupies_table(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reservation status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ReservationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for ReservationStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Reservation record
///
/// `date` plus `timeslot_start`/`timeslot_end` are restaurant-local wall
/// clock values ("HH:MM"). `timeslot_end` is computed once at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reservation {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub customer_id: Uuid,
    pub confirmation_code: String,
    pub date: NaiveDate,
    pub timeslot_start: String,
    pub timeslot_end: String,
    pub party_size: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub status: ReservationStatus,
    pub dietary_restrictions: Option<String>,
    pub special_occasion: Option<String>,
    pub special_requests: Option<String>,
    pub deposit_payment_intent_id: Option<String>,
    pub reminder_1_week_at: DateTime<Utc>,
    pub reminder_1_week_sent: bool,
    pub reminder_1_day_at: DateTime<Utc>,
    pub reminder_1_day_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in ReservationStatus::ALL {
            assert_eq!(status.as_str().parse::<ReservationStatus>(), Ok(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_status_kebab_case() {
        assert_eq!(ReservationStatus::ArrivingSoon.as_str(), "arriving-soon");
        assert_eq!(ReservationStatus::NoShow.as_str(), "no-show");
        assert!("no_show".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<_> = ReservationStatus::ALL
            .into_iter()
            .filter(ReservationStatus::is_terminal)
            .collect();
        assert_eq!(
            terminal,
            vec![ReservationStatus::Completed, ReservationStatus::Cancelled]
        );
    }

    #[test]
    fn test_only_cancelled_frees_table() {
        assert!(ReservationStatus::Completed.occupies_table());
        assert!(ReservationStatus::NoShow.occupies_table());
        assert!(!ReservationStatus::Cancelled.occupies_table());
    }
}
