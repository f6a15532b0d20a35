//! Restaurant configuration models
//!
//! Owned by the restaurant admin surface; the booking engine only reads them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Restaurant booking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub thumbnail_url: Option<String>,
    /// IANA timezone name, e.g. "America/New_York"
    pub timezone: String,
    /// Earliest booking, in hours from now
    #[serde(default)]
    pub min_advance_hours: i32,
    /// Latest booking, in hours from now
    #[serde(default = "default_max_advance_hours")]
    pub max_advance_hours: i32,
    /// Inside this many hours before the start a cancellation is charged
    #[serde(default)]
    pub allowed_cancellation_hours: i32,
    #[serde(default)]
    pub deposit_required: bool,
    /// Deposit in major currency units (e.g. 20.00)
    #[serde(default)]
    pub deposit_amount: Decimal,
    #[serde(default = "default_currency")]
    pub deposit_currency: String,
    /// Public booking page, linked from cancellation emails
    pub booking_page_url: Option<String>,
}

fn default_max_advance_hours() -> i32 {
    24 * 60
}

fn default_currency() -> String {
    "USD".to_string()
}

/// A `{start, end}` wall-clock window in which bookings are accepted ("HH:MM")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Interchangeable physical tables of one size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableType {
    #[serde(alias = "tableCapacity")]
    pub capacity: i32,
    pub quantity: i32,
}

impl TableType {
    pub const fn new(capacity: i32, quantity: i32) -> Self {
        Self { capacity, quantity }
    }
}

/// Per-day reservation setting
///
/// Either a default for a day of week (`day_of_week`, 0 = Sunday) or an
/// override for one calendar date (`specific_date`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReservationSetting {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub day_of_week: Option<i16>,
    pub specific_date: Option<NaiveDate>,
    pub timeslot_length_minutes: i32,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub time_ranges: Vec<TimeRange>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub table_inventory: Vec<TableType>,
}
