//! Restaurant timezone conversion and wall-clock formatting
//!
//! Reservations store restaurant-local wall clock strings. Every conversion
//! to an absolute instant goes through [`to_utc_instant`], which looks up the
//! offset for the calendar date being converted rather than for "now".

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, Timelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Hours to step back when probing the offset in force before a DST gap
const DST_PROBE_HOURS: i64 = 6;

const NOON: NaiveTime = match NaiveTime::from_hms_opt(12, 0, 0) {
    Some(t) => t,
    None => NaiveTime::MIN,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Invalid time of day: {0}")]
    InvalidTime(String),
}

/// Parse an IANA timezone name
pub fn parse_tz(name: &str) -> Result<Tz, TimeError> {
    name.parse::<Tz>()
        .map_err(|_| TimeError::UnknownTimezone(name.to_string()))
}

/// Instant → restaurant-local wall clock
pub fn to_restaurant_local(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// Restaurant-local wall clock → instant
///
/// Ambiguous times (clocks falling back) resolve to the earlier instant.
/// Nonexistent times (clocks springing forward) keep the offset in force
/// before the jump, which moves them forward by the size of the gap.
pub fn to_utc_instant(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    if let Some(dt) = local.and_local_timezone(tz).earliest() {
        return dt.with_timezone(&Utc);
    }

    let probe = local - Duration::hours(DST_PROBE_HOURS);
    match probe.and_local_timezone(tz).earliest() {
        Some(before) => {
            let offset = before.offset().fix().local_minus_utc();
            (local - Duration::seconds(i64::from(offset))).and_utc()
        }
        None => local.and_utc(),
    }
}

/// UTC offset in minutes in effect on `date` (measured at local noon)
pub fn timezone_offset_minutes(tz: Tz, date: NaiveDate) -> i32 {
    let local = date.and_time(NOON);
    let instant = to_utc_instant(local, tz);
    let offset = local - instant.naive_utc();
    i32::try_from(offset.num_minutes()).unwrap_or(0)
}

/// Parse a wall-clock time given as "HH:MM" or "H:MM AM|PM"
pub fn parse_wall_clock(value: &str) -> Result<NaiveTime, TimeError> {
    let trimmed = value.trim();
    let upper = trimmed.to_ascii_uppercase();
    if upper.ends_with("AM") || upper.ends_with("PM") {
        let twenty_four = to_24_hour(trimmed)?;
        return NaiveTime::parse_from_str(&twenty_four, "%H:%M")
            .map_err(|_| TimeError::InvalidTime(value.to_string()));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map_err(|_| TimeError::InvalidTime(value.to_string()))
}

/// Format a wall-clock time as "HH:MM"
pub fn format_wall_clock(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// "14:30" → "2:30 PM"
pub fn to_12_hour(value: &str) -> Result<String, TimeError> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| TimeError::InvalidTime(value.to_string()))?;
    let (pm, hour) = time.hour12();
    let suffix = if pm { "PM" } else { "AM" };
    Ok(format!("{}:{:02} {}", hour, time.minute(), suffix))
}

/// "2:30 PM" → "14:30"
pub fn to_24_hour(value: &str) -> Result<String, TimeError> {
    let invalid = || TimeError::InvalidTime(value.to_string());

    let (clock, suffix) = value.trim().rsplit_once(' ').ok_or_else(invalid)?;
    let (h, m) = clock.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&hour) || minute > 59 || m.len() != 2 {
        return Err(invalid());
    }

    let hour = match suffix.to_ascii_uppercase().as_str() {
        "AM" => hour % 12,
        "PM" => hour % 12 + 12,
        _ => return Err(invalid()),
    };
    Ok(format!("{:02}:{:02}", hour, minute))
}
