//! Booking policy: which setting applies, how far ahead a booking may be
//! made, and when a cancellation becomes chargeable.

use crate::time;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use shared::models::{Reservation, Restaurant, ReservationSetting};

/// A specific-date override wins over the day-of-week default.
pub fn applicable_setting(
    settings: &[ReservationSetting],
    date: NaiveDate,
) -> Option<&ReservationSetting> {
    let weekday = i16::try_from(date.weekday().num_days_from_sunday()).ok();
    settings
        .iter()
        .find(|s| s.specific_date == Some(date))
        .or_else(|| {
            settings
                .iter()
                .find(|s| s.specific_date.is_none() && s.day_of_week == weekday)
        })
}

/// Absolute start of a booking on `date` at local `start`
pub fn slot_start_instant(date: NaiveDate, start: NaiveTime, tz: Tz) -> DateTime<Utc> {
    time::to_utc_instant(date.and_time(start), tz)
}

/// Absolute start of a stored reservation
pub fn reservation_start(r: &Reservation, tz: Tz) -> Result<DateTime<Utc>, time::TimeError> {
    let start = time::parse_wall_clock(&r.timeslot_start)?;
    Ok(slot_start_instant(r.date, start, tz))
}

/// Earliest and latest bookable start, relative to `now`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

impl BookingWindow {
    pub fn for_restaurant(restaurant: &Restaurant, now: DateTime<Utc>) -> Self {
        Self {
            earliest: now + Duration::hours(i64::from(restaurant.min_advance_hours.max(0))),
            latest: now + Duration::hours(i64::from(restaurant.max_advance_hours.max(0))),
        }
    }

    pub fn contains(&self, start: DateTime<Utc>) -> bool {
        start >= self.earliest && start <= self.latest
    }
}

/// Inside the window a cancellation captures the deposit and modification
/// is refused.
pub fn within_cancellation_window(
    restaurant: &Restaurant,
    start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    start - now <= Duration::hours(i64::from(restaurant.allowed_cancellation_hours))
}
