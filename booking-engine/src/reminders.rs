//! Reminder sweep
//!
//! Triggered externally (cron). Each due reservation is claimed by flipping
//! its sent flag before the message goes out, so a rerun never double-sends.

use crate::error::BookingError;
use crate::lifecycle::ReservationService;
use crate::notify::{NotificationKind, NotificationParams};
use crate::schedule;
use crate::time;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shared::models::{Reservation, Restaurant};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReminderKind {
    #[serde(rename = "1_week")]
    OneWeek,
    #[serde(rename = "1_day")]
    OneDay,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneWeek => "1_week",
            Self::OneDay => "1_day",
        }
    }

    /// How long before the slot the reminder is scheduled
    pub fn lead(&self) -> Duration {
        match self {
            Self::OneWeek => Duration::days(7),
            Self::OneDay => Duration::days(1),
        }
    }

    /// A reminder is skipped when the slot starts sooner than this,
    /// e.g. a "1 week" reminder for a booking made two days out.
    pub fn min_notice(&self) -> Duration {
        match self {
            Self::OneWeek => Duration::days(5),
            Self::OneDay => Duration::hours(12),
        }
    }

    /// Dispatch instant for a slot starting at local `start` on `date`.
    /// The lead is taken in local time so a DST change in between does not
    /// shift the reminder's wall clock.
    pub fn due_at(&self, date: NaiveDate, start: NaiveTime, tz: Tz) -> DateTime<Utc> {
        time::to_utc_instant(date.and_time(start) - self.lead(), tz)
    }

    pub fn notification(&self) -> NotificationKind {
        match self {
            Self::OneWeek => NotificationKind::Reminder1Week,
            Self::OneDay => NotificationKind::Reminder1Day,
        }
    }

    /// `(reminder_at, sent)` of this kind on a reservation
    pub fn schedule_of(&self, r: &Reservation) -> (DateTime<Utc>, bool) {
        match self {
            Self::OneWeek => (r.reminder_1_week_at, r.reminder_1_week_sent),
            Self::OneDay => (r.reminder_1_day_at, r.reminder_1_day_sent),
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown reminder type: {0}")]
pub struct UnknownReminderKind(pub String);

impl FromStr for ReminderKind {
    type Err = UnknownReminderKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1_week" => Ok(Self::OneWeek),
            "1_day" => Ok(Self::OneDay),
            other => Err(UnknownReminderKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub kind: ReminderKind,
    pub matched: usize,
    pub sent: usize,
    pub failed: usize,
}

impl ReservationService {
    /// Send every due reminder of `kind` ("1_week" or "1_day")
    pub async fn send_reminders(&self, kind: &str) -> Result<SweepReport, BookingError> {
        let kind: ReminderKind = kind.parse()?;
        let now = self.clock.now();
        let earliest_start = now + kind.min_notice();
        // zones differ by at most a day from UTC
        let min_date = earliest_start.date_naive() - Duration::days(1);

        let candidates = self.store.list_due_reminders(kind, now, min_date).await?;
        let mut restaurants: HashMap<Uuid, Option<Restaurant>> = HashMap::new();
        let mut report = SweepReport {
            kind,
            matched: 0,
            sent: 0,
            failed: 0,
        };

        for r in candidates {
            let restaurant = match restaurants.get(&r.restaurant_id) {
                Some(cached) => cached.clone(),
                None => {
                    let found = self.store.find_restaurant(r.restaurant_id).await?;
                    restaurants.insert(r.restaurant_id, found.clone());
                    found
                }
            };
            let Some(restaurant) = restaurant else {
                tracing::warn!(confirmation_code = %r.confirmation_code, "Reminder for unknown restaurant");
                continue;
            };

            let start = match time::parse_tz(&restaurant.timezone)
                .and_then(|tz| schedule::reservation_start(&r, tz))
            {
                Ok(start) => start,
                Err(e) => {
                    tracing::warn!(confirmation_code = %r.confirmation_code, error = %e, "Reminder skipped");
                    continue;
                }
            };
            if start < earliest_start {
                continue;
            }
            report.matched += 1;

            if !self.store.claim_reminder(r.id, kind).await? {
                continue;
            }

            let link = match self.links.url(&r.confirmation_code, &r.customer_email) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(confirmation_code = %r.confirmation_code, error = %e, "Reminder sent without link");
                    None
                }
            };
            let params = NotificationParams::new(&restaurant, &r, link);
            match self
                .notifier
                .send(&r.customer_email, kind.notification(), &params)
                .await
            {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    tracing::warn!(
                        confirmation_code = %r.confirmation_code,
                        kind = %kind,
                        error = %e,
                        "Reminder delivery failed"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            kind = %kind,
            matched = report.matched,
            sent = report.sent,
            failed = report.failed,
            "Reminder sweep finished"
        );
        Ok(report)
    }
}
