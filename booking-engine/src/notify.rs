//! Guest notifications
//!
//! The engine renders nothing transport-specific: a [`Notifier`] receives
//! the recipient, the kind and a flat parameter bag. [`render`] produces the
//! plain-text subject/body a mailer can send as-is.

use crate::time;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{Reservation, Restaurant};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Created,
    Modified,
    Cancelled,
    #[serde(rename = "reminder-1-week")]
    Reminder1Week,
    #[serde(rename = "reminder-1-day")]
    Reminder1Day,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Cancelled => "cancelled",
            Self::Reminder1Week => "reminder-1-week",
            Self::Reminder1Day => "reminder-1-day",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat parameter bag handed to the notifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationParams {
    pub restaurant_name: String,
    pub restaurant_address: String,
    pub restaurant_thumbnail: Option<String>,
    pub restaurant_timezone: String,
    pub customer_name: String,
    /// e.g. "March 14, 2026"
    pub date: String,
    /// e.g. "7:30 PM"
    pub time: String,
    pub party_size: i32,
    /// Management link, or the booking page for cancellations
    pub link: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub special_occasion: Option<String>,
    pub special_requests: Option<String>,
}

impl NotificationParams {
    pub fn new(restaurant: &Restaurant, reservation: &Reservation, link: Option<String>) -> Self {
        let time = time::to_12_hour(&reservation.timeslot_start)
            .unwrap_or_else(|_| reservation.timeslot_start.clone());
        Self {
            restaurant_name: restaurant.name.clone(),
            restaurant_address: restaurant.address.clone(),
            restaurant_thumbnail: restaurant.thumbnail_url.clone(),
            restaurant_timezone: restaurant.timezone.clone(),
            customer_name: reservation.customer_name.clone(),
            date: reservation.date.format("%B %-d, %Y").to_string(),
            time,
            party_size: reservation.party_size,
            link,
            dietary_restrictions: reservation.dietary_restrictions.clone(),
            special_occasion: reservation.special_occasion.clone(),
            special_requests: reservation.special_requests.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

pub fn render(kind: NotificationKind, p: &NotificationParams) -> RenderedMessage {
    let subject = match kind {
        NotificationKind::Created => format!("Reservation Confirmed - {}", p.restaurant_name),
        NotificationKind::Modified => format!("Reservation Modified - {}", p.restaurant_name),
        NotificationKind::Cancelled => format!("Reservation Cancelled - {}", p.restaurant_name),
        NotificationKind::Reminder1Week => format!(
            "Reminder: Your reservation at {} is in less than a week",
            p.restaurant_name
        ),
        NotificationKind::Reminder1Day => format!(
            "Reminder: Your reservation at {} is in less than a day",
            p.restaurant_name
        ),
    };

    let headline = match kind {
        NotificationKind::Created => "your reservation is confirmed.",
        NotificationKind::Modified => "your reservation has been updated.",
        NotificationKind::Cancelled => "your reservation has been cancelled.",
        NotificationKind::Reminder1Week | NotificationKind::Reminder1Day => {
            "this is a reminder of your upcoming reservation."
        }
    };

    let mut lines = vec![
        format!("Hi {}, {}", p.customer_name, headline),
        String::new(),
        format!("Restaurant: {}", p.restaurant_name),
    ];
    if !p.restaurant_address.is_empty() {
        lines.push(format!("Address: {}", p.restaurant_address));
    }
    lines.push(format!("Date: {}", p.date));
    lines.push(format!("Time: {}", p.time));
    if matches!(
        kind,
        NotificationKind::Reminder1Week | NotificationKind::Reminder1Day
    ) {
        lines.push(format!("Timezone: {}", p.restaurant_timezone));
    }
    lines.push(format!("Party size: {}", p.party_size));

    for (label, value) in [
        ("Dietary restrictions", &p.dietary_restrictions),
        ("Special occasion", &p.special_occasion),
        ("Special requests", &p.special_requests),
    ] {
        if let Some(v) = value {
            lines.push(format!("{}: {}", label, v));
        }
    }

    if let Some(link) = &p.link {
        lines.push(String::new());
        match kind {
            NotificationKind::Cancelled => lines.push(format!("Book again: {}", link)),
            _ => lines.push(format!("View or change your reservation: {}", link)),
        }
    }

    RenderedMessage {
        subject,
        body: lines.join("\n"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("Notification rejected: {0}")]
    Rejected(String),

    #[error("Notification transport failed: {0}")]
    Transport(String),
}

/// Delivers guest notifications. Failures are reported, never panicked.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        kind: NotificationKind,
        params: &NotificationParams,
    ) -> Result<(), NotifyError>;
}
