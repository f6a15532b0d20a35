//! Reservation lifecycle
//!
//! [`ReservationService`] is the only writer of reservations. Every
//! mutating call validates first, talks to the payment gateway second and
//! writes last; notification failures never undo a write and come back as
//! a `warning` on the receipt instead.

use crate::capacity::CapacityError;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::confirmation::{self, CodeAllocation};
use crate::error::BookingError;
use crate::link::{LinkError, LinkSigner};
use crate::notify::{NotificationKind, NotificationParams, Notifier};
use crate::payment::{DepositGateway, DepositHold, DepositProtocol};
use crate::reminders::ReminderKind;
use crate::repository::{ListScope, RepoError, ReservationStore};
use crate::schedule::{self, BookingWindow};
use crate::slots::{self, CapacityGuard, SlotOutcome, SlotRequest};
use crate::time;
use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use shared::models::{Reservation, ReservationSetting, ReservationStatus, Restaurant, TimeSlot};
use shared::request::{
    AvailabilityQuery, CreateReservationRequest, HoldRequest, ModifyReservationRequest,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Attached to a successful result when the guest could not be emailed
pub const NOTIFICATION_WARNING: &str =
    "Your reservation was saved, but we could not send the confirmation email.";

/// Slots for one date, as offered to the guest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub date: NaiveDate,
    pub party_size: i32,
    pub timezone: String,
    pub slots: Vec<TimeSlot>,
    /// Set when the party cannot be seated at all on this date
    pub diagnostic: Option<CapacityError>,
}

/// Result of create and modify
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingReceipt {
    pub reservation: Reservation,
    /// `/reservations/{code}/{mac}`
    pub management_path: String,
    pub management_url: String,
    pub warning: Option<String>,
}

/// What happened to the deposit hold on cancellation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DepositOutcome {
    NoDeposit,
    /// Late cancellation fee charged
    Captured { intent_id: String },
    Released { intent_id: String },
    /// Release failed; the hold lapses on the processor's schedule
    LeftToExpire { intent_id: String },
    /// Already captured or canceled before this call
    Inactive { intent_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancellationReceipt {
    pub reservation: Reservation,
    pub deposit: DepositOutcome,
    pub warning: Option<String>,
}

/// A requested slot that passed every check, with the guard the store
/// re-evaluates under its write lock
struct PlannedSlot {
    timeslot_start: String,
    timeslot_end: String,
    start: DateTime<Utc>,
    guard: CapacityGuard,
}

pub struct ReservationService {
    pub(crate) store: Arc<dyn ReservationStore>,
    pub(crate) deposits: DepositProtocol,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) links: LinkSigner,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: EngineConfig,
}

impl ReservationService {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        gateway: Arc<dyn DepositGateway>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        link_secret: impl AsRef<[u8]>,
        config: EngineConfig,
    ) -> Result<Self, LinkError> {
        let links = LinkSigner::new(link_secret, config.public_base_url.clone())?;
        let deposits = DepositProtocol::new(
            gateway,
            config.allowed_currencies.clone(),
            config.verify_retries,
            config.verify_backoff,
        );
        Ok(Self {
            store,
            deposits,
            notifier,
            links,
            clock,
            config,
        })
    }

    pub fn links(&self) -> &LinkSigner {
        &self.links
    }

    // ========== Reads ==========

    /// Bookable slots for a date and party size
    pub async fn available_slots(
        &self,
        restaurant_id: Uuid,
        query: &AvailabilityQuery,
    ) -> Result<Availability, BookingError> {
        query.validate()?;
        let restaurant = self.load_restaurant(restaurant_id).await?;
        let tz = time::parse_tz(&restaurant.timezone)?;

        let day = self
            .day_outcome(&restaurant, tz, query.date, query.party_size, None)
            .await?;
        let (slots, diagnostic) = match day {
            Some((_, outcome)) => (outcome.slots, outcome.diagnostic),
            None => (Vec::new(), None),
        };
        Ok(Availability {
            date: query.date,
            party_size: query.party_size,
            timezone: restaurant.timezone,
            slots,
            diagnostic,
        })
    }

    /// Look up a reservation through its management link
    ///
    /// An unknown code and a wrong tag produce the same error.
    pub async fn access(&self, code: &str, mac: &str) -> Result<Reservation, BookingError> {
        let reservation = self
            .store
            .find_by_code(code)
            .await?
            .ok_or(BookingError::ReservationNotFound)?;
        if !self
            .links
            .verify(&reservation.confirmation_code, &reservation.customer_email, mac)
        {
            tracing::warn!(confirmation_code = %code, "Management link rejected");
            return Err(BookingError::Security);
        }
        Ok(reservation)
    }

    /// Everything except cancelled reservations
    pub async fn list_active(
        &self,
        restaurant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Reservation>, BookingError> {
        Ok(self
            .store
            .list_reservations(restaurant_id, from, to, ListScope::Active)
            .await?)
    }

    /// Every reservation in the range, terminal ones included
    pub async fn list_all(
        &self,
        restaurant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Reservation>, BookingError> {
        Ok(self
            .store
            .list_reservations(restaurant_id, from, to, ListScope::All)
            .await?)
    }

    // ========== Deposits ==========

    /// Place the restaurant's configured deposit as an uncaptured hold
    pub async fn place_deposit_hold(&self, req: &HoldRequest) -> Result<DepositHold, BookingError> {
        req.validate()?;
        let restaurant = self.load_restaurant(req.restaurant_id).await?;
        if !restaurant.deposit_required {
            return Err(BookingError::NoDepositPolicy(restaurant.id));
        }
        Ok(self
            .deposits
            .authorize(
                restaurant.deposit_amount,
                &restaurant.deposit_currency,
                restaurant.id,
                &req.customer_email,
            )
            .await?)
    }

    // ========== Transitions ==========

    pub async fn create(&self, req: CreateReservationRequest) -> Result<BookingReceipt, BookingError> {
        req.validate()?;
        let restaurant = self.load_restaurant(req.restaurant_id).await?;
        let tz = time::parse_tz(&restaurant.timezone)?;

        let planned = self
            .plan_slot(&restaurant, tz, req.date, &req.time_slot_start, req.party_size, None)
            .await?;
        let deposit = self
            .check_deposit(&restaurant, req.payment_intent_id.as_deref())
            .await?;

        let now = self.clock.now();
        let email = req.customer_email.trim().to_string();
        let customer = self
            .store
            .upsert_customer(&email, req.customer_name.trim(), req.customer_phone.trim(), now)
            .await?;

        let prefs = req.preferences();
        let start = time::parse_wall_clock(&planned.timeslot_start)?;
        let draft = Reservation {
            id: Uuid::new_v4(),
            restaurant_id: restaurant.id,
            customer_id: customer.id,
            confirmation_code: String::new(),
            date: req.date,
            timeslot_start: planned.timeslot_start.clone(),
            timeslot_end: planned.timeslot_end.clone(),
            party_size: req.party_size,
            customer_name: req.customer_name.trim().to_string(),
            customer_email: email,
            customer_phone: req.customer_phone.trim().to_string(),
            status: ReservationStatus::New,
            dietary_restrictions: prefs.dietary_restrictions,
            special_occasion: prefs.special_occasion,
            special_requests: prefs.special_requests,
            deposit_payment_intent_id: deposit,
            reminder_1_week_at: ReminderKind::OneWeek.due_at(req.date, start, tz),
            reminder_1_week_sent: false,
            reminder_1_day_at: ReminderKind::OneDay.due_at(req.date, start, tz),
            reminder_1_day_sent: false,
            created_at: now,
            updated_at: now,
        };

        let store = &self.store;
        let guard = &planned.guard;
        let allocation = confirmation::with_unique_code(
            self.config.code_attempts,
            self.config.code_length,
            |code| {
                let reservation = Reservation {
                    confirmation_code: code,
                    ..draft.clone()
                };
                async move {
                    store
                        .insert_reservation(&reservation, guard)
                        .await
                        .map(|()| reservation)
                }
            },
        )
        .await
        .map_err(|e| slot_error(e, &planned))?;

        let reservation = match allocation {
            CodeAllocation::Allocated(r) => r,
            CodeAllocation::Exhausted { attempts } => {
                tracing::error!(attempts, restaurant_id = %restaurant.id, "Confirmation code space exhausted");
                return Err(BookingError::CodeExhausted { attempts });
            }
        };

        let (management_path, management_url) = self.management_link(&reservation)?;
        tracing::info!(
            confirmation_code = %reservation.confirmation_code,
            restaurant_id = %restaurant.id,
            date = %reservation.date,
            start = %reservation.timeslot_start,
            party_size = reservation.party_size,
            "Reservation created"
        );

        let warning = self
            .notify(
                NotificationKind::Created,
                &restaurant,
                &reservation,
                Some(management_url.clone()),
            )
            .await;
        Ok(BookingReceipt {
            reservation,
            management_path,
            management_url,
            warning,
        })
    }

    /// Move a reservation to a new date, slot or party size
    ///
    /// The status goes back to `new` and the reminders are rescheduled.
    /// The confirmation code, and with it the management link, is kept.
    pub async fn modify(
        &self,
        code: &str,
        mac: &str,
        req: ModifyReservationRequest,
    ) -> Result<BookingReceipt, BookingError> {
        req.validate()?;
        let current = self.access(code, mac).await?;
        if current.status.is_terminal() {
            return Err(BookingError::Terminal(current.status));
        }

        let restaurant = self.load_restaurant(current.restaurant_id).await?;
        let tz = time::parse_tz(&restaurant.timezone)?;
        let now = self.clock.now();
        let current_start = schedule::reservation_start(&current, tz)?;
        if schedule::within_cancellation_window(&restaurant, current_start, now) {
            return Err(BookingError::ModificationLocked);
        }

        let planned = self
            .plan_slot(
                &restaurant,
                tz,
                req.date,
                &req.time_slot_start,
                req.party_size,
                Some(current.id),
            )
            .await?;

        let replacement = match req.payment_intent_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() && current.deposit_payment_intent_id.as_deref() != Some(id) => {
                if !self.deposits.verify(id).await? {
                    return Err(BookingError::HoldInactive);
                }
                Some(id.to_string())
            }
            _ => None,
        };

        let start = time::parse_wall_clock(&planned.timeslot_start)?;
        let updated = Reservation {
            date: req.date,
            timeslot_start: planned.timeslot_start.clone(),
            timeslot_end: planned.timeslot_end.clone(),
            party_size: req.party_size,
            status: ReservationStatus::New,
            deposit_payment_intent_id: replacement
                .clone()
                .or_else(|| current.deposit_payment_intent_id.clone()),
            reminder_1_week_at: ReminderKind::OneWeek.due_at(req.date, start, tz),
            reminder_1_week_sent: false,
            reminder_1_day_at: ReminderKind::OneDay.due_at(req.date, start, tz),
            reminder_1_day_sent: false,
            updated_at: next_version(current.updated_at, now),
            ..current.clone()
        };
        match self
            .store
            .update_reservation(&updated, current.updated_at, Some(&planned.guard))
            .await
        {
            Ok(()) => {}
            Err(RepoError::Stale(_)) => return Err(self.lost_race(code).await),
            Err(e) => return Err(slot_error(e, &planned)),
        }

        tracing::info!(
            confirmation_code = %updated.confirmation_code,
            from = %format!("{} {}", current.date, current.timeslot_start),
            to = %format!("{} {}", updated.date, updated.timeslot_start),
            party_size = updated.party_size,
            "Reservation modified"
        );

        if replacement.is_some()
            && let Some(superseded) = current.deposit_payment_intent_id.as_deref()
            && let Err(e) = self.deposits.void(superseded).await
        {
            tracing::warn!(intent_id = %superseded, error = %e, "Superseded deposit hold not released");
        }

        let (management_path, management_url) = self.management_link(&updated)?;
        let warning = self
            .notify(
                NotificationKind::Modified,
                &restaurant,
                &updated,
                Some(management_url.clone()),
            )
            .await;
        Ok(BookingReceipt {
            reservation: updated,
            management_path,
            management_url,
            warning,
        })
    }

    /// Cancel a reservation
    ///
    /// Inside the cancellation window an active deposit hold is captured
    /// and a capture failure aborts the cancellation. Outside it the hold
    /// is released.
    pub async fn cancel(&self, code: &str, mac: &str) -> Result<CancellationReceipt, BookingError> {
        let current = self.access(code, mac).await?;
        if current.status.is_terminal() {
            return Err(BookingError::Terminal(current.status));
        }

        let restaurant = self.load_restaurant(current.restaurant_id).await?;
        let tz = time::parse_tz(&restaurant.timezone)?;
        let now = self.clock.now();
        let start = schedule::reservation_start(&current, tz)?;
        let late = schedule::within_cancellation_window(&restaurant, start, now);

        let deposit = match current.deposit_payment_intent_id.clone() {
            None => DepositOutcome::NoDeposit,
            Some(intent_id) => {
                if !self.deposits.verify(&intent_id).await? {
                    DepositOutcome::Inactive { intent_id }
                } else if late {
                    self.deposits.capture(&intent_id).await?;
                    DepositOutcome::Captured { intent_id }
                } else {
                    match self.deposits.void(&intent_id).await {
                        Ok(_) => DepositOutcome::Released { intent_id },
                        Err(e) => {
                            tracing::warn!(%intent_id, error = %e, "Deposit hold not released");
                            DepositOutcome::LeftToExpire { intent_id }
                        }
                    }
                }
            }
        };

        let read_version = current.updated_at;
        let cancelled = Reservation {
            status: ReservationStatus::Cancelled,
            updated_at: next_version(read_version, now),
            ..current
        };
        if let Err(e) = self
            .store
            .update_reservation(&cancelled, read_version, None)
            .await
        {
            if matches!(
                deposit,
                DepositOutcome::Captured { .. } | DepositOutcome::Released { .. }
            ) {
                tracing::error!(
                    confirmation_code = %cancelled.confirmation_code,
                    error = %e,
                    deposit = ?deposit,
                    "Deposit settled but cancellation not saved"
                );
            }
            return Err(match e {
                RepoError::Stale(_) => self.lost_race(code).await,
                other => other.into(),
            });
        }

        tracing::info!(
            confirmation_code = %cancelled.confirmation_code,
            late,
            deposit = ?deposit,
            "Reservation cancelled"
        );

        let warning = self
            .notify(
                NotificationKind::Cancelled,
                &restaurant,
                &cancelled,
                restaurant.booking_page_url.clone(),
            )
            .await;
        Ok(CancellationReceipt {
            reservation: cancelled,
            deposit,
            warning,
        })
    }

    // ========== Helpers ==========

    /// Error for a write that lost to a concurrent one
    async fn lost_race(&self, code: &str) -> BookingError {
        tracing::warn!(confirmation_code = %code, "Reservation changed concurrently");
        match self.store.find_by_code(code).await {
            Ok(Some(latest)) if latest.status.is_terminal() => BookingError::Terminal(latest.status),
            Ok(_) => BookingError::ConcurrentUpdate,
            Err(e) => e.into(),
        }
    }

    async fn load_restaurant(&self, id: Uuid) -> Result<Restaurant, BookingError> {
        self.store
            .find_restaurant(id)
            .await?
            .ok_or(BookingError::RestaurantNotFound(id))
    }

    /// Setting and generated slots for a date; `None` when nothing is
    /// configured for it
    async fn day_outcome(
        &self,
        restaurant: &Restaurant,
        tz: Tz,
        date: NaiveDate,
        party_size: i32,
        exclude: Option<Uuid>,
    ) -> Result<Option<(ReservationSetting, SlotOutcome)>, BookingError> {
        let settings = self.store.list_settings(restaurant.id).await?;
        let Some(setting) = schedule::applicable_setting(&settings, date).cloned() else {
            tracing::debug!(restaurant_id = %restaurant.id, %date, "No reservation setting applies");
            return Ok(None);
        };

        // the previous day may hold bookings that run past midnight
        let from = date.pred_opt().unwrap_or(date);
        let existing = self
            .store
            .list_reservations(restaurant.id, from, date, ListScope::Active)
            .await?;
        let booked = slots::booked_intervals(
            existing.iter().filter(|r| Some(r.id) != exclude),
            tz,
        );

        let outcome = slots::generate_slots(&SlotRequest {
            date,
            timeslot_length_minutes: setting.timeslot_length_minutes,
            ranges: &setting.time_ranges,
            tables: &setting.table_inventory,
            booked: &booked,
            party_size,
            tz,
            threshold: self.config.capacity_threshold,
            now: self.clock.now(),
        })?;
        Ok(Some((setting, outcome)))
    }

    /// Check that `requested` is a generated, available slot inside the
    /// booking window
    async fn plan_slot(
        &self,
        restaurant: &Restaurant,
        tz: Tz,
        date: NaiveDate,
        requested: &str,
        party_size: i32,
        exclude: Option<Uuid>,
    ) -> Result<PlannedSlot, BookingError> {
        let start_time = time::parse_wall_clock(requested)?;
        let requested = time::format_wall_clock(start_time);
        let start = schedule::slot_start_instant(date, start_time, tz);

        let window = BookingWindow::for_restaurant(restaurant, self.clock.now());
        if !window.contains(start) {
            return Err(BookingError::OutsideBookingWindow {
                earliest: window.earliest,
                latest: window.latest,
            });
        }

        let Some((setting, outcome)) = self
            .day_outcome(restaurant, tz, date, party_size, exclude)
            .await?
        else {
            return Err(BookingError::SlotNotOffered(requested));
        };
        if let Some(diagnostic) = outcome.diagnostic {
            return Err(diagnostic.into());
        }
        let slot = outcome
            .slots
            .into_iter()
            .find(|s| s.start == requested)
            .ok_or_else(|| BookingError::SlotNotOffered(requested.clone()))?;
        if !slot.available {
            return Err(BookingError::SlotUnavailable(requested));
        }

        let end = start + Duration::minutes(i64::from(setting.timeslot_length_minutes));
        Ok(PlannedSlot {
            timeslot_start: slot.start,
            timeslot_end: slot.end,
            start,
            guard: CapacityGuard {
                restaurant_id: restaurant.id,
                date,
                start,
                end,
                party_size,
                tables: setting.table_inventory,
                threshold: self.config.capacity_threshold,
                tz,
                exclude,
            },
        })
    }

    /// The payment reference to store, checked against the deposit policy
    async fn check_deposit(
        &self,
        restaurant: &Restaurant,
        intent_id: Option<&str>,
    ) -> Result<Option<String>, BookingError> {
        let intent_id = intent_id.map(str::trim).filter(|id| !id.is_empty());
        match intent_id {
            None if restaurant.deposit_required => Err(BookingError::DepositRequired),
            None => Ok(None),
            Some(id) => {
                if !self.deposits.verify(id).await? {
                    return Err(BookingError::HoldInactive);
                }
                Ok(Some(id.to_string()))
            }
        }
    }

    fn management_link(&self, r: &Reservation) -> Result<(String, String), BookingError> {
        let mac = self.links.sign(&r.confirmation_code, &r.customer_email)?;
        let path = LinkSigner::path(&r.confirmation_code, &mac);
        let url = format!("{}{}", self.links.base_url(), path);
        Ok((path, url))
    }

    async fn notify(
        &self,
        kind: NotificationKind,
        restaurant: &Restaurant,
        reservation: &Reservation,
        link: Option<String>,
    ) -> Option<String> {
        let params = NotificationParams::new(restaurant, reservation, link);
        match self
            .notifier
            .send(&reservation.customer_email, kind, &params)
            .await
        {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    confirmation_code = %reservation.confirmation_code,
                    kind = %kind,
                    error = %e,
                    "Notification failed"
                );
                Some(NOTIFICATION_WARNING.to_string())
            }
        }
    }
}

/// Stored versions strictly increase even when the clock does not.
/// Microsecond precision matches what PostgreSQL keeps.
fn next_version(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(6);
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn slot_error(e: RepoError, planned: &PlannedSlot) -> BookingError {
    match e {
        RepoError::SlotTaken => {
            tracing::info!(start = %planned.start, "Slot taken by a concurrent booking");
            BookingError::SlotUnavailable(planned.timeslot_start.clone())
        }
        other => other.into(),
    }
}
