//! In-memory [`ReservationStore`]
//!
//! One mutex guards everything, so the capacity guard and the write it
//! protects happen under the same lock.

use crate::reminders::ReminderKind;
use crate::repository::{ListScope, RepoError, RepoResult, ReservationStore};
use crate::slots::CapacityGuard;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use shared::models::{Customer, Reservation, ReservationSetting, ReservationStatus, Restaurant};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
    restaurants: HashMap<Uuid, Restaurant>,
    settings: Vec<ReservationSetting>,
    customers: HashMap<String, Customer>,
    reservations: Vec<Reservation>,
}

impl Inner {
    fn same_day(&self, guard: &CapacityGuard) -> Vec<Reservation> {
        self.reservations
            .iter()
            .filter(|r| {
                r.restaurant_id == guard.restaurant_id
                    && r.date == guard.date
                    && r.status.occupies_table()
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_restaurant(&self, restaurant: Restaurant) {
        self.inner.lock().restaurants.insert(restaurant.id, restaurant);
    }

    pub fn add_setting(&self, setting: ReservationSetting) {
        self.inner.lock().settings.push(setting);
    }

    /// Seed a reservation without any checks
    pub fn seed_reservation(&self, reservation: Reservation) {
        self.inner.lock().reservations.push(reservation);
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.inner.lock().reservations.clone()
    }

    pub fn customer(&self, email: &str) -> Option<Customer> {
        self.inner.lock().customers.get(email).cloned()
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn find_restaurant(&self, id: Uuid) -> RepoResult<Option<Restaurant>> {
        Ok(self.inner.lock().restaurants.get(&id).cloned())
    }

    async fn list_settings(&self, restaurant_id: Uuid) -> RepoResult<Vec<ReservationSetting>> {
        Ok(self
            .inner
            .lock()
            .settings
            .iter()
            .filter(|s| s.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn upsert_customer(
        &self,
        email: &str,
        name: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Customer> {
        let mut inner = self.inner.lock();
        let customer = inner
            .customers
            .entry(email.to_string())
            .and_modify(|c| {
                c.merge(name, phone, now);
            })
            .or_insert_with(|| Customer::new(email, name, phone, now));
        Ok(customer.clone())
    }

    async fn insert_reservation(
        &self,
        reservation: &Reservation,
        guard: &CapacityGuard,
    ) -> RepoResult<()> {
        let mut inner = self.inner.lock();
        if inner
            .reservations
            .iter()
            .any(|r| r.confirmation_code == reservation.confirmation_code)
        {
            return Err(RepoError::Duplicate(reservation.confirmation_code.clone()));
        }
        if !guard.admits(&inner.same_day(guard)) {
            return Err(RepoError::SlotTaken);
        }
        inner.reservations.push(reservation.clone());
        Ok(())
    }

    async fn update_reservation(
        &self,
        reservation: &Reservation,
        read_version: DateTime<Utc>,
        guard: Option<&CapacityGuard>,
    ) -> RepoResult<()> {
        let mut inner = self.inner.lock();
        let stored = inner
            .reservations
            .iter()
            .find(|r| r.id == reservation.id)
            .ok_or_else(|| RepoError::NotFound(reservation.confirmation_code.clone()))?;
        if stored.updated_at != read_version || stored.status.is_terminal() {
            return Err(RepoError::Stale(reservation.confirmation_code.clone()));
        }
        if let Some(guard) = guard
            && !guard.admits(&inner.same_day(guard))
        {
            return Err(RepoError::SlotTaken);
        }
        let slot = inner
            .reservations
            .iter_mut()
            .find(|r| r.id == reservation.id)
            .ok_or_else(|| RepoError::NotFound(reservation.confirmation_code.clone()))?;
        *slot = reservation.clone();
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Reservation>> {
        Ok(self
            .inner
            .lock()
            .reservations
            .iter()
            .find(|r| r.confirmation_code == code)
            .cloned())
    }

    async fn list_reservations(
        &self,
        restaurant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        scope: ListScope,
    ) -> RepoResult<Vec<Reservation>> {
        let mut rows: Vec<Reservation> = self
            .inner
            .lock()
            .reservations
            .iter()
            .filter(|r| r.restaurant_id == restaurant_id && r.date >= from && r.date <= to)
            .filter(|r| scope == ListScope::All || r.status != ReservationStatus::Cancelled)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (a.date, &a.timeslot_start).cmp(&(b.date, &b.timeslot_start)));
        Ok(rows)
    }

    async fn list_due_reminders(
        &self,
        kind: ReminderKind,
        now: DateTime<Utc>,
        min_date: NaiveDate,
    ) -> RepoResult<Vec<Reservation>> {
        Ok(self
            .inner
            .lock()
            .reservations
            .iter()
            .filter(|r| {
                let (at, sent) = kind.schedule_of(r);
                at <= now
                    && !sent
                    && r.status != ReservationStatus::Cancelled
                    && r.date >= min_date
            })
            .cloned()
            .collect())
    }

    async fn claim_reminder(&self, reservation_id: Uuid, kind: ReminderKind) -> RepoResult<bool> {
        let mut inner = self.inner.lock();
        let r = inner
            .reservations
            .iter_mut()
            .find(|r| r.id == reservation_id)
            .ok_or_else(|| RepoError::NotFound(reservation_id.to_string()))?;
        let flag = match kind {
            ReminderKind::OneWeek => &mut r.reminder_1_week_sent,
            ReminderKind::OneDay => &mut r.reminder_1_day_sent,
        };
        if *flag {
            return Ok(false);
        }
        *flag = true;
        Ok(true)
    }
}
