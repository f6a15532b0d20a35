//! Persistence seam
//!
//! The lifecycle manager is the only writer. Implementations must enforce
//! confirmation-code uniqueness (reported as [`RepoError::Duplicate`]),
//! evaluate the [`CapacityGuard`] atomically with the write it protects,
//! and refuse an update whose read is out of date ([`RepoError::Stale`]).

use crate::reminders::ReminderKind;
use crate::slots::CapacityGuard;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::models::{Customer, Reservation, ReservationSetting, Restaurant};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Slot was taken by a concurrent booking")]
    SlotTaken,

    /// The stored row changed since it was read, or is already terminal
    #[error("Stale write: {0}")]
    Stale(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Which reservations a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Everything except cancelled
    Active,
    All,
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn find_restaurant(&self, id: Uuid) -> RepoResult<Option<Restaurant>>;

    async fn list_settings(&self, restaurant_id: Uuid) -> RepoResult<Vec<ReservationSetting>>;

    /// Create or merge the customer record keyed by email
    async fn upsert_customer(
        &self,
        email: &str,
        name: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Customer>;

    async fn insert_reservation(
        &self,
        reservation: &Reservation,
        guard: &CapacityGuard,
    ) -> RepoResult<()>;

    /// Replace a stored reservation. A guard is given when the slot moves.
    ///
    /// Applies only while the stored row still has `updated_at ==
    /// read_version` and a non-terminal status; otherwise
    /// [`RepoError::Stale`].
    async fn update_reservation(
        &self,
        reservation: &Reservation,
        read_version: DateTime<Utc>,
        guard: Option<&CapacityGuard>,
    ) -> RepoResult<()>;

    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Reservation>>;

    /// Reservations of a restaurant with `from <= date <= to`
    async fn list_reservations(
        &self,
        restaurant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        scope: ListScope,
    ) -> RepoResult<Vec<Reservation>>;

    /// Unsent, non-cancelled reminders due at `now`, for reservations dated
    /// on or after `min_date`
    async fn list_due_reminders(
        &self,
        kind: ReminderKind,
        now: DateTime<Utc>,
        min_date: NaiveDate,
    ) -> RepoResult<Vec<Reservation>>;

    /// Flip the sent flag if still unset. Returns whether this call flipped it.
    async fn claim_reminder(&self, reservation_id: Uuid, kind: ReminderKind) -> RepoResult<bool>;
}
