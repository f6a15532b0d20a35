//! PostgreSQL persistence
//!
//! Query functions live in the submodules and take a pool or transaction;
//! [`PgStore`] wires them into the engine's [`ReservationStore`].

pub mod customers;
pub mod reservations;
pub mod restaurants;

use async_trait::async_trait;
use booking_engine::reminders::ReminderKind;
use booking_engine::{CapacityGuard, ListScope, RepoError, RepoResult, ReservationStore};
use chrono::{DateTime, NaiveDate, Utc};
use shared::models::{Customer, Reservation, ReservationSetting, Restaurant};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// sqlx error → store error. Unique violations become `Duplicate`.
pub(crate) fn repo_err(e: sqlx::Error) -> RepoError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Duplicate(db.constraint().unwrap_or("unique").to_string())
        }
        _ => RepoError::Database(e.to_string()),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Serialise writers for one restaurant/date, then run the guard
    /// against what is stored now. Both happen inside `tx`.
    async fn check_guard(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        guard: &CapacityGuard,
    ) -> RepoResult<()> {
        let key = format!("{}:{}", guard.restaurant_id, guard.date);
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&key)
            .execute(&mut **tx)
            .await
            .map_err(repo_err)?;

        let others = reservations::occupying_on(&mut **tx, guard.restaurant_id, guard.date)
            .await
            .map_err(repo_err)?;
        if !guard.admits(&others) {
            return Err(RepoError::SlotTaken);
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn find_restaurant(&self, id: Uuid) -> RepoResult<Option<Restaurant>> {
        restaurants::find(&self.pool, id).await.map_err(repo_err)
    }

    async fn list_settings(&self, restaurant_id: Uuid) -> RepoResult<Vec<ReservationSetting>> {
        restaurants::settings(&self.pool, restaurant_id)
            .await
            .map_err(repo_err)
    }

    async fn upsert_customer(
        &self,
        email: &str,
        name: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Customer> {
        customers::upsert(&self.pool, email, name, phone, now)
            .await
            .map_err(repo_err)
    }

    async fn insert_reservation(
        &self,
        reservation: &Reservation,
        guard: &CapacityGuard,
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(repo_err)?;
        Self::check_guard(&mut tx, guard).await?;
        reservations::insert(&mut *tx, reservation)
            .await
            .map_err(repo_err)?;
        tx.commit().await.map_err(repo_err)
    }

    async fn update_reservation(
        &self,
        reservation: &Reservation,
        read_version: DateTime<Utc>,
        guard: Option<&CapacityGuard>,
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(repo_err)?;
        // The conditional update row-locks the reservation until commit
        let updated = reservations::update(&mut *tx, reservation, read_version)
            .await
            .map_err(repo_err)?;
        if updated == 0 {
            return Err(RepoError::Stale(reservation.confirmation_code.clone()));
        }
        if let Some(guard) = guard {
            Self::check_guard(&mut tx, guard).await?;
        }
        tx.commit().await.map_err(repo_err)
    }

    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Reservation>> {
        reservations::find_by_code(&self.pool, code)
            .await
            .map_err(repo_err)
    }

    async fn list_reservations(
        &self,
        restaurant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        scope: ListScope,
    ) -> RepoResult<Vec<Reservation>> {
        reservations::list(
            &self.pool,
            restaurant_id,
            from,
            to,
            scope == ListScope::All,
        )
        .await
        .map_err(repo_err)
    }

    async fn list_due_reminders(
        &self,
        kind: ReminderKind,
        now: DateTime<Utc>,
        min_date: NaiveDate,
    ) -> RepoResult<Vec<Reservation>> {
        reservations::due_reminders(&self.pool, kind, now, min_date)
            .await
            .map_err(repo_err)
    }

    async fn claim_reminder(&self, reservation_id: Uuid, kind: ReminderKind) -> RepoResult<bool> {
        reservations::claim_reminder(&self.pool, reservation_id, kind)
            .await
            .map_err(repo_err)
    }
}
