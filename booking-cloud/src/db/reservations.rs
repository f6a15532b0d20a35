use booking_engine::reminders::ReminderKind;
use chrono::{DateTime, NaiveDate, Utc};
use shared::models::Reservation;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const COLUMNS: &str = "id, restaurant_id, customer_id, confirmation_code, date, timeslot_start,
    timeslot_end, party_size, customer_name, customer_email, customer_phone, status,
    dietary_restrictions, special_occasion, special_requests, deposit_payment_intent_id,
    reminder_1_week_at, reminder_1_week_sent, reminder_1_day_at, reminder_1_day_sent,
    created_at, updated_at";

pub async fn insert<'e>(ex: impl PgExecutor<'e>, r: &Reservation) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO reservations (id, restaurant_id, customer_id, confirmation_code, date,
            timeslot_start, timeslot_end, party_size, customer_name, customer_email,
            customer_phone, status, dietary_restrictions, special_occasion, special_requests,
            deposit_payment_intent_id, reminder_1_week_at, reminder_1_week_sent,
            reminder_1_day_at, reminder_1_day_sent, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21, $22)",
    )
    .bind(r.id)
    .bind(r.restaurant_id)
    .bind(r.customer_id)
    .bind(&r.confirmation_code)
    .bind(r.date)
    .bind(&r.timeslot_start)
    .bind(&r.timeslot_end)
    .bind(r.party_size)
    .bind(&r.customer_name)
    .bind(&r.customer_email)
    .bind(&r.customer_phone)
    .bind(r.status.as_str())
    .bind(&r.dietary_restrictions)
    .bind(&r.special_occasion)
    .bind(&r.special_requests)
    .bind(&r.deposit_payment_intent_id)
    .bind(r.reminder_1_week_at)
    .bind(r.reminder_1_week_sent)
    .bind(r.reminder_1_day_at)
    .bind(r.reminder_1_day_sent)
    .bind(r.created_at)
    .bind(r.updated_at)
    .execute(ex)
    .await?;
    Ok(())
}

/// Overwrite the mutable fields. Returns the number of rows touched.
/// Conditional on the row still carrying `read_version` and a live status.
/// Zero rows affected means another writer got there first.
pub async fn update<'e>(
    ex: impl PgExecutor<'e>,
    r: &Reservation,
    read_version: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE reservations SET
            customer_id = $2, date = $3, timeslot_start = $4, timeslot_end = $5,
            party_size = $6, customer_name = $7, customer_email = $8, customer_phone = $9,
            status = $10, dietary_restrictions = $11, special_occasion = $12,
            special_requests = $13, deposit_payment_intent_id = $14,
            reminder_1_week_at = $15, reminder_1_week_sent = $16,
            reminder_1_day_at = $17, reminder_1_day_sent = $18, updated_at = $19
            WHERE id = $1 AND updated_at = $20
              AND status NOT IN ('cancelled', 'completed')",
    )
    .bind(r.id)
    .bind(r.customer_id)
    .bind(r.date)
    .bind(&r.timeslot_start)
    .bind(&r.timeslot_end)
    .bind(r.party_size)
    .bind(&r.customer_name)
    .bind(&r.customer_email)
    .bind(&r.customer_phone)
    .bind(r.status.as_str())
    .bind(&r.dietary_restrictions)
    .bind(&r.special_occasion)
    .bind(&r.special_requests)
    .bind(&r.deposit_payment_intent_id)
    .bind(r.reminder_1_week_at)
    .bind(r.reminder_1_week_sent)
    .bind(r.reminder_1_day_at)
    .bind(r.reminder_1_day_sent)
    .bind(r.updated_at)
    .bind(read_version)
    .execute(ex)
    .await?;
    Ok(result.rows_affected())
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Reservation>, sqlx::Error> {
    sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {COLUMNS} FROM reservations WHERE confirmation_code = $1"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await
}

/// Reservations holding a table on `date`, or on the day before (slots
/// crossing midnight).
pub async fn occupying_on<'e>(
    ex: impl PgExecutor<'e>,
    restaurant_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<Reservation>, sqlx::Error> {
    sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {COLUMNS} FROM reservations
            WHERE restaurant_id = $1 AND date BETWEEN $2 - 1 AND $2
            AND status <> 'cancelled'"
    ))
    .bind(restaurant_id)
    .bind(date)
    .fetch_all(ex)
    .await
}

pub async fn list(
    pool: &PgPool,
    restaurant_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
    include_cancelled: bool,
) -> Result<Vec<Reservation>, sqlx::Error> {
    sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {COLUMNS} FROM reservations
            WHERE restaurant_id = $1 AND date BETWEEN $2 AND $3
            AND ($4 OR status <> 'cancelled')
            ORDER BY date, timeslot_start"
    ))
    .bind(restaurant_id)
    .bind(from)
    .bind(to)
    .bind(include_cancelled)
    .fetch_all(pool)
    .await
}

fn reminder_columns(kind: ReminderKind) -> (&'static str, &'static str) {
    match kind {
        ReminderKind::OneWeek => ("reminder_1_week_at", "reminder_1_week_sent"),
        ReminderKind::OneDay => ("reminder_1_day_at", "reminder_1_day_sent"),
    }
}

pub async fn due_reminders(
    pool: &PgPool,
    kind: ReminderKind,
    now: DateTime<Utc>,
    min_date: NaiveDate,
) -> Result<Vec<Reservation>, sqlx::Error> {
    let (at, sent) = reminder_columns(kind);
    sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {COLUMNS} FROM reservations
            WHERE {at} <= $1 AND NOT {sent} AND date >= $2
            AND status <> 'cancelled'
            ORDER BY {at}"
    ))
    .bind(now)
    .bind(min_date)
    .fetch_all(pool)
    .await
}

/// Flip the sent flag; only the caller that flips it may send.
pub async fn claim_reminder(
    pool: &PgPool,
    reservation_id: Uuid,
    kind: ReminderKind,
) -> Result<bool, sqlx::Error> {
    let (_, sent) = reminder_columns(kind);
    let result = sqlx::query(&format!(
        "UPDATE reservations SET {sent} = TRUE WHERE id = $1 AND NOT {sent}"
    ))
    .bind(reservation_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}
