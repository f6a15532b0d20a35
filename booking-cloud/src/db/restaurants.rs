use shared::models::{ReservationSetting, Restaurant};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Restaurant>, sqlx::Error> {
    sqlx::query_as::<_, Restaurant>(
        "SELECT id, name, address, thumbnail_url, timezone, min_advance_hours,
            max_advance_hours, allowed_cancellation_hours, deposit_required,
            deposit_amount, deposit_currency, booking_page_url
            FROM restaurants WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Weekday defaults and date overrides together
pub async fn settings(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> Result<Vec<ReservationSetting>, sqlx::Error> {
    sqlx::query_as::<_, ReservationSetting>(
        "SELECT id, restaurant_id, day_of_week, specific_date, timeslot_length_minutes,
            time_ranges, table_inventory
            FROM reservation_settings
            WHERE restaurant_id = $1
            ORDER BY specific_date NULLS FIRST, day_of_week",
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await
}
