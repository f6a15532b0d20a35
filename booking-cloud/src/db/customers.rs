use chrono::{DateTime, Utc};
use shared::models::Customer;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert by email, or append an unseen name/phone to the existing row.
///
/// One statement; concurrent calls for the same email merge.
pub async fn upsert(
    pool: &PgPool,
    email: &str,
    name: &str,
    phone: &str,
    now: DateTime<Utc>,
) -> Result<Customer, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (id, email, names, phones, created_at, updated_at)
            VALUES ($1, $2, ARRAY[$3::text], ARRAY[$4::text], $5, $5)
            ON CONFLICT (email) DO UPDATE SET
                names = CASE WHEN $3 = ANY(customers.names) THEN customers.names
                    ELSE array_append(customers.names, $3::text) END,
                phones = CASE WHEN $4 = ANY(customers.phones) THEN customers.phones
                    ELSE array_append(customers.phones, $4::text) END,
                updated_at = CASE
                    WHEN $3 = ANY(customers.names) AND $4 = ANY(customers.phones)
                    THEN customers.updated_at ELSE $5 END
            RETURNING id, email, names, phones, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(phone)
    .bind(now)
    .fetch_one(pool)
    .await
}
