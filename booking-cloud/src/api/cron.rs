use crate::state::AppState;
use axum::extract::{Query, State};
use booking_engine::SweepReport;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use sha2::Sha256;
use shared::error::{ApiResponse, AppError};
use shared::request::ReminderQuery;

type HmacSha256 = Hmac<Sha256>;

/// Both sides are MACed under the expected secret and the tags compared
/// with `verify_slice`, which is constant time.
fn token_matches(presented: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let tag = |value: &str| {
        HmacSha256::new_from_slice(expected.as_bytes()).map(|mut mac| {
            mac.update(value.as_bytes());
            mac
        })
    };
    let (Ok(reference), Ok(candidate)) = (tag(expected), tag(presented)) else {
        return false;
    };
    candidate
        .verify_slice(&reference.finalize().into_bytes())
        .is_ok()
}

/// GET /api/cron/reminders?type=1_week|1_day
pub async fn send_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReminderQuery>,
) -> Result<ApiResponse<SweepReport>, AppError> {
    let authorized = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token_matches(token, state.cron_secret.as_str()));
    if !authorized {
        tracing::warn!("Rejected reminder trigger without a valid token");
        return Err(AppError::unauthorized());
    }

    let report = state.service.send_reminders(&query.kind).await?;
    Ok(ApiResponse::success(report))
}
