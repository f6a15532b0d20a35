use crate::state::AppState;
use axum::extract::{Path, Query, State};
use booking_engine::Availability;
use shared::error::{ApiResponse, AppError};
use shared::request::AvailabilityQuery;
use uuid::Uuid;

/// GET /api/restaurants/{id}/availability?date=&party_size=
pub async fn get_availability(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<ApiResponse<Availability>, AppError> {
    let availability = state.service.available_slots(restaurant_id, &query).await?;
    Ok(ApiResponse::success(availability))
}
