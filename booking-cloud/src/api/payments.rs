use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use booking_engine::DepositHold;
use shared::error::{ApiResponse, AppError};
use shared::request::HoldRequest;

/// POST /api/payments/holds
///
/// The returned client secret lets the browser confirm the card; the
/// intent id then goes into the create request.
pub async fn create_hold(
    State(state): State<AppState>,
    Json(req): Json<HoldRequest>,
) -> Result<ApiResponse<DepositHold>, AppError> {
    let hold = state.service.place_deposit_hold(&req).await?;
    Ok(ApiResponse::success(hold))
}
