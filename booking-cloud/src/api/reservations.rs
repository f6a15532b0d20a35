//! Guest-facing reservation endpoints
//!
//! Everything after create is addressed by `{code}/{mac}` from the
//! management link; a wrong MAC looks exactly like an unknown code.

use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use http::StatusCode;
use booking_engine::{BookingReceipt, CancellationReceipt};
use shared::error::{ApiResponse, AppError};
use shared::models::Reservation;
use shared::request::{CreateReservationRequest, ModifyReservationRequest};

/// POST /api/reservations
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<(StatusCode, ApiResponse<BookingReceipt>), AppError> {
    let receipt = state.service.create(req).await?;
    Ok((StatusCode::CREATED, ApiResponse::success(receipt)))
}

/// GET /api/reservations/{code}/{mac}
pub async fn get(
    State(state): State<AppState>,
    Path((code, mac)): Path<(String, String)>,
) -> Result<ApiResponse<Reservation>, AppError> {
    let reservation = state.service.access(&code, &mac).await?;
    Ok(ApiResponse::success(reservation))
}

/// PUT /api/reservations/{code}/{mac}
pub async fn modify(
    State(state): State<AppState>,
    Path((code, mac)): Path<(String, String)>,
    Json(req): Json<ModifyReservationRequest>,
) -> Result<ApiResponse<BookingReceipt>, AppError> {
    let receipt = state.service.modify(&code, &mac, req).await?;
    Ok(ApiResponse::success(receipt))
}

/// POST /api/reservations/{code}/{mac}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path((code, mac)): Path<(String, String)>,
) -> Result<ApiResponse<CancellationReceipt>, AppError> {
    let receipt = state.service.cancel(&code, &mac).await?;
    Ok(ApiResponse::success(receipt))
}
