use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use staybook_booking::{CreateBookingRequest, CreatedBooking};
use staybook_shared::{Booking, BookingFilter};

use crate::error::AppError;
use crate::identity::CallerId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<BookingFilter>,
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route("/v1/bookings/{reference}", get(get_booking))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
        .route("/v1/bookings/{id}/check-in", post(check_in))
        .route("/v1/bookings/{id}/check-out", post(check_out))
}

/// POST /v1/bookings
async fn create_booking(
    State(state): State<AppState>,
    CallerId(guest_id): CallerId,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreatedBooking>), AppError> {
    let created = state.bookings.create(guest_id, req).await?;
    info!(reference = %created.booking.reference, "booking created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /v1/bookings?status=upcoming|past|cancelled
async fn list_bookings(
    State(state): State<AppState>,
    CallerId(guest_id): CallerId,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.bookings.find_by_user(guest_id, query.status).await?))
}

/// GET /v1/bookings/{reference}
async fn get_booking(
    State(state): State<AppState>,
    CallerId(guest_id): CallerId,
    Path(reference): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.find_by_reference(&reference).await?;
    if !booking.belongs_to(guest_id) {
        return Err(AppError::NotFound("Booking not found".to_string()));
    }
    Ok(Json(booking))
}

/// POST /v1/bookings/{id}/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    CallerId(guest_id): CallerId,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.cancel(booking_id, guest_id, req.reason).await?))
}

/// POST /v1/bookings/{id}/check-in (front desk)
async fn check_in(
    State(state): State<AppState>,
    CallerId(staff_id): CallerId,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.check_in(booking_id, staff_id).await?))
}

/// POST /v1/bookings/{id}/check-out (front desk)
async fn check_out(
    State(state): State<AppState>,
    CallerId(staff_id): CallerId,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.check_out(booking_id, staff_id).await?))
}
