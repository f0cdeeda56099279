use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use staybook_booking::PaymentInitialization;

use crate::error::AppError;
use crate::identity::CallerId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InitializePaymentRequest {
    pub booking_reference: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/payments/initialize", post(initialize_payment))
}

/// POST /v1/payments/initialize
async fn initialize_payment(
    State(state): State<AppState>,
    CallerId(guest_id): CallerId,
    Json(req): Json<InitializePaymentRequest>,
) -> Result<Json<PaymentInitialization>, AppError> {
    let init = state.payments.initialize_payment(&req.booking_reference, guest_id).await?;
    tracing::info!(reference = %init.reference, "payment initialized");
    Ok(Json(init))
}
