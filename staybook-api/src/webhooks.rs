use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use staybook_booking::NotificationOutcome;

use crate::error::AppError;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/payments", post(handle_payment_webhook))
}

/// POST /v1/webhooks/payments
/// The raw body is taken as bytes so the signature is checked over exactly
/// what the gateway sent.
async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok());
    let outcome = state.payments.handle_notification(&body, signature).await?;
    tracing::info!("Payment webhook handled: {}", outcome_label(&outcome));
    Ok(Json(outcome_body(&outcome)))
}

fn outcome_label(outcome: &NotificationOutcome) -> &'static str {
    match outcome {
        NotificationOutcome::Confirmed(_) => "confirmed",
        NotificationOutcome::AlreadyProcessed => "already_processed",
        NotificationOutcome::PaymentNotSuccessful(_) => "payment_not_successful",
        NotificationOutcome::Ignored(_) => "ignored",
    }
}

fn outcome_body(outcome: &NotificationOutcome) -> Value {
    let label = outcome_label(outcome);
    match outcome {
        NotificationOutcome::Confirmed(booking) => json!({
            "outcome": label,
            "booking_reference": booking.reference,
            "status": booking.status,
        }),
        NotificationOutcome::PaymentNotSuccessful(reason) => json!({ "outcome": label, "reason": reason }),
        NotificationOutcome::Ignored(event) => json!({ "outcome": label, "event": event }),
        NotificationOutcome::AlreadyProcessed => json!({ "outcome": label }),
    }
}
