use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use uuid::Uuid;

use staybook_core::payment::{
    GatewayStatus, InitializeTransaction, InitializedTransaction, PaymentGateway, VerifiedTransaction,
};
use staybook_core::repository::{BookingRepository, PaymentRepository};
use staybook_core::{BookingError, BookingResult, Repositories};
use staybook_shared::{Booking, BookingStatus, PaymentRecord, PaymentStatus};

use crate::manager::BookingOrchestrator;
use crate::models::{NotificationOutcome, PaymentInitialization, WebhookEvent};

/// Event name the gateway sends for a captured charge.
pub const PAYMENT_SUCCEEDED_EVENT: &str = "charge.success";

type HmacSha512 = Hmac<Sha512>;

/// Hex HMAC-SHA512 of `body` under `secret`, as sent in the signature header.
pub fn webhook_signature(secret: &[u8], body: &[u8]) -> BookingResult<String> {
    let mut mac = HmacSha512::new_from_slice(secret).map_err(|_| BookingError::SignatureInvalid)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn payment_reference(booking_reference: &str) -> String {
    format!("PAY-{}", booking_reference)
}

#[derive(Debug, Clone)]
pub struct PaymentSettings {
    pub webhook_secret: String,
    pub callback_base_url: String,
    pub currency: String,
}

/// Turns verified gateway payments into booking confirmations, at most once
/// per payment.
#[derive(Clone)]
pub struct PaymentConfirmationHandler {
    orchestrator: BookingOrchestrator,
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    settings: PaymentSettings,
}

impl PaymentConfirmationHandler {
    pub fn new(
        orchestrator: BookingOrchestrator,
        repos: &Repositories,
        gateway: Arc<dyn PaymentGateway>,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            orchestrator,
            bookings: repos.bookings.clone(),
            payments: repos.payments.clone(),
            gateway,
            settings,
        }
    }

    /// Start a gateway transaction for a booking awaiting payment. Calling it
    /// again while the transaction is still pending returns the same one.
    /// The payment reference is fixed per booking, so once a payment has
    /// failed the guest must retry with a new booking.
    pub async fn initialize_payment(&self, booking_reference: &str, guest_id: Uuid) -> BookingResult<PaymentInitialization> {
        let booking = self
            .bookings
            .find_by_reference(booking_reference)
            .await?
            .filter(|b| b.belongs_to(guest_id))
            .ok_or_else(|| BookingError::not_found("Booking not found"))?;

        if booking.status != BookingStatus::PendingPayment {
            return Err(BookingError::invalid(format!(
                "Booking is {} and cannot be paid",
                booking.status
            )));
        }

        let reference = payment_reference(&booking.reference);
        if let Some(existing) = self.payments.find_by_reference(&reference).await? {
            return match existing.status {
                PaymentStatus::Pending => Ok(self.initialization(&existing)),
                status => Err(BookingError::conflict(format!("Payment already {}", status))),
            };
        }

        let transaction = self
            .gateway
            .initialize(&InitializeTransaction {
                email: booking.contact.email.expose().clone(),
                amount: booking.pricing.total,
                reference: reference.clone(),
                callback_url: format!(
                    "{}/bookings/{}/confirm",
                    self.settings.callback_base_url.trim_end_matches('/'),
                    booking.id
                ),
                metadata: serde_json::json!({
                    "booking_id": booking.id,
                    "booking_reference": booking.reference,
                }),
            })
            .await?;

        let now = Utc::now();
        let record = PaymentRecord {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            reference,
            access_code: Some(transaction.access_code),
            authorization_url: Some(transaction.authorization_url),
            amount: booking.pricing.total,
            currency: self.settings.currency.clone(),
            status: PaymentStatus::Pending,
            customer_email: booking.contact.email.clone(),
            gateway_response: None,
            paid_at: None,
            failed_at: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.payments.insert(&record).await?;

        info!(booking_id = %booking.id, reference = %record.reference, amount = record.amount, "payment initialized");
        Ok(self.initialization(&record))
    }

    fn initialization(&self, record: &PaymentRecord) -> PaymentInitialization {
        PaymentInitialization {
            reference: record.reference.clone(),
            access_code: record.access_code.clone(),
            authorization_url: record.authorization_url.clone(),
            amount: record.amount,
            currency: record.currency.clone(),
        }
    }

    pub fn verify_signature(&self, raw_body: &[u8], signature: Option<&str>) -> BookingResult<()> {
        let provided = signature.ok_or(BookingError::SignatureInvalid)?.trim().to_ascii_lowercase();
        let expected = webhook_signature(self.settings.webhook_secret.as_bytes(), raw_body)?;

        if expected.len() != provided.len() || !bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
            return Err(BookingError::SignatureInvalid);
        }
        Ok(())
    }

    /// Authenticate a webhook, re-verify the payment with the gateway and
    /// confirm its booking.
    pub async fn handle_notification(&self, raw_body: &[u8], signature: Option<&str>) -> BookingResult<NotificationOutcome> {
        if let Err(err) = self.verify_signature(raw_body, signature) {
            warn!("rejected payment webhook with bad signature");
            return Err(err);
        }

        let event: WebhookEvent = serde_json::from_slice(raw_body)
            .map_err(|e| BookingError::invalid(format!("Malformed webhook payload: {}", e)))?;

        if event.event != PAYMENT_SUCCEEDED_EVENT {
            info!(event = %event.event, "ignoring payment webhook event");
            return Ok(NotificationOutcome::Ignored(event.event));
        }

        let reference = event.data["reference"]
            .as_str()
            .ok_or_else(|| BookingError::invalid("Webhook payload has no reference"))?;

        let mut payment = self
            .payments
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| BookingError::not_found("Payment not found"))?;

        if payment.status == PaymentStatus::Completed {
            return self.redeliver_completed(&payment).await;
        }

        let verified = self.gateway.verify(reference).await?;
        let expected = payment.status;

        if let Some(reason) = rejection_reason(&verified, payment.amount) {
            warn!(reference, reason = %reason, "payment not successful");
            payment.mark_failed(reason.clone(), verified.raw);
            self.payments.update(&payment, expected).await?;
            return Ok(NotificationOutcome::PaymentNotSuccessful(reason));
        }

        payment.mark_completed(verified.raw);
        if !self.payments.update(&payment, expected).await? {
            info!(reference, "payment completed by a concurrent notification");
            return Ok(NotificationOutcome::AlreadyProcessed);
        }

        let booking = self.orchestrator.confirm(payment.booking_id).await?;
        info!(reference, booking_id = %booking.id, "booking confirmed by payment");
        Ok(NotificationOutcome::Confirmed(booking))
    }

    /// A notification for a payment already marked completed. Re-drives the
    /// confirmation if an earlier attempt stopped before reaching the booking.
    async fn redeliver_completed(&self, payment: &PaymentRecord) -> BookingResult<NotificationOutcome> {
        let booking: Booking = self
            .bookings
            .get(payment.booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Booking not found"))?;

        if booking.status != BookingStatus::PendingPayment {
            info!(reference = %payment.reference, "duplicate payment notification");
            return Ok(NotificationOutcome::AlreadyProcessed);
        }

        warn!(reference = %payment.reference, "payment completed but booking still pending, confirming");
        Ok(NotificationOutcome::Confirmed(self.orchestrator.confirm(booking.id).await?))
    }
}

fn rejection_reason(verified: &VerifiedTransaction, expected_amount: i64) -> Option<String> {
    if !verified.status.is_success() {
        return Some(verified.status.to_string());
    }
    match verified.amount {
        Some(amount) if amount != expected_amount => Some("amount_mismatch".to_string()),
        _ => None,
    }
}

/// In-process gateway for tests and local runs. Transactions verify as
/// pending until an outcome is set.
#[derive(Default)]
pub struct MockPaymentGateway {
    outcomes: Mutex<HashMap<String, (GatewayStatus, Option<i64>)>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_outcome(&self, reference: &str, status: GatewayStatus, amount: Option<i64>) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.insert(reference.to_string(), (status, amount));
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn initialize(&self, request: &InitializeTransaction) -> BookingResult<InitializedTransaction> {
        Ok(InitializedTransaction {
            authorization_url: format!("https://checkout.invalid/{}", request.reference),
            access_code: format!("mock_{}", request.reference.to_lowercase()),
            reference: request.reference.clone(),
        })
    }

    async fn verify(&self, reference: &str) -> BookingResult<VerifiedTransaction> {
        let (status, amount) = self
            .outcomes
            .lock()
            .map_err(|_| BookingError::upstream("mock gateway poisoned"))?
            .get(reference)
            .cloned()
            .unwrap_or((GatewayStatus::Pending, None));

        Ok(VerifiedTransaction {
            reference: reference.to_string(),
            raw: serde_json::json!({ "reference": reference, "status": status.to_string(), "amount": amount }),
            status,
            amount,
        })
    }
}
